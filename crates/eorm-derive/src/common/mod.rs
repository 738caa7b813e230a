//! Helpers shared by the derive implementations.

pub mod syn_types;
