//! # eorm
//!
//! A typed, metadata-driven ORM for Rust.
//!
//! ## Features
//!
//! - **Entity mapping**: `#[derive(Entity)]` describes a struct once; table and column names
//!   follow a [`NamingStrategy`] unless overridden per type or field
//! - **Fluent builders**: [`Selector`], [`Inserter`] and [`RawQuery`], compiled to SQL text plus
//!   bound parameters (never interpolated values)
//! - **Predicate trees**: [`C`]`("Id").lt(3).and(...)`, `or`, [`not`], `IN`, NULL checks and raw
//!   fragments
//! - **Explicit no-rows semantics**: `get` returns [`OrmError::NoRows`] when nothing matches,
//!   `get_multi` returns an empty `Vec`
//! - **Cancellation**: every execution takes a [`Context`] with an optional deadline and
//!   [`CancelToken`]
//! - **Pluggable sessions**: anything implementing [`Session`]; `tokio_postgres::Client` and
//!   `deadpool_postgres::Pool` work out of the box
//!
//! ## Example
//!
//! ```ignore
//! use eorm::{C, Context, Db, Entity};
//!
//! #[derive(Debug, Default, Clone, Entity)]
//! struct SimpleStruct {
//!     id: i64,
//!     name: String,
//!     nick: Option<String>,
//! }
//!
//! let db = Db::new(eorm::create_pool(&database_url)?);
//! let ctx = Context::background();
//!
//! db.insert::<SimpleStruct>().values([&row]).exec(&ctx).await?;
//!
//! let one = db.select::<SimpleStruct>().where_([C("Id").eq(1)]).get(&ctx).await?;
//! match db.select::<SimpleStruct>().where_([C("Id").eq(9)]).get(&ctx).await {
//!     Err(e) if e.is_no_rows() => { /* not found */ }
//!     other => { other?; }
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod context;
pub mod db;
pub mod dialect;
pub mod error;
mod exec;
pub mod expr;
pub mod meta;
pub mod session;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use builder::{CompiledStatement, Inserter, OrderBy, RawQuery, Selector};
pub use client::PgRows;
pub use config::DbConfig;
pub use context::{CancelToken, Context};
pub use db::Db;
pub use dialect::Dialect;
pub use error::{BoxError, DecodeError, OrmError, OrmResult};
pub use expr::{C, Column, Expr, LogicalOp, Op, Predicate, col, not, raw};
pub use meta::{ColumnMeta, Entity, FieldDef, MetaRegistry, NamingStrategy, TableMeta};
pub use session::{BufferedRows, ExecResult, RowStream, Session};
pub use value::{FromValue, Value, ValueError};

#[cfg(feature = "pool")]
pub use pool::{connect, create_pool, create_pool_with_config, create_pool_with_manager_config};

#[cfg(feature = "derive")]
pub use eorm_derive::Entity;
