//! Statement builders.
//!
//! - [`Selector`]: SELECT for an entity type, with `get` / `get_multi`
//! - [`Inserter`]: multi-row INSERT of entity values
//! - [`RawQuery`]: caller-written SQL with positional parameters
//!
//! Builders are single-owner values: every chained call consumes and returns the builder, and
//! nothing touches the session until `get`, `get_multi` or `exec` is awaited.
//!
//! # Usage
//!
//! ```ignore
//! use eorm::{C, Context, Db};
//!
//! let db = Db::new(pool);
//! let ctx = Context::background();
//!
//! let user: User = db.select::<User>().where_([C("Id").eq(1)]).get(&ctx).await?;
//! let young: Vec<User> = db.select::<User>().where_([C("Age").lt(18)]).get_multi(&ctx).await?;
//!
//! db.insert::<User>().values([&alice, &bob]).exec(&ctx).await?;
//! db.raw_query("DELETE FROM users").exec(&ctx).await?;
//! ```

mod insert;
mod raw;
mod render;
mod select;

pub use insert::Inserter;
pub use raw::RawQuery;
pub use select::{OrderBy, Selector};

use crate::value::Value;

/// SQL text and its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl CompiledStatement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}
