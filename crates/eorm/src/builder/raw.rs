use super::CompiledStatement;
use crate::context::Context;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::exec;
use crate::meta::Entity;
use crate::session::{ExecResult, Session};
use crate::value::Value;

const SHAPE: &str = "RAW";

/// Caller-written SQL, sent to the session as-is.
///
/// Placeholders must already be in the session's native style (`$1` for PostgreSQL).
pub struct RawQuery<'db, S> {
    db: &'db Db<S>,
    sql: String,
    args: Vec<Value>,
}

impl<'db, S: Session> RawQuery<'db, S> {
    pub fn new(db: &'db Db<S>, sql: impl Into<String>) -> Self {
        Self {
            db,
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Bind the next positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn build(&self) -> CompiledStatement {
        CompiledStatement::new(self.sql.clone(), self.args.clone())
    }

    fn into_statement(self) -> CompiledStatement {
        CompiledStatement::new(self.sql, self.args)
    }

    /// Run a statement that returns no rows.
    pub async fn exec(self, ctx: &Context) -> OrmResult<ExecResult> {
        let db = self.db;
        exec::execute(db, ctx, SHAPE, &self.into_statement()).await
    }

    /// Fetch one row as `T`; [`OrmError::NoRows`] when the query returns nothing.
    pub async fn get<T: Entity>(self, ctx: &Context) -> OrmResult<T> {
        let db = self.db;
        let meta = db.meta::<T>()?;
        let mut rows = exec::query(db, ctx, SHAPE, &self.into_statement(), &meta, Some(1)).await?;
        rows.pop().ok_or(OrmError::NoRows)
    }

    /// Fetch every row as `T`; an empty `Vec` when the query returns nothing.
    pub async fn get_multi<T: Entity>(self, ctx: &Context) -> OrmResult<Vec<T>> {
        let db = self.db;
        let meta = db.meta::<T>()?;
        exec::query(db, ctx, SHAPE, &self.into_statement(), &meta, None).await
    }
}
