use super::CompiledStatement;
use super::render::Renderer;
use crate::context::Context;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::exec;
use crate::meta::Entity;
use crate::session::{ExecResult, Session};
use crate::value::Value;
use std::borrow::Borrow;
use std::marker::PhantomData;

/// Multi-row INSERT builder for entity type `T`.
///
/// Every value is bound as a parameter; the column list comes from `T`'s metadata (or the
/// [`Inserter::columns`] restriction) and is the same for every row.
pub struct Inserter<'db, T, S> {
    db: &'db Db<S>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    _target: PhantomData<fn() -> T>,
}

impl<'db, T: Entity, S: Session> Inserter<'db, T, S> {
    pub fn new(db: &'db Db<S>) -> Self {
        Self {
            db,
            columns: Vec::new(),
            rows: Vec::new(),
            _target: PhantomData,
        }
    }

    /// Add rows. Field values are captured immediately.
    pub fn values<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        self.rows
            .extend(rows.into_iter().map(|row| row.borrow().values()));
        self
    }

    /// Insert only these columns (field or column names); the rest take their database
    /// defaults.
    pub fn columns<C: Into<String>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Number of rows queued so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compile without executing.
    pub fn build(&self) -> OrmResult<CompiledStatement> {
        if self.rows.is_empty() {
            return Err(OrmError::validation("insert requires at least one row of values"));
        }

        let meta = self.db.meta::<T>()?;
        let mut r = Renderer::new(self.db.dialect(), &meta);
        let columns = if self.columns.is_empty() {
            meta.columns.iter().collect::<Vec<_>>()
        } else {
            self.columns
                .iter()
                .map(|name| r.resolve(name))
                .collect::<OrmResult<Vec<_>>>()?
        };

        r.push("INSERT INTO ");
        r.push_ident(&meta.table_name);
        r.push(" (");
        r.push_column_list(columns.iter().copied());
        r.push(") VALUES ");

        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != meta.columns.len() {
                return Err(OrmError::mapping(format!(
                    "{} produced {} values for {} fields",
                    T::entity_name(),
                    row.len(),
                    meta.columns.len()
                )));
            }
            r.push(if i == 0 { "(" } else { ", (" });
            for (j, column) in columns.iter().enumerate() {
                if j > 0 {
                    r.push(", ");
                }
                r.push_param(row[column.field_index].clone());
            }
            r.push(")");
        }

        Ok(r.finish())
    }

    /// Execute the INSERT.
    pub async fn exec(self, ctx: &Context) -> OrmResult<ExecResult> {
        let stmt = self.build()?;
        let meta = self.db.meta::<T>()?;
        let shape = format!("INSERT {}", meta.table_name);
        exec::execute(self.db, ctx, &shape, &stmt).await
    }
}
