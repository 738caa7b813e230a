use super::CompiledStatement;
use super::render::Renderer;
use crate::context::Context;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::exec;
use crate::expr::Predicate;
use crate::meta::{Entity, MetaRegistry, TableMeta};
use crate::session::Session;
use std::marker::PhantomData;
use std::sync::Arc;

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    column: String,
    descending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

#[derive(Clone)]
enum TableSource {
    Target,
    Named(String),
    Entity(fn(&MetaRegistry) -> OrmResult<Arc<TableMeta>>),
}

fn entity_meta<U: Entity>(registry: &MetaRegistry) -> OrmResult<Arc<TableMeta>> {
    registry.get::<U>()
}

/// SELECT builder for entity type `T`.
///
/// Column references in predicates, projections and ORDER BY resolve against `T`'s metadata;
/// `from` / `from_entity` only change the table name.
pub struct Selector<'db, T, S> {
    db: &'db Db<S>,
    source: TableSource,
    columns: Vec<String>,
    predicates: Vec<Predicate>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    _target: PhantomData<fn() -> T>,
}

impl<'db, T: Entity, S: Session> Selector<'db, T, S> {
    pub fn new(db: &'db Db<S>) -> Self {
        Self {
            db,
            source: TableSource::Target,
            columns: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            _target: PhantomData,
        }
    }

    /// Read from an explicitly named table.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.source = TableSource::Named(table.into());
        self
    }

    /// Read from the table mapped by entity `U`.
    pub fn from_entity<U: Entity>(mut self) -> Self {
        self.source = TableSource::Entity(entity_meta::<U>);
        self
    }

    /// Add predicates. All predicates, across repeated calls, are AND-ed.
    pub fn where_(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    /// Restrict the projection (default: every mapped column). Unselected fields keep their
    /// default value.
    pub fn select<C: Into<String>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Compile without executing.
    pub fn build(&self) -> OrmResult<CompiledStatement> {
        let meta = self.db.meta::<T>()?;
        let table = self.table_name(&meta)?;
        self.compile(&meta, &table, self.limit)
    }

    /// Fetch exactly one row.
    ///
    /// Returns [`OrmError::NoRows`] when nothing matches.
    pub async fn get(self, ctx: &Context) -> OrmResult<T> {
        let meta = self.db.meta::<T>()?;
        let table = self.table_name(&meta)?;
        let stmt = self.compile(&meta, &table, Some(1))?;
        let shape = format!("SELECT {table}");
        let mut rows = exec::query(self.db, ctx, &shape, &stmt, &meta, Some(1)).await?;
        rows.pop().ok_or(OrmError::NoRows)
    }

    /// Fetch every matching row; an empty `Vec` when nothing matches.
    pub async fn get_multi(self, ctx: &Context) -> OrmResult<Vec<T>> {
        let meta = self.db.meta::<T>()?;
        let table = self.table_name(&meta)?;
        let stmt = self.compile(&meta, &table, self.limit)?;
        let shape = format!("SELECT {table}");
        exec::query(self.db, ctx, &shape, &stmt, &meta, None).await
    }

    fn table_name(&self, meta: &TableMeta) -> OrmResult<String> {
        match &self.source {
            TableSource::Target => Ok(meta.table_name.clone()),
            TableSource::Named(name) if name.trim().is_empty() => {
                Err(OrmError::compile("table name cannot be empty"))
            }
            TableSource::Named(name) => Ok(name.clone()),
            TableSource::Entity(lookup) => Ok(lookup(self.db.registry())?.table_name.clone()),
        }
    }

    fn compile(&self, meta: &TableMeta, table: &str, limit: Option<u64>) -> OrmResult<CompiledStatement> {
        let mut r = Renderer::new(self.db.dialect(), meta);

        r.push("SELECT ");
        if self.columns.is_empty() {
            r.push_column_list(&meta.columns);
        } else {
            let projected = self
                .columns
                .iter()
                .map(|name| r.resolve(name))
                .collect::<OrmResult<Vec<_>>>()?;
            r.push_column_list(projected);
        }
        r.push(" FROM ");
        r.push_ident(table);

        if let Some(filter) = Predicate::all(self.predicates.iter().cloned()) {
            r.push(" WHERE ");
            r.push_expr(filter.expr())?;
        }

        for (i, order) in self.order_by.iter().enumerate() {
            r.push(if i == 0 { " ORDER BY " } else { ", " });
            r.push_column(&order.column)?;
            r.push(if order.descending { " DESC" } else { " ASC" });
        }

        if let Some(limit) = limit {
            r.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            r.push(&format!(" OFFSET {offset}"));
        }

        Ok(r.finish())
    }
}
