use crate::builder::{Inserter, RawQuery, Selector};
use crate::config::DbConfig;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::meta::{Entity, MetaRegistry, TableMeta};
use crate::session::Session;
use std::sync::Arc;

/// A session plus the configuration and metadata cache statements are built with.
///
/// `Db` is cheap to share by reference; builders borrow it and only the final execution call
/// reaches the session.
///
/// # Example
///
/// ```ignore
/// let db = eorm::Db::new(eorm::create_pool(&url)?);
/// let users = db.select::<User>().get_multi(&eorm::Context::background()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Db<S> {
    session: S,
    config: DbConfig,
    registry: Arc<MetaRegistry>,
}

impl<S: Session> Db<S> {
    pub fn new(session: S) -> Self {
        Self::with_config(session, DbConfig::default())
    }

    pub fn with_config(session: S, config: DbConfig) -> Self {
        let registry = Arc::new(MetaRegistry::new(config.naming));
        Self {
            session,
            config,
            registry,
        }
    }

    /// Share an existing metadata cache (its naming strategy takes precedence).
    pub fn with_registry(mut self, registry: Arc<MetaRegistry>) -> Self {
        self.config.naming = registry.naming();
        self.registry = registry;
        self
    }
}

impl<S> Db<S> {
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn registry(&self) -> &Arc<MetaRegistry> {
        &self.registry
    }
}

impl<S: Session> Db<S> {
    /// Table metadata of `T`.
    pub fn meta<T: Entity>(&self) -> OrmResult<Arc<TableMeta>> {
        self.registry.get::<T>()
    }

    /// Start a SELECT for `T`.
    pub fn select<T: Entity>(&self) -> Selector<'_, T, S> {
        Selector::new(self)
    }

    /// Start an INSERT of `T` values.
    pub fn insert<T: Entity>(&self) -> Inserter<'_, T, S> {
        Inserter::new(self)
    }

    /// Run caller-written SQL.
    pub fn raw_query(&self, sql: impl Into<String>) -> RawQuery<'_, S> {
        RawQuery::new(self, sql)
    }
}
