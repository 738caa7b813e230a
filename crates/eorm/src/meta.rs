//! Table metadata: how an entity type maps onto a table.
//!
//! [`Entity`] is the static description of a type (usually generated by
//! `#[derive(Entity)]`); [`MetaRegistry`] turns it into a [`TableMeta`] once per type and caches
//! the result for every later lookup.

use crate::error::{OrmError, OrmResult};
use crate::value::{Value, ValueError};
use heck::{ToLowerCamelCase, ToSnakeCase};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Static description of one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub name: &'static str,
    /// Explicit column name, overriding the naming strategy.
    pub column: Option<&'static str>,
    /// Whether the field accepts NULL (`Option<T>`).
    pub nullable: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            nullable: false,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A Rust type that maps to a table.
///
/// This trait should typically be derived using `#[derive(Entity)]`.
///
/// # Example
///
/// ```ignore
/// use eorm::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// #[eorm(table = "users")]
/// struct User {
///     id: i64,
///     #[eorm(column = "user_name")]
///     name: String,
///     email: Option<String>,
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    /// The Rust type name (`User`).
    fn entity_name() -> &'static str;

    /// Explicit table name; `None` derives it from [`Entity::entity_name`].
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Field descriptions, in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Current field values, in the order of [`Entity::fields`].
    fn values(&self) -> Vec<Value>;

    /// Assign the field at `index` (position in [`Entity::fields`]).
    fn set_value(&mut self, index: usize, value: Value) -> Result<(), ValueError>;
}

/// Field-name to column-name transform applied when no explicit column is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingStrategy {
    /// `UserName` / `userName` -> `user_name`
    #[default]
    SnakeCase,
    /// `user_name` -> `userName`
    CamelCase,
    /// Names are used unchanged.
    Verbatim,
}

impl NamingStrategy {
    pub fn apply(self, name: &str) -> String {
        match self {
            NamingStrategy::SnakeCase => name.to_snake_case(),
            NamingStrategy::CamelCase => name.to_lower_camel_case(),
            NamingStrategy::Verbatim => name.to_string(),
        }
    }
}

/// Column metadata for one mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub field_name: String,
    pub column_name: String,
    /// Position of the field in [`Entity::fields`].
    pub field_index: usize,
    pub nullable: bool,
}

/// Table metadata for an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub table_name: String,
    pub columns: Vec<ColumnMeta>,
    naming: NamingStrategy,
    by_field: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
}

impl TableMeta {
    /// Describe `T` with the given naming strategy.
    pub fn of<T: Entity>(naming: NamingStrategy) -> OrmResult<Self> {
        let entity = T::entity_name();
        let table_name = match T::table_name() {
            Some(name) => name.to_string(),
            None => naming.apply(entity),
        };
        check_name(entity, "table", &table_name)?;

        let fields = T::fields();
        if fields.is_empty() {
            return Err(OrmError::mapping(format!("{entity} has no mapped fields")));
        }

        let mut columns = Vec::with_capacity(fields.len());
        let mut by_field = HashMap::with_capacity(fields.len());
        let mut by_column = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let column_name = match field.column {
                Some(col) => col.to_string(),
                None => naming.apply(field.name),
            };
            check_name(entity, "column", &column_name)?;

            if by_column.insert(column_name.clone(), index).is_some() {
                return Err(OrmError::mapping(format!(
                    "{entity}: column '{column_name}' is mapped by more than one field"
                )));
            }
            by_field.insert(field.name.to_string(), index);
            columns.push(ColumnMeta {
                field_name: field.name.to_string(),
                column_name,
                field_index: index,
                nullable: field.nullable,
            });
        }

        Ok(Self {
            table_name,
            columns,
            naming,
            by_field,
            by_column,
        })
    }

    /// Column mapped by the Rust field `name`.
    pub fn column_by_field(&self, name: &str) -> Option<&ColumnMeta> {
        self.by_field.get(name).map(|&i| &self.columns[i])
    }

    /// Column with the database name `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&ColumnMeta> {
        self.by_column.get(name).map(|&i| &self.columns[i])
    }

    /// Resolve a column reference: field name first, then column name, then the naming
    /// strategy applied to `name` (so `"FirstName"` finds `first_name`).
    pub fn resolve(&self, name: &str) -> Option<&ColumnMeta> {
        self.column_by_field(name)
            .or_else(|| self.column_by_name(name))
            .or_else(|| self.column_by_name(&self.naming.apply(name)))
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column_name.as_str()).collect()
    }
}

fn check_name(entity: &str, what: &str, name: &str) -> OrmResult<()> {
    if name.trim().is_empty() {
        return Err(OrmError::mapping(format!("{entity}: empty {what} name")));
    }
    if name.contains('\0') {
        return Err(OrmError::mapping(format!(
            "{entity}: {what} name cannot contain NUL character"
        )));
    }
    Ok(())
}

/// Lazily-populated cache of [`TableMeta`] keyed by entity type.
///
/// Entries are written once and never mutated, so lookups from concurrent callers only
/// contend on the first access of a type.
#[derive(Debug, Default)]
pub struct MetaRegistry {
    naming: NamingStrategy,
    tables: RwLock<HashMap<TypeId, Arc<TableMeta>>>,
}

impl MetaRegistry {
    pub fn new(naming: NamingStrategy) -> Self {
        Self {
            naming,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn naming(&self) -> NamingStrategy {
        self.naming
    }

    /// Get (or build and cache) the metadata of `T`.
    pub fn get<T: Entity>(&self) -> OrmResult<Arc<TableMeta>> {
        let key = TypeId::of::<T>();
        if let Some(meta) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(meta));
        }

        // Build outside the lock; if another caller won the race, keep its entry.
        let meta = Arc::new(TableMeta::of::<T>(self.naming)?);
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(tables.entry(key).or_insert(meta)))
    }

    /// Number of cached entity types.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct UserAccount {
        id: i64,
        user_name: String,
    }

    impl Entity for UserAccount {
        fn entity_name() -> &'static str {
            "UserAccount"
        }

        fn fields() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("userName")];
            FIELDS
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), self.user_name.clone().into()]
        }

        fn set_value(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
            use crate::value::FromValue;
            match index {
                0 => self.id = FromValue::from_value(value)?,
                1 => self.user_name = FromValue::from_value(value)?,
                _ => {}
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Empty;

    impl Entity for Empty {
        fn entity_name() -> &'static str {
            "Empty"
        }

        fn fields() -> &'static [FieldDef] {
            &[]
        }

        fn values(&self) -> Vec<Value> {
            Vec::new()
        }

        fn set_value(&mut self, _index: usize, _value: Value) -> Result<(), ValueError> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Clash;

    impl Entity for Clash {
        fn entity_name() -> &'static str {
            "Clash"
        }

        fn table_name() -> Option<&'static str> {
            Some("clashes")
        }

        fn fields() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[FieldDef::new("a").column("x"), FieldDef::new("x")];
            FIELDS
        }

        fn values(&self) -> Vec<Value> {
            vec![Value::Null, Value::Null]
        }

        fn set_value(&mut self, _index: usize, _value: Value) -> Result<(), ValueError> {
            Ok(())
        }
    }

    #[test]
    fn snake_case_is_the_default() {
        let meta = TableMeta::of::<UserAccount>(NamingStrategy::default()).unwrap();
        assert_eq!(meta.table_name, "user_account");
        assert_eq!(meta.column_names(), vec!["id", "user_name"]);
        assert_eq!(meta.resolve("userName").unwrap().column_name, "user_name");
        assert_eq!(meta.resolve("user_name").unwrap().field_index, 1);
        assert_eq!(meta.resolve("UserName").unwrap().column_name, "user_name");
        assert_eq!(meta.resolve("Id").unwrap().field_index, 0);
        assert!(meta.resolve("missing").is_none());
    }

    #[test]
    fn other_naming_strategies() {
        let camel = TableMeta::of::<UserAccount>(NamingStrategy::CamelCase).unwrap();
        assert_eq!(camel.table_name, "userAccount");
        let verbatim = TableMeta::of::<UserAccount>(NamingStrategy::Verbatim).unwrap();
        assert_eq!(verbatim.column_names(), vec!["id", "userName"]);
    }

    #[test]
    fn registry_is_idempotent() {
        let registry = MetaRegistry::default();
        let first = registry.get::<UserAccount>().unwrap();
        let second = registry.get::<UserAccount>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.column_names(), second.column_names());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_concurrent_lookups_share_one_entry() {
        let registry = Arc::new(MetaRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get::<UserAccount>().unwrap())
            })
            .collect();
        let metas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = registry.get::<UserAccount>().unwrap();
        assert!(metas.iter().all(|m| Arc::ptr_eq(m, &first)));
    }

    #[test]
    fn entity_without_fields_is_a_mapping_error() {
        let err = MetaRegistry::default().get::<Empty>().unwrap_err();
        assert!(matches!(err, OrmError::Mapping(_)));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = TableMeta::of::<Clash>(NamingStrategy::SnakeCase).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }
}
