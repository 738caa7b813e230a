//! Dispatch of compiled statements and mapping of rows into entities.

use crate::builder::CompiledStatement;
use crate::context::Context;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::meta::{Entity, TableMeta};
use crate::session::{ExecResult, RowStream, Session};
use std::time::Instant;

/// Run a row-returning statement and scan up to `limit` rows into `T`.
pub(crate) async fn query<T, S>(
    db: &Db<S>,
    ctx: &Context,
    shape: &str,
    stmt: &CompiledStatement,
    meta: &TableMeta,
    limit: Option<usize>,
) -> OrmResult<Vec<T>>
where
    T: Entity,
    S: Session,
{
    log::dispatch(db, shape, stmt);
    let started = Instant::now();
    let result = ctx
        .run(async {
            let mut rows = db
                .session()
                .execute_query(&stmt.sql, &stmt.args)
                .await
                .map_err(|e| OrmError::execution(shape, e))?;
            let scanned = scan::<T, _>(&mut rows, meta, shape, limit).await;
            let closed = rows
                .close()
                .await
                .map_err(|e| OrmError::execution(shape, e));
            let entities = scanned?;
            closed?;
            Ok(entities)
        })
        .await;
    log::outcome(db, shape, started, result.as_ref().map(|_| ()));
    result
}

/// Run a statement that returns no rows.
pub(crate) async fn execute<S: Session>(
    db: &Db<S>,
    ctx: &Context,
    shape: &str,
    stmt: &CompiledStatement,
) -> OrmResult<ExecResult> {
    log::dispatch(db, shape, stmt);
    let started = Instant::now();
    let result = ctx
        .run(async {
            db.session()
                .execute_statement(&stmt.sql, &stmt.args)
                .await
                .map_err(|e| OrmError::execution(shape, e))
        })
        .await;
    log::outcome(db, shape, started, result.as_ref().map(|_| ()));
    result
}

/// Position of each result column in `T::fields()`, computed once per result set.
///
/// Two result columns landing on the same field are rejected rather than overwriting each other.
fn scan_plan(meta: &TableMeta, columns: &[String]) -> OrmResult<Vec<usize>> {
    let mut plan = Vec::with_capacity(columns.len());
    for name in columns {
        let index = meta
            .column_by_name(name)
            .or_else(|| meta.column_by_field(name))
            .map(|c| c.field_index)
            .ok_or_else(|| {
                OrmError::scan(
                    name.as_str(),
                    format!("no field of '{}' maps to this column", meta.table_name),
                )
            })?;
        if plan.contains(&index) {
            return Err(OrmError::scan(
                name.as_str(),
                "column appears more than once in the result set",
            ));
        }
        plan.push(index);
    }
    Ok(plan)
}

async fn scan<T, R>(
    rows: &mut R,
    meta: &TableMeta,
    shape: &str,
    limit: Option<usize>,
) -> OrmResult<Vec<T>>
where
    T: Entity,
    R: RowStream,
{
    let columns = rows.columns().to_vec();
    let plan = scan_plan(meta, &columns)?;

    let mut out = Vec::new();
    while limit.is_none_or(|limit| out.len() < limit) {
        let Some(values) = rows
            .next_row()
            .await
            .map_err(|e| OrmError::from_row_error(shape, e))?
        else {
            break;
        };
        if values.len() != plan.len() {
            return Err(OrmError::scan(
                "*",
                format!("row has {} values but {} columns", values.len(), plan.len()),
            ));
        }

        let mut entity = T::default();
        for ((value, &index), name) in values.into_iter().zip(&plan).zip(&columns) {
            entity
                .set_value(index, value)
                .map_err(|e| OrmError::scan(name.as_str(), e.to_string()))?;
        }
        out.push(entity);
    }
    Ok(out)
}

#[cfg(feature = "tracing")]
mod log {
    use super::*;
    use std::borrow::Cow;

    pub(super) fn dispatch<S>(db: &Db<S>, shape: &str, stmt: &CompiledStatement) {
        let config = db.config();
        if !config.log_sql {
            return;
        }
        tracing::debug!(
            target: "eorm.sql",
            statement = shape,
            dialect = config.dialect.name(),
            param_count = stmt.args.len(),
            sql = %truncate_sql(&stmt.sql, config.max_sql_length),
            "dispatch",
        );
    }

    pub(super) fn outcome<S>(db: &Db<S>, shape: &str, started: Instant, result: Result<(), &OrmError>) {
        let elapsed = started.elapsed();
        match result {
            Err(err) if err.is_canceled() => tracing::debug!(
                target: "eorm.sql",
                statement = shape,
                elapsed_us = elapsed.as_micros() as u64,
                error = %err,
                "statement abandoned",
            ),
            Err(err) => tracing::warn!(
                target: "eorm.sql",
                statement = shape,
                elapsed_us = elapsed.as_micros() as u64,
                error = %err,
                "statement failed",
            ),
            Ok(()) => {
                if db
                    .config()
                    .slow_query_threshold
                    .is_some_and(|threshold| elapsed > threshold)
                {
                    tracing::warn!(
                        target: "eorm.sql",
                        statement = shape,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "slow statement",
                    );
                }
            }
        }
    }

    pub(super) fn truncate_sql(sql: &str, max: Option<usize>) -> Cow<'_, str> {
        match max {
            Some(max) => match sql.char_indices().nth(max) {
                Some((cut, _)) => Cow::Owned(format!("{}...", &sql[..cut])),
                None => Cow::Borrowed(sql),
            },
            None => Cow::Borrowed(sql),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::truncate_sql;

        #[test]
        fn truncates_on_char_boundaries() {
            assert_eq!(truncate_sql("SELECT 1", Some(20)), "SELECT 1");
            assert_eq!(truncate_sql("SELECT 1", Some(6)), "SELECT...");
            assert_eq!(truncate_sql("héllo", Some(2)), "hé...");
            assert_eq!(truncate_sql("SELECT 1", None), "SELECT 1");
        }
    }
}

#[cfg(not(feature = "tracing"))]
mod log {
    use super::*;

    pub(super) fn dispatch<S>(_db: &Db<S>, _shape: &str, _stmt: &CompiledStatement) {}

    pub(super) fn outcome<S>(_db: &Db<S>, _shape: &str, _started: Instant, _result: Result<(), &OrmError>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::FieldDef;
    use crate::session::BufferedRows;
    use crate::value::{FromValue, Value, ValueError};

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        id: i64,
        label: Option<String>,
    }

    impl Entity for Pair {
        fn entity_name() -> &'static str {
            "Pair"
        }

        fn fields() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("label").nullable()];
            FIELDS
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), self.label.clone().into()]
        }

        fn set_value(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
            match index {
                0 => self.id = FromValue::from_value(value)?,
                1 => self.label = FromValue::from_value(value)?,
                _ => {}
            }
            Ok(())
        }
    }

    fn meta() -> TableMeta {
        TableMeta::of::<Pair>(Default::default()).unwrap()
    }

    #[tokio::test]
    async fn scans_in_result_column_order() {
        let mut rows = BufferedRows::new(["label", "id"])
            .row([Value::Null, Value::Int(1)])
            .row([Value::from("b"), Value::Int(2)]);
        let out: Vec<Pair> = scan(&mut rows, &meta(), "SELECT pair", None).await.unwrap();
        assert_eq!(
            out,
            vec![
                Pair { id: 1, label: None },
                Pair { id: 2, label: Some("b".into()) },
            ]
        );
    }

    #[tokio::test]
    async fn limit_stops_early() {
        let mut rows = BufferedRows::new(["id"])
            .row([Value::Int(1)])
            .row([Value::Int(2)]);
        let out: Vec<Pair> = scan(&mut rows, &meta(), "SELECT pair", Some(1)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(rows.remaining(), 1);
    }

    #[tokio::test]
    async fn unknown_column_is_a_scan_error() {
        let mut rows = BufferedRows::new(["id", "extra"]).row([Value::Int(1), Value::Int(2)]);
        let err = scan::<Pair, _>(&mut rows, &meta(), "SELECT pair", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Scan { ref column, .. } if column == "extra"));
    }

    #[tokio::test]
    async fn type_mismatch_and_short_rows_are_scan_errors() {
        let mut rows = BufferedRows::new(["id"]).row([Value::from("nope")]);
        let err = scan::<Pair, _>(&mut rows, &meta(), "SELECT pair", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Scan { ref column, .. } if column == "id"));

        let mut rows = BufferedRows::new(["id", "label"]).row([Value::Int(1)]);
        let err = scan::<Pair, _>(&mut rows, &meta(), "SELECT pair", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Scan { .. }));
    }

    #[tokio::test]
    async fn duplicate_result_columns_are_a_scan_error() {
        let mut rows = BufferedRows::new(["id", "id"]).row([Value::Int(1), Value::Int(2)]);
        let err = scan::<Pair, _>(&mut rows, &meta(), "RAW", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Scan { ref column, .. } if column == "id"));
        assert_eq!(rows.remaining(), 1);
    }

    struct Undecodable;

    impl RowStream for Undecodable {
        fn columns(&self) -> &[String] {
            const COLUMNS: &[String] = &[];
            COLUMNS
        }

        async fn next_row(&mut self) -> Result<Option<Vec<Value>>, crate::error::BoxError> {
            Err(crate::error::DecodeError::new("label", "unsupported type numeric").into())
        }
    }

    #[tokio::test]
    async fn undecodable_values_are_scan_errors() {
        let err = scan::<Pair, _>(&mut Undecodable, &meta(), "SELECT pair", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Scan { ref column, .. } if column == "label"));
        assert!(err.to_string().contains("numeric"));
    }

    #[tokio::test]
    async fn null_into_required_field_is_a_scan_error() {
        let mut rows = BufferedRows::new(["id"]).row([Value::Null]);
        let err = scan::<Pair, _>(&mut rows, &meta(), "SELECT pair", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("null"));
    }
}
