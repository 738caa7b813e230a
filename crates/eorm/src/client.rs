//! PostgreSQL sessions backed by `tokio-postgres` (and `deadpool-postgres` pools).

use crate::error::{BoxError, DecodeError};
use crate::session::{ExecResult, RowStream, Session};
use crate::value::Value;
use bytes::BytesMut;
use futures_core::Stream;
use std::error::Error;
use std::pin::Pin;
use tokio_postgres::Row;
use tokio_postgres::Statement;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::UInt(v) => int_to_sql(i64::try_from(*v)?, ty, out),
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Time(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    // Each variant checks the target type itself in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Integers are stored widened; narrow them to whatever the server expects.
fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::CHAR => i8::try_from(v)?.to_sql_checked(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql_checked(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql_checked(ty, out),
        Type::OID => u32::try_from(v)?.to_sql_checked(ty, out),
        Type::FLOAT4 => (v as f32).to_sql_checked(ty, out),
        Type::FLOAT8 => (v as f64).to_sql_checked(ty, out),
        Type::BOOL => (v != 0).to_sql_checked(ty, out),
        _ => v.to_sql_checked(ty, out),
    }
}

fn params(args: &[Value]) -> impl ExactSizeIterator<Item = &(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync))
}

fn column_names(stmt: &Statement) -> Vec<String> {
    stmt.columns().iter().map(|c| c.name().to_string()).collect()
}

fn decode_row(row: &Row) -> Result<Vec<Value>, BoxError> {
    (0..row.len())
        .map(|idx| {
            decode_column(row, idx)
                .map_err(|e| DecodeError::new(row.columns()[idx].name(), e.to_string()))
        })
        .collect::<Result<_, _>>()
        .map_err(Into::into)
}

fn decode_column(row: &Row, idx: usize) -> Result<Value, BoxError> {
    let value = match *row.columns()[idx].type_() {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::CHAR => row.try_get::<_, Option<i8>>(idx)?.map(Value::from),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(Value::from),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(Value::from),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        Type::OID => row.try_get::<_, Option<u32>>(idx)?.map(Value::from),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(Value::from),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
        }
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx)?.map(Value::Uuid),
        Type::DATE => row.try_get::<_, Option<chrono::NaiveDate>>(idx)?.map(Value::Date),
        Type::TIME => row.try_get::<_, Option<chrono::NaiveTime>>(idx)?.map(Value::Time),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map(Value::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(Value::TimestampTz),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(Value::Json),
        ref other => return Err(format!("unsupported type {other}").into()),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Rows streamed from PostgreSQL via `query_raw`.
///
/// When produced by a pool, the checked-out connection is held until the stream is closed or
/// dropped.
pub struct PgRows {
    columns: Vec<String>,
    stream: Option<Pin<Box<tokio_postgres::RowStream>>>,
    #[cfg(feature = "pool")]
    conn: Option<deadpool_postgres::Client>,
}

impl PgRows {
    fn new(columns: Vec<String>, stream: tokio_postgres::RowStream) -> Self {
        Self {
            columns,
            stream: Some(Box::pin(stream)),
            #[cfg(feature = "pool")]
            conn: None,
        }
    }

    #[cfg(feature = "pool")]
    fn hold(mut self, conn: deadpool_postgres::Client) -> Self {
        self.conn = Some(conn);
        self
    }

    fn release(&mut self) {
        self.stream = None;
        #[cfg(feature = "pool")]
        {
            self.conn = None;
        }
    }
}

impl std::fmt::Debug for PgRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgRows")
            .field("columns", &self.columns)
            .field("open", &self.stream.is_some())
            .finish()
    }
}

impl RowStream for PgRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match std::future::poll_fn(|cx| stream.as_mut().poll_next(cx)).await {
            Some(Ok(row)) => decode_row(&row).map(Some),
            Some(Err(e)) => {
                self.release();
                Err(e.into())
            }
            None => {
                self.release();
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.release();
        Ok(())
    }
}

impl Session for tokio_postgres::Client {
    type Rows = PgRows;

    async fn execute_query(&self, sql: &str, args: &[Value]) -> Result<PgRows, BoxError> {
        let stmt = self.prepare(sql).await?;
        let stream = self.query_raw(&stmt, params(args)).await?;
        Ok(PgRows::new(column_names(&stmt), stream))
    }

    async fn execute_statement(&self, sql: &str, args: &[Value]) -> Result<ExecResult, BoxError> {
        let affected = self.execute_raw(sql, params(args)).await?;
        Ok(ExecResult::new(affected))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Session for deadpool_postgres::Pool {
    type Rows = PgRows;

    async fn execute_query(&self, sql: &str, args: &[Value]) -> Result<PgRows, BoxError> {
        let conn = self.get().await?;
        let stmt = conn.prepare_cached(sql).await?;
        let stream = conn.query_raw(&stmt, params(args)).await?;
        Ok(PgRows::new(column_names(&stmt), stream).hold(conn))
    }

    async fn execute_statement(&self, sql: &str, args: &[Value]) -> Result<ExecResult, BoxError> {
        let conn = self.get().await?;
        let stmt = conn.prepare_cached(sql).await?;
        let affected = conn.execute_raw(&stmt, params(args)).await?;
        Ok(ExecResult::new(affected))
    }
}
