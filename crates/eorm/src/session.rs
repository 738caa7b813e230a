//! The narrow interface the engine uses to reach a database.
//!
//! A [`Session`] executes SQL text with positional [`Value`] parameters and either returns a
//! [`RowStream`] or an [`ExecResult`]. Drivers plug in by implementing these two traits; the
//! PostgreSQL implementation lives in [`crate::client`].

use crate::error::BoxError;
use crate::value::Value;
use std::collections::VecDeque;
use std::future::Future;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Id generated by the statement, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

/// A lazy, finite, non-restartable sequence of result rows.
///
/// Callers must call [`RowStream::close`] when done; implementations must also release their
/// resources on `Drop` so early returns and cancelled futures never leak a connection.
pub trait RowStream: Send {
    /// Result-set column names, in row order.
    fn columns(&self) -> &[String];

    /// The next row, or `None` once the set is exhausted.
    fn next_row(&mut self) -> impl Future<Output = Result<Option<Vec<Value>>, BoxError>> + Send;

    /// Release the underlying handle. Further calls to `next_row` yield `None`.
    fn close(&mut self) -> impl Future<Output = Result<(), BoxError>> + Send {
        async { Ok(()) }
    }
}

/// A database session (a connection, a pool, or a test double).
///
/// Sessions may be shared across tasks; the engine never holds one across unrelated calls.
pub trait Session: Send + Sync {
    type Rows: RowStream;

    /// Run a row-returning statement.
    fn execute_query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Self::Rows, BoxError>> + Send;

    /// Run a statement and report the affected-row count.
    fn execute_statement(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult, BoxError>> + Send;
}

impl<S: Session> Session for &S {
    type Rows = S::Rows;

    fn execute_query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Self::Rows, BoxError>> + Send {
        (**self).execute_query(sql, args)
    }

    fn execute_statement(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult, BoxError>> + Send {
        (**self).execute_statement(sql, args)
    }
}

impl<S: Session> Session for std::sync::Arc<S> {
    type Rows = S::Rows;

    fn execute_query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Self::Rows, BoxError>> + Send {
        (**self).execute_query(sql, args)
    }

    fn execute_statement(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult, BoxError>> + Send {
        (**self).execute_statement(sql, args)
    }
}

/// An in-memory [`RowStream`], for sessions that materialize their results up front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferedRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    closed: bool,
}

impl BufferedRows {
    pub fn new<C: Into<String>>(columns: impl IntoIterator<Item = C>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: VecDeque::new(),
            closed: false,
        }
    }

    /// Append a row.
    pub fn row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.rows.push_back(values.into_iter().collect());
        self
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowStream for BufferedRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxError> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.pop_front())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}
