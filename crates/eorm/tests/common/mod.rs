//! Shared fixtures for the integration tests: a scripted session and the `SimpleStruct` entity.
#![allow(dead_code)]

use chrono::NaiveDate;
use eorm::{BoxError, BufferedRows, Entity, ExecResult, RowStream, Session, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct SimpleStruct {
    pub id: i64,
    pub bool: bool,
    pub bool_ptr: Option<bool>,
    pub int: i32,
    pub int_ptr: Option<i32>,
    pub int8: i8,
    pub int16: i16,
    pub int64: i64,
    pub uint8: u8,
    pub uint32: u32,
    pub float32: f32,
    pub float64: f64,
    pub byte_array: Vec<u8>,
    pub string: String,
    pub null_string_ptr: Option<String>,
    pub created_on: Option<NaiveDate>,
}

pub fn new_simple_struct(id: i64) -> SimpleStruct {
    SimpleStruct {
        id,
        bool: true,
        bool_ptr: Some(false),
        int: 12,
        int_ptr: Some(13),
        int8: 8,
        int16: -16,
        int64: 64,
        uint8: 8,
        uint32: 32,
        float32: 3.2,
        float64: 6.4,
        byte_array: vec![1, 2, 3],
        string: "world".to_string(),
        null_string_ptr: None,
        created_on: NaiveDate::from_ymd_opt(2024, 5, 17),
    }
}

/// Result rows shaped the way a database would return `rows`.
pub fn rows_of(rows: &[SimpleStruct]) -> BufferedRows {
    let columns = eorm::MetaRegistry::default()
        .get::<SimpleStruct>()
        .unwrap()
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    rows.iter()
        .fold(BufferedRows::new(columns), |acc, row| acc.row(row.values()))
}

#[derive(Debug, thiserror::Error)]
#[error("mock driver: {0}")]
pub struct MockError(pub String);

#[derive(Debug)]
pub enum Reply {
    Rows(BufferedRows),
    Exec(ExecResult),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Default)]
struct Inner {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
    delay: Mutex<Option<Duration>>,
    closed: AtomicUsize,
    dropped: AtomicUsize,
}

/// A session answering from a queue of scripted replies and recording every call.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    inner: Arc<Inner>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.inner.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn reply_rows(self, rows: BufferedRows) -> Self {
        self.reply(Reply::Rows(rows))
    }

    pub fn reply_exec(self, result: ExecResult) -> Self {
        self.reply(Reply::Exec(result))
    }

    pub fn reply_error(self, message: &str) -> Self {
        self.reply(Reply::Fail(message.to_string()))
    }

    /// Wait this long before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }

    /// Row streams closed explicitly.
    pub fn closed_count(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Row streams released, whether closed or dropped.
    pub fn released_count(&self) -> usize {
        self.inner.dropped.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str, args: &[Value]) -> Option<Reply> {
        self.inner.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        self.inner.replies.lock().unwrap().pop_front()
    }

    async fn pause(&self) {
        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub struct MockRows {
    rows: BufferedRows,
    inner: Arc<Inner>,
}

impl Drop for MockRows {
    fn drop(&mut self) {
        self.inner.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl RowStream for MockRows {
    fn columns(&self) -> &[String] {
        self.rows.columns()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxError> {
        self.rows.next_row().await
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
        self.rows.close().await
    }
}

impl Session for MockSession {
    type Rows = MockRows;

    async fn execute_query(&self, sql: &str, args: &[Value]) -> Result<MockRows, BoxError> {
        let reply = self.record(sql, args);
        self.pause().await;
        match reply {
            Some(Reply::Rows(rows)) => Ok(MockRows {
                rows,
                inner: Arc::clone(&self.inner),
            }),
            Some(Reply::Fail(message)) => Err(MockError(message).into()),
            other => Err(MockError(format!("no row reply scripted, got {other:?}")).into()),
        }
    }

    async fn execute_statement(&self, sql: &str, args: &[Value]) -> Result<ExecResult, BoxError> {
        let reply = self.record(sql, args);
        self.pause().await;
        match reply {
            Some(Reply::Exec(result)) => Ok(result),
            Some(Reply::Fail(message)) => Err(MockError(message).into()),
            other => Err(MockError(format!("no exec reply scripted, got {other:?}")).into()),
        }
    }
}
