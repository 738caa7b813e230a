//! Cancellation and deadlines for a single database call.
//!
//! Every execution method takes a [`Context`]. When its [`CancelToken`] fires or its deadline
//! passes, the in-flight session future is dropped and the call returns
//! [`OrmError::Canceled`] or [`OrmError::DeadlineExceeded`].

use crate::error::{OrmError, OrmResult};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A handle for cancelling one or more in-flight calls.
///
/// Clones share state: cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent `cancel` is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Deadline and cancellation carried by a database call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now (keeps an earlier existing deadline).
    ///
    /// A timeout too large to represent as an instant leaves the deadline unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Expire at `deadline` (keeps an earlier existing deadline).
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error this context would abort with right now, if any.
    pub fn err(&self) -> Option<OrmError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(OrmError::Canceled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(OrmError::DeadlineExceeded);
        }
        None
    }

    /// Run `fut` unless the context is done first.
    ///
    /// `fut` is dropped (releasing whatever it holds) as soon as the context fires.
    pub async fn run<T, F>(&self, fut: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(OrmError::Canceled),
            _ = expired => Err(OrmError::DeadlineExceeded),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        let out = ctx.run(async { Ok::<_, OrmError>(5) }).await.unwrap();
        assert_eq!(out, 5);
    }

    #[tokio::test]
    async fn already_cancelled_never_polls_the_future() {
        let token = CancelToken::new();
        token.cancel();
        let ctx = Context::background().with_cancel(token);
        let polled = AtomicBool::new(false);
        let err = ctx
            .run(async {
                polled.store(true, Ordering::SeqCst);
                Ok::<_, OrmError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Canceled));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_during_flight() {
        let token = CancelToken::new();
        let ctx = Context::background().with_cancel(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = ctx
            .run(async {
                std::future::pending::<()>().await;
                Ok::<_, OrmError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Canceled));
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_secs(1));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, OrmError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn unbounded_timeout_keeps_the_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.run(async { Ok::<_, OrmError>(1) }).await.unwrap(), 1);

        let bounded = Context::background()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::MAX);
        assert!(bounded.deadline().is_some());
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }
}
