//! Status checks and their outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::Progress;

/// Non-error answers a status check can give.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// The backend has nothing yet; try again next tick.
    NotReady,
    /// Still running, with step/total/label detail.
    Progress(Progress),
    /// Finished with a result payload.
    Completed(serde_json::Value),
}

/// Errors a status check can report.
///
/// Everything except [`PollError::NotYetAvailable`] ends the watch as failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("result not yet available")]
    NotYetAvailable,

    /// The backend reports the job itself failed. The message is shown verbatim.
    #[error("{0}")]
    Job(String),

    #[error("job not found")]
    NotFound,

    #[error("status check failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed status response: {0}")]
    Malformed(String),

    #[error("status check panicked: {0}")]
    Panicked(String),
}

impl PollError {
    /// Whether this error is the "still processing" signal rather than a failure.
    pub fn is_not_yet_available(&self) -> bool {
        matches!(self, PollError::NotYetAvailable)
    }
}

/// Result type for status checks.
pub type PollResult = Result<PollStatus, PollError>;

/// Future type for async status checks.
pub type PollFuture = Pin<Box<dyn Future<Output = PollResult> + Send>>;

/// An idempotent, zero-argument status check for one job.
///
/// Implementations usually close over an HTTP GET to a status endpoint.
pub trait StatusPoller: Send + Sync + 'static {
    /// Check the job's status once.
    fn poll(&self) -> PollFuture;
}

/// A simple function-based status poller.
pub struct FnPoller<F>
where
    F: Fn() -> PollFuture + Send + Sync + 'static,
{
    poll: F,
}

impl<F> FnPoller<F>
where
    F: Fn() -> PollFuture + Send + Sync + 'static,
{
    /// Create a new function-based poller.
    pub fn new(poll: F) -> Self {
        Self { poll }
    }
}

impl<F> StatusPoller for FnPoller<F>
where
    F: Fn() -> PollFuture + Send + Sync + 'static,
{
    fn poll(&self) -> PollFuture {
        (self.poll)()
    }
}

/// Helper macro for creating pollers from async blocks.
///
/// ```ignore
/// let poller = status_poller!(client, {
///     client.fetch_status().await
/// });
/// ```
#[macro_export]
macro_rules! status_poller {
    ($($capture:ident),* , $body:block) => {
        $crate::FnPoller::new(move || {
            $(let $capture = $capture.clone();)*
            Box::pin(async move $body)
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    #[test]
    fn only_not_yet_available_counts_as_pending() {
        assert!(PollError::NotYetAvailable.is_not_yet_available());
        assert!(!PollError::NotFound.is_not_yet_available());
        assert!(!PollError::Job("x".into()).is_not_yet_available());
    }

    #[test]
    fn job_errors_display_verbatim() {
        let err = PollError::Job("Not enough respondents in wave 2".into());
        assert_eq!(err.to_string(), "Not enough respondents in wave 2");
    }

    #[test]
    fn fn_poller_invokes_closure() {
        let poller = FnPoller::new(|| Box::pin(async { Ok(PollStatus::NotReady) }));
        assert_eq!(poller.poll().now_or_never(), Some(Ok(PollStatus::NotReady)));
    }

    #[test]
    fn macro_clones_captures_per_call() {
        let label = String::from("step");
        let poller = status_poller!(label, {
            Ok(PollStatus::Progress(Progress::new(1, 2, label)))
        });
        let first = poller.poll().now_or_never();
        let second = poller.poll().now_or_never();
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
