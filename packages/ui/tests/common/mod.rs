#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actors::JobWatcher;
use watch_core::{PollFuture, PollResult, PollStatus, StatusPoller, WatchError, WatcherConfig};

/// Start a watcher with a short tick interval.
pub async fn start_watcher() -> Result<JobWatcher, WatchError> {
    let config = WatcherConfig::default().with_interval(Duration::from_millis(10));
    let (watcher, _handle) = JobWatcher::start(config).await?;
    Ok(watcher)
}

/// Poller that walks through a script, repeating the last answer.
#[derive(Clone)]
pub struct Script {
    answers: Arc<Vec<PollResult>>,
    calls: Arc<AtomicUsize>,
}

impl Script {
    pub fn new(answers: Vec<PollResult>) -> Self {
        Self {
            answers: Arc::new(answers),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl StatusPoller for Script {
    fn poll(&self) -> PollFuture {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .get(n)
            .or(self.answers.last())
            .cloned()
            .unwrap_or(Ok(PollStatus::NotReady));
        Box::pin(async move { answer })
    }
}

/// Wait up to two seconds for `check` to hold.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
