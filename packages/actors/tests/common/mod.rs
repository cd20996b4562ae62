#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::{JobHandlers, JobWatcher};
use watch_core::{
    PollFuture, PollResult, PollStatus, Progress, StatusPoller, WatchError, WatchKey,
    WatchOptions, WatcherConfig,
};

pub const INTERVAL: Duration = Duration::from_millis(10);

/// Start a watcher with a short tick interval.
pub async fn start_watcher() -> Result<JobWatcher, WatchError> {
    let config = WatcherConfig::default().with_interval(INTERVAL);
    let (watcher, _handle) = JobWatcher::start(config).await?;
    Ok(watcher)
}

pub fn key(raw: &str) -> WatchKey {
    WatchKey::parse(raw).expect("valid key")
}

pub fn timeout_ms(ms: u64) -> WatchOptions {
    WatchOptions::default().with_timeout(Duration::from_millis(ms))
}

/// Poller that answers from a fixed script, repeating the last answer.
#[derive(Clone)]
pub struct ScriptedPoller {
    script: Arc<Vec<PollResult>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedPoller {
    pub fn new(script: Vec<PollResult>) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    pub fn pending() -> Self {
        Self::new(vec![Ok(PollStatus::NotReady)])
    }

    /// Delay every answer, keeping the check in flight for a while.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatusPoller for ScriptedPoller {
    fn poll(&self) -> PollFuture {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .script
            .get(n)
            .or(self.script.last())
            .cloned()
            .unwrap_or(Ok(PollStatus::NotReady));
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            answer
        })
    }
}

/// Handlers that record every callback as a line of text.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| !e.starts_with("progress"))
            .count()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl JobHandlers for Recorder {
    fn on_progress(&mut self, _key: &WatchKey, progress: &Progress) {
        self.push(format!("progress {}/{}", progress.step, progress.total));
    }

    fn on_completed(&mut self, _key: &WatchKey, result: &serde_json::Value) {
        self.push(format!("completed {}", result));
    }

    fn on_failed(&mut self, _key: &WatchKey, message: &str) {
        self.push(format!("failed {}", message));
    }

    fn on_timeout(&mut self, _key: &WatchKey, _elapsed: Duration) {
        self.push("timeout".to_string());
    }
}

/// Wait up to two seconds for `check` to hold.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(INTERVAL).await;
    }
    check()
}

/// Wait until the watcher has no active jobs and its timer is stopped.
pub async fn wait_idle(watcher: &JobWatcher) -> Result<bool, WatchError> {
    for _ in 0..200 {
        let stats = watcher.stats().await?;
        if stats.active == 0 && !stats.polling {
            return Ok(true);
        }
        tokio::time::sleep(INTERVAL).await;
    }
    Ok(false)
}
