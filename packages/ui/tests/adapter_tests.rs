#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::time::Duration;

use serde_json::json;
use ui::{
    CompletionNotifier, ExportProgress, ExportState, NavigationAction, ResultTemplate, ToastLevel,
    ToastQueue,
};
use watch_core::{PollError, PollStatus, Progress};

use common::{Script, eventually, start_watcher};

#[tokio::test]
async fn test_completion_raises_persistent_toast_with_link() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let toasts = ToastQueue::new();
    let notifier = CompletionNotifier::new(watcher.clone(), toasts.clone());

    let key = notifier.watch(
        ResultTemplate::Summary,
        "42",
        Script::new(vec![Ok(PollStatus::NotReady), Ok(PollStatus::Completed(json!({"text": "ok"})))]),
    )?;
    assert_eq!(key.as_str(), "summary:42");
    // A second request for the same summary does not add a second toast.
    notifier.watch(
        ResultTemplate::Summary,
        "42",
        Script::new(vec![Ok(PollStatus::Completed(json!({})))]),
    )?;

    assert!(eventually(|| !toasts.is_empty()).await);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let shown = toasts.drain();
    assert_eq!(shown.len(), 1);
    let toast = &shown[0];
    assert_eq!(toast.level, ToastLevel::Success);
    assert_eq!(toast.title, "Summary ready");
    assert!(toast.persistent);
    assert_eq!(
        toast.action,
        Some(NavigationAction {
            label: "View summary".into(),
            route: "/surveys/42/summary".into(),
        })
    );
    assert!(!watcher.is_watching(&key).await);
    Ok(())
}

#[tokio::test]
async fn test_completion_timeout_and_failure_are_silent() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let toasts = ToastQueue::new();
    let notifier =
        CompletionNotifier::new(watcher.clone(), toasts.clone()).with_timeout(Duration::from_millis(30));

    let slow = notifier.watch(
        ResultTemplate::Clustering,
        "1",
        Script::new(vec![Ok(PollStatus::NotReady)]),
    )?;
    let broken = notifier.watch(
        ResultTemplate::WaveComparison,
        "1",
        Script::new(vec![Err(PollError::Job("Only one wave".into()))]),
    )?;

    assert!(watcher_drained(&watcher, &[&slow, &broken]).await?);
    assert!(toasts.is_empty());
    Ok(())
}

async fn watcher_drained(
    watcher: &actors::JobWatcher,
    keys: &[&watch_core::WatchKey],
) -> Result<bool, Box<dyn Error>> {
    for _ in 0..200 {
        let mut any = false;
        for key in keys {
            any |= watcher.is_watching(key).await;
        }
        if !any {
            return Ok(true);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(false)
}

#[tokio::test]
async fn test_cancel_stops_completion_toast() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let toasts = ToastQueue::new();
    let notifier = CompletionNotifier::new(watcher.clone(), toasts.clone());

    let key = notifier.watch(
        ResultTemplate::Summary,
        "9",
        Script::new(vec![
            Ok(PollStatus::NotReady),
            Ok(PollStatus::NotReady),
            Ok(PollStatus::Completed(json!(1))),
        ]),
    )?;
    notifier.cancel(ResultTemplate::Summary, "9")?;

    assert!(!watcher.is_watching(&key).await);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(toasts.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_export_progress_readout() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let toasts = ToastQueue::new();
    let exports = ExportProgress::new(watcher, toasts.clone());

    let mut tracker = exports.track(
        "77",
        Script::new(vec![
            Ok(PollStatus::Progress(Progress::new(1, 3, "Collecting responses"))),
            Ok(PollStatus::Progress(Progress::new(2, 3, "Rendering charts"))),
            Ok(PollStatus::Completed(json!({"url": "/exports/77.pdf"}))),
        ]),
    )?;
    assert_eq!(tracker.key().as_str(), "export:77");

    let mut bar = tracker.subscribe();
    let mut seen = Vec::new();
    while bar.changed().await.is_ok() {
        let state = bar.borrow_and_update().clone();
        let finished = state.is_finished();
        seen.push(state);
        if finished {
            break;
        }
    }

    // A slow reader may skip intermediate states, never reorder them.
    assert_eq!(
        seen.last(),
        Some(&ExportState::Completed(json!({"url": "/exports/77.pdf"})))
    );
    let steps: Vec<u32> = seen
        .iter()
        .filter_map(|state| match state {
            ExportState::Running(progress) => Some(progress.step),
            _ => None,
        })
        .collect();
    assert!(steps.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(steps.iter().all(|step| (1..=2).contains(step)));
    assert_eq!(
        tracker.finished().await,
        ExportState::Completed(json!({"url": "/exports/77.pdf"}))
    );
    assert!(toasts.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_export_failure_surfaces_message_verbatim() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let toasts = ToastQueue::new();
    let exports = ExportProgress::new(watcher, toasts.clone());

    let mut tracker = exports.track(
        "78",
        Script::new(vec![Err(PollError::Job("Survey has no responses yet".into()))]),
    )?;

    assert_eq!(
        tracker.finished().await,
        ExportState::Failed("Survey has no responses yet".into())
    );
    let shown = toasts.drain();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].level, ToastLevel::Error);
    assert_eq!(shown[0].message, "Survey has no responses yet");
    assert!(!shown[0].persistent);
    Ok(())
}

#[tokio::test]
async fn test_export_timeout_says_it_took_too_long() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let toasts = ToastQueue::new();
    let exports =
        ExportProgress::new(watcher, toasts.clone()).with_timeout(Duration::from_millis(40));

    let mut tracker = exports.track("79", Script::new(vec![Ok(PollStatus::NotReady)]))?;

    assert_eq!(tracker.finished().await, ExportState::TimedOut);
    let shown = toasts.drain();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].level, ToastLevel::Error);
    assert!(shown[0].message.contains("took too long"));
    Ok(())
}

#[tokio::test]
async fn test_cancelled_export_keeps_last_state() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let exports = ExportProgress::new(watcher.clone(), ToastQueue::new());

    let mut tracker = exports.track(
        "80",
        Script::new(vec![Ok(PollStatus::Progress(Progress::new(1, 10, "")))]),
    )?;
    let mut bar = tracker.subscribe();
    bar.changed().await?;
    exports.cancel(&tracker);

    assert_eq!(
        tracker.finished().await,
        ExportState::Running(Progress::new(1, 10, ""))
    );
    assert!(!watcher.is_watching(tracker.key()).await);
    Ok(())
}

#[tokio::test]
async fn test_dropped_tracker_releases_its_subscriber() -> Result<(), Box<dyn Error>> {
    let watcher = start_watcher().await?;
    let exports = ExportProgress::new(watcher.clone(), ToastQueue::new());

    let tracker = exports.track("81", Script::new(vec![Ok(PollStatus::NotReady)]))?;
    let copy = tracker.clone();
    let key = tracker.key().clone();
    drop(tracker);
    assert_eq!(watcher.stats().await?.subscribers, 1);

    drop(copy);
    assert_eq!(watcher.stats().await?.subscribers, 0);
    assert!(watcher.is_watching(&key).await);
    watcher.unregister(&key);
    Ok(())
}
