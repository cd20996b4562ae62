//! Mapping from HTTP status responses to poll outcomes.

use serde_json::{Map, Value};
use watch_core::{PollError, PollResult, PollStatus, Progress};

use crate::config::NotFoundPolicy;

/// Longest error body kept in [`PollError::Http`].
const MAX_ERROR_BODY: usize = 512;

/// Classify one status response.
///
/// Status codes decide first: 404 follows `not_found`, 202 and 204 mean the
/// result is not there yet, and any other non-2xx fails the job. A 2xx body is
/// then read as JSON. An `error` field or a failed `status` fails the job, a
/// `result` field or a finished `status` completes it, progress fields
/// (nested under `progress` or at the top level) or a running `status` keep it
/// pending, and any other document is the result itself.
pub fn classify(status: u16, body: &str, not_found: NotFoundPolicy) -> PollResult {
    match status {
        404 => match not_found {
            NotFoundPolicy::Pending => Err(PollError::NotYetAvailable),
            NotFoundPolicy::Absent => Err(PollError::NotFound),
        },
        202 | 204 => Err(PollError::NotYetAvailable),
        200..=299 => classify_body(body),
        _ => Err(PollError::Http {
            status,
            body: truncate(body.trim(), MAX_ERROR_BODY),
        }),
    }
}

fn classify_body(body: &str) -> PollResult {
    if body.trim().is_empty() {
        return Err(PollError::NotYetAvailable);
    }

    let doc: Value =
        serde_json::from_str(body).map_err(|e| PollError::Malformed(e.to_string()))?;
    let Some(fields) = doc.as_object() else {
        return Ok(PollStatus::Completed(doc));
    };

    let state = fields
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase);
    let state = state.as_deref();

    if let Some(error) = present(fields, "error") {
        return Err(PollError::Job(error_message(error)));
    }
    if matches!(state, Some("failed" | "error")) {
        let message = present(fields, "message")
            .map(error_message)
            .unwrap_or_else(|| "job failed".to_string());
        return Err(PollError::Job(message));
    }

    if let Some(result) = present(fields, "result") {
        return Ok(PollStatus::Completed(result.clone()));
    }
    if matches!(state, Some("completed" | "done" | "success")) {
        return Ok(PollStatus::Completed(doc));
    }

    if let Some(progress) = present(fields, "progress") {
        return parse_progress(progress).map(PollStatus::Progress);
    }
    if has_progress_fields(fields) {
        return parse_progress(&doc).map(PollStatus::Progress);
    }
    if matches!(state, Some("pending" | "processing" | "running" | "queued")) {
        return Ok(PollStatus::NotReady);
    }

    Ok(PollStatus::Completed(doc))
}

/// A field that is present and not null.
fn present<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|v| !v.is_null())
}

/// Numeric `step` (or `current`) together with a numeric `total`.
fn has_progress_fields(fields: &Map<String, Value>) -> bool {
    let numeric = |name: &str| fields.get(name).is_some_and(Value::is_u64);
    (numeric("step") || numeric("current")) && numeric("total")
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Accepts `{"step", "total", "label"?}` or `{"current", "total", "message"?}`.
fn parse_progress(progress: &Value) -> Result<Progress, PollError> {
    let number = |name: &str| {
        progress
            .get(name)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };
    let text = |name: &str| progress.get(name).and_then(Value::as_str);

    let step = number("step").or_else(|| number("current"));
    let total = number("total");
    match (step, total) {
        (Some(step), Some(total)) => {
            let label = text("label").or_else(|| text("message")).unwrap_or_default();
            Ok(Progress::new(step, total, label))
        }
        _ => Err(PollError::Malformed(format!(
            "progress needs numeric step and total: {}",
            progress
        ))),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
