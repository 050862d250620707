//! JSON-lines position input, replayed into a [`ChannelProvider`].
//!
//! Each non-empty line is one of:
//!
//! - a [`PositionEvent`]: `{"sample":{"lat":..,"lng":..,"timestamp_ms":..}}`
//!   or `{"error":"permission_denied"}`
//! - a bare sample: `{"lat":..,"lng":..,"timestamp_ms":..}`
//! - a platform error code: `{"code":1}`
//! - the word `restart`, which asks the watch to re-register after an error

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use wayfinder_core::LocationSample;
use wayfinder_locate::{PositionError, PositionEvent, ProviderHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum InputLine {
    Event(PositionEvent),
    Restart,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub(crate) fn parse_line(line: &str) -> Result<Option<InputLine>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.eq_ignore_ascii_case("restart") {
        return Ok(Some(InputLine::Restart));
    }

    let value: Value = serde_json::from_str(line).map_err(|e| format!("not JSON: {e}"))?;
    if let Some(code) = value.get("code").and_then(Value::as_u64) {
        let code = u16::try_from(code).map_err(|_| format!("error code {code} out of range"))?;
        return Ok(Some(InputLine::Event(PositionEvent::Error(
            PositionError::from_code(code),
        ))));
    }
    if let Ok(event) = serde_json::from_value::<PositionEvent>(value.clone()) {
        return Ok(Some(InputLine::Event(event)));
    }
    serde_json::from_value::<LocationSample>(value)
        .map(|sample| Some(InputLine::Event(PositionEvent::Sample(sample))))
        .map_err(|e| format!("unrecognised position line: {e}"))
}

/// Reads lines until EOF and pushes them to the provider.
///
/// Waits for the first watch registration before reading. Events arriving
/// while nothing is registered (after a position error) are dropped.
/// Returns the number of events delivered.
pub(crate) async fn feed<R>(
    reader: R,
    handle: ProviderHandle,
    restarts: Option<mpsc::UnboundedSender<()>>,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    while !handle.is_watching() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut lines = reader.lines();
    let mut delivered = 0usize;
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(InputLine::Restart)) => match &restarts {
                Some(tx) => {
                    let before = handle.registrations();
                    if tx.send(()).is_err() {
                        tracing::debug!(line_no, "restart requested after watch stopped");
                    } else {
                        wait_for_reregistration(&handle, before).await;
                    }
                }
                None => tracing::debug!(line_no, "restart ignored in one-shot mode"),
            },
            Ok(Some(InputLine::Event(event))) => {
                if handle.push(event).await {
                    delivered += 1;
                } else {
                    tracing::debug!(line_no, "no active watch, position event dropped");
                }
            }
            Err(reason) => tracing::warn!(line_no, %reason, "skipping input line"),
        }
    }
    Ok(delivered)
}

/// Holds the next line back until the watch has re-registered, so samples
/// following a `restart` are not dropped.
async fn wait_for_reregistration(handle: &ProviderHandle, before: usize) {
    let registered = tokio::time::timeout(Duration::from_secs(1), async {
        while handle.registrations() <= before || !handle.is_watching() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    if registered.is_err() {
        tracing::warn!("watch did not re-register after restart");
    }
}
