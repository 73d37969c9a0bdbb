//! Terminal rendering for `watch` and `run`.

use std::fmt::Write as _;

use chainprobe_core::event::Event;
use chainprobe_core::reassembler::{EntryKind, LogEntry, SessionStatus, SessionView};
use chainprobe_core::{NetworkId, Outcome};
use chrono::{DateTime, Local, Utc};

/// One live line: `[HH:MM:SS] [Network] message`.
pub fn event_line(event: &Event, at: DateTime<Utc>) -> Option<String> {
    let stamp = at.with_timezone(&Local).format("%H:%M:%S");
    let label = event.network().map_or("Session", NetworkId::label);
    match event {
        Event::Progress { message, .. } => Some(format!("[{stamp}] [{label}] {message}")),
        Event::Failure { message, .. } => Some(format!("[{stamp}] [{label}] ERROR: {message}")),
        Event::AggregateResult { .. } => None,
    }
}

/// Per-network timelines followed by the comparison table.
pub fn summary(view: &SessionView) -> String {
    let mut out = String::new();
    for network in NetworkId::AGGREGATE_ORDER {
        let _ = writeln!(out, "== {} ==", network.display_name());
        let entries = view.logs(network);
        if entries.is_empty() {
            let _ = writeln!(out, "  (no events)");
        }
        for entry in entries {
            let _ = writeln!(out, "  {}", entry_line(entry));
        }
    }
    match (view.results(), view.status()) {
        (Some(results), _) => out.push_str(&comparison(results)),
        (None, SessionStatus::Failed { reason }) => {
            let _ = writeln!(out, "Session failed: {reason}");
        }
        (None, _) => {
            let _ = writeln!(out, "Stream ended before results arrived");
        }
    }
    out
}

fn entry_line(entry: &LogEntry) -> String {
    let stamp = entry.received_at.with_timezone(&Local).format("%H:%M:%S");
    match entry.kind {
        EntryKind::Normal => format!("[{stamp}] {}", entry.message),
        EntryKind::Error => format!("[{stamp}] ERROR: {}", entry.message),
    }
}

/// Fee and time per network, with the cheapest and fastest marked.
pub fn comparison(results: &[Outcome]) -> String {
    let cheapest = best_by(results, |o| o.fee);
    let fastest = best_by(results, |o| o.elapsed_seconds);
    let mut out = format!(
        "{:<28} {:>12} {:>10}  {}\n",
        "Network", "Fee (USD)", "Time (s)", "Status"
    );
    for outcome in results {
        let mut marks = Vec::new();
        if cheapest == Some(outcome.network) {
            marks.push("cheapest");
        }
        if fastest == Some(outcome.network) {
            marks.push("fastest");
        }
        let status = match &outcome.failure_reason {
            None => "ok".to_string(),
            Some(reason) => format!("fallback ({reason})"),
        };
        let _ = write!(
            out,
            "{:<28} {:>12.4} {:>10.2}  {status}",
            outcome.network.display_name(),
            outcome.fee,
            outcome.elapsed_seconds
        );
        if !marks.is_empty() {
            let _ = write!(out, " [{}]", marks.join(", "));
        }
        out.push('\n');
    }
    out
}

fn best_by(results: &[Outcome], key: impl Fn(&Outcome) -> f64) -> Option<NetworkId> {
    results
        .iter()
        .min_by(|a, b| key(a).total_cmp(&key(b)))
        .map(|o| o.network)
}
