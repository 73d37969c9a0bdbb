//! Consumer-side view of a session, rebuilt from decoded events.
//!
//! [`reduce`] is a pure fold step: the view only ever changes by applying
//! one event, so the same event sequence always yields the same view.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::event::{Event, Observation};
use crate::network::NetworkId;
use crate::outcome::Outcome;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    Normal,
    Error,
}

/// One line of a network's log.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub kind: EntryKind,
    pub received_at: DateTime<Utc>,
    pub data: Option<Observation>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionStatus {
    #[default]
    Streaming,
    /// The aggregate result arrived.
    Completed,
    /// A session-level failure was reported.
    Failed { reason: String },
    /// The stream closed before any terminal event.
    Disconnected,
}

#[derive(Clone, Debug, Default)]
pub struct SessionView {
    logs: BTreeMap<NetworkId, Vec<LogEntry>>,
    general: Vec<LogEntry>,
    results: Option<Vec<Outcome>>,
    status: SessionStatus,
}

impl SessionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for one network in arrival order. Empty if none arrived.
    pub fn logs(&self, network: NetworkId) -> &[LogEntry] {
        self.logs.get(&network).map(Vec::as_slice).unwrap_or_default()
    }

    /// Entries that carried no network label.
    pub fn general(&self) -> &[LogEntry] {
        &self.general
    }

    pub fn results(&self) -> Option<&[Outcome]> {
        self.results.as_deref()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::Streaming
    }
}

/// Applies one event to the view.
pub fn reduce(mut view: SessionView, event: Event, received_at: DateTime<Utc>) -> SessionView {
    match event {
        Event::Progress {
            message,
            network,
            data,
        } => {
            let entry = LogEntry {
                message,
                kind: EntryKind::Normal,
                received_at,
                data,
            };
            push_entry(&mut view, network, entry);
        }
        Event::Failure { message, network } => {
            if network.is_none() && view.status == SessionStatus::Streaming {
                view.status = SessionStatus::Failed {
                    reason: message.clone(),
                };
            }
            let entry = LogEntry {
                message,
                kind: EntryKind::Error,
                received_at,
                data: None,
            };
            push_entry(&mut view, network, entry);
        }
        Event::AggregateResult { data, .. } => {
            view.results = Some(data.results);
            view.status = SessionStatus::Completed;
        }
    }
    view
}

/// Marks the end of the transport.
pub fn close(mut view: SessionView) -> SessionView {
    if view.status == SessionStatus::Streaming {
        view.status = SessionStatus::Disconnected;
    }
    view
}

fn push_entry(view: &mut SessionView, network: Option<NetworkId>, entry: LogEntry) {
    match network {
        Some(network) => view.logs.entry(network).or_default().push(entry),
        None => view.general.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fold(events: Vec<Event>) -> SessionView {
        let now = Utc::now();
        events
            .into_iter()
            .fold(SessionView::new(), |view, event| reduce(view, event, now))
    }

    #[test]
    fn entries_are_routed_by_network() {
        let view = fold(vec![
            Event::starting(),
            Event::progress(NetworkId::Ledger, "Connecting to XRPL testnet..."),
            Event::failure(NetworkId::Contract, "Ethereum connection failed"),
            Event::progress(NetworkId::Ledger, "Connected to XRPL"),
        ]);
        let ledger: Vec<_> = view
            .logs(NetworkId::Ledger)
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(ledger, ["Connecting to XRPL testnet...", "Connected to XRPL"]);
        assert_eq!(view.logs(NetworkId::Contract)[0].kind, EntryKind::Error);
        assert!(view.logs(NetworkId::Metered).is_empty());
        assert_eq!(view.general().len(), 1);
        assert_eq!(view.status(), &SessionStatus::Streaming);
        assert!(view.results().is_none());
    }

    #[test]
    fn aggregate_sets_results_atomically() {
        let outcomes = vec![
            Outcome::failed(NetworkId::Metered, Duration::from_secs(10), "Timeout"),
            Outcome::succeeded(NetworkId::Contract, 3.9, Duration::from_secs(18), None),
            Outcome::succeeded(NetworkId::Ledger, 0.0025, Duration::from_secs(4), None),
        ];
        let view = fold(vec![Event::starting(), Event::aggregate(outcomes.clone())]);
        assert_eq!(view.results(), Some(outcomes.as_slice()));
        assert_eq!(view.status(), &SessionStatus::Completed);
        assert!(view.is_finished());
    }

    #[test]
    fn aggregate_without_any_logs_is_tolerated() {
        let view = close(fold(vec![Event::aggregate(Vec::new())]));
        assert_eq!(view.results(), Some(&[][..]));
        assert_eq!(view.status(), &SessionStatus::Completed);
        for network in NetworkId::AGGREGATE_ORDER {
            assert!(view.logs(network).is_empty());
        }
    }

    #[test]
    fn session_failure_is_terminal_and_close_keeps_it() {
        let view = close(fold(vec![
            Event::starting(),
            Event::session_failure("consumer disconnected"),
        ]));
        assert_eq!(
            view.status(),
            &SessionStatus::Failed {
                reason: "consumer disconnected".into()
            }
        );
        assert_eq!(view.general()[1].kind, EntryKind::Error);
    }

    #[test]
    fn close_without_terminal_event_is_a_disconnect() {
        let view = close(fold(vec![Event::progress(NetworkId::Metered, "Connecting...")]));
        assert_eq!(view.status(), &SessionStatus::Disconnected);
        assert!(view.results().is_none());
    }
}
