//! Single-flight poll state machine.
//!
//! The driver (a browser timer chain or a tokio loop) owns the transport; this type
//! only decides whether a poll may start and what a finished poll means for the store.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Snapshot;
use crate::store::SnapshotStore;

/// The exact bytes of the last payload that was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn matches(&self, raw: &str) -> bool {
        self.0 == raw
    }
}

/// Proof that a poll was started; handed back to [`PollLoop::finish`].
#[derive(Debug, PartialEq, Eq)]
pub struct PollTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Same payload (or same content) as before; nothing was redrawn.
    Unchanged,
    Replaced,
    /// The source was unreachable; worth retrying quietly. The store was left alone.
    Failed(String),
    /// The source answered with something unusable. The store was left alone.
    Rejected(String),
}

#[derive(Debug)]
pub struct PollLoop {
    interval: Duration,
    in_flight: Option<u64>,
    next_ticket: u64,
    last: Option<Fingerprint>,
    consecutive_failures: u32,
}

impl PollLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            in_flight: None,
            next_ticket: 0,
            last: None,
            consecutive_failures: 0,
        }
    }

    /// Delay between the end of one poll and the start of the next.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_fingerprint(&self) -> Option<&Fingerprint> {
        self.last.as_ref()
    }

    /// Start a poll, unless one is already running.
    pub fn begin(&mut self) -> Option<PollTicket> {
        if self.in_flight.is_some() {
            debug!("Poll already in flight; skipping tick");
            return None;
        }
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);
        Some(PollTicket(id))
    }

    /// Apply the result of the poll started with `ticket`.
    pub fn finish(&mut self, ticket: PollTicket, result: Result<String>, store: &mut SnapshotStore) -> PollOutcome {
        if self.in_flight != Some(ticket.0) {
            debug!("Finishing poll {} that is not the one in flight", ticket.0);
        }
        self.in_flight = None;

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => return self.fail(e),
        };

        if self.last.as_ref().is_some_and(|f| f.matches(&raw)) {
            self.consecutive_failures = 0;
            return PollOutcome::Unchanged;
        }

        match Snapshot::from_payload(&raw) {
            Ok(snapshot) => {
                self.consecutive_failures = 0;
                self.last = Some(Fingerprint::of(&raw));
                if store.replace_snapshot(snapshot) {
                    PollOutcome::Replaced
                } else {
                    PollOutcome::Unchanged
                }
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, e: Error) -> PollOutcome {
        self.consecutive_failures += 1;
        if e.is_transient() {
            warn!("Poll failed ({} in a row): {}", self.consecutive_failures, e);
            PollOutcome::Failed(e.to_string())
        } else {
            warn!("Ignoring unusable payload: {}", e);
            PollOutcome::Rejected(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::config::DashboardConfig;
    use crate::store::StoreEvent;

    const PAYLOAD: &str = r#"{"nodes": [{"id": "a", "generation": 0, "metrics": {"score": 1.0}}], "archive": [], "checkpoint_dir": "c"}"#;

    fn counted_store() -> (SnapshotStore, Rc<Cell<usize>>) {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        let renders = Rc::new(Cell::new(0));
        let r = renders.clone();
        store.subscribe(move |e, _| {
            if *e == StoreEvent::SnapshotReplaced {
                r.set(r.get() + 1);
            }
        });
        (store, renders)
    }

    fn poll_once(poll: &mut PollLoop, store: &mut SnapshotStore, result: Result<String>) -> PollOutcome {
        let ticket = poll.begin().unwrap();
        poll.finish(ticket, result, store)
    }

    #[test]
    fn identical_payloads_render_once() {
        let (mut store, renders) = counted_store();
        let mut poll = PollLoop::new(Duration::from_millis(2000));
        assert_eq!(poll_once(&mut poll, &mut store, Ok(PAYLOAD.into())), PollOutcome::Replaced);
        assert_eq!(poll_once(&mut poll, &mut store, Ok(PAYLOAD.into())), PollOutcome::Unchanged);
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn reformatted_but_equal_content_does_not_render() {
        let (mut store, renders) = counted_store();
        let mut poll = PollLoop::new(Duration::from_millis(2000));
        poll_once(&mut poll, &mut store, Ok(PAYLOAD.into()));
        let spaced = PAYLOAD.replace(", ", ",\n  ");
        assert_eq!(poll_once(&mut poll, &mut store, Ok(spaced)), PollOutcome::Unchanged);
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn only_one_poll_in_flight() {
        let mut poll = PollLoop::new(Duration::from_millis(2000));
        let ticket = poll.begin().unwrap();
        assert!(poll.begin().is_none());
        assert!(poll.is_in_flight());

        let mut store = SnapshotStore::new(DashboardConfig::default());
        poll.finish(ticket, Ok(PAYLOAD.into()), &mut store);
        assert!(!poll.is_in_flight());
        assert!(poll.begin().is_some());
    }

    #[test]
    fn failures_leave_the_store_alone_and_the_loop_alive() {
        let (mut store, renders) = counted_store();
        let mut poll = PollLoop::new(Duration::from_millis(2000));
        poll_once(&mut poll, &mut store, Ok(PAYLOAD.into()));

        let out = poll_once(&mut poll, &mut store, Err(Error::Fetch("connection refused".into())));
        assert!(matches!(out, PollOutcome::Failed(ref m) if m.contains("connection refused")));
        let out = poll_once(&mut poll, &mut store, Ok("{not json".into()));
        assert!(matches!(out, PollOutcome::Rejected(_)));
        assert_eq!(poll.consecutive_failures(), 2);
        assert_eq!(store.snapshot().len(), 1);
        assert!(poll.last_fingerprint().unwrap().matches(PAYLOAD));

        assert_eq!(poll_once(&mut poll, &mut store, Ok(PAYLOAD.into())), PollOutcome::Unchanged);
        assert_eq!(poll.consecutive_failures(), 0);
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn io_errors_are_retried_and_shape_errors_rejected() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        let mut poll = PollLoop::new(Duration::from_millis(2000));

        let gone = std::io::Error::new(std::io::ErrorKind::NotFound, "data.json");
        assert!(matches!(poll_once(&mut poll, &mut store, Err(gone.into())), PollOutcome::Failed(_)));
        let shape = Error::PayloadShape {
            field: "nodes",
            reason: "expected an array".into(),
        };
        assert!(matches!(poll_once(&mut poll, &mut store, Err(shape)), PollOutcome::Rejected(ref m) if m.contains("nodes")));
        assert_eq!(poll.consecutive_failures(), 2);
    }
}
