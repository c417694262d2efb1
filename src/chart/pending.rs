use std::collections::{BTreeMap, HashMap};

use crate::model::IntervalId;

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    interval_id: IntervalId,
    history: bool,
}

/// Whether a response may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Unknown or already-resolved ticket, or an older request than one already applied.
    Stale,
}

/// Sequence numbers for outstanding gateway requests.
///
/// Responses are ordered per interval by sequence, not by arrival: once a
/// request has been applied for an interval, any earlier request for the same
/// interval resolves as stale.
#[derive(Debug, Clone, Default)]
pub struct PendingRegistry {
    next_seq: u64,
    in_flight: BTreeMap<u64, InFlight>,
    /// interval id → highest sequence applied. Only kept while the interval
    /// still has tickets in flight; later tickets always carry a higher seq.
    applied: HashMap<IntervalId, u64>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request. `history` marks undo/redo requests.
    pub fn issue(&mut self, interval_id: &IntervalId, history: bool) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight.insert(
            seq,
            InFlight {
                interval_id: interval_id.clone(),
                history,
            },
        );
        seq
    }

    pub fn resolve(&mut self, interval_id: &IntervalId, seq: u64, success: bool) -> Freshness {
        let freshness = self.classify(interval_id, seq, success);
        if !self.is_pending(interval_id) {
            self.applied.remove(interval_id);
        }
        freshness
    }

    fn classify(&mut self, interval_id: &IntervalId, seq: u64, success: bool) -> Freshness {
        let Some(entry) = self.in_flight.remove(&seq) else {
            return Freshness::Stale;
        };
        if &entry.interval_id != interval_id {
            // Not this interval's ticket.
            self.in_flight.insert(seq, entry);
            return Freshness::Stale;
        }
        if self.applied.get(interval_id).is_some_and(|&last| last >= seq) {
            return Freshness::Stale;
        }
        if success {
            self.applied.insert(interval_id.clone(), seq);
        }
        Freshness::Fresh
    }

    /// Drop the applied watermark of an interval removed upstream. Its
    /// outstanding tickets still resolve.
    pub fn forget(&mut self, interval_id: &IntervalId) {
        self.applied.remove(interval_id);
    }

    pub fn is_pending(&self, interval_id: &IntervalId) -> bool {
        self.in_flight.values().any(|e| &e.interval_id == interval_id)
    }

    pub fn any_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// An undo or redo is awaiting confirmation.
    pub fn history_in_flight(&self) -> bool {
        self.in_flight.values().any(|e| e.history)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
