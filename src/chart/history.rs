use std::collections::VecDeque;

use ulid::Ulid;

use crate::model::{IntervalId, IntervalSet, Mutation};

/// Anything a history entry can be replayed against.
pub trait ApplyMutation {
    fn apply_mutation(&mut self, mutation: &Mutation);
}

impl ApplyMutation for IntervalSet {
    fn apply_mutation(&mut self, mutation: &Mutation) {
        self.apply(mutation);
    }
}

/// One confirmed change and the op that reverses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: Ulid,
    pub forward: Mutation,
    pub inverse: Mutation,
}

impl HistoryEntry {
    pub fn new(forward: Mutation, inverse: Mutation) -> Self {
        Self {
            id: Ulid::new(),
            forward,
            inverse,
        }
    }
}

/// Bounded undo/redo stacks. Only confirmed changes are ever pushed.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    /// Oldest at the front; evicted first once `limit` is reached.
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    limit: usize,
}

impl HistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record an already-applied change. A new edit invalidates the redo lineage.
    pub fn perform(&mut self, entry: HistoryEntry) {
        self.future.clear();
        self.past.push_back(entry);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Apply the newest entry's inverse and move it to `future`. No-op when empty.
    pub fn undo(&mut self, target: &mut impl ApplyMutation) -> Option<&HistoryEntry> {
        let entry = self.past.pop_back()?;
        target.apply_mutation(&entry.inverse);
        self.future.push(entry);
        self.future.last()
    }

    /// Re-apply the most recently undone entry. No-op when empty.
    pub fn redo(&mut self, target: &mut impl ApplyMutation) -> Option<&HistoryEntry> {
        let entry = self.future.pop()?;
        target.apply_mutation(&entry.forward);
        self.past.push_back(entry);
        self.past.back()
    }

    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.past.back()
    }

    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.future.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Drop every entry touching `interval_id` from both stacks. Returns how many went.
    pub fn forget(&mut self, interval_id: &IntervalId) -> usize {
        let before = self.past.len() + self.future.len();
        self.past.retain(|e| e.forward.interval_id() != interval_id);
        self.future.retain(|e| e.forward.interval_id() != interval_id);
        before - self.past.len() - self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{day, Edge, Interval, LifecycleStatus};

    fn set() -> IntervalSet {
        IntervalSet::from_vec(vec![Interval::new(
            "A",
            "101",
            day("2026-02-07"),
            day("2026-02-09"),
            LifecycleStatus::Pending,
        )])
    }

    fn reassign(to: &str) -> Mutation {
        Mutation::Reassign {
            interval_id: "A".into(),
            resource_id: to.into(),
        }
    }

    fn set_end(date: &str) -> Mutation {
        Mutation::Reschedule {
            interval_id: "A".into(),
            edge: Edge::End,
            date: day(date),
        }
    }

    /// Apply `forward` and record it, the way the chart does after confirmation.
    fn perform(history: &mut HistoryStore, state: &mut IntervalSet, forward: Mutation, inverse: Mutation) {
        state.apply(&forward);
        history.perform(HistoryEntry::new(forward, inverse));
    }

    #[test]
    fn undo_restores_pre_perform_state_for_move() {
        let mut state = set();
        let before = state.clone();
        let mut history = HistoryStore::new(5);
        perform(&mut history, &mut state, reassign("102"), reassign("101"));
        assert_ne!(state, before);
        history.undo(&mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn undo_restores_pre_perform_state_for_resize() {
        let mut state = set();
        let before = state.clone();
        let mut history = HistoryStore::new(5);
        perform(&mut history, &mut state, set_end("2026-02-12"), set_end("2026-02-09"));
        history.undo(&mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn redo_after_undo_restores_undone_state() {
        let mut state = set();
        let mut history = HistoryStore::new(5);
        perform(&mut history, &mut state, reassign("102"), reassign("101"));
        let after = state.clone();
        history.undo(&mut state);
        history.redo(&mut state);
        assert_eq!(state, after);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn perform_after_undo_clears_future() {
        let mut state = set();
        let mut history = HistoryStore::new(5);
        perform(&mut history, &mut state, reassign("102"), reassign("101"));
        history.undo(&mut state);
        assert!(history.can_redo());

        perform(&mut history, &mut state, set_end("2026-02-11"), set_end("2026-02-09"));
        assert!(!history.can_redo());
        let snapshot = state.clone();
        assert!(history.redo(&mut state).is_none());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut state = set();
        let before = state.clone();
        let mut history = HistoryStore::new(5);
        assert!(history.undo(&mut state).is_none());
        assert!(history.redo(&mut state).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn bound_evicts_oldest() {
        let mut state = set();
        let mut history = HistoryStore::new(3);
        let rooms = ["102", "103", "104", "105", "106"];
        let mut origin = "101";
        for room in rooms {
            perform(&mut history, &mut state, reassign(room), reassign(origin));
            origin = room;
        }
        assert_eq!(history.past_len(), 3);
        // Undo everything that is left: lands on the room reached after two moves.
        while history.undo(&mut state).is_some() {}
        assert_eq!(state.get(&"A".into()).unwrap().resource_id, "103".into());
    }

    #[test]
    fn entries_move_between_stacks() {
        let mut state = set();
        let mut history = HistoryStore::new(5);
        perform(&mut history, &mut state, reassign("102"), reassign("101"));
        let id = history.peek_undo().unwrap().id;
        let undone = history.undo(&mut state).unwrap().id;
        assert_eq!(id, undone);
        assert_eq!(history.peek_redo().unwrap().id, id);
        assert_eq!((history.past_len(), history.future_len()), (0, 1));
        history.clear();
        assert!(!history.can_redo());
    }

    #[test]
    fn forget_drops_entries_for_one_booking() {
        let mut history = HistoryStore::new(5);
        let mut target = set();
        history.perform(HistoryEntry::new(reassign("102"), reassign("101")));
        history.perform(HistoryEntry::new(
            Mutation::Reassign {
                interval_id: "B".into(),
                resource_id: "103".into(),
            },
            Mutation::Reassign {
                interval_id: "B".into(),
                resource_id: "101".into(),
            },
        ));
        history.perform(HistoryEntry::new(set_end("2026-02-10"), set_end("2026-02-09")));
        history.undo(&mut target);

        assert_eq!(history.forget(&"A".into()), 2);
        assert_eq!((history.past_len(), history.future_len()), (1, 0));
        assert_eq!(history.peek_undo().unwrap().forward.interval_id(), &"B".into());
        assert_eq!(history.forget(&"A".into()), 0);
    }
}
