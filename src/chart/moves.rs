use serde::Serialize;

use crate::model::{Block, Day, Interval, IntervalId, Resource, ResourceId, ResourceStatus};

use super::{ChartError, PendingRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Idle,
    Dragging {
        interval_id: IntervalId,
        origin: ResourceId,
        /// Resource currently under the pointer, for the ghost bar.
        hover: Option<ResourceId>,
    },
}

/// Why a drop target was refused. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardRejection {
    pub interval_id: IntervalId,
    pub resource_id: ResourceId,
    pub label: String,
    pub status: ResourceStatus,
    pub reason: Option<String>,
    /// Set when the room is held over the booking's dates rather than unavailable.
    pub block: Option<Block>,
}

impl GuardRejection {
    pub fn message(&self) -> String {
        if let Some(block) = &self.block {
            let held = format!(
                "Room {} is blocked from {} to {}",
                self.label, block.start, block.end
            );
            return match &block.reason {
                Some(reason) => format!("{held} ({reason}); booking {} was not moved", self.interval_id),
                None => format!("{held}; booking {} was not moved", self.interval_id),
            };
        }
        match &self.reason {
            Some(reason) => format!(
                "Room {} is {} ({reason}); booking {} was not moved",
                self.label,
                self.status.as_str(),
                self.interval_id
            ),
            None => format!(
                "Room {} is {}; booking {} was not moved",
                self.label,
                self.status.as_str(),
                self.interval_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped back on its own row.
    Unchanged,
    /// No drag active, or dropped outside any known resource.
    Cancelled,
    Rejected(GuardRejection),
    /// Passed the guard check; a reassign request should be issued.
    Reassign {
        interval_id: IntervalId,
        from: ResourceId,
        to: ResourceId,
    },
}

/// Row-to-row drag of one booking. Never mutates bookings itself.
#[derive(Debug, Clone, Default)]
pub struct DragMoveController {
    state: MoveState,
}

impl DragMoveController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MoveState {
        &self.state
    }

    /// Interval being dragged, if any.
    pub fn active(&self) -> Option<&IntervalId> {
        match &self.state {
            MoveState::Idle => None,
            MoveState::Dragging { interval_id, .. } => Some(interval_id),
        }
    }

    pub fn hover_target(&self) -> Option<&ResourceId> {
        match &self.state {
            MoveState::Dragging { hover, .. } => hover.as_ref(),
            MoveState::Idle => None,
        }
    }

    pub fn begin(&mut self, interval: &Interval, pending: &PendingRegistry) -> Result<(), ChartError> {
        if let Some(active) = self.active() {
            return Err(ChartError::InteractionInProgress(active.clone()));
        }
        check_editable(interval, pending)?;
        self.state = MoveState::Dragging {
            interval_id: interval.id.clone(),
            origin: interval.resource_id.clone(),
            hover: Some(interval.resource_id.clone()),
        };
        tracing::debug!("move drag started for {} from {}", interval.id, interval.resource_id);
        Ok(())
    }

    pub fn hover(&mut self, target: Option<ResourceId>) {
        if let MoveState::Dragging { hover, .. } = &mut self.state {
            *hover = target;
        }
    }

    /// End the drag on `target`. `None` means the pointer left every row.
    /// `stay` is the booking's current `[start, end)`, checked against the
    /// target's blocks. The controller is idle afterwards whatever the outcome.
    pub fn drop_on(&mut self, target: Option<&Resource>, stay: (Day, Day)) -> DropOutcome {
        let MoveState::Dragging {
            interval_id,
            origin,
            ..
        } = std::mem::take(&mut self.state)
        else {
            return DropOutcome::Cancelled;
        };
        let Some(target) = target else {
            tracing::debug!("move drag for {interval_id} dropped outside the grid");
            return DropOutcome::Cancelled;
        };
        if target.id == origin {
            return DropOutcome::Unchanged;
        }
        if !target.status.accepts_moves() {
            return DropOutcome::Rejected(GuardRejection {
                interval_id,
                resource_id: target.id.clone(),
                label: target.label.clone(),
                status: target.status,
                reason: target.status_reason.clone(),
                block: None,
            });
        }
        if let Some(block) = target.block_during(stay.0, stay.1) {
            return DropOutcome::Rejected(GuardRejection {
                interval_id,
                resource_id: target.id.clone(),
                label: target.label.clone(),
                status: target.status,
                reason: block.reason.clone(),
                block: Some(block.clone()),
            });
        }
        DropOutcome::Reassign {
            interval_id,
            from: origin,
            to: target.id.clone(),
        }
    }

    /// Abandon the drag. Returns false if nothing was being dragged.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.active().is_some();
        self.state = MoveState::Idle;
        was_active
    }
}

/// Shared entry check for moves and resizes.
pub(super) fn check_editable(interval: &Interval, pending: &PendingRegistry) -> Result<(), ChartError> {
    if !interval.status.is_editable() {
        return Err(ChartError::NotEditable {
            id: interval.id.clone(),
            status: interval.status,
        });
    }
    if pending.history_in_flight() {
        return Err(ChartError::HistoryBusy);
    }
    if pending.is_pending(&interval.id) {
        return Err(ChartError::Pending(interval.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{day, LifecycleStatus};

    fn stay() -> (Day, Day) {
        (day("2026-02-07"), day("2026-02-09"))
    }

    fn booking(status: LifecycleStatus) -> Interval {
        Interval::new("A", "101", day("2026-02-07"), day("2026-02-09"), status)
    }

    fn room(id: &str, status: ResourceStatus) -> Resource {
        Resource::new(id, id, "Double").with_status(status)
    }

    #[test]
    fn drop_on_available_room_requests_reassign() {
        let mut ctl = DragMoveController::new();
        ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
        ctl.hover(Some("102".into()));
        assert_eq!(ctl.hover_target(), Some(&"102".into()));

        let outcome = ctl.drop_on(Some(&room("102", ResourceStatus::Available)), stay());
        assert_eq!(
            outcome,
            DropOutcome::Reassign {
                interval_id: "A".into(),
                from: "101".into(),
                to: "102".into(),
            }
        );
        assert_eq!(ctl.state(), &MoveState::Idle);
    }

    #[test]
    fn drop_on_origin_is_noop() {
        let mut ctl = DragMoveController::new();
        ctl.begin(&booking(LifecycleStatus::Active), &PendingRegistry::new()).unwrap();
        let outcome = ctl.drop_on(Some(&room("101", ResourceStatus::Available)), stay());
        assert_eq!(outcome, DropOutcome::Unchanged);
    }

    #[test]
    fn guard_rejects_unavailable_rooms() {
        for status in [ResourceStatus::OutOfService, ResourceStatus::NeedsCleaning] {
            let mut ctl = DragMoveController::new();
            ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
            let mut target = room("102", status);
            target.status_reason = Some("Broken AC".into());
            let DropOutcome::Rejected(rejection) = ctl.drop_on(Some(&target), stay()) else {
                panic!("expected guard rejection for {status:?}");
            };
            let msg = rejection.message();
            assert!(msg.contains("102"));
            assert!(msg.contains(status.as_str()));
            assert!(msg.contains("Broken AC"));
            assert_eq!(ctl.state(), &MoveState::Idle);
        }
    }

    #[test]
    fn inspection_statuses_pass_guard() {
        let mut ctl = DragMoveController::new();
        ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
        let outcome = ctl.drop_on(Some(&room("102", ResourceStatus::UnderInspection)), stay());
        assert!(matches!(outcome, DropOutcome::Reassign { .. }));
    }

    #[test]
    fn blocked_dates_refuse_the_drop() {
        let mut ctl = DragMoveController::new();
        ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
        let target = room("102", ResourceStatus::Available)
            .with_block(Block::new(day("2026-02-08"), day("2026-02-12")).with_reason("Renovation"));
        let DropOutcome::Rejected(rejection) = ctl.drop_on(Some(&target), stay()) else {
            panic!("expected block rejection");
        };
        assert_eq!(rejection.block.as_ref().map(|b| b.start), Some(day("2026-02-08")));
        assert_eq!(
            rejection.message(),
            "Room 102 is blocked from 2026-02-08 to 2026-02-12 (Renovation); booking A was not moved"
        );

        // a block that starts on the departure day does not collide
        ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
        let target = room("102", ResourceStatus::Available)
            .with_block(Block::new(day("2026-02-09"), day("2026-02-12")));
        assert!(matches!(ctl.drop_on(Some(&target), stay()), DropOutcome::Reassign { .. }));
    }

    #[test]
    fn finished_bookings_cannot_be_dragged() {
        for status in [
            LifecycleStatus::Completed,
            LifecycleStatus::Cancelled,
            LifecycleStatus::NoShow,
        ] {
            let mut ctl = DragMoveController::new();
            let err = ctl.begin(&booking(status), &PendingRegistry::new()).unwrap_err();
            assert!(matches!(err, ChartError::NotEditable { .. }));
            assert_eq!(ctl.state(), &MoveState::Idle);
        }
    }

    #[test]
    fn pending_booking_refuses_drag() {
        let mut pending = PendingRegistry::new();
        pending.issue(&"A".into(), false);
        let mut ctl = DragMoveController::new();
        let err = ctl.begin(&booking(LifecycleStatus::Pending), &pending).unwrap_err();
        assert_eq!(err, ChartError::Pending("A".into()));
    }

    #[test]
    fn second_drag_refused_while_dragging() {
        let mut ctl = DragMoveController::new();
        let pending = PendingRegistry::new();
        ctl.begin(&booking(LifecycleStatus::Pending), &pending).unwrap();
        let err = ctl.begin(&booking(LifecycleStatus::Pending), &pending).unwrap_err();
        assert_eq!(err, ChartError::InteractionInProgress("A".into()));
    }

    #[test]
    fn drop_outside_and_cancel() {
        let mut ctl = DragMoveController::new();
        assert_eq!(ctl.drop_on(None, stay()), DropOutcome::Cancelled);
        assert!(!ctl.cancel());

        ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
        assert_eq!(ctl.drop_on(None, stay()), DropOutcome::Cancelled);

        ctl.begin(&booking(LifecycleStatus::Pending), &PendingRegistry::new()).unwrap();
        assert!(ctl.cancel());
        assert_eq!(ctl.active(), None);
    }
}
