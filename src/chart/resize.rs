use crate::grid::TimelineWindow;
use crate::model::{Day, Edge, Interval, IntervalId};

use super::moves::check_editable;
use super::{ChartError, PendingRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResizeState {
    #[default]
    Idle,
    Resizing {
        interval_id: IntervalId,
        edge: Edge,
        /// Edge date when the drag began.
        original: Day,
        /// The edge that is not being dragged.
        fixed: Day,
        /// Last candidate that kept `start < end`.
        provisional: Day,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Nothing was resizing, or the edge ended where it started.
    Unchanged,
    Reschedule {
        interval_id: IntervalId,
        edge: Edge,
        from: Day,
        to: Day,
    },
}

/// Edge drag of one booking. Invalid candidates are dropped before they are shown.
#[derive(Debug, Clone, Default)]
pub struct DragResizeController {
    state: ResizeState,
}

impl DragResizeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn active(&self) -> Option<&IntervalId> {
        match &self.state {
            ResizeState::Idle => None,
            ResizeState::Resizing { interval_id, .. } => Some(interval_id),
        }
    }

    pub fn begin(
        &mut self,
        interval: &Interval,
        edge: Edge,
        pending: &PendingRegistry,
    ) -> Result<(), ChartError> {
        if let Some(active) = self.active() {
            return Err(ChartError::InteractionInProgress(active.clone()));
        }
        check_editable(interval, pending)?;
        let fixed = match edge {
            Edge::Start => interval.end,
            Edge::End => interval.start,
        };
        let original = interval.edge(edge);
        self.state = ResizeState::Resizing {
            interval_id: interval.id.clone(),
            edge,
            original,
            fixed,
            provisional: original,
        };
        tracing::debug!("resize of {} {edge} edge started at {original}", interval.id);
        Ok(())
    }

    /// Offer a candidate date. It must keep `start < end` and pass `admit`,
    /// which sees the resulting `[start, end)`. Returns whether it became the
    /// provisional value.
    pub fn propose(&mut self, candidate: Day, admit: impl FnOnce(Day, Day) -> bool) -> bool {
        let ResizeState::Resizing {
            edge,
            fixed,
            provisional,
            ..
        } = &mut self.state
        else {
            return false;
        };
        let (start, end) = match edge {
            Edge::Start => (candidate, *fixed),
            Edge::End => (*fixed, candidate),
        };
        let valid = start < end && admit(start, end);
        if valid {
            *provisional = candidate;
        }
        valid
    }

    /// Translate a fractional pointer column into a candidate date and propose it.
    /// Returns the provisional date after the update.
    pub fn track(
        &mut self,
        window: &TimelineWindow,
        pointer_column: f64,
        admit: impl FnOnce(Day, Day) -> bool,
    ) -> Option<Day> {
        if self.active().is_none() {
            return None;
        }
        let candidate = window.date_at(window.nearest_column(pointer_column));
        self.propose(candidate, admit);
        self.provisional()
    }

    pub fn provisional(&self) -> Option<Day> {
        match &self.state {
            ResizeState::Resizing { provisional, .. } => Some(*provisional),
            ResizeState::Idle => None,
        }
    }

    /// Provisional `[start, end)` for drawing the stretched bar.
    pub fn preview(&self) -> Option<(Day, Day)> {
        match &self.state {
            ResizeState::Resizing {
                edge: Edge::Start,
                fixed,
                provisional,
                ..
            } => Some((*provisional, *fixed)),
            ResizeState::Resizing {
                edge: Edge::End,
                fixed,
                provisional,
                ..
            } => Some((*fixed, *provisional)),
            ResizeState::Idle => None,
        }
    }

    pub fn release(&mut self) -> ResizeOutcome {
        match std::mem::take(&mut self.state) {
            ResizeState::Resizing {
                interval_id,
                edge,
                original,
                provisional,
                ..
            } if provisional != original => ResizeOutcome::Reschedule {
                interval_id,
                edge,
                from: original,
                to: provisional,
            },
            _ => ResizeOutcome::Unchanged,
        }
    }

    pub fn cancel(&mut self) -> bool {
        let was_active = self.active().is_some();
        self.state = ResizeState::Idle;
        was_active
    }
}
