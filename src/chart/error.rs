use crate::model::{IntervalId, LifecycleStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    NotFound(IntervalId),
    /// Completed, cancelled and no-show bookings cannot be dragged.
    NotEditable {
        id: IntervalId,
        status: LifecycleStatus,
    },
    /// A request for this booking is still awaiting confirmation.
    Pending(IntervalId),
    /// Another drag or resize is already in progress.
    InteractionInProgress(IntervalId),
    /// An undo/redo is in flight, or undo/redo was asked for while edits are in flight.
    HistoryBusy,
    InvalidWindow(u32),
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::NotFound(id) => write!(f, "booking not found: {id}"),
            ChartError::NotEditable { id, status } => {
                write!(f, "booking {id} cannot be changed in status {status:?}")
            }
            ChartError::Pending(id) => {
                write!(f, "booking {id} has a change awaiting confirmation")
            }
            ChartError::InteractionInProgress(id) => {
                write!(f, "already dragging booking {id}")
            }
            ChartError::HistoryBusy => write!(f, "history is busy: a request is in flight"),
            ChartError::InvalidWindow(days) => {
                write!(f, "window must span 1..={} days, got {days}", crate::limits::MAX_DAY_COUNT)
            }
        }
    }
}

impl std::error::Error for ChartError {}
