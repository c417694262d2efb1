use serde::Serialize;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::gateway::{dispatch, GatewayError, PersistenceGateway};
use crate::keymap::{focus_command, history_command, FocusCommand, HistoryCommand, KeyChord};
use crate::model::*;
use crate::notify::Notice;
use crate::observability::{self, mutation_label};

use super::*;

/// What a confirmed request will do to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Purpose {
    /// A fresh move or resize; recorded with `inverse` once confirmed.
    Edit { inverse: Mutation },
    Undo { entry_id: Ulid },
    Redo { entry_id: Ulid },
}

/// A sequenced request awaiting the gateway. Hand it back to
/// [`TapeChart::resolve`] with the gateway's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequest {
    pub seq: u64,
    pub mutation: Mutation,
    pub purpose: Purpose,
}

impl Purpose {
    fn label(&self) -> &'static str {
        match self {
            Purpose::Edit { .. } => "edit",
            Purpose::Undo { .. } => "undo",
            Purpose::Redo { .. } => "redo",
        }
    }
}

impl PendingRequest {
    pub fn interval_id(&self) -> &IntervalId {
        self.mutation.interval_id()
    }
}

/// Result of ending a drag or resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Unchanged,
    Cancelled,
    Rejected(GuardRejection),
    Submitted(PendingRequest),
}

impl Interaction {
    pub fn into_request(self) -> Option<PendingRequest> {
        match self {
            Interaction::Submitted(ticket) => Some(ticket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Confirmed and applied locally. `entry_id` names the history entry
    /// recorded, undone or redone.
    Applied { entry_id: Ulid },
    /// The gateway refused; nothing changed locally.
    Rejected { reason: String },
    /// Confirmed, but the booking was removed here while the request was in
    /// flight. Nothing applied, nothing recorded.
    Gone,
    /// Superseded by a newer response for the same booking; discarded.
    Stale,
}

impl TapeChart {
    // ── Moves ────────────────────────────────────────────────

    pub fn begin_move(&mut self, id: &IntervalId) -> Result<(), ChartError> {
        if let Some(active) = self.resizes.active() {
            return Err(ChartError::InteractionInProgress(active.clone()));
        }
        let interval = self
            .intervals
            .get(id)
            .ok_or_else(|| ChartError::NotFound(id.clone()))?;
        self.moves.begin(interval, &self.pending)
    }

    pub fn hover_move(&mut self, target: Option<&ResourceId>) {
        self.moves.hover(target.cloned());
    }

    pub fn hover_move_row(&mut self, row: usize) {
        let target = self.index.resource_at(row).map(|r| r.id.clone());
        self.moves.hover(target);
    }

    /// Drop on `target`. Unknown or missing targets cancel the drag.
    pub fn drop_move(&mut self, target: Option<&ResourceId>) -> Interaction {
        let Some(stay) = self
            .moves
            .active()
            .and_then(|id| self.intervals.get(id))
            .map(|i| (i.start, i.end))
        else {
            self.moves.cancel();
            return Interaction::Cancelled;
        };
        let resource = target.and_then(|id| self.resources.iter().find(|r| &r.id == id));
        let outcome = self.moves.drop_on(resource, stay);
        self.on_drop(outcome)
    }

    /// Drop on the resource shown at `row` under the current filters.
    pub fn drop_move_at_row(&mut self, row: usize) -> Interaction {
        let target = self.index.resource_at(row).map(|r| r.id.clone());
        self.drop_move(target.as_ref())
    }

    pub fn cancel_move(&mut self) -> bool {
        self.moves.cancel()
    }

    fn on_drop(&mut self, outcome: DropOutcome) -> Interaction {
        match outcome {
            DropOutcome::Unchanged => Interaction::Unchanged,
            DropOutcome::Cancelled => Interaction::Cancelled,
            DropOutcome::Rejected(rejection) => {
                let message = rejection.message();
                warn!("{message}");
                metrics::counter!(observability::GUARD_REJECTIONS_TOTAL).increment(1);
                self.notify.notify(Notice::GuardRejected {
                    interval_id: rejection.interval_id.clone(),
                    resource_id: rejection.resource_id.clone(),
                    status: rejection.status,
                    message,
                });
                Interaction::Rejected(rejection)
            }
            DropOutcome::Reassign {
                interval_id,
                from,
                to,
            } => {
                info!("requesting move of {interval_id} from {from} to {to}");
                let mutation = Mutation::Reassign {
                    interval_id: interval_id.clone(),
                    resource_id: to,
                };
                let inverse = Mutation::Reassign {
                    interval_id,
                    resource_id: from,
                };
                Interaction::Submitted(self.issue(mutation, Purpose::Edit { inverse }))
            }
        }
    }

    // ── Resizes ──────────────────────────────────────────────

    pub fn begin_resize(&mut self, id: &IntervalId, edge: Edge) -> Result<(), ChartError> {
        if let Some(active) = self.moves.active() {
            return Err(ChartError::InteractionInProgress(active.clone()));
        }
        let interval = self
            .intervals
            .get(id)
            .ok_or_else(|| ChartError::NotFound(id.clone()))?;
        self.resizes.begin(interval, edge, &self.pending)
    }

    /// Feed a pointer position in fractional columns. Returns the provisional date.
    pub fn track_resize(&mut self, pointer_column: f64) -> Option<Day> {
        let current = self.resizes.active().and_then(|id| self.intervals.get(id));
        let room = current.and_then(|i| self.resources.iter().find(|r| r.id == i.resource_id));
        self.resizes.track(&self.window, pointer_column, |start, end| {
            stays_clear(room, current, start, end)
        })
    }

    pub fn propose_resize_date(&mut self, date: Day) -> bool {
        let current = self.resizes.active().and_then(|id| self.intervals.get(id));
        let room = current.and_then(|i| self.resources.iter().find(|r| r.id == i.resource_id));
        self.resizes
            .propose(date, |start, end| stays_clear(room, current, start, end))
    }

    pub fn release_resize(&mut self) -> Interaction {
        match self.resizes.release() {
            ResizeOutcome::Unchanged => Interaction::Unchanged,
            ResizeOutcome::Reschedule {
                interval_id,
                edge,
                from,
                to,
            } => {
                let Some(current) = self.intervals.get(&interval_id) else {
                    debug!("resize of {interval_id} released after removal");
                    return Interaction::Cancelled;
                };
                let (start, end) = match edge {
                    Edge::Start => (to, current.end),
                    Edge::End => (current.start, to),
                };
                let room = self.resources.iter().find(|r| r.id == current.resource_id);
                if current.edge(edge) != from || !stays_clear(room, Some(current), start, end) {
                    warn!("resize of {interval_id} to {start}..{end} no longer valid, dropped");
                    return Interaction::Cancelled;
                }
                info!("requesting {edge} of {interval_id} move from {from} to {to}");
                let mutation = Mutation::Reschedule {
                    interval_id: interval_id.clone(),
                    edge,
                    date: to,
                };
                let inverse = Mutation::Reschedule {
                    interval_id,
                    edge,
                    date: from,
                };
                Interaction::Submitted(self.issue(mutation, Purpose::Edit { inverse }))
            }
        }
    }

    pub fn cancel_resize(&mut self) -> bool {
        self.resizes.cancel()
    }

    // ── History ──────────────────────────────────────────────

    /// Ticket for undoing the newest entry, or `None` when there is nothing to undo.
    pub fn request_undo(&mut self) -> Result<Option<PendingRequest>, ChartError> {
        self.ensure_history_idle()?;
        let Some(entry) = self.history.peek_undo() else {
            return Ok(None);
        };
        let (mutation, entry_id) = (entry.inverse.clone(), entry.id);
        Ok(Some(self.issue(mutation, Purpose::Undo { entry_id })))
    }

    pub fn request_redo(&mut self) -> Result<Option<PendingRequest>, ChartError> {
        self.ensure_history_idle()?;
        let Some(entry) = self.history.peek_redo() else {
            return Ok(None);
        };
        let (mutation, entry_id) = (entry.forward.clone(), entry.id);
        Ok(Some(self.issue(mutation, Purpose::Redo { entry_id })))
    }

    pub async fn undo(
        &mut self,
        gateway: &dyn PersistenceGateway,
    ) -> Result<Option<Resolution>, ChartError> {
        let Some(ticket) = self.request_undo()? else {
            return Ok(None);
        };
        Ok(Some(self.submit(gateway, ticket).await))
    }

    pub async fn redo(
        &mut self,
        gateway: &dyn PersistenceGateway,
    ) -> Result<Option<Resolution>, ChartError> {
        let Some(ticket) = self.request_redo()? else {
            return Ok(None);
        };
        Ok(Some(self.submit(gateway, ticket).await))
    }

    /// Route a key press: arrows and Escape drive the grid focus, the
    /// history chords request undo/redo.
    pub fn handle_key(
        &mut self,
        chord: &KeyChord,
        text_entry_focused: bool,
    ) -> Result<Option<PendingRequest>, ChartError> {
        match focus_command(chord, text_entry_focused) {
            Some(FocusCommand::Step(step)) => {
                self.move_focus(step);
                return Ok(None);
            }
            Some(FocusCommand::Clear) => {
                self.clear_focus();
                return Ok(None);
            }
            None => {}
        }
        match history_command(chord, text_entry_focused) {
            Some(HistoryCommand::Undo) => self.request_undo(),
            Some(HistoryCommand::Redo) => self.request_redo(),
            None => Ok(None),
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn ensure_history_idle(&self) -> Result<(), ChartError> {
        if let Some(id) = self.moves.active().or(self.resizes.active()) {
            return Err(ChartError::InteractionInProgress(id.clone()));
        }
        if self.pending.any_pending() {
            return Err(ChartError::HistoryBusy);
        }
        Ok(())
    }

    // ── Requests ─────────────────────────────────────────────

    fn issue(&mut self, mutation: Mutation, purpose: Purpose) -> PendingRequest {
        let history = !matches!(purpose, Purpose::Edit { .. });
        let seq = self.pending.issue(mutation.interval_id(), history);
        metrics::gauge!(observability::PENDING_REQUESTS).set(self.pending.len() as f64);
        debug!("issued #{seq}: {mutation}");
        PendingRequest {
            seq,
            mutation,
            purpose,
        }
    }

    /// Apply the gateway's answer to `ticket`. Nothing changes locally before
    /// this is called with `Ok`.
    pub fn resolve(
        &mut self,
        ticket: &PendingRequest,
        result: Result<Interval, GatewayError>,
    ) -> Resolution {
        let interval_id = ticket.interval_id().clone();
        let kind = mutation_label(&ticket.mutation);
        let freshness = self.pending.resolve(&interval_id, ticket.seq, result.is_ok());
        metrics::gauge!(observability::PENDING_REQUESTS).set(self.pending.len() as f64);
        if freshness == Freshness::Stale {
            metrics::counter!(observability::STALE_RESPONSES_TOTAL).increment(1);
            debug!("discarding stale response #{} for {interval_id}", ticket.seq);
            return Resolution::Stale;
        }

        if let Err(err) = result {
            metrics::counter!(observability::MUTATIONS_TOTAL, "kind" => kind, "outcome" => "rejected")
                .increment(1);
            warn!("{} rejected: {err}", ticket.mutation);
            self.notify.notify(Notice::ConfirmationFailed {
                interval_id,
                reason: err.0.clone(),
            });
            return Resolution::Rejected { reason: err.0 };
        }

        if self.intervals.get(&interval_id).is_none() {
            metrics::counter!(observability::MUTATIONS_TOTAL, "kind" => kind, "outcome" => "gone")
                .increment(1);
            info!("{} confirmed after {interval_id} was removed, ignoring", ticket.mutation);
            return Resolution::Gone;
        }

        let entry_id = match &ticket.purpose {
            Purpose::Edit { inverse } => {
                self.intervals_mut().apply(&ticket.mutation);
                let entry = HistoryEntry::new(ticket.mutation.clone(), inverse.clone());
                let id = entry.id;
                self.history.perform(entry);
                id
            }
            Purpose::Undo { entry_id } => {
                self.revision.intervals += 1;
                if self.history.peek_undo().map(|e| e.id) == Some(*entry_id) {
                    self.history.undo(&mut self.intervals);
                } else {
                    // History was cleared meanwhile; still mirror the confirmed change.
                    self.intervals.apply(&ticket.mutation);
                }
                metrics::counter!(observability::HISTORY_OPS_TOTAL, "op" => "undo").increment(1);
                *entry_id
            }
            Purpose::Redo { entry_id } => {
                self.revision.intervals += 1;
                if self.history.peek_redo().map(|e| e.id) == Some(*entry_id) {
                    self.history.redo(&mut self.intervals);
                } else {
                    self.intervals.apply(&ticket.mutation);
                }
                metrics::counter!(observability::HISTORY_OPS_TOTAL, "op" => "redo").increment(1);
                *entry_id
            }
        };
        self.after_confirmed_change();

        metrics::counter!(observability::MUTATIONS_TOTAL, "kind" => kind, "outcome" => "applied")
            .increment(1);
        let summary = ticket.mutation.to_string();
        info!("{summary} confirmed ({})", ticket.purpose.label());
        self.notify.notify(Notice::Applied {
            interval_id,
            summary,
        });
        Resolution::Applied { entry_id }
    }

    /// Dispatch `ticket` to `gateway` and apply the answer.
    pub async fn submit(
        &mut self,
        gateway: &dyn PersistenceGateway,
        ticket: PendingRequest,
    ) -> Resolution {
        let result = dispatch(gateway, &ticket.mutation).await;
        self.resolve(&ticket, result)
    }
}

/// Whether `[start, end)` keeps clear of room blocks. Blocks the booking
/// already sits on are tolerated so it can still shrink away from them.
fn stays_clear(room: Option<&Resource>, current: Option<&Interval>, start: Day, end: Day) -> bool {
    let Some(room) = room else {
        return true;
    };
    room.blocks.iter().all(|b| {
        !b.overlaps(start, end) || current.is_some_and(|i| b.overlaps(i.start, i.end))
    })
}
