mod error;
mod history;
mod interactions;
mod moves;
mod pending;
mod resize;

pub use error::ChartError;
pub use history::{ApplyMutation, HistoryEntry, HistoryStore};
pub use interactions::{Interaction, PendingRequest, Purpose, Resolution};
pub use moves::{DragMoveController, DropOutcome, GuardRejection, MoveState};
pub use pending::{Freshness, PendingRegistry};
pub use resize::{DragResizeController, ResizeOutcome, ResizeState};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ChartConfig;
use crate::gateway::ResourceProvider;
use crate::grid::{self, *};
use crate::label::{compose_label, BarLabel, DecorationProvider};
use crate::model::*;
use crate::notify::NotificationSink;

/// Version counters, bumped whenever the matching input to placement changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Revision {
    pub intervals: u64,
    pub resources: u64,
    pub window: u64,
}

/// The chart session: bookings, rows, visible window, history and in-flight
/// interactions. Bookings change only through external refresh or a confirmed
/// gateway response.
pub struct TapeChart {
    resources: Vec<Resource>,
    intervals: IntervalSet,
    window: TimelineWindow,
    /// Paging step at day scale; coarser scales use their own step.
    base_step: i64,
    scale: ViewScale,
    filter: ResourceFilter,
    interval_filter: IntervalFilter,
    index: ResourceIndex,
    history: HistoryStore,
    moves: DragMoveController,
    resizes: DragResizeController,
    pending: PendingRegistry,
    focus: Option<FocusedCell>,
    notify: Arc<dyn NotificationSink>,
    revision: Revision,
}

impl TapeChart {
    pub fn new(
        config: &ChartConfig,
        start: Day,
        notify: Arc<dyn NotificationSink>,
    ) -> Result<Self, ChartError> {
        let window = TimelineWindow::new(start, config.day_count)?;
        Ok(Self {
            resources: Vec::new(),
            intervals: IntervalSet::new(),
            window,
            base_step: config.page_step.max(1),
            scale: ViewScale::default(),
            filter: ResourceFilter::default(),
            interval_filter: IntervalFilter::default(),
            index: ResourceIndex::default(),
            history: HistoryStore::new(config.history_limit),
            moves: DragMoveController::new(),
            resizes: DragResizeController::new(),
            pending: PendingRegistry::new(),
            focus: None,
            notify,
            revision: Revision::default(),
        })
    }

    // ── External refresh ─────────────────────────────────────

    /// Replace every resource and booking, e.g. on first load. Clears history
    /// and abandons any drag in progress.
    pub fn hydrate(&mut self, resources: Vec<Resource>, intervals: Vec<Interval>) {
        self.resources = resources;
        self.intervals = IntervalSet::from_vec(intervals);
        self.history.clear();
        self.moves.cancel();
        self.resizes.cancel();
        self.revision.resources += 1;
        self.revision.intervals += 1;
        self.reindex();
        info!(
            "hydrated {} resources, {} bookings",
            self.resources.len(),
            self.intervals.len()
        );
    }

    pub fn refresh_resources(&mut self, resources: Vec<Resource>) {
        self.resources = resources;
        self.revision.resources += 1;
        self.reindex();
        debug!("resources refreshed: {}", self.resources.len());
    }

    pub fn refresh_resources_from(&mut self, provider: &dyn ResourceProvider) {
        self.refresh_resources(provider.resources());
    }

    /// Merge a booking pushed by the external source. A drag on it is
    /// abandoned, since it was started against the old dates and room.
    pub fn upsert_interval(&mut self, interval: Interval) {
        debug!("booking {} refreshed", interval.id);
        self.abandon_interactions_on(&interval.id);
        self.intervals.upsert(interval);
        self.revision.intervals += 1;
        self.reindex_if_free_only();
    }

    /// Drop a booking removed upstream. A drag on it is abandoned and its
    /// history entries are discarded.
    pub fn remove_interval(&mut self, id: &IntervalId) -> Option<Interval> {
        let removed = self.intervals.remove(id)?;
        self.abandon_interactions_on(id);
        let forgotten = self.history.forget(id);
        if forgotten > 0 {
            debug!("dropped {forgotten} history entries for {id}");
        }
        self.pending.forget(id);
        self.revision.intervals += 1;
        self.reindex_if_free_only();
        debug!("booking {id} removed");
        Some(removed)
    }

    fn abandon_interactions_on(&mut self, id: &IntervalId) {
        if self.moves.active() == Some(id) {
            self.moves.cancel();
            debug!("move of {id} abandoned on refresh");
        }
        if self.resizes.active() == Some(id) {
            self.resizes.cancel();
            debug!("resize of {id} abandoned on refresh");
        }
    }

    pub fn set_filter(&mut self, filter: ResourceFilter) {
        self.filter = filter;
        self.reindex();
    }

    pub fn set_interval_filter(&mut self, filter: IntervalFilter) {
        self.interval_filter = filter;
        self.revision.intervals += 1;
    }

    fn reindex(&mut self) {
        let occupied = self
            .filter
            .free_only
            .then(|| occupied_resources(&self.intervals, &self.window));
        self.index = ResourceIndex::build(&self.resources, &self.filter, occupied.as_ref());
        self.focus = self
            .focus
            .and_then(|f| f.clamp(self.index.len(), self.window.day_count()));
        self.revision.resources += 1;
    }

    fn reindex_if_free_only(&mut self) {
        if self.filter.free_only {
            self.reindex();
        }
    }

    // ── Navigation ───────────────────────────────────────────

    pub fn page_step(&self) -> i64 {
        match self.scale {
            ViewScale::Day => self.base_step,
            scale => scale.page_step(),
        }
    }

    pub fn prev_page(&mut self) {
        self.set_window(self.window.shift(-self.page_step()));
    }

    pub fn next_page(&mut self) {
        self.set_window(self.window.shift(self.page_step()));
    }

    /// Put `date` in column 0.
    pub fn go_to_date(&mut self, date: Day) {
        self.set_window(self.window.anchor_to(date));
    }

    pub fn go_to_today(&mut self, today: Day) {
        self.go_to_date(today);
    }

    /// Change the paging granularity. Any drag or resize in progress is abandoned.
    pub fn set_view_scale(&mut self, scale: ViewScale) {
        let dropped_move = self.moves.cancel();
        let dropped_resize = self.resizes.cancel();
        if dropped_move || dropped_resize {
            debug!("drag abandoned on scale change");
        }
        self.scale = scale;
        info!("view scale {scale:?}, paging by {} days", self.page_step());
    }

    fn set_window(&mut self, window: TimelineWindow) {
        self.window = window;
        self.revision.window += 1;
        self.reindex_if_free_only();
        info!("window now starts {}", window.start());
    }

    // ── Rendering ────────────────────────────────────────────

    /// Placements for every visible booking, with conflict flags merged in.
    pub fn placements(&self) -> Vec<Placement> {
        let started = Instant::now();
        let visible = self
            .intervals
            .iter()
            .filter(|i| self.interval_filter.matches(i));
        let mut out = grid::placements(visible, &self.index, &self.window);
        let conflicts = annotate(&mut out, &self.intervals);
        metrics::histogram!(crate::observability::PLACEMENT_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        debug!("placed {} bookings, {conflicts} conflicting", out.len());
        out
    }

    /// Preview bar for the booking being dragged: over the hovered row while
    /// moving, or with the provisional dates while resizing.
    pub fn ghost_placement(&self) -> Option<Placement> {
        if let Some(interval_id) = self.moves.active() {
            let target = self.moves.hover_target()?;
            let interval = self.intervals.get(interval_id)?;
            let row = self.index.row_of(target)?;
            return place(interval, row, &self.window);
        }
        let id = self.resizes.active()?;
        let (start, end) = self.resizes.preview()?;
        let mut interval = self.intervals.get(id)?.clone();
        interval.start = start;
        interval.end = end;
        let row = self.index.row_of(&interval.resource_id)?;
        place(&interval, row, &self.window)
    }

    /// Room blocks on the visible rows.
    pub fn block_placements(&self) -> Vec<BlockPlacement> {
        block_placements(&self.index, &self.window)
    }

    pub fn blocked_columns(&self, id: &ResourceId) -> Vec<u32> {
        self.resource(id)
            .map(|r| blocked_columns(r, &self.window))
            .unwrap_or_default()
    }

    pub fn occupancy(&self) -> Occupancy {
        occupancy(&self.intervals, &self.index, &self.window)
    }

    pub fn movements(&self, on: Day) -> DailyMovements {
        daily_movements(&self.intervals, on)
    }

    /// Bar text for one booking. `privacy_mode` masks guest names.
    pub fn label(
        &self,
        id: &IntervalId,
        decorations: &dyn DecorationProvider,
        privacy_mode: bool,
    ) -> Option<BarLabel> {
        let interval = self.intervals.get(id)?;
        let deco = decorations.decoration(interval);
        Some(compose_label(interval, &deco, privacy_mode))
    }

    // ── Keyboard focus ───────────────────────────────────────

    pub fn move_focus(&mut self, step: FocusStep) -> Option<FocusedCell> {
        self.focus = FocusedCell::step(self.focus, step, self.index.len(), self.window.day_count());
        self.focus
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    pub fn focused_cell(&self) -> Option<FocusedCell> {
        self.focus
    }

    /// Resource row and day under the keyboard cursor.
    pub fn focus_target(&self) -> Option<(&Resource, Day)> {
        let cell = self.focus?;
        let resource = self.index.resource_at(cell.row)?;
        Some((resource, self.window.date_at(cell.column)))
    }

    /// Live booking covering the focused cell, if any.
    pub fn focused_interval(&self) -> Option<&Interval> {
        let (resource, date) = self.focus_target()?;
        self.intervals
            .overlapping(&resource.id, date, add_days(date, 1))
            .find(|i| i.status.can_conflict())
    }

    // ── Accessors ────────────────────────────────────────────

    pub fn window(&self) -> &TimelineWindow {
        &self.window
    }

    pub fn scale(&self) -> ViewScale {
        self.scale
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    pub fn rows(&self) -> &ResourceIndex {
        &self.index
    }

    pub fn intervals(&self) -> &IntervalSet {
        &self.intervals
    }

    pub fn interval(&self, id: &IntervalId) -> Option<&Interval> {
        self.intervals.get(id)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_pending(&self, id: &IntervalId) -> bool {
        self.pending.is_pending(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn move_state(&self) -> &MoveState {
        self.moves.state()
    }

    pub fn resize_state(&self) -> &ResizeState {
        self.resizes.state()
    }

    pub fn resize_preview(&self) -> Option<(Day, Day)> {
        self.resizes.preview()
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    fn intervals_mut(&mut self) -> &mut IntervalSet {
        self.revision.intervals += 1;
        &mut self.intervals
    }

    fn after_confirmed_change(&mut self) {
        self.reindex_if_free_only();
    }
}
