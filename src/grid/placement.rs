use serde::{Deserialize, Serialize};

use crate::model::{Day, Interval, IntervalId};

use super::{ResourceIndex, TimelineWindow};

/// Row/column geometry of one booking under the current window and row order.
/// Columns are half-open: `column_start < column_end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Placement {
    pub interval_id: IntervalId,
    pub row: usize,
    pub column_start: u32,
    pub column_end: u32,
    /// Booking starts before the window.
    pub clipped_left: bool,
    /// Booking ends after the window.
    pub clipped_right: bool,
    /// Set by the conflict detector; advisory only.
    pub conflicting: bool,
}

impl Placement {
    pub fn width(&self) -> u32 {
        self.column_end - self.column_start
    }
}

/// Column span of `[start, end)` after clipping to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Clipped {
    pub column_start: u32,
    pub column_end: u32,
    pub clipped_left: bool,
    pub clipped_right: bool,
}

/// `None` when the span is empty or lies wholly outside the window.
pub(super) fn clip(start: Day, end: Day, window: &TimelineWindow) -> Option<Clipped> {
    if start >= end {
        return None;
    }
    let day_count = window.day_count() as i64;
    let start = window.offset_of(start);
    let end = window.offset_of(end);
    // Fully before or fully after the window.
    if end <= 0 || start >= day_count {
        return None;
    }
    let (column_start, clipped_left) = if start < 0 { (0, true) } else { (start, false) };
    let (column_end, clipped_right) = if end > day_count {
        (day_count, true)
    } else {
        (end, false)
    };
    if column_start >= column_end {
        return None;
    }
    Some(Clipped {
        column_start: column_start as u32,
        column_end: column_end as u32,
        clipped_left,
        clipped_right,
    })
}

/// Place a single interval on `row`, clipping to the window. `None` if nothing is visible.
pub fn place(interval: &Interval, row: usize, window: &TimelineWindow) -> Option<Placement> {
    let span = clip(interval.start, interval.end, window)?;
    Some(Placement {
        interval_id: interval.id.clone(),
        row,
        column_start: span.column_start,
        column_end: span.column_end,
        clipped_left: span.clipped_left,
        clipped_right: span.clipped_right,
        conflicting: false,
    })
}

/// Compute placements for every visible interval.
///
/// Intervals on resources missing from `index` are dropped, as are intervals
/// that violate `start < end` or fall entirely outside `window`. The result is
/// sorted by `(row, column_start, interval_id)` so it does not depend on input order.
pub fn placements<'a>(
    intervals: impl IntoIterator<Item = &'a Interval>,
    index: &ResourceIndex,
    window: &TimelineWindow,
) -> Vec<Placement> {
    let mut out: Vec<Placement> = intervals
        .into_iter()
        .filter_map(|interval| {
            let row = index.row_of(&interval.resource_id)?;
            place(interval, row, window)
        })
        .collect();
    out.sort_by(|a, b| {
        (a.row, a.column_start, &a.interval_id).cmp(&(b.row, b.column_start, &b.interval_id))
    });
    out
}

/// Booking-level filters from the search panel, applied before placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalFilter {
    /// Case-insensitive substring of the guest label.
    pub guest_text: String,
    /// Only bookings that belong to a group.
    pub groups_only: bool,
    pub group_tag: Option<String>,
}

impl IntervalFilter {
    pub fn is_empty(&self) -> bool {
        self.guest_text.trim().is_empty() && !self.groups_only && self.group_tag.is_none()
    }

    pub fn matches(&self, interval: &Interval) -> bool {
        let deco = &interval.decoration;
        if self.groups_only && deco.group_tag.is_none() {
            return false;
        }
        if let Some(tag) = &self.group_tag
            && deco.group_tag.as_ref() != Some(tag)
        {
            return false;
        }
        let term = self.guest_text.trim().to_lowercase();
        if !term.is_empty() {
            let Some(label) = &deco.guest_label else {
                return false;
            };
            if !label.to_lowercase().contains(&term) {
                return false;
            }
        }
        true
    }
}
