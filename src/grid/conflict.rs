use std::collections::{BTreeMap, HashSet};

use crate::model::{Interval, IntervalId, IntervalSet};

use super::Placement;

/// Ids of placed bookings that strictly overlap another booking on the same row.
///
/// Each row is swept in start order against the booking reaching furthest so
/// far, so a short stay nested inside a long one is compared with the long one
/// rather than only with its immediate predecessor. Touching boundaries
/// (`next.start == previous.end`) never conflict. Cancelled and no-show
/// bookings are ignored.
pub fn conflicting_ids(placements: &[Placement], intervals: &IntervalSet) -> HashSet<IntervalId> {
    let mut rows: BTreeMap<usize, Vec<&Interval>> = BTreeMap::new();
    for p in placements {
        if let Some(interval) = intervals.get(&p.interval_id)
            && interval.status.can_conflict()
        {
            rows.entry(p.row).or_default().push(interval);
        }
    }

    let mut conflicts = HashSet::new();
    for row in rows.values_mut() {
        row.sort_by(|a, b| (a.start, a.end, &a.id).cmp(&(b.start, b.end, &b.id)));
        let mut reach: Option<&Interval> = None;
        for &next in row.iter() {
            if let Some(previous) = reach {
                if next.start < previous.end {
                    conflicts.insert(previous.id.clone());
                    conflicts.insert(next.id.clone());
                }
                if next.end > previous.end {
                    reach = Some(next);
                }
            } else {
                reach = Some(next);
            }
        }
    }
    conflicts
}

/// Set `conflicting` on every placement whose booking overlaps another.
pub fn annotate(placements: &mut [Placement], intervals: &IntervalSet) -> usize {
    let conflicts = conflicting_ids(placements, intervals);
    for p in placements.iter_mut() {
        p.conflicting = conflicts.contains(&p.interval_id);
    }
    conflicts.len()
}
