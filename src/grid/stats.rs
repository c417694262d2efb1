use serde::Serialize;

use crate::model::{Day, IntervalSet};

use super::{ResourceIndex, TimelineWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Occupancy {
    pub occupied_nights: u64,
    pub total_nights: u64,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
}

/// Occupied room-nights over visible rows × visible days.
pub fn occupancy(intervals: &IntervalSet, index: &ResourceIndex, window: &TimelineWindow) -> Occupancy {
    let total_nights = index.len() as u64 * window.day_count() as u64;
    if total_nights == 0 {
        return Occupancy::default();
    }
    let day_count = window.day_count() as i64;
    let occupied_nights: u64 = intervals
        .iter()
        .filter(|i| i.status.occupies() && i.is_well_formed() && index.contains(&i.resource_id))
        .map(|i| {
            let start = window.offset_of(i.start).max(0);
            let end = window.offset_of(i.end).min(day_count);
            (end - start).max(0) as u64
        })
        .sum();
    let percentage = ((occupied_nights * 100 + total_nights / 2) / total_nights) as u32;
    Occupancy {
        occupied_nights,
        total_nights,
        percentage,
    }
}

/// Front-desk counts for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DailyMovements {
    pub arrivals: usize,
    pub departures: usize,
    pub in_house: usize,
}

pub fn daily_movements(intervals: &IntervalSet, on: Day) -> DailyMovements {
    let mut out = DailyMovements::default();
    for i in intervals.iter().filter(|i| i.status.occupies()) {
        if i.start == on {
            out.arrivals += 1;
        }
        if i.end == on {
            out.departures += 1;
        }
        if i.start <= on && on < i.end {
            out.in_house += 1;
        }
    }
    out
}
