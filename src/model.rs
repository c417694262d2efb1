use std::fmt;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// Calendar day. The chart never reasons below one day.
pub type Day = NaiveDate;

/// Add a signed number of days, saturating at the calendar bounds.
pub fn add_days(day: Day, delta: i64) -> Day {
    TimeDelta::try_days(delta)
        .and_then(|d| day.checked_add_signed(d))
        .unwrap_or(if delta < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: Day, to: Day) -> i64 {
    to.signed_duration_since(from).num_days()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(pub String);

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for IntervalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Housekeeping status of a room, owned by the resource provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Available,
    NeedsCleaning,
    OutOfService,
    UnderInspection,
    Inspected,
    CheckoutPending,
    Maintenance,
}

impl ResourceStatus {
    /// Whether a booking may be dragged onto a resource in this status.
    pub fn accepts_moves(self) -> bool {
        !matches!(self, ResourceStatus::NeedsCleaning | ResourceStatus::OutOfService)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Available => "AVAILABLE",
            ResourceStatus::NeedsCleaning => "NEEDS_CLEANING",
            ResourceStatus::OutOfService => "OUT_OF_SERVICE",
            ResourceStatus::UnderInspection => "UNDER_INSPECTION",
            ResourceStatus::Inspected => "INSPECTED",
            ResourceStatus::CheckoutPending => "CHECKOUT_PENDING",
            ResourceStatus::Maintenance => "MAINTENANCE",
        }
    }
}

/// A schedulable unit (a room). One grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub label: String,
    /// Room class, e.g. "Double" or "Suite".
    pub category: String,
    pub status: ResourceStatus,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub floor: Option<String>,
    /// Free-text explanation for the status, e.g. "Broken AC" when out of service.
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Resource {
    pub fn new(id: impl Into<String>, label: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: ResourceId(id.into()),
            label: label.into(),
            category: category.into(),
            status: ResourceStatus::Available,
            features: Vec::new(),
            floor: None,
            status_reason: None,
            blocks: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f.eq_ignore_ascii_case(feature))
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// First block overlapping `[start, end)`.
    pub fn block_during(&self, start: Day, end: Day) -> Option<&Block> {
        self.blocks.iter().find(|b| b.overlaps(start, end))
    }
}

/// Operator hold on a room (renovation, owner use), half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub id: Option<String>,
    pub start: Day,
    pub end: Day,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Block {
    pub fn new(start: Day, end: Day) -> Self {
        Self {
            id: None,
            start,
            end,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn overlaps(&self, start: Day, end: Day) -> bool {
        self.start < end && start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Confirmed, guest not yet arrived.
    Pending,
    /// Guest checked in.
    Active,
    /// Guest checked out.
    Completed,
    Cancelled,
    NoShow,
}

impl LifecycleStatus {
    /// Only upcoming and in-house bookings can be moved or resized.
    pub fn is_editable(self) -> bool {
        matches!(self, LifecycleStatus::Pending | LifecycleStatus::Active)
    }

    /// Whether the booking occupies its room for occupancy figures and free-room filtering.
    pub fn occupies(self) -> bool {
        matches!(
            self,
            LifecycleStatus::Pending | LifecycleStatus::Active | LifecycleStatus::Completed
        )
    }

    /// Cancelled and no-show bookings never count as overlapping.
    pub fn can_conflict(self) -> bool {
        !matches!(self, LifecycleStatus::Cancelled | LifecycleStatus::NoShow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

/// Display metadata attached by external decorators. Never used for placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decoration {
    pub guest_label: Option<String>,
    pub pax: Option<u32>,
    /// Price per night in whole currency units.
    pub price_per_night: Option<u64>,
    pub total_amount: Option<u64>,
    pub payment: Option<PaymentStatus>,
    pub group_tag: Option<String>,
    pub vip: bool,
    /// Mask the guest name on this booking even outside privacy mode.
    pub private: bool,
}

/// Which date edge of a booking a resize acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    End,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Start => f.write_str("start"),
            Edge::End => f.write_str("end"),
        }
    }
}

/// A booking on a resource, half-open `[start, end)` in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub id: IntervalId,
    pub resource_id: ResourceId,
    pub start: Day,
    pub end: Day,
    pub status: LifecycleStatus,
    #[serde(default)]
    pub decoration: Decoration,
}

impl Interval {
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        start: Day,
        end: Day,
        status: LifecycleStatus,
    ) -> Self {
        Self {
            id: IntervalId(id.into()),
            resource_id: ResourceId(resource_id.into()),
            start,
            end,
            status,
            decoration: Decoration::default(),
        }
    }

    /// `start < end`. Intervals failing this are never placed.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn nights(&self) -> i64 {
        days_between(self.start, self.end)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn edge(&self, edge: Edge) -> Day {
        match edge {
            Edge::Start => self.start,
            Edge::End => self.end,
        }
    }
}

/// A reversible change to one interval. History entries pair a forward and an inverse op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    Reassign {
        interval_id: IntervalId,
        resource_id: ResourceId,
    },
    Reschedule {
        interval_id: IntervalId,
        edge: Edge,
        date: Day,
    },
}

impl Mutation {
    pub fn interval_id(&self) -> &IntervalId {
        match self {
            Mutation::Reassign { interval_id, .. } | Mutation::Reschedule { interval_id, .. } => {
                interval_id
            }
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Reassign {
                interval_id,
                resource_id,
            } => write!(f, "reassign {interval_id} to {resource_id}"),
            Mutation::Reschedule {
                interval_id,
                edge,
                date,
            } => write!(f, "reschedule {interval_id} {edge} to {date}"),
        }
    }
}

/// All bookings known to the chart, sorted by `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(intervals: Vec<Interval>) -> Self {
        let mut set = Self::new();
        for i in intervals {
            set.upsert(i);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn get(&self, id: &IntervalId) -> Option<&Interval> {
        self.intervals.iter().find(|i| &i.id == id)
    }

    /// Insert or replace by id, keeping sort order by `start`.
    pub fn upsert(&mut self, interval: Interval) {
        self.remove(&interval.id);
        let pos = self
            .intervals
            .partition_point(|i| i.start <= interval.start);
        self.intervals.insert(pos, interval);
    }

    pub fn remove(&mut self, id: &IntervalId) -> Option<Interval> {
        let pos = self.intervals.iter().position(|i| &i.id == id)?;
        Some(self.intervals.remove(pos))
    }

    /// Intervals on `resource_id` overlapping `[start, end)`.
    /// Binary search skips everything starting at or after `end`.
    pub fn overlapping<'a>(
        &'a self,
        resource_id: &'a ResourceId,
        start: Day,
        end: Day,
    ) -> impl Iterator<Item = &'a Interval> {
        let right_bound = self.intervals.partition_point(|i| i.start < end);
        self.intervals[..right_bound]
            .iter()
            .filter(move |i| &i.resource_id == resource_id && i.end > start)
    }

    /// Apply a mutation in place. Returns false if the interval is unknown.
    pub fn apply(&mut self, mutation: &Mutation) -> bool {
        let Some(mut interval) = self.remove(mutation.interval_id()) else {
            return false;
        };
        match mutation {
            Mutation::Reassign { resource_id, .. } => interval.resource_id = resource_id.clone(),
            Mutation::Reschedule { edge, date, .. } => match edge {
                Edge::Start => interval.start = *date,
                Edge::End => interval.end = *date,
            },
        }
        self.upsert(interval);
        true
    }
}

#[cfg(test)]
pub(crate) fn day(s: &str) -> Day {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
