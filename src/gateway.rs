use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::*;

/// Rejection from the booking authority. The message is shown to the operator as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError(pub String);

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GatewayError {}

/// The authoritative booking store. Each call is a single-shot request.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn reassign_interval(
        &self,
        interval_id: &IntervalId,
        resource_id: &ResourceId,
    ) -> Result<Interval, GatewayError>;

    async fn reschedule_interval(
        &self,
        interval_id: &IntervalId,
        edge: Edge,
        date: Day,
    ) -> Result<Interval, GatewayError>;
}

/// Route a mutation to the matching gateway call.
pub async fn dispatch(
    gateway: &dyn PersistenceGateway,
    mutation: &Mutation,
) -> Result<Interval, GatewayError> {
    match mutation {
        Mutation::Reassign {
            interval_id,
            resource_id,
        } => gateway.reassign_interval(interval_id, resource_id).await,
        Mutation::Reschedule {
            interval_id,
            edge,
            date,
        } => gateway.reschedule_interval(interval_id, *edge, *date).await,
    }
}

/// Supplies the current resource set. Read whenever the chart refreshes rows.
pub trait ResourceProvider {
    fn resources(&self) -> Vec<Resource>;
}

impl ResourceProvider for Vec<Resource> {
    fn resources(&self) -> Vec<Resource> {
        self.clone()
    }
}

/// In-process booking authority. Arbitrates overlaps the way a real backend would,
/// and lets tests script rejections.
pub struct InMemoryGateway {
    intervals: DashMap<IntervalId, Interval>,
    resources: DashMap<ResourceId, Resource>,
    /// interval id → reason for its next request to fail
    scripted_failures: DashMap<IntervalId, String>,
    reassign_calls: AtomicUsize,
    reschedule_calls: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new(resources: Vec<Resource>, intervals: Vec<Interval>) -> Self {
        Self {
            intervals: intervals.into_iter().map(|i| (i.id.clone(), i)).collect(),
            resources: resources.into_iter().map(|r| (r.id.clone(), r)).collect(),
            scripted_failures: DashMap::new(),
            reassign_calls: AtomicUsize::new(0),
            reschedule_calls: AtomicUsize::new(0),
        }
    }

    /// Make the next request touching `interval_id` fail with `reason`.
    pub fn fail_next(&self, interval_id: &IntervalId, reason: impl Into<String>) {
        self.scripted_failures.insert(interval_id.clone(), reason.into());
    }

    pub fn reassign_calls(&self) -> usize {
        self.reassign_calls.load(Ordering::SeqCst)
    }

    pub fn reschedule_calls(&self) -> usize {
        self.reschedule_calls.load(Ordering::SeqCst)
    }

    pub fn interval(&self, id: &IntervalId) -> Option<Interval> {
        self.intervals.get(id).map(|e| e.value().clone())
    }

    pub fn intervals(&self) -> Vec<Interval> {
        let mut out: Vec<Interval> = self.intervals.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| (a.start, &a.id).cmp(&(b.start, &b.id)));
        out
    }

    /// Change a room's housekeeping status, as the front desk would.
    pub fn set_resource_status(&self, id: &ResourceId, status: ResourceStatus) {
        if let Some(mut r) = self.resources.get_mut(id) {
            r.status = status;
        }
    }

    fn take_scripted_failure(&self, id: &IntervalId) -> Result<(), GatewayError> {
        match self.scripted_failures.remove(id) {
            Some((_, reason)) => Err(GatewayError(reason)),
            None => Ok(()),
        }
    }

    fn current(&self, id: &IntervalId) -> Result<Interval, GatewayError> {
        self.interval(id)
            .ok_or_else(|| GatewayError(format!("booking {id} not found")))
    }

    /// Reject if `candidate` overlaps another live booking on its resource.
    fn check_no_conflict(&self, candidate: &Interval) -> Result<(), GatewayError> {
        let clash = self.intervals.iter().find(|e| {
            let other = e.value();
            other.id != candidate.id
                && other.resource_id == candidate.resource_id
                && other.status.can_conflict()
                && other.overlaps(candidate)
        });
        match clash {
            Some(e) => Err(GatewayError(format!(
                "room {} is already booked {}..{} ({})",
                candidate.resource_id,
                e.value().start,
                e.value().end,
                e.key()
            ))),
            None => Ok(()),
        }
    }

    fn store(&self, interval: Interval) -> Interval {
        self.intervals.insert(interval.id.clone(), interval.clone());
        interval
    }
}

impl ResourceProvider for InMemoryGateway {
    fn resources(&self) -> Vec<Resource> {
        let mut out: Vec<Resource> = self.resources.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| crate::grid::natural_cmp(&a.label, &b.label));
        out
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn reassign_interval(
        &self,
        interval_id: &IntervalId,
        resource_id: &ResourceId,
    ) -> Result<Interval, GatewayError> {
        self.reassign_calls.fetch_add(1, Ordering::SeqCst);
        self.take_scripted_failure(interval_id)?;
        if !self.resources.contains_key(resource_id) {
            return Err(GatewayError(format!("room {resource_id} not found")));
        }
        let mut updated = self.current(interval_id)?;
        updated.resource_id = resource_id.clone();
        self.check_no_conflict(&updated)?;
        Ok(self.store(updated))
    }

    async fn reschedule_interval(
        &self,
        interval_id: &IntervalId,
        edge: Edge,
        date: Day,
    ) -> Result<Interval, GatewayError> {
        self.reschedule_calls.fetch_add(1, Ordering::SeqCst);
        self.take_scripted_failure(interval_id)?;
        let mut updated = self.current(interval_id)?;
        match edge {
            Edge::Start => updated.start = date,
            Edge::End => updated.end = date,
        }
        if !updated.is_well_formed() {
            return Err(GatewayError(format!(
                "check-in {} must be before check-out {}",
                updated.start, updated.end
            )));
        }
        self.check_no_conflict(&updated)?;
        Ok(self.store(updated))
    }
}
