use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::broadcast;

use tapechart::chart::{ChartError, Interaction, PendingRequest, Resolution, TapeChart};
use tapechart::config::ChartConfig;
use tapechart::gateway::{dispatch, GatewayError, InMemoryGateway, PersistenceGateway};
use tapechart::grid::ResourceFilter;
use tapechart::label::{compose_label, DecorationProvider, NightlyRates};
use tapechart::model::*;
use tapechart::notify::{Notice, NotifyHub};

// ── Test infrastructure ──────────────────────────────────────

fn day(s: &str) -> Day {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

const FIXTURE: &str = r#"{
    "resources": [
        { "id": "r-101", "label": "101", "category": "Double", "status": "AVAILABLE" },
        { "id": "r-102", "label": "102", "category": "Double", "status": "AVAILABLE",
          "features": ["balcony"] },
        { "id": "r-9", "label": "9", "category": "Single", "status": "INSPECTED" },
        { "id": "r-201", "label": "201", "category": "Suite", "status": "OUT_OF_SERVICE",
          "status_reason": "Water damage" }
    ],
    "intervals": [
        { "id": "A", "resource_id": "r-101", "start": "2026-02-07", "end": "2026-02-09",
          "status": "PENDING",
          "decoration": { "guest_label": "Kowalski, Jan", "pax": 2 } },
        { "id": "B", "resource_id": "r-102", "start": "2026-02-10", "end": "2026-02-14",
          "status": "ACTIVE" },
        { "id": "C", "resource_id": "r-9", "start": "2026-02-01", "end": "2026-02-03",
          "status": "COMPLETED" }
    ]
}"#;

#[derive(serde::Deserialize)]
struct Fixture {
    resources: Vec<Resource>,
    intervals: Vec<Interval>,
}

fn load() -> (TapeChart, Arc<InMemoryGateway>, broadcast::Receiver<Notice>) {
    let fixture: Fixture = serde_json::from_str(FIXTURE).unwrap();
    let hub = Arc::new(NotifyHub::new());
    let rx = hub.subscribe();
    let mut chart = TapeChart::new(&ChartConfig::default(), day("2026-02-07"), hub).unwrap();
    let gateway = Arc::new(InMemoryGateway::new(
        fixture.resources.clone(),
        fixture.intervals.clone(),
    ));
    chart.hydrate(fixture.resources, fixture.intervals);
    (chart, gateway, rx)
}

async fn next_notice(rx: &mut broadcast::Receiver<Notice>) -> Notice {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notice timed out")
        .unwrap()
}

/// Yields before answering so concurrent requests interleave.
struct GatedGateway {
    inner: InMemoryGateway,
    calls: AtomicUsize,
}

#[async_trait]
impl PersistenceGateway for GatedGateway {
    async fn reassign_interval(
        &self,
        interval_id: &IntervalId,
        resource_id: &ResourceId,
    ) -> Result<Interval, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.reassign_interval(interval_id, resource_id).await
    }

    async fn reschedule_interval(
        &self,
        interval_id: &IntervalId,
        edge: Edge,
        date: Day,
    ) -> Result<Interval, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.reschedule_interval(interval_id, edge, date).await
    }
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn fixture_renders_with_natural_grouping() {
    let (mut chart, _, _) = load();
    chart.set_filter(ResourceFilter {
        group_by_category: true,
        ..Default::default()
    });
    let labels: Vec<_> = chart.rows().rows().iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["101", "102", "9", "201"]);

    let placed = chart.placements();
    // C ended before the window
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].interval_id, "A".into());
    assert_eq!((placed[0].row, placed[0].column_start, placed[0].column_end), (0, 0, 2));
    assert_eq!((placed[1].row, placed[1].column_start, placed[1].column_end), (1, 3, 7));
}

#[tokio::test]
async fn move_resize_undo_redo_end_to_end() {
    let (mut chart, gateway, mut rx) = load();

    chart.begin_move(&"A".into()).unwrap();
    chart.hover_move(Some(&"r-9".into()));
    let ticket = chart
        .drop_move(Some(&"r-9".into()))
        .into_request()
        .unwrap();
    let resolution = chart.submit(gateway.as_ref(), ticket).await;
    assert!(matches!(resolution, Resolution::Applied { .. }));
    assert!(matches!(next_notice(&mut rx).await, Notice::Applied { .. }));

    chart.begin_resize(&"A".into(), Edge::End).unwrap();
    chart.track_resize(4.2);
    let ticket = chart.release_resize().into_request().unwrap();
    chart.submit(gateway.as_ref(), ticket).await;
    next_notice(&mut rx).await;

    let a = chart.interval(&"A".into()).unwrap().clone();
    assert_eq!(a.resource_id, "r-9".into());
    assert_eq!(a.end, day("2026-02-11"));
    assert_eq!(gateway.interval(&"A".into()), Some(a.clone()));

    // undo the resize, then the move
    chart.undo(gateway.as_ref()).await.unwrap();
    chart.undo(gateway.as_ref()).await.unwrap();
    let a = chart.interval(&"A".into()).unwrap();
    assert_eq!(a.resource_id, "r-101".into());
    assert_eq!(a.end, day("2026-02-09"));
    assert_eq!(gateway.interval(&"A".into()).unwrap().resource_id, "r-101".into());

    chart.redo(gateway.as_ref()).await.unwrap();
    assert_eq!(chart.interval(&"A".into()).unwrap().resource_id, "r-9".into());
    assert!(chart.can_redo());
}

#[tokio::test]
async fn out_of_service_room_never_reaches_gateway() {
    let (mut chart, gateway, mut rx) = load();
    chart.begin_move(&"A".into()).unwrap();
    let outcome = chart.drop_move(Some(&"r-201".into()));
    assert!(matches!(outcome, Interaction::Rejected(_)));
    assert_eq!(gateway.reassign_calls(), 0);

    let Notice::GuardRejected { message, status, .. } = next_notice(&mut rx).await else {
        panic!("expected guard notice");
    };
    assert_eq!(status, ResourceStatus::OutOfService);
    assert!(message.contains("Water damage"));
}

#[tokio::test]
async fn authority_conflict_is_reported_verbatim() {
    let (mut chart, gateway, mut rx) = load();
    // B occupies 102 from 02-10; stretching A into it is refused upstream.
    chart.begin_move(&"A".into()).unwrap();
    let ticket = chart.drop_move(Some(&"r-102".into())).into_request().unwrap();
    chart.submit(gateway.as_ref(), ticket).await;
    next_notice(&mut rx).await;

    chart.begin_resize(&"A".into(), Edge::End).unwrap();
    assert!(chart.propose_resize_date(day("2026-02-12")));
    let ticket = chart.release_resize().into_request().unwrap();
    let Resolution::Rejected { reason } = chart.submit(gateway.as_ref(), ticket).await else {
        panic!("expected rejection");
    };
    assert!(reason.contains("already booked"));
    match next_notice(&mut rx).await {
        Notice::ConfirmationFailed { reason: shown, .. } => assert_eq!(shown, reason),
        other => panic!("unexpected notice {other:?}"),
    }
    assert_eq!(chart.interval(&"A".into()).unwrap().end, day("2026-02-09"));
}

#[tokio::test]
async fn concurrent_tickets_resolve_in_any_order() {
    let (mut chart, inner, _) = load();
    let gateway = Arc::new(GatedGateway {
        inner: InMemoryGateway::new(chart.resources().to_vec(), inner.intervals()),
        calls: AtomicUsize::new(0),
    });

    chart.begin_move(&"A".into()).unwrap();
    let first = chart.drop_move(Some(&"r-9".into())).into_request().unwrap();
    chart.begin_resize(&"B".into(), Edge::Start).unwrap();
    chart.propose_resize_date(day("2026-02-11"));
    let second = chart.release_resize().into_request().unwrap();
    assert!(second.seq > first.seq);

    let (r1, r2) = tokio::join!(
        dispatch(gateway.as_ref(), &first.mutation),
        dispatch(gateway.as_ref(), &second.mutation)
    );
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);

    // answers arrive newest first
    assert!(matches!(chart.resolve(&second, r2), Resolution::Applied { .. }));
    assert!(matches!(chart.resolve(&first, r1), Resolution::Applied { .. }));
    assert_eq!(chart.interval(&"A".into()).unwrap().resource_id, "r-9".into());
    assert_eq!(chart.interval(&"B".into()).unwrap().start, day("2026-02-11"));
    assert_eq!(chart.history().past_len(), 2);
}

#[tokio::test]
async fn stale_duplicate_is_ignored() {
    let (mut chart, gateway, _) = load();
    chart.begin_move(&"A".into()).unwrap();
    let ticket: PendingRequest = chart.drop_move(Some(&"r-9".into())).into_request().unwrap();
    let answer = dispatch(gateway.as_ref(), &ticket.mutation).await;

    assert!(matches!(chart.resolve(&ticket, answer.clone()), Resolution::Applied { .. }));
    assert_eq!(chart.resolve(&ticket, answer), Resolution::Stale);
    assert_eq!(chart.history().past_len(), 1);
}

#[tokio::test]
async fn completed_booking_is_read_only() {
    let (mut chart, _, _) = load();
    assert!(matches!(
        chart.begin_move(&"C".into()),
        Err(ChartError::NotEditable { .. })
    ));
}

#[test]
fn labels_use_rate_card() {
    let (chart, _, _) = load();
    let rates = NightlyRates::new(HashMap::from([(ResourceId::from("r-101"), 180)]));
    let a = chart.interval(&"A".into()).unwrap();
    let label = compose_label(a, &rates.decoration(a), true);
    assert_eq!(label.title, "K*****i, J. (private) (2 pax)");
    assert_eq!(label.subtitle.as_deref(), Some("180/night · 360"));
}

#[test]
fn undo_via_blocking_harness() {
    let (mut chart, gateway, _) = load();
    tokio_test::block_on(async {
        chart.begin_move(&"A".into()).unwrap();
        let ticket = chart.drop_move(Some(&"r-9".into())).into_request().unwrap();
        chart.submit(gateway.as_ref(), ticket).await;
        assert_eq!(
            chart.undo(gateway.as_ref()).await.unwrap().map(|r| matches!(r, Resolution::Applied { .. })),
            Some(true)
        );
    });
    assert_eq!(chart.interval(&"A".into()).unwrap().resource_id, "r-101".into());
}
