use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use tapechart::chart::{Interaction, TapeChart};
use tapechart::config::ChartConfig;
use tapechart::gateway::InMemoryGateway;
use tapechart::label::{compose_label, DecorationProvider, Embedded};
use tapechart::model::*;
use tapechart::notify::{Notice, NotifyHub};

/// Snapshot of a property loaded at startup.
#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    window_start: Option<Day>,
    resources: Vec<Resource>,
    intervals: Vec<Interval>,
}

fn load_fixture(path: &Path) -> Result<Fixture, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn sample_fixture(today: Day) -> Fixture {
    let at = |offset: i64| add_days(today, offset);
    let mut resources = vec![
        Resource::new("101", "101", "Double"),
        Resource::new("102", "102", "Double").with_features(&["balcony"]),
        Resource::new("9", "9", "Single")
            .with_block(Block::new(at(8), at(11)).with_reason("Renovation")),
        Resource::new("201", "201", "Suite").with_features(&["balcony", "bathtub"]),
        Resource::new("202", "202", "Suite").with_status(ResourceStatus::NeedsCleaning),
    ];
    resources[4].status_reason = Some("Late checkout".into());

    let mut a = Interval::new("A", "101", at(0), at(2), LifecycleStatus::Active);
    a.decoration.guest_label = Some("Kowalski, Jan".into());
    a.decoration.pax = Some(2);
    let mut b = Interval::new("B", "101", at(1), at(4), LifecycleStatus::Pending);
    b.decoration.guest_label = Some("Novak, Eva".into());
    b.decoration.vip = true;
    let mut c = Interval::new("C", "201", at(-3), at(5), LifecycleStatus::Active);
    c.decoration.guest_label = Some("Okafor, Ade".into());
    c.decoration.group_tag = Some("conference".into());
    let d = Interval::new("D", "9", at(3), at(6), LifecycleStatus::Cancelled);

    Fixture {
        window_start: Some(today),
        resources,
        intervals: vec![a, b, c, d],
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ChartConfig::from_env();
    tapechart::observability::init(config.metrics_port);

    let today = chrono::Local::now().date_naive();
    let fixture = match &config.fixture_path {
        Some(path) => load_fixture(path)?,
        None => sample_fixture(today),
    };

    let hub = Arc::new(NotifyHub::new());
    let mut notices = hub.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match notice {
                Notice::GuardRejected { message, .. } => warn!("toast: {message}"),
                Notice::ConfirmationFailed { interval_id, reason } => {
                    warn!("toast: {interval_id} not saved: {reason}")
                }
                Notice::Applied { summary, .. } => info!("toast: {summary}"),
            }
        }
    });

    let start = fixture.window_start.unwrap_or(today);
    let mut chart = TapeChart::new(&config, start, hub.clone())?;
    let gateway = InMemoryGateway::new(fixture.resources.clone(), fixture.intervals.clone());
    chart.hydrate(fixture.resources, fixture.intervals);

    info!("tapechart ready");
    info!("  window: {} + {} days", chart.window().start(), chart.window().day_count());
    info!("  rows: {}", chart.rows().len());
    info!("  history limit: {}", chart.history().limit());

    print_grid(&chart, &Embedded);

    // Scripted session: move the first movable booking to the next row, then undo.
    let candidate = chart
        .intervals()
        .iter()
        .find(|i| i.status.is_editable())
        .map(|i| i.id.clone());
    if let Some(id) = candidate {
        chart.begin_move(&id)?;
        let row = chart
            .interval(&id)
            .and_then(|i| chart.rows().row_of(&i.resource_id))
            .unwrap_or(0);
        if let Interaction::Submitted(ticket) = chart.drop_move_at_row(row + 1) {
            let resolution = chart.submit(&gateway, ticket).await;
            info!("move {id}: {resolution:?}");
            print_grid(&chart, &Embedded);
            if let Some(resolution) = chart.undo(&gateway).await? {
                info!("undo {id}: {resolution:?}");
            }
        }
    }

    let occupancy = chart.occupancy();
    let movements = chart.movements(today);
    info!(
        "occupancy {}% ({}/{} room-nights)",
        occupancy.percentage, occupancy.occupied_nights, occupancy.total_nights
    );
    info!(
        "today: {} arrivals, {} departures, {} in house",
        movements.arrivals, movements.departures, movements.in_house
    );

    drop(chart);
    drop(hub);
    listener.await?;
    Ok(())
}

fn print_grid(chart: &TapeChart, decorations: &dyn DecorationProvider) {
    for p in chart.placements() {
        let Some(interval) = chart.interval(&p.interval_id) else {
            continue;
        };
        let room = chart
            .rows()
            .resource_at(p.row)
            .map(|r| r.label.as_str())
            .unwrap_or("?");
        let label = compose_label(interval, &decorations.decoration(interval), false);
        info!(
            "  room {room:>4} cols {:>2}..{:<2}{}{}  {}",
            p.column_start,
            p.column_end,
            if p.clipped_left { " <" } else { "" },
            if p.clipped_right { " >" } else { "" },
            label.title
        );
        if p.conflicting {
            warn!("  overlap on room {room}: {}", p.interval_id);
        }
    }
    for b in chart.block_placements() {
        info!(
            "  room {:>4} cols {:>2}..{:<2}  blocked{}",
            b.resource_id.0,
            b.column_start,
            b.column_end,
            b.reason.map(|r| format!(" ({r})")).unwrap_or_default()
        );
    }
}
