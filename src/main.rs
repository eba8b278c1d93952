//! SpotView demo - Main Entry Point
//!
//! Polls a simulated parking lot and prints the monitoring table after every
//! applied refresh. Usage: `spotview [refreshes]` (default 5).

use anyhow::Context;
use spotview::{
    config::DashboardConfig,
    datasets::parking_spots,
    pipeline::RowModelPipeline,
    source::{DataSource, ParkingLotSimulator, PollConfig, Poller},
    ParkingSpot,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOT_SIZE: usize = 42;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,spotview=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let refreshes: usize = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("Invalid refresh count '{}'", arg))?,
        None => 5,
    };

    tracing::info!("Starting SpotView demo");

    let config = DashboardConfig::load_or_default();
    let table_config = &config.parking_spots;
    let mut table = parking_spots::pipeline(table_config)
        .context("Failed to build parking spot table")?;

    let poll = PollConfig {
        interval: table_config
            .poll_interval()
            .or(Some(Duration::from_millis(1000))),
        ..PollConfig::default()
    };
    let source: Arc<dyn DataSource<ParkingSpot>> =
        Arc::new(ParkingLotSimulator::new(LOT_SIZE, 0x5eed));
    let poller = Poller::spawn(source, poll)
        .context("Failed to start parking spot poller")?;

    let wait = poll.interval.unwrap_or(Duration::from_secs(1)) * 4;
    let mut applied = 0;
    while applied < refreshes {
        let before = table.generation();
        if poller.wait_and_pump(&mut table, wait) == 0 {
            tracing::warn!("No refresh within {:?}", wait);
            continue;
        }
        if let Some(err) = table.last_fetch_error() {
            tracing::warn!("Showing stale data: {}", err.message);
        }
        if table.generation() > before {
            applied += 1;
            print_table(&table);
            if table.can_next_page() {
                table.next_page();
            } else {
                table.first_page();
            }
        }
    }

    tracing::info!("Shutting down...");
    poller.shutdown();
    Ok(())
}

fn print_table(table: &RowModelPipeline<ParkingSpot>) {
    let columns = table.registry().columns();
    let cells: Vec<Vec<String>> = table
        .page_rows()
        .map(|row| {
            columns
                .iter()
                .map(|c| {
                    table
                        .cell(row, c.id())
                        .map(ToString::to_string)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.header().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let view = table.state();
    println!();
    println!(
        "{} | page {}/{} | {} of {} spots",
        view.generation,
        view.page_index() + 1,
        view.page_count,
        view.filtered_rows,
        view.total_rows
    );
    println!("{}", line(columns.iter().map(|c| c.header()).collect()));
    for row in &cells {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}
