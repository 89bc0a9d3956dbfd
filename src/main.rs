// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod config;
mod feed;
mod reference_data;

use std::path::PathBuf;
use std::sync::RwLock;

use clap::Parser;
use log::{info, warn};
use mimalloc::MiMalloc;
use tokio::sync::broadcast::error::RecvError;
use vatsim_core::refresher::run_cycle;
use vatsim_core::{Client, CycleReport, NetworkEvent, NetworkState, Position, Refresher};

use config::AppConfig;
use feed::HttpSnapshotSource;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "vatsim-map")]
#[command(about = "Follow the live VATSIM network from the terminal", long_about = None)]
struct Args {
    /// Configuration file (defaults to the per-user config location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between refresh cycles
    #[arg(long)]
    interval: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Print the pilots nearest to this position after each cycle, as "lat,lon"
    #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
    near: Option<Position>,

    /// Search radius in nautical miles
    #[arg(long)]
    radius: Option<f64>,

    /// Maximum number of pilots to print
    #[arg(long)]
    count: Option<usize>,
}

fn parse_position(value: &str) -> Result<Position, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{value}\""))?;
    let latitude: f64 = lat.trim().parse().map_err(|e| format!("invalid latitude \"{lat}\": {e}"))?;
    let longitude: f64 = lon.trim().parse().map_err(|e| format!("invalid longitude \"{lon}\": {e}"))?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} out of range"));
    }
    Ok(Position::new(latitude, longitude))
}

/// Configuration with command line overrides applied.
fn resolve_config(args: &Args) -> Result<AppConfig, confy::ConfyError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }
    if let Some(radius) = args.radius {
        config.search_radius_nm = radius;
    }
    if let Some(count) = args.count {
        config.search_count = count;
    }
    Ok(config)
}

fn log_report(report: &CycleReport) {
    info!(
        "Cycle {}: clients {} airports {} firs {} boundaries {} airlines {}, {} pilots indexed, {} warnings",
        report.cycle,
        report.clients,
        report.airports,
        report.firs,
        report.boundaries,
        report.airlines,
        report.spatially_indexed,
        report.warnings.len()
    );
}

fn describe_pilot(state: &NetworkState, client: &Client, distance_nm: f64) -> String {
    let mut line = format!("{:<10} {:>7.1} nm", client.callsign, distance_nm);

    if let Some(pilot) = client.pilot() {
        if let Some(plan) = &pilot.flight_plan {
            let code = |code: &str| if code.is_empty() { "----".to_string() } else { code.to_string() };
            line.push_str(&format!("  {} -> {}", code(&plan.departure.code), code(&plan.arrival.code)));
        }
        if let Some(airline) = pilot.airline.and_then(|handle| state.airlines().get(handle)) {
            line.push_str(&format!("  {}", airline.name));
        }
    }
    line
}

fn print_nearest(state: &NetworkState, config: &AppConfig, position: Position) {
    let nearest = state
        .clients()
        .list_search_by_position(position, config.search_radius_nm, config.search_count);

    if nearest.is_empty() {
        println!("No pilots within {:.0} nm", config.search_radius_nm);
        return;
    }
    for (client, distance) in nearest {
        println!("{}", describe_pilot(state, client, distance));
    }
}

async fn run_once(source: HttpSnapshotSource, config: &AppConfig, near: Option<Position>) -> Result<(), Box<dyn std::error::Error>> {
    let state = RwLock::new(NetworkState::new());

    match run_cycle(&source, &state).await {
        NetworkEvent::CycleCompleted(report) => log_report(&report),
        NetworkEvent::FetchFailed(message) | NetworkEvent::CycleAborted(message) => {
            return Err(message.into());
        }
    }

    if let Some(position) = near {
        let state = state.read().map_err(|e| e.to_string())?;
        print_nearest(&state, config, position);
    }
    Ok(())
}

async fn run_forever(source: HttpSnapshotSource, config: &AppConfig, near: Option<Position>) {
    let refresher = Refresher::spawn(source, config.refresher_config());
    let mut events = refresher.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(NetworkEvent::CycleCompleted(report)) => {
                    log_report(&report);
                    if let Some(position) = near {
                        refresher.read(|state| print_nearest(state, config, position));
                    }
                }
                Ok(NetworkEvent::FetchFailed(message)) => warn!("Fetch failed: {message}"),
                Ok(NetworkEvent::CycleAborted(message)) => warn!("Cycle aborted: {message}"),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {skipped} cycle events"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    refresher.shutdown();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    if args.config.is_none() {
        if let Ok(path) = AppConfig::get_config_path() {
            info!("Using configuration at {}", path.display());
        }
    }

    info!("Reading reference data from {}", config.reference_data_dir.display());
    let source = HttpSnapshotSource::new(&config.feed_url, &config.reference_data_dir, config.request_timeout())?;

    if args.once {
        run_once(source, &config, args.near).await
    } else {
        run_forever(source, &config, args.near).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use vatsim_core::raw::{NetworkSnapshot, RawAirline, RawClient, RawClientDetails, RawFlightPlan, RawPilot};

    use super::*;

    #[test]
    fn test_parse_position() {
        let position = parse_position("50.03, -8.57").unwrap();
        assert!((position.latitude - 50.03).abs() < 1e-9);
        assert!((position.longitude + 8.57).abs() < 1e-9);
    }

    #[test]
    fn test_parse_position_rejects_bad_input() {
        assert!(parse_position("50.03").is_err());
        assert!(parse_position("north,8.5").is_err());
        assert!(parse_position("95.0,8.5").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from(["vatsim-map", "--interval", "30", "--near", "-33.9,151.2", "--count", "3"]);

        assert_eq!(args.interval, Some(30));
        assert_eq!(args.count, Some(3));
        assert!(args.near.is_some_and(|p| (p.latitude + 33.9).abs() < 1e-9));
        assert!(!args.once);
    }

    #[test]
    fn test_describe_pilot() {
        let mut state = NetworkState::new();
        state
            .apply(NetworkSnapshot {
                airlines: vec![RawAirline {
                    icao: "DLH".to_string(),
                    name: "Lufthansa".to_string(),
                    ..Default::default()
                }],
                clients: vec![RawClient {
                    cid: 1,
                    callsign: "DLH456".to_string(),
                    name: String::new(),
                    server: String::new(),
                    rating: 1,
                    logon_time: Utc::now(),
                    last_updated: Utc::now(),
                    details: RawClientDetails::Pilot(RawPilot {
                        latitude: 50.0,
                        longitude: 8.5,
                        flight_plan: Some(RawFlightPlan {
                            departure: "EDDF".to_string(),
                            arrival: "EGLL".to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                }],
                ..Default::default()
            })
            .unwrap();

        let (client, distance) = state.clients().list_search_by_position(Position::new(50.0, 8.5), 10.0, 1)[0];
        let line = describe_pilot(&state, client, distance);

        assert!(line.starts_with("DLH456"));
        assert!(line.contains("EDDF -> EGLL"));
        assert!(line.ends_with("Lufthansa"));
    }
}
