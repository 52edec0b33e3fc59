//! CLI entry point for the fault-ticket engine.
//!
//! Provides subcommands for verifying a reported incident end to end and
//! for probing either upstream feed while debugging an integration.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fault_ticket_engine::{
    config::EngineConfig,
    feeds::{SiriSmClient, StopMonitoringApi, VehicleTrackingApi, VehicleTrackingClient},
    fetch::build_transport,
    pipeline::{IncidentReport, verify_incident},
    sink::{CsvSink, EvidenceSink},
    ticket::{IncidentKind, Sha256Hasher, StationData, UserGps},
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fault_ticket_engine")]
#[command(about = "Correlates transit feeds into sealed fault tickets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Delay,
    EarlyDeparture,
    DidntStop,
}

impl From<KindArg> for IncidentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Delay => IncidentKind::Delay,
            KindArg::EarlyDeparture => IncidentKind::EarlyDeparture,
            KindArg::DidntStop => IncidentKind::DidntStop,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a reported incident and seal a fault ticket
    Verify {
        /// Kind of fault being claimed
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Line reference the claim is about
        #[arg(long)]
        line: String,

        /// Stop code of the station
        #[arg(long)]
        station_code: String,

        /// Station name for the record
        #[arg(long, default_value = "")]
        station_name: String,

        /// Station latitude
        #[arg(long)]
        station_lat: f64,

        /// Station longitude
        #[arg(long)]
        station_lon: f64,

        /// User latitude at report time
        #[arg(long)]
        user_lat: f64,

        /// User longitude at report time
        #[arg(long)]
        user_lon: f64,

        /// Reported GPS accuracy in meters
        #[arg(long, default_value_t = 10.0)]
        accuracy_m: f64,

        /// When the fault happened (RFC 3339); defaults to now
        #[arg(long)]
        reported_at: Option<String>,

        /// Incident record to link, if one exists
        #[arg(long)]
        incident_id: Option<String>,

        /// Reporting user to link, if known
        #[arg(long)]
        user_id: Option<String>,

        /// Ticket id this verification corrects
        #[arg(long)]
        supersedes: Option<String>,

        /// CSV file to append the ticket row to
        #[arg(short, long, default_value = "tickets.csv")]
        output: String,
    },
    /// Query the stop-monitoring feed and log the parsed visits
    ProbeSm {
        /// Stop code to monitor
        #[arg(value_name = "STOP_CODE")]
        stop: String,

        /// Only show visits for this line
        #[arg(short, long)]
        line: Option<String>,
    },
    /// Query the vehicle-tracking feed and log the snapshots
    ProbeVm {
        /// Latitude of the search center
        #[arg(long)]
        lat: f64,

        /// Longitude of the search center
        #[arg(long)]
        lon: f64,

        /// Search radius in kilometers; defaults to the configured radius
        #[arg(long)]
        radius_km: Option<f64>,

        /// Only show vehicles for this line
        #[arg(short, long)]
        line: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/fault_ticket_engine.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fault_ticket_engine.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let cfg = EngineConfig::from_env()?;
    let transport = build_transport(cfg.egress_proxy_url.as_deref(), cfg.feed_timeout)?;

    match cli.command {
        Commands::Verify {
            kind,
            line,
            station_code,
            station_name,
            station_lat,
            station_lon,
            user_lat,
            user_lon,
            accuracy_m,
            reported_at,
            incident_id,
            user_id,
            supersedes,
            output,
        } => {
            let reported_at = match reported_at {
                Some(s) => DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| anyhow::anyhow!("invalid --reported-at {s:?}: {e}"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };

            let sm = SiriSmClient::new(&cfg, transport.clone());
            let vm = VehicleTrackingClient::new(&cfg, transport);

            let report = IncidentReport {
                incident_id,
                user_id,
                kind: kind.into(),
                line_ref: line,
                station: StationData {
                    name: station_name,
                    code: station_code,
                    latitude: station_lat,
                    longitude: station_lon,
                },
                user_gps: UserGps {
                    latitude: user_lat,
                    longitude: user_lon,
                    accuracy_m,
                    captured_at: reported_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                },
                reported_at,
                supersedes,
            };

            let ticket = verify_incident(&cfg, &sm, &vm, &Sha256Hasher, report).await?;
            CsvSink::new(&output).append(&ticket)?;
            println!("{}", serde_json::to_string_pretty(&ticket)?);
        }
        Commands::ProbeSm { stop, line } => {
            let sm = SiriSmClient::new(&cfg, transport);
            let resp = sm.query_stop_monitoring(&stop, line.as_deref()).await;

            if !resp.success {
                warn!(
                    error = resp.error.as_deref().unwrap_or("unknown"),
                    "Stop-monitoring query failed"
                );
            }
            for visit in &resp.stop_visits {
                info!(
                    line = %visit.line_ref,
                    aimed = %visit.aimed_arrival_time,
                    expected = %visit.expected_arrival_time,
                    stops_away = ?visit.stops_away,
                    "Visit"
                );
            }
            info!(
                stop = %resp.stop_code,
                visits = resp.stop_visits.len(),
                response_ms = resp.response_time_ms,
                "Stop-monitoring probe complete"
            );
        }
        Commands::ProbeVm {
            lat,
            lon,
            radius_km,
            line,
        } => {
            let vm = VehicleTrackingClient::new(&cfg, transport);
            let radius = radius_km.unwrap_or(cfg.vehicle_search_radius_km);
            let resp = vm.find_vehicles_near(lat, lon, radius, line.as_deref()).await;

            if !resp.success {
                warn!(
                    error = resp.error.as_deref().unwrap_or("unknown"),
                    "Vehicle-tracking query failed"
                );
            }
            for v in &resp.vehicles {
                info!(
                    line = %v.line_ref,
                    distance_m = v.distance_m,
                    velocity_kmh = ?v.velocity_kmh,
                    recorded_at = %v.recorded_at,
                    "Vehicle"
                );
            }
            info!(
                vehicles = resp.vehicles.len(),
                radius_km = radius,
                "Vehicle-tracking probe complete"
            );
        }
    }

    Ok(())
}
