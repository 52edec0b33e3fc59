//! End-to-end verification of one reported incident.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::EngineConfig;
use crate::feeds::{StopMonitoringApi, VehicleTrackingApi};
use crate::matching::find_relevant_arrival;
use crate::ticket::{
    FaultTicket, IncidentKind, StationData, TicketHasher, TicketInput, TicketSeed, UserGps,
    create_fault_ticket,
};

/// One user-reported service fault, ready for verification.
#[derive(Debug, Clone)]
pub struct IncidentReport {
    pub incident_id: Option<String>,
    pub user_id: Option<String>,
    pub kind: IncidentKind,
    pub line_ref: String,
    pub station: StationData,
    pub user_gps: UserGps,
    /// When the user says the fault happened.
    pub reported_at: DateTime<Utc>,
    pub supersedes: Option<String>,
}

/// Runs one verification: queries both feeds concurrently, matches the
/// reported time against the arrivals, and seals a ticket.
///
/// A failed feed call shrinks the evidence, never the outcome: the ticket
/// is always produced, possibly at low confidence. Dropping the returned
/// future abandons the in-flight feed calls; there are no retries here.
pub async fn verify_incident(
    cfg: &EngineConfig,
    sm_api: &dyn StopMonitoringApi,
    vm_api: &dyn VehicleTrackingApi,
    hasher: &dyn TicketHasher,
    report: IncidentReport,
) -> anyhow::Result<FaultTicket> {
    info!(
        kind = %report.kind,
        line = %report.line_ref,
        station = %report.station.code,
        "Verifying incident"
    );

    let (feed, tracking) = tokio::join!(
        sm_api.query_stop_monitoring(&report.station.code, Some(&report.line_ref)),
        vm_api.find_vehicles_near(
            report.station.latitude,
            report.station.longitude,
            cfg.vehicle_search_radius_km,
            Some(&report.line_ref),
        ),
    );

    let arrival = find_relevant_arrival(
        &feed.stop_visits,
        report.reported_at,
        Some(&report.line_ref),
        cfg.default_tolerance_minutes,
    );

    info!(
        feed_success = feed.success,
        visits = feed.stop_visits.len(),
        tracking_success = tracking.success,
        vehicles = tracking.vehicles.len(),
        matched = arrival.visit.is_some(),
        "Evidence gathered"
    );

    let input = TicketInput {
        incident_id: report.incident_id,
        user_id: report.user_id,
        kind: report.kind,
        line_ref: report.line_ref,
        station: report.station,
        user_gps: report.user_gps,
        feed,
        tracking,
        arrival,
        tolerance_minutes: cfg.default_tolerance_minutes,
        velocity_threshold_kmh: cfg.didnt_stop_velocity_kmh,
        supersedes: report.supersedes,
    };

    let ticket = create_fault_ticket(input, TicketSeed::generate(), hasher)?;
    info!(
        ticket_id = %ticket.ticket_id,
        verdict = %ticket.verdict,
        confidence = %ticket.confidence,
        "Ticket sealed"
    );
    Ok(ticket)
}
