//! Row-oriented persistence of sealed tickets.
//!
//! One row per ticket, append-only. The sink never edits or deletes rows;
//! retention is the store's concern, corrections arrive as new tickets.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::ticket::FaultTicket;

/// Destination for sealed tickets. `incident_id` and `user_id` are nullable
/// references; a ticket may exist before its incident record is finalized.
pub trait EvidenceSink: Send + Sync {
    fn append(&self, ticket: &FaultTicket) -> Result<()>;
}

/// Flat row shape for the CSV store. Station and user-GPS fields are
/// spread into scalar columns; the matched visit and the vehicle list are
/// carried as JSON cell values.
#[derive(Debug, Serialize)]
struct TicketRow<'a> {
    ticket_id: &'a str,
    schema_version: u8,
    algorithm_version: u8,
    created_at: &'a str,
    incident_id: Option<&'a str>,
    user_id: Option<&'a str>,
    incident_kind: &'a str,
    verdict: &'a str,
    confidence: &'a str,
    reason: &'a str,
    line_ref: &'a str,
    station_name: &'a str,
    station_code: &'a str,
    station_latitude: f64,
    station_longitude: f64,
    user_latitude: f64,
    user_longitude: f64,
    user_accuracy_m: f64,
    user_gps_captured_at: &'a str,
    matched_visit: String,
    delay_minutes: Option<i64>,
    didnt_stop_detected: bool,
    nearest_vehicle_distance_m: Option<f64>,
    observed_velocity_kmh: Option<f64>,
    vehicle_count: usize,
    vehicles: String,
    feed_query_timestamp: &'a str,
    feed_success: bool,
    tracking_success: bool,
    raw_siri_sm_response: &'a str,
    raw_siri_vm_response: &'a str,
    legal_citation_local: &'a str,
    legal_citation_en: &'a str,
    supersedes: Option<&'a str>,
    ticket_hash: &'a str,
}

impl<'a> TicketRow<'a> {
    fn from_ticket(t: &'a FaultTicket) -> Result<Self> {
        let matched_visit = match &t.matched_visit {
            Some(v) => serde_json::to_string(v)?,
            None => String::new(),
        };
        let vehicles = serde_json::to_string(&t.vehicles)?;

        Ok(TicketRow {
            ticket_id: &t.ticket_id,
            schema_version: t.schema_version,
            algorithm_version: t.algorithm_version,
            created_at: &t.created_at,
            incident_id: t.incident_id.as_deref(),
            user_id: t.user_id.as_deref(),
            incident_kind: t.incident_kind.as_str(),
            verdict: t.verdict.as_str(),
            confidence: t.confidence.as_str(),
            reason: &t.reason,
            line_ref: &t.line_ref,
            station_name: &t.station.name,
            station_code: &t.station.code,
            station_latitude: t.station.latitude,
            station_longitude: t.station.longitude,
            user_latitude: t.user_gps.latitude,
            user_longitude: t.user_gps.longitude,
            user_accuracy_m: t.user_gps.accuracy_m,
            user_gps_captured_at: &t.user_gps.captured_at,
            matched_visit,
            delay_minutes: t.delay_minutes,
            didnt_stop_detected: t.didnt_stop_detected,
            nearest_vehicle_distance_m: t.nearest_vehicle_distance_m,
            observed_velocity_kmh: t.observed_velocity_kmh,
            vehicle_count: t.vehicle_count,
            vehicles,
            feed_query_timestamp: &t.feed_query_timestamp,
            feed_success: t.feed_success,
            tracking_success: t.tracking_success,
            raw_siri_sm_response: &t.raw_siri_sm_response,
            raw_siri_vm_response: &t.raw_siri_vm_response,
            legal_citation_local: &t.legal_citation_local,
            legal_citation_en: &t.legal_citation_en,
            supersedes: t.supersedes.as_deref(),
            ticket_hash: &t.ticket_hash,
        })
    }
}

/// Appends tickets to a CSV file, writing the header when the file is
/// first created.
pub struct CsvSink {
    path: String,
}

impl CsvSink {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl EvidenceSink for CsvSink {
    fn append(&self, ticket: &FaultTicket) -> Result<()> {
        let file_exists = Path::new(&self.path).exists();
        debug!(path = %self.path, file_exists, "Appending ticket row");

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = WriterBuilder::new()
            .has_headers(!file_exists) // IMPORTANT when appending
            .from_writer(file);

        writer.serialize(TicketRow::from_ticket(ticket)?)?;
        writer.flush()?;

        Ok(())
    }
}
