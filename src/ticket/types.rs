//! Record types for sealed fault tickets.

use serde::{Deserialize, Serialize};

use crate::feeds::VehicleSnapshot;
use crate::siri::StopVisit;

/// Layout version of the ticket record itself.
pub const SCHEMA_VERSION: u8 = 1;

/// Version of the verdict rules that produced the ticket. Bumped whenever a
/// matching/detection constant or rule changes, so old tickets stay
/// interpretable.
pub const ALGORITHM_VERSION: u8 = 1;

/// Whether the gathered evidence supports the reported fault. Always an
/// output of the matching/detection logic, never an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirmed,
    Unconfirmed,
    Contradicted,
    InsufficientData,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Confirmed => "confirmed",
            Verdict::Unconfirmed => "unconfirmed",
            Verdict::Contradicted => "contradicted",
            Verdict::InsufficientData => "insufficient_data",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strength of the evidence behind a verdict. Ordered so that
/// `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of service fault being claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Delay,
    EarlyDeparture,
    DidntStop,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::Delay => "delay",
            IncidentKind::EarlyDeparture => "early_departure",
            IncidentKind::DidntStop => "didnt_stop",
        }
    }
}

impl std::fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reference point every distance in a verification is measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationData {
    pub name: String,
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The user's position at report time, supplied as a finished value by the
/// GPS-acquisition routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGps {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub captured_at: String,
}

/// The sealed evidentiary record.
///
/// A ticket is constructed exactly once and never mutated; a correction is a
/// new ticket with a fresh id carrying the old id in `supersedes`. Raw feed
/// payloads ride along unmodified for chain of custody.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultTicket {
    pub ticket_id: String,
    pub schema_version: u8,
    pub algorithm_version: u8,
    /// RFC 3339 UTC at whole-second precision.
    pub created_at: String,
    pub incident_id: Option<String>,
    pub user_id: Option<String>,
    pub incident_kind: IncidentKind,
    pub verdict: Verdict,
    pub confidence: Confidence,
    /// Human-readable justification embedding the measured values.
    pub reason: String,
    pub line_ref: String,
    pub station: StationData,
    pub user_gps: UserGps,
    pub matched_visit: Option<StopVisit>,
    pub delay_minutes: Option<i64>,
    pub didnt_stop_detected: bool,
    pub nearest_vehicle_distance_m: Option<f64>,
    pub observed_velocity_kmh: Option<f64>,
    pub vehicle_count: usize,
    pub vehicles: Vec<VehicleSnapshot>,
    /// RFC 3339 UTC at whole-second precision.
    pub feed_query_timestamp: String,
    pub feed_success: bool,
    pub tracking_success: bool,
    pub raw_siri_sm_response: String,
    pub raw_siri_vm_response: String,
    pub legal_citation_local: String,
    pub legal_citation_en: String,
    /// Id of the ticket this one corrects, if any.
    pub supersedes: Option<String>,
    /// Hex SHA-256 over the canonical serialization of the designated
    /// hash fields.
    pub ticket_hash: String,
}
