//! Composes gathered evidence into one sealed, hashed fault ticket.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::detector::detect_didnt_stop;
use crate::feeds::{FeedResponse, TrackingResponse};
use crate::matching::ArrivalMatch;

use super::hash::{HashSubset, TicketHasher};
use super::types::{
    ALGORITHM_VERSION, Confidence, FaultTicket, IncidentKind, SCHEMA_VERSION, StationData,
    UserGps, Verdict,
};

/// Identity material for one ticket. Production mints a fresh id and
/// timestamp; tests inject fixed values so the digest is reproducible.
#[derive(Debug, Clone)]
pub struct TicketSeed {
    pub ticket_id: String,
    pub created_at: DateTime<Utc>,
}

impl TicketSeed {
    pub fn generate() -> Self {
        Self {
            ticket_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Everything the assembler composes. All network work already happened in
/// the clients that produced these values; the matcher output for the
/// reported time is embedded, not recomputed here.
#[derive(Debug, Clone)]
pub struct TicketInput {
    pub incident_id: Option<String>,
    pub user_id: Option<String>,
    pub kind: IncidentKind,
    pub line_ref: String,
    pub station: StationData,
    pub user_gps: UserGps,
    pub feed: FeedResponse,
    pub tracking: TrackingResponse,
    pub arrival: ArrivalMatch,
    pub tolerance_minutes: i64,
    pub velocity_threshold_kmh: f64,
    pub supersedes: Option<String>,
}

struct Assessment {
    verdict: Verdict,
    confidence: Confidence,
    reason: String,
    didnt_stop_detected: bool,
    nearest_vehicle_distance_m: Option<f64>,
    observed_velocity_kmh: Option<f64>,
}

fn timing_assessment(verdict: Verdict, confidence: Confidence, reason: String) -> Assessment {
    Assessment {
        verdict,
        confidence,
        reason,
        didnt_stop_detected: false,
        nearest_vehicle_distance_m: None,
        observed_velocity_kmh: None,
    }
}

fn describe_offset(delay_minutes: i64) -> String {
    match delay_minutes {
        0 => "on time".to_string(),
        d if d > 0 => format!("{d} minutes late"),
        d => format!("{} minutes early", -d),
    }
}

fn assess_didnt_stop(input: &TicketInput, sm_no_arrival: bool) -> Assessment {
    let det = detect_didnt_stop(
        &input.tracking.vehicles,
        sm_no_arrival,
        input.velocity_threshold_kmh,
    );

    let (verdict, confidence) = if det.detected {
        (Verdict::Confirmed, det.confidence)
    } else {
        match &det.nearest_vehicle {
            // A measured below-threshold velocity argues the bus was
            // serving the stop.
            Some(v) if v.velocity_kmh.is_some() => (Verdict::Contradicted, Confidence::Low),
            Some(_) => (Verdict::Unconfirmed, Confidence::Low),
            None => (Verdict::InsufficientData, Confidence::Low),
        }
    };

    Assessment {
        verdict,
        confidence,
        reason: det.reason,
        didnt_stop_detected: det.detected,
        nearest_vehicle_distance_m: det.nearest_vehicle.as_ref().map(|v| v.distance_m),
        observed_velocity_kmh: det.observed_velocity_kmh,
    }
}

fn assess_timing(input: &TicketInput) -> Assessment {
    let claims_early = matches!(input.kind, IncidentKind::EarlyDeparture);

    let Some(visit) = &input.arrival.visit else {
        return timing_assessment(
            Verdict::InsufficientData,
            Confidence::Low,
            format!(
                "no scheduled arrival for line {} was found within {} minutes of the reported time",
                input.line_ref, input.tolerance_minutes
            ),
        );
    };

    let Some(delay) = input.arrival.delay_minutes else {
        return timing_assessment(
            Verdict::Unconfirmed,
            Confidence::Low,
            format!(
                "a scheduled arrival (aimed {}) was found but the feed carried no expected arrival time, so the offset could not be measured",
                visit.aimed_arrival_time
            ),
        );
    };

    let claim_holds = if claims_early { delay <= -1 } else { delay >= 1 };
    let verdict = if claim_holds {
        Verdict::Confirmed
    } else {
        Verdict::Contradicted
    };
    let confidence = if input.feed.success {
        Confidence::High
    } else {
        Confidence::Medium
    };
    timing_assessment(
        verdict,
        confidence,
        format!(
            "government feed shows the line {} arrival aimed at {} was expected {}",
            input.line_ref,
            visit.aimed_arrival_time,
            describe_offset(delay)
        ),
    )
}

/// Seals one fault ticket from the gathered evidence.
///
/// Pure composition plus hashing, no I/O. The ticket value is constructed
/// exactly once, after every field is final, and the digest covers only the
/// [`HashSubset`] fields. A failed government feed never raises the
/// confidence above medium; its absence-of-arrival signal is simply
/// unavailable, and the reason says so.
pub fn create_fault_ticket(
    input: TicketInput,
    seed: TicketSeed,
    hasher: &dyn TicketHasher,
) -> anyhow::Result<FaultTicket> {
    let sm_no_arrival = input.feed.success && input.arrival.visit.is_none();

    let assessment = match input.kind {
        IncidentKind::DidntStop => assess_didnt_stop(&input, sm_no_arrival),
        IncidentKind::Delay | IncidentKind::EarlyDeparture => assess_timing(&input),
    };

    let mut reason = assessment.reason;
    let confidence = if input.feed.success {
        assessment.confidence
    } else {
        let err = input.feed.error.as_deref().unwrap_or("no response");
        reason.push_str(&format!(
            "; the government feed was unavailable ({err}), so the absence of an arrival record could not be established"
        ));
        assessment.confidence.min(Confidence::Medium)
    };

    let created_at = seed.created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let feed_query_timestamp = input
        .feed
        .query_timestamp
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let vehicle_count = input.tracking.vehicles.len();

    let legal_citation_en = format!(
        "Determination based on real-time data obtained from the Ministry of Transport stop-monitoring service (SIRI-SM 2.8); feed queried at {feed_query_timestamp}."
    );
    let legal_citation_local = format!(
        "הקביעה מבוססת על נתוני זמן אמת משירות ניטור התחנות של משרד התחבורה (SIRI-SM 2.8); השאילתה בוצעה ב-{feed_query_timestamp}."
    );

    let payload = HashSubset {
        ticket_id: &seed.ticket_id,
        created_at: &created_at,
        incident_id: input.incident_id.as_deref(),
        incident_type: input.kind,
        verdict: assessment.verdict,
        feed_query_timestamp: &feed_query_timestamp,
        vehicle_count,
        user_gps: &input.user_gps,
        station: &input.station,
        line_ref: &input.line_ref,
    }
    .canonical_json()
    .context("serializing canonical ticket payload")?;
    let ticket_hash = hasher.hash(payload.as_bytes());

    Ok(FaultTicket {
        ticket_id: seed.ticket_id,
        schema_version: SCHEMA_VERSION,
        algorithm_version: ALGORITHM_VERSION,
        created_at,
        incident_id: input.incident_id,
        user_id: input.user_id,
        incident_kind: input.kind,
        verdict: assessment.verdict,
        confidence,
        reason,
        line_ref: input.line_ref,
        station: input.station,
        user_gps: input.user_gps,
        matched_visit: input.arrival.visit,
        delay_minutes: input.arrival.delay_minutes,
        didnt_stop_detected: assessment.didnt_stop_detected,
        nearest_vehicle_distance_m: assessment.nearest_vehicle_distance_m,
        observed_velocity_kmh: assessment.observed_velocity_kmh,
        vehicle_count,
        vehicles: input.tracking.vehicles,
        feed_query_timestamp,
        feed_success: input.feed.success,
        tracking_success: input.tracking.success,
        raw_siri_sm_response: input.feed.raw_xml,
        raw_siri_vm_response: input.tracking.raw_json,
        legal_citation_local,
        legal_citation_en,
        supersedes: input.supersedes,
        ticket_hash,
    })
}
