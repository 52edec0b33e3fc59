use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fault_ticket_engine::config::EngineConfig;
use fault_ticket_engine::feeds::{
    FeedResponse, StopMonitoringApi, TrackingResponse, VehicleSnapshot, VehicleTrackingApi,
};
use fault_ticket_engine::pipeline::{IncidentReport, verify_incident};
use fault_ticket_engine::siri::parse_feed_xml;
use fault_ticket_engine::ticket::{
    Confidence, IncidentKind, Sha256Hasher, StationData, UserGps, Verdict,
};

const FEED: &str = include_str!("fixtures/stop_monitoring.xml");

fn query_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 3, 5, 5, 1).unwrap()
}

fn test_config() -> EngineConfig {
    let lookup = |name: &str| match name {
        "SIRI_SM_BASE_URL" => Some("https://siri.example.test/sm".to_string()),
        "SIRI_API_KEY" => Some("k".to_string()),
        "VEHICLE_FEED_BASE_URL" => Some("https://vm.example.test/vehicles".to_string()),
        _ => None,
    };
    EngineConfig::from_lookup(lookup).unwrap()
}

fn report(kind: IncidentKind) -> IncidentReport {
    IncidentReport {
        incident_id: Some("inc-42".to_string()),
        user_id: Some("user-7".to_string()),
        kind,
        line_ref: "480".to_string(),
        station: StationData {
            name: "Arlozorov Terminal".to_string(),
            code: "20271".to_string(),
            latitude: 32.0839,
            longitude: 34.7971,
        },
        user_gps: UserGps {
            latitude: 32.0834,
            longitude: 34.7986,
            accuracy_m: 8.5,
            captured_at: "2025-06-03T08:04:58+03:00".to_string(),
        },
        // 08:05 local time (+03:00).
        reported_at: Utc.with_ymd_and_hms(2025, 6, 3, 5, 5, 0).unwrap(),
        supersedes: None,
    }
}

struct TimedOutSm;

#[async_trait]
impl StopMonitoringApi for TimedOutSm {
    async fn query_stop_monitoring(
        &self,
        stop_code: &str,
        _line_ref: Option<&str>,
    ) -> FeedResponse {
        FeedResponse {
            success: false,
            stop_code: stop_code.to_string(),
            query_timestamp: query_time(),
            response_time_ms: 20000,
            stop_visits: Vec::new(),
            raw_xml: String::new(),
            error: Some("timeout after 20000ms".to_string()),
        }
    }
}

struct FixtureSm;

#[async_trait]
impl StopMonitoringApi for FixtureSm {
    async fn query_stop_monitoring(
        &self,
        stop_code: &str,
        _line_ref: Option<&str>,
    ) -> FeedResponse {
        FeedResponse {
            success: true,
            stop_code: stop_code.to_string(),
            query_timestamp: query_time(),
            response_time_ms: 140,
            stop_visits: parse_feed_xml(FEED, stop_code),
            raw_xml: FEED.to_string(),
            error: None,
        }
    }
}

struct FastVehicleVm;

#[async_trait]
impl VehicleTrackingApi for FastVehicleVm {
    async fn find_vehicles_near(
        &self,
        _lat: f64,
        _lng: f64,
        _radius_km: f64,
        line_ref: Option<&str>,
    ) -> TrackingResponse {
        TrackingResponse {
            success: true,
            query_timestamp: query_time(),
            vehicles: vec![VehicleSnapshot {
                recorded_at: "2025-06-03T08:05:00+03:00".to_string(),
                latitude: 32.084,
                longitude: 34.7973,
                distance_m: 20.0,
                velocity_kmh: Some(40.0),
                bearing: Some(185.0),
                line_ref: line_ref.unwrap_or("480").to_string(),
                operator_ref: "3".to_string(),
            }],
            raw_json: r#"[{"lat":32.084,"lon":34.7973,"speed_kmh":40.0}]"#.to_string(),
            error: None,
        }
    }
}

struct EmptyVm;

#[async_trait]
impl VehicleTrackingApi for EmptyVm {
    async fn find_vehicles_near(
        &self,
        _lat: f64,
        _lng: f64,
        _radius_km: f64,
        _line_ref: Option<&str>,
    ) -> TrackingResponse {
        TrackingResponse {
            success: true,
            query_timestamp: query_time(),
            vehicles: Vec::new(),
            raw_json: "[]".to_string(),
            error: None,
        }
    }
}

#[tokio::test]
async fn test_sm_timeout_still_seals_a_complete_ticket() {
    let cfg = test_config();
    let ticket = verify_incident(
        &cfg,
        &TimedOutSm,
        &FastVehicleVm,
        &Sha256Hasher,
        report(IncidentKind::DidntStop),
    )
    .await
    .unwrap();

    // The fast nearby vehicle still detects, one confidence grade down,
    // and the reason names the missing government data.
    assert_eq!(ticket.verdict, Verdict::Confirmed);
    assert!(ticket.confidence <= Confidence::Medium);
    assert!(!ticket.feed_success);
    assert!(ticket.tracking_success);
    assert!(ticket.reason.contains("timeout after 20000ms"));
    assert!(ticket.reason.contains("could not be established"));
    assert_eq!(ticket.vehicle_count, 1);
    assert_eq!(ticket.ticket_hash.len(), 64);
    assert!(ticket.ticket_hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(!ticket.raw_siri_vm_response.is_empty());
}

#[tokio::test]
async fn test_sm_timeout_on_delay_claim_is_insufficient_data() {
    let cfg = test_config();
    let ticket = verify_incident(
        &cfg,
        &TimedOutSm,
        &EmptyVm,
        &Sha256Hasher,
        report(IncidentKind::Delay),
    )
    .await
    .unwrap();

    assert_eq!(ticket.verdict, Verdict::InsufficientData);
    assert_eq!(ticket.confidence, Confidence::Low);
    assert!(ticket.reason.contains("government feed was unavailable"));
}

#[tokio::test]
async fn test_delay_claim_confirmed_from_fixture_feed() {
    let cfg = test_config();
    let ticket = verify_incident(
        &cfg,
        &FixtureSm,
        &EmptyVm,
        &Sha256Hasher,
        report(IncidentKind::Delay),
    )
    .await
    .unwrap();

    assert_eq!(ticket.verdict, Verdict::Confirmed);
    assert_eq!(ticket.confidence, Confidence::High);
    assert_eq!(ticket.delay_minutes, Some(4));
    let visit = ticket.matched_visit.expect("matched the 08:00 visit");
    assert_eq!(visit.aimed_arrival_time, "2025-06-03T08:00:00+03:00");
    assert_eq!(ticket.raw_siri_sm_response, FEED);
    assert!(ticket.legal_citation_en.contains("SIRI-SM 2.8"));
}

#[tokio::test]
async fn test_didnt_stop_contradicted_when_feed_recorded_the_arrival() {
    let cfg = test_config();

    // Vehicle crawling past the stop while the feed shows a registered
    // arrival for the line.
    struct SlowVehicleVm;

    #[async_trait]
    impl VehicleTrackingApi for SlowVehicleVm {
        async fn find_vehicles_near(
            &self,
            _lat: f64,
            _lng: f64,
            _radius_km: f64,
            _line_ref: Option<&str>,
        ) -> TrackingResponse {
            TrackingResponse {
                success: true,
                query_timestamp: query_time(),
                vehicles: vec![VehicleSnapshot {
                    recorded_at: "2025-06-03T08:05:00+03:00".to_string(),
                    latitude: 32.084,
                    longitude: 34.7973,
                    distance_m: 14.0,
                    velocity_kmh: Some(6.0),
                    bearing: None,
                    line_ref: "480".to_string(),
                    operator_ref: "3".to_string(),
                }],
                raw_json: r#"[{"lat":32.084,"lon":34.7973,"speed_kmh":6.0}]"#.to_string(),
                error: None,
            }
        }
    }

    let ticket = verify_incident(
        &cfg,
        &FixtureSm,
        &SlowVehicleVm,
        &Sha256Hasher,
        report(IncidentKind::DidntStop),
    )
    .await
    .unwrap();

    assert_eq!(ticket.verdict, Verdict::Contradicted);
    assert_eq!(ticket.confidence, Confidence::Low);
    assert!(!ticket.didnt_stop_detected);
    assert_eq!(ticket.observed_velocity_kmh, Some(6.0));
    assert!(ticket.feed_success);
}
