//! Canonical serialization and digesting of the hashed ticket fields.
//!
//! Independent auditors must be able to recompute `ticket_hash` from a
//! persisted ticket, so the payload has to be byte-identical across
//! implementations: a fixed field subset, keys sorted, timestamps in RFC 3339
//! UTC at whole-second precision, floats in shortest-representation form.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::types::{IncidentKind, StationData, UserGps, Verdict};

/// Digest capability over the canonical payload bytes. The production
/// implementation is SHA-256; tests substitute a mock to assert on the exact
/// payload being hashed.
pub trait TicketHasher: Send + Sync {
    fn hash(&self, bytes: &[u8]) -> String;
}

/// SHA-256, lowercase hex.
pub struct Sha256Hasher;

impl TicketHasher for Sha256Hasher {
    fn hash(&self, bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}

/// The fixed subset of ticket fields covered by `ticket_hash`. Nothing
/// outside this struct ever enters the digest.
#[derive(Serialize)]
pub struct HashSubset<'a> {
    pub ticket_id: &'a str,
    pub created_at: &'a str,
    pub incident_id: Option<&'a str>,
    pub incident_type: IncidentKind,
    pub verdict: Verdict,
    pub feed_query_timestamp: &'a str,
    pub vehicle_count: usize,
    pub user_gps: &'a UserGps,
    pub station: &'a StationData,
    pub line_ref: &'a str,
}

impl HashSubset<'_> {
    /// Canonical key-sorted JSON. Round-tripping through `serde_json::Value`
    /// sorts object keys (its map is a `BTreeMap`), at every nesting level.
    pub fn canonical_json(&self) -> serde_json::Result<String> {
        let value = serde_json::to_value(self)?;
        serde_json::to_string(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset<'a>(gps: &'a UserGps, station: &'a StationData) -> HashSubset<'a> {
        HashSubset {
            ticket_id: "0f1e2d3c-0000-4000-8000-000000000001",
            created_at: "2025-06-03T08:05:00Z",
            incident_id: Some("inc-42"),
            incident_type: IncidentKind::DidntStop,
            verdict: Verdict::Confirmed,
            feed_query_timestamp: "2025-06-03T08:05:01Z",
            vehicle_count: 2,
            user_gps: gps,
            station,
            line_ref: "480",
        }
    }

    fn gps() -> UserGps {
        UserGps {
            latitude: 32.0834,
            longitude: 34.7986,
            accuracy_m: 8.5,
            captured_at: "2025-06-03T08:04:58Z".to_string(),
        }
    }

    fn station() -> StationData {
        StationData {
            name: "Arlozorov Terminal".to_string(),
            code: "20271".to_string(),
            latitude: 32.0839,
            longitude: 34.7971,
        }
    }

    #[test]
    fn test_canonical_json_sorts_keys_at_every_level() {
        let gps = gps();
        let station = station();
        let json = subset(&gps, &station).canonical_json().unwrap();
        assert!(json.starts_with("{\"created_at\":"));
        // Field declaration order puts ticket_id first; canonical order
        // must not.
        let user_gps_pos = json.find("\"user_gps\"").unwrap();
        let station_pos = json.find("\"station\"").unwrap();
        let vehicle_count_pos = json.find("\"vehicle_count\"").unwrap();
        assert!(station_pos < user_gps_pos);
        assert!(user_gps_pos < vehicle_count_pos);
        assert!(json.contains("\"station\":{\"code\":\"20271\",\"latitude\":32.0839,\"longitude\":34.7971,\"name\":\"Arlozorov Terminal\"}"));
    }

    #[test]
    fn test_canonical_json_is_stable() {
        let gps = gps();
        let station = station();
        let a = subset(&gps, &station).canonical_json().unwrap();
        let b = subset(&gps, &station).canonical_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_null_incident_id_serializes_as_null() {
        let gps = gps();
        let station = station();
        let mut s = subset(&gps, &station);
        s.incident_id = None;
        let json = s.canonical_json().unwrap();
        assert!(json.contains("\"incident_id\":null"));
    }

    #[test]
    fn test_sha256_hasher_known_vector() {
        let hasher = Sha256Hasher;
        assert_eq!(
            hasher.hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
