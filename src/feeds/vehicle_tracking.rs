//! Independent vehicle-position feed client.
//!
//! Deliberately redundant with the government feed: positions come from a
//! separate, loosely-coupled public service so the detector can reason from
//! two sources that do not share a failure mode.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::fetch::{self, HttpClient};
use crate::geo::haversine_distance_m;

/// One position sample, with the distance to the queried station already
/// computed through the engine's canonical haversine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub recorded_at: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_m: f64,
    pub velocity_kmh: Option<f64>,
    pub bearing: Option<f64>,
    pub line_ref: String,
    pub operator_ref: String,
}

/// Outcome of one radius query. Failures degrade to an empty vehicle list;
/// "no vehicles found" is a legitimate, informative signal for the
/// detector, never a fault.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub query_timestamp: DateTime<Utc>,
    pub vehicles: Vec<VehicleSnapshot>,
    pub raw_json: String,
    pub error: Option<String>,
}

impl TrackingResponse {
    fn failure(query_timestamp: DateTime<Utc>, raw_json: String, error: String) -> Self {
        Self {
            success: false,
            query_timestamp,
            vehicles: Vec::new(),
            raw_json,
            error: Some(error),
        }
    }
}

#[async_trait]
pub trait VehicleTrackingApi: Send + Sync {
    async fn find_vehicles_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        line_ref: Option<&str>,
    ) -> TrackingResponse;
}

/// A vehicle position record as the tracking service publishes it.
#[derive(Debug, Deserialize)]
struct WireVehicle {
    lat: f64,
    lon: f64,
    #[serde(default)]
    recorded_at: String,
    #[serde(default)]
    speed_kmh: Option<f64>,
    #[serde(default)]
    bearing: Option<f64>,
    #[serde(default)]
    line_ref: String,
    #[serde(default)]
    operator_ref: String,
}

pub struct VehicleTrackingClient<C> {
    base_url: String,
    transport: C,
}

impl<C: HttpClient> VehicleTrackingClient<C> {
    pub fn new(cfg: &EngineConfig, transport: C) -> Self {
        Self {
            base_url: cfg.vehicle_feed_base_url.clone(),
            transport,
        }
    }
}

/// Maps wire records into snapshots relative to the queried station,
/// dropping anything outside the requested radius.
fn to_snapshots(records: Vec<WireVehicle>, lat: f64, lng: f64, radius_km: f64) -> Vec<VehicleSnapshot> {
    records
        .into_iter()
        .map(|v| VehicleSnapshot {
            distance_m: haversine_distance_m(lat, lng, v.lat, v.lon),
            recorded_at: v.recorded_at,
            latitude: v.lat,
            longitude: v.lon,
            velocity_kmh: v.speed_kmh,
            bearing: v.bearing,
            line_ref: v.line_ref,
            operator_ref: v.operator_ref,
        })
        .filter(|s| s.distance_m <= radius_km * 1000.0)
        .collect()
}

#[async_trait]
impl<C: HttpClient> VehicleTrackingApi for VehicleTrackingClient<C> {
    #[tracing::instrument(skip(self))]
    async fn find_vehicles_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        line_ref: Option<&str>,
    ) -> TrackingResponse {
        let query_timestamp = Utc::now();

        let mut url: reqwest::Url = match self.base_url.parse() {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Vehicle-tracking query not sent");
                return TrackingResponse::failure(
                    query_timestamp,
                    String::new(),
                    format!("invalid base url: {e}"),
                );
            }
        };
        url.query_pairs_mut()
            .append_pair("lat", &lat.to_string())
            .append_pair("lon", &lng.to_string())
            .append_pair("radius_km", &radius_km.to_string());
        if let Some(line) = line_ref {
            url.query_pairs_mut().append_pair("line_ref", line);
        }

        let started = Instant::now();
        match fetch::get_raw(&self.transport, url).await {
            Ok((status, body)) => {
                let raw_json = String::from_utf8_lossy(&body).into_owned();
                if !status.is_success() {
                    warn!(%status, "Vehicle-tracking returned an error status");
                    return TrackingResponse::failure(query_timestamp, raw_json, format!("HTTP {status}"));
                }
                match serde_json::from_str::<Vec<WireVehicle>>(&raw_json) {
                    Ok(records) => {
                        let vehicles = to_snapshots(records, lat, lng, radius_km);
                        debug!(
                            vehicles = vehicles.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Vehicle positions fetched"
                        );
                        TrackingResponse {
                            success: true,
                            query_timestamp,
                            vehicles,
                            raw_json,
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Vehicle-tracking response did not parse");
                        TrackingResponse::failure(query_timestamp, raw_json, format!("parse error: {e}"))
                    }
                }
            }
            Err(e) => {
                let reason = e.without_url().to_string();
                warn!(error = %reason, "Vehicle-tracking query failed");
                TrackingResponse::failure(query_timestamp, String::new(), reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_records_become_station_relative_snapshots() {
        let records: Vec<WireVehicle> = serde_json::from_str(
            r#"[
                {"lat": 32.0861, "lon": 34.7818, "recorded_at": "2025-06-03T08:02:11+03:00",
                 "speed_kmh": 38.5, "bearing": 180.0, "line_ref": "480", "operator_ref": "3"},
                {"lat": 32.0853, "lon": 34.7818, "line_ref": "480"}
            ]"#,
        )
        .unwrap();

        let snapshots = to_snapshots(records, 32.0853, 34.7818, 0.5);
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].distance_m > 80.0 && snapshots[0].distance_m < 100.0);
        assert_eq!(snapshots[0].velocity_kmh, Some(38.5));
        assert_eq!(snapshots[1].distance_m, 0.0);
        assert_eq!(snapshots[1].velocity_kmh, None);
        assert!(snapshots[1].recorded_at.is_empty());
    }

    #[test]
    fn test_snapshots_outside_radius_are_dropped() {
        let records: Vec<WireVehicle> = serde_json::from_str(
            r#"[{"lat": 32.2, "lon": 34.9, "line_ref": "480"}]"#,
        )
        .unwrap();
        // ~17 km away from the reference point, radius 500 m.
        assert!(to_snapshots(records, 32.0853, 34.7818, 0.5).is_empty());
    }
}
