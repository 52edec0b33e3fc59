//! Didn't-stop detection from independent vehicle observations.
//!
//! The government feed can only say what it recorded; it cannot say a bus
//! sailed past the stop. That signal comes from the tracking feed: a vehicle
//! moving at speed right next to the stop. The feed's silence about an
//! arrival then decides how strong the detection is.

use serde::Serialize;

use crate::feeds::VehicleSnapshot;
use crate::ticket::Confidence;

/// Outcome of the didn't-stop check, with the observation that drove it.
#[derive(Debug, Clone, Serialize)]
pub struct DidntStopVerdict {
    pub detected: bool,
    pub confidence: Confidence,
    pub nearest_vehicle: Option<VehicleSnapshot>,
    pub observed_velocity_kmh: Option<f64>,
    pub reason: String,
}

/// Decides whether the tracked vehicles support a didn't-stop claim.
///
/// The subject is the nearest snapshot. Detection requires a measured
/// velocity strictly above `velocity_threshold_kmh`; a slow or unmeasured
/// vehicle never detects, whatever the feed says. `sm_no_arrival` is true
/// when the government feed answered successfully but listed no matching
/// arrival; it upgrades a detection from medium to high confidence.
pub fn detect_didnt_stop(
    vehicles: &[VehicleSnapshot],
    sm_no_arrival: bool,
    velocity_threshold_kmh: f64,
) -> DidntStopVerdict {
    let mut nearest: Option<&VehicleSnapshot> = None;
    for v in vehicles {
        if nearest.map_or(true, |n| v.distance_m < n.distance_m) {
            nearest = Some(v);
        }
    }

    let Some(vehicle) = nearest else {
        return DidntStopVerdict {
            detected: false,
            confidence: Confidence::Low,
            nearest_vehicle: None,
            observed_velocity_kmh: None,
            reason: "no independent vehicle observations near the stop".to_string(),
        };
    };

    let velocity = vehicle.velocity_kmh;
    let (detected, confidence, reason) = match velocity {
        Some(kmh) if kmh > velocity_threshold_kmh && sm_no_arrival => (
            true,
            Confidence::High,
            format!(
                "vehicle passed {:.0} m from the stop at {:.1} km/h while the government feed recorded no arrival",
                vehicle.distance_m, kmh
            ),
        ),
        Some(kmh) if kmh > velocity_threshold_kmh => (
            true,
            Confidence::Medium,
            format!(
                "vehicle passed {:.0} m from the stop at {:.1} km/h; the government feed did not independently show a missed arrival",
                vehicle.distance_m, kmh
            ),
        ),
        Some(kmh) => (
            false,
            Confidence::Low,
            format!(
                "vehicle observed {:.0} m from the stop at {:.1} km/h, consistent with slowing or stopping",
                vehicle.distance_m, kmh
            ),
        ),
        None => (
            false,
            Confidence::Low,
            format!(
                "vehicle observed {:.0} m from the stop without a velocity reading",
                vehicle.distance_m
            ),
        ),
    };

    DidntStopVerdict {
        detected,
        confidence,
        nearest_vehicle: Some(vehicle.clone()),
        observed_velocity_kmh: velocity,
        reason,
    }
}
