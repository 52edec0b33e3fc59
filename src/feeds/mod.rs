//! The two independent evidence feeds.
//!
//! Each module pairs the provider trait with its concrete client; both
//! clients recover transport failures as data so a verification always
//! completes with whatever evidence exists.

pub mod stop_monitoring;
pub mod vehicle_tracking;

pub use stop_monitoring::{FeedResponse, SiriSmClient, StopMonitoringApi};
pub use vehicle_tracking::{
    TrackingResponse, VehicleSnapshot, VehicleTrackingApi, VehicleTrackingClient,
};
