//! Typed `StopVisit` records extracted from Stop-Monitoring deliveries.

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration_minutes;
use crate::siri::extract::{extract_blocks, extract_tag};

/// One scheduled/real-time arrival record from the government feed.
///
/// Timestamps are kept verbatim as they appeared on the wire; evidentiary
/// use requires the original strings, and chrono parsing happens at the
/// consumers that need instants. A visit with mostly-empty fields is still a
/// valid visit; data-quality judgment belongs to the matcher and detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopVisit {
    pub line_ref: String,
    pub operator_ref: String,
    pub vehicle_ref: String,
    pub journey_ref: String,
    pub destination_display: String,
    pub stop_point_ref: String,
    pub aimed_arrival_time: String,
    pub expected_arrival_time: String,
    pub aimed_departure_time: String,
    pub expected_departure_time: String,
    /// Signed delay in whole minutes, from the `<Delay>` ISO-8601 duration.
    pub delay_minutes: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub stops_away: Option<u32>,
    pub progress_rate: String,
    pub recorded_at: String,
}

/// Builds a [`StopVisit`] from one `<MonitoredStopVisit>` fragment.
///
/// Every field is extracted independently; anything missing or malformed
/// becomes an empty string or `None`. This never fails.
pub fn parse_stop_visit(fragment: &str) -> StopVisit {
    let text = |tag: &str| extract_tag(fragment, tag).unwrap_or_default();

    StopVisit {
        line_ref: text("LineRef"),
        operator_ref: text("OperatorRef"),
        vehicle_ref: text("VehicleRef"),
        // The framed journey form wraps a DatedVehicleJourneyRef; the flat
        // VehicleJourneyRef is the fallback some agencies publish instead.
        journey_ref: extract_tag(fragment, "DatedVehicleJourneyRef")
            .or_else(|| extract_tag(fragment, "VehicleJourneyRef"))
            .unwrap_or_default(),
        destination_display: text("DestinationDisplay"),
        stop_point_ref: text("StopPointRef"),
        aimed_arrival_time: text("AimedArrivalTime"),
        expected_arrival_time: text("ExpectedArrivalTime"),
        aimed_departure_time: text("AimedDepartureTime"),
        expected_departure_time: text("ExpectedDepartureTime"),
        delay_minutes: extract_tag(fragment, "Delay").and_then(|d| parse_duration_minutes(&d)),
        latitude: extract_tag(fragment, "Latitude").and_then(|v| v.parse().ok()),
        longitude: extract_tag(fragment, "Longitude").and_then(|v| v.parse().ok()),
        stops_away: extract_tag(fragment, "NumberOfStopsAway").and_then(|v| v.parse().ok()),
        progress_rate: text("ProgressRate"),
        recorded_at: text("RecordedAtTime"),
    }
}

/// Parses a whole Stop-Monitoring delivery into visits for one stop.
///
/// Visits are kept when their `StopPointRef` equals or suffix-matches
/// `stop_code` (some agencies prefix stop codes with region identifiers),
/// and always kept when the field is absent.
pub fn parse_feed_xml(xml: &str, stop_code: &str) -> Vec<StopVisit> {
    extract_blocks(xml, "MonitoredStopVisit")
        .iter()
        .map(|block| parse_stop_visit(block))
        .filter(|visit| stop_ref_matches(&visit.stop_point_ref, stop_code))
        .collect()
}

fn stop_ref_matches(stop_point_ref: &str, stop_code: &str) -> bool {
    stop_point_ref.is_empty() || stop_point_ref.ends_with(stop_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_VISIT: &str = r#"
        <MonitoredVehicleJourney>
            <LineRef>480</LineRef>
            <OperatorRef>3</OperatorRef>
            <FramedVehicleJourneyRef>
                <DataFrameRef>2025-06-03</DataFrameRef>
                <DatedVehicleJourneyRef>28105324</DatedVehicleJourneyRef>
            </FramedVehicleJourneyRef>
            <DestinationDisplay>Jerusalem CBS</DestinationDisplay>
            <VehicleRef>7028869</VehicleRef>
            <ProgressRate>normalProgress</ProgressRate>
            <VehicleLocation>
                <Longitude>34.79437</Longitude>
                <Latitude>32.08744</Latitude>
            </VehicleLocation>
            <MonitoredCall>
                <StopPointRef>20608</StopPointRef>
                <AimedArrivalTime>2025-06-03T08:00:00+03:00</AimedArrivalTime>
                <ExpectedArrivalTime>2025-06-03T08:04:00+03:00</ExpectedArrivalTime>
                <AimedDepartureTime>2025-06-03T08:00:30+03:00</AimedDepartureTime>
                <ExpectedDepartureTime>2025-06-03T08:04:30+03:00</ExpectedDepartureTime>
                <NumberOfStopsAway>2</NumberOfStopsAway>
            </MonitoredCall>
            <Delay>PT4M</Delay>
        </MonitoredVehicleJourney>
        <RecordedAtTime>2025-06-03T07:58:12+03:00</RecordedAtTime>"#;

    #[test]
    fn test_parse_full_visit() {
        let visit = parse_stop_visit(FULL_VISIT);
        assert_eq!(visit.line_ref, "480");
        assert_eq!(visit.operator_ref, "3");
        assert_eq!(visit.vehicle_ref, "7028869");
        assert_eq!(visit.journey_ref, "28105324");
        assert_eq!(visit.destination_display, "Jerusalem CBS");
        assert_eq!(visit.stop_point_ref, "20608");
        assert_eq!(visit.aimed_arrival_time, "2025-06-03T08:00:00+03:00");
        assert_eq!(visit.expected_arrival_time, "2025-06-03T08:04:00+03:00");
        assert_eq!(visit.delay_minutes, Some(4));
        assert_eq!(visit.latitude, Some(32.08744));
        assert_eq!(visit.longitude, Some(34.79437));
        assert_eq!(visit.stops_away, Some(2));
        assert_eq!(visit.progress_rate, "normalProgress");
        assert_eq!(visit.recorded_at, "2025-06-03T07:58:12+03:00");
    }

    #[test]
    fn test_parse_empty_fragment_is_still_a_visit() {
        let visit = parse_stop_visit("");
        assert_eq!(visit, StopVisit::default());
    }

    #[test]
    fn test_malformed_numbers_become_none() {
        let xml = "<Latitude>north</Latitude><Delay>soon</Delay><NumberOfStopsAway>-2</NumberOfStopsAway>";
        let visit = parse_stop_visit(xml);
        assert_eq!(visit.latitude, None);
        assert_eq!(visit.delay_minutes, None);
        assert_eq!(visit.stops_away, None);
    }

    #[test]
    fn test_flat_vehicle_journey_ref_fallback() {
        let visit = parse_stop_visit("<VehicleJourneyRef>555-7</VehicleJourneyRef>");
        assert_eq!(visit.journey_ref, "555-7");
    }

    fn delivery(stop_refs: &[&str]) -> String {
        stop_refs
            .iter()
            .map(|s| {
                format!(
                    "<MonitoredStopVisit><StopPointRef>{s}</StopPointRef>\
                     <LineRef>18</LineRef></MonitoredStopVisit>"
                )
            })
            .collect()
    }

    #[test]
    fn test_feed_filters_by_stop_code() {
        let xml = delivery(&["20608", "20704", "20608"]);
        let visits = parse_feed_xml(&xml, "20608");
        assert_eq!(visits.len(), 2);
        assert!(visits.iter().all(|v| v.stop_point_ref == "20608"));
    }

    #[test]
    fn test_feed_suffix_matches_prefixed_codes() {
        let xml = delivery(&["IL:20608", "IL:20704"]);
        let visits = parse_feed_xml(&xml, "20608");
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].stop_point_ref, "IL:20608");
    }

    #[test]
    fn test_feed_keeps_visits_without_stop_ref() {
        let xml = "<MonitoredStopVisit><LineRef>90</LineRef></MonitoredStopVisit>";
        let visits = parse_feed_xml(xml, "20608");
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].line_ref, "90");
    }

    #[test]
    fn test_namespaced_delivery() {
        let xml = "\
            <siri:MonitoredStopVisit>\
              <siri:StopPointRef>20608</siri:StopPointRef>\
              <siri:LineRef>480</siri:LineRef>\
            </siri:MonitoredStopVisit>";
        let visits = parse_feed_xml(xml, "20608");
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].line_ref, "480");
    }
}
