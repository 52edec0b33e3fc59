//! Reconciles the reported incident time with the feed's arrival records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::siri::StopVisit;

/// Result of matching a reported time against the visits at a stop.
///
/// A "no match" outcome carries all-`None`/`false` fields; finding nothing
/// within tolerance is evidence in its own right, not an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArrivalMatch {
    pub visit: Option<StopVisit>,
    pub delay_minutes: Option<i64>,
    pub was_scheduled: bool,
    pub had_expected_arrival: bool,
}

/// Parses a feed timestamp (RFC 3339 with zone offset) into UTC; anything
/// unparseable is treated as absent.
pub(crate) fn parse_feed_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn line_matches(visit_line: &str, wanted: &str) -> bool {
    // Agencies may prefix line refs the same way they prefix stop codes.
    visit_line.ends_with(wanted)
}

/// Selects the visit whose aimed arrival best explains `target_time`.
///
/// Candidates are filtered by line (exact or suffix match) when a line is
/// given and must carry a parseable aimed arrival; the smallest absolute
/// difference wins, within the inclusive tolerance window. Ties keep the
/// first-seen candidate, so verdicts never depend on iteration luck.
pub fn find_relevant_arrival(
    visits: &[StopVisit],
    target_time: DateTime<Utc>,
    line_ref: Option<&str>,
    tolerance_minutes: i64,
) -> ArrivalMatch {
    let mut best: Option<(&StopVisit, i64)> = None;

    for visit in visits {
        if let Some(wanted) = line_ref {
            if !line_matches(&visit.line_ref, wanted) {
                continue;
            }
        }
        let Some(aimed) = parse_feed_time(&visit.aimed_arrival_time) else {
            continue;
        };

        let diff_secs = (aimed - target_time).num_seconds().abs();
        if diff_secs > tolerance_minutes * 60 {
            continue;
        }
        // Strict comparison keeps the earlier candidate on equal distance.
        if best.map_or(true, |(_, current)| diff_secs < current) {
            best = Some((visit, diff_secs));
        }
    }

    match best {
        Some((visit, _)) => ArrivalMatch {
            delay_minutes: calculate_delay_minutes(visit),
            was_scheduled: true,
            had_expected_arrival: !visit.expected_arrival_time.is_empty(),
            visit: Some(visit.clone()),
        },
        None => ArrivalMatch::default(),
    }
}

/// Delay in whole minutes between expected and aimed arrival, rounded half
/// away from zero. Positive means late. `None` unless both timestamps are
/// present and parseable.
pub fn calculate_delay_minutes(visit: &StopVisit) -> Option<i64> {
    let aimed = parse_feed_time(&visit.aimed_arrival_time)?;
    let expected = parse_feed_time(&visit.expected_arrival_time)?;
    let minutes = (expected - aimed).num_seconds() as f64 / 60.0;
    Some(minutes.round() as i64)
}
