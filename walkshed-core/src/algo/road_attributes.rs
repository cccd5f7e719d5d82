//! Road length per surface, administration and road class over the
//! segments a track was matched to.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use log::warn;
use serde::Serialize;

use crate::{Meters, algo::map_matching::MatchResult, model::RoadNetwork, model::RoadSegment};

/// Bucket for segments without a surface value. Missing surface is
/// counted as paved.
pub const DEFAULT_SURFACE: &str = "Con pavimento";
/// Bucket for segments without an administration value. Missing
/// administration is counted as municipal.
pub const DEFAULT_ADMINISTRATION: &str = "Municipal";
/// Bucket for segments without a road class
pub const UNKNOWN_ROAD_CLASS: &str = "N/A";

/// Length that was assigned to a default bucket, in kilometers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefaultedLength {
    pub surface_km: f64,
    pub administration_km: f64,
}

/// Road length breakdown of the matched segments.
///
/// Every matched segment is counted once with its own length, however
/// many track points matched it, so each category map sums to
/// `matched_length_km`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoadAttributeSummary {
    pub matched_segments: usize,
    pub matched_length_m: Meters,
    pub matched_length_km: f64,
    pub surface_km: BTreeMap<String, f64>,
    pub administration_km: BTreeMap<String, f64>,
    pub road_class_km: BTreeMap<String, f64>,
    pub defaulted: DefaultedLength,
}

impl RoadAttributeSummary {
    pub fn is_empty(&self) -> bool {
        self.matched_segments == 0
    }
}

/// Classifies the distinct segments of a match result.
pub fn classify_matched_roads(
    matches: &MatchResult,
    network: &RoadNetwork,
) -> RoadAttributeSummary {
    let segment_ids = matches.matched_segments();
    let segments = segment_ids.iter().filter_map(|&id| {
        let segment = network.segment(id);
        if segment.is_none() {
            warn!("Matched segment {id} is not part of the network");
        }
        segment
    });

    classify_segments(segments)
}

/// Classifies a set of segments, ignoring repeated identifiers.
pub fn classify_segments<'a, I>(segments: I) -> RoadAttributeSummary
where
    I: IntoIterator<Item = &'a RoadSegment>,
{
    let mut summary = RoadAttributeSummary::default();
    let mut seen = HashSet::new();

    for segment in segments {
        if !seen.insert(segment.id) {
            continue;
        }

        let km = segment.length / 1000.0;
        summary.matched_segments += 1;
        summary.matched_length_m += segment.length;

        let surface = match segment.attributes.surface.as_deref() {
            Some(surface) => surface,
            None => {
                summary.defaulted.surface_km += km;
                DEFAULT_SURFACE
            }
        };
        *summary.surface_km.entry(surface.to_owned()).or_default() += km;

        let administration = match segment.attributes.administration.as_deref() {
            Some(administration) => administration,
            None => {
                summary.defaulted.administration_km += km;
                DEFAULT_ADMINISTRATION
            }
        };
        *summary
            .administration_km
            .entry(administration.to_owned())
            .or_default() += km;

        let road_class = segment
            .attributes
            .road_class
            .as_deref()
            .unwrap_or(UNKNOWN_ROAD_CLASS);
        *summary.road_class_km.entry(road_class.to_owned()).or_default() += km;
    }

    summary.matched_length_km = summary.matched_length_m / 1000.0;
    summary
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::model::{RoadAttributes, RoadSegment};

    fn segment(id: u64, length: f64, surface: Option<&str>, admin: Option<&str>) -> RoadSegment {
        RoadSegment::new(
            id,
            line_string![(x: 0.0, y: 0.0), (x: length, y: 0.0)],
            id,
            id + 1,
            length,
        )
        .with_attributes(RoadAttributes {
            surface: surface.map(str::to_owned),
            administration: admin.map(str::to_owned),
            road_class: None,
        })
    }

    #[test]
    fn missing_values_use_defaults_and_are_audited() {
        let segments = [
            segment(1, 1500.0, Some("Sin pavimento"), Some("Federal")),
            segment(2, 500.0, None, None),
            segment(3, 250.0, Some("Con pavimento"), None),
        ];

        let summary = classify_segments(&segments);

        assert_eq!(summary.matched_segments, 3);
        assert!((summary.matched_length_km - 2.25).abs() < 1e-12);
        assert!((summary.surface_km["Con pavimento"] - 0.75).abs() < 1e-12);
        assert!((summary.surface_km["Sin pavimento"] - 1.5).abs() < 1e-12);
        assert!((summary.administration_km["Municipal"] - 0.75).abs() < 1e-12);
        assert!((summary.defaulted.surface_km - 0.5).abs() < 1e-12);
        assert!((summary.defaulted.administration_km - 0.75).abs() < 1e-12);
        assert!((summary.road_class_km[UNKNOWN_ROAD_CLASS] - 2.25).abs() < 1e-12);
    }

    #[test]
    fn repeated_segments_count_once() {
        let a = segment(7, 1000.0, None, None);
        let summary = classify_segments([&a, &a, &a]);

        assert_eq!(summary.matched_segments, 1);
        assert!((summary.matched_length_m - 1000.0).abs() < 1e-12);
    }
}
