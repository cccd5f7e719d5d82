//! Point-wise map matching of a track onto road segments.
//!
//! Each fix is assigned to its nearest segment within a tolerance,
//! independently of its neighbours. Consecutive fixes may jump between
//! unconnected segments; no path smoothing is applied.

use geo::{Coord, LineString, Point};
use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::{Meters, SegmentId, model::RoadNetwork, model::RoadSegment, model::Track};

/// Matching outcome for a single track point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointMatch {
    Matched {
        segment: SegmentId,
        /// Perpendicular distance to the segment
        distance: Meters,
    },
    Unmatched,
}

impl PointMatch {
    pub fn segment(&self) -> Option<SegmentId> {
        match self {
            Self::Matched { segment, .. } => Some(*segment),
            Self::Unmatched => None,
        }
    }
}

/// Summary of a matching run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub total_points: usize,
    pub matched_points: usize,
    pub unmatched_points: usize,
    /// Matched points over total points, in percent
    pub match_rate_pct: f64,
    /// Mean distance of matched points; `None` when nothing matched
    pub average_distance: Option<Meters>,
    /// `max(0, 100 - average / tolerance * 100)`, 0 when nothing matched
    pub confidence: f64,
    pub tolerance: Meters,
}

/// Result of matching a track onto the road network
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// One entry per track point, in track order
    pub points: Vec<PointMatch>,
    /// Matched points projected onto their segments, consecutive duplicates
    /// removed. Equal to the original track when fewer than two distinct
    /// projections exist.
    pub aligned: LineString<f64>,
    pub stats: MatchStats,
}

impl MatchResult {
    /// Distinct matched segment identifiers in order of first appearance
    pub fn matched_segments(&self) -> Vec<SegmentId> {
        self.points
            .iter()
            .filter_map(PointMatch::segment)
            .unique()
            .collect()
    }

    pub fn has_matches(&self) -> bool {
        self.stats.matched_points > 0
    }
}

struct Candidate<'a> {
    position: usize,
    segment: &'a RoadSegment,
    distance: Meters,
    projection: Point<f64>,
}

/// Matches every track point to its nearest segment within `tolerance`.
pub fn match_track(track: &Track, network: &RoadNetwork, tolerance: Meters) -> MatchResult {
    let mut points = Vec::with_capacity(track.len());
    let mut projections: Vec<Coord<f64>> = Vec::with_capacity(track.len());
    let mut distance_sum = 0.0;

    for track_point in track.points() {
        match nearest_segment(&track_point.projected, network, tolerance) {
            Some(candidate) => {
                distance_sum += candidate.distance;
                projections.push(candidate.projection.into());
                points.push(PointMatch::Matched {
                    segment: candidate.segment.id,
                    distance: candidate.distance,
                });
            }
            None => points.push(PointMatch::Unmatched),
        }
    }

    let stats = match_stats(track.len(), projections.len(), distance_sum, tolerance);
    let aligned = aligned_geometry(projections).unwrap_or_else(|| track.line_string());

    debug!(
        "Matched {}/{} track points (confidence {:.1})",
        stats.matched_points, stats.total_points, stats.confidence
    );

    MatchResult {
        points,
        aligned,
        stats,
    }
}

/// Nearest segment to `point` within `tolerance`. Ties go to the segment
/// loaded first.
fn nearest_segment<'a>(
    point: &Point<f64>,
    network: &'a RoadNetwork,
    tolerance: Meters,
) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;

    for (position, segment) in network.segment_candidates(point, tolerance) {
        let Some(projection) = segment.closest_point(point) else {
            continue;
        };
        let distance = (point.x() - projection.x()).hypot(point.y() - projection.y());

        let closer = best.as_ref().is_none_or(|current| {
            distance < current.distance
                || (distance == current.distance && position < current.position)
        });
        if closer {
            best = Some(Candidate {
                position,
                segment,
                distance,
                projection,
            });
        }
    }

    best.filter(|candidate| candidate.distance <= tolerance)
}

#[allow(clippy::cast_precision_loss)]
fn match_stats(
    total: usize,
    matched: usize,
    distance_sum: Meters,
    tolerance: Meters,
) -> MatchStats {
    let average_distance = (matched > 0).then(|| distance_sum / matched as f64);
    let confidence = average_distance
        .map(|avg| (100.0 - avg / tolerance * 100.0).max(0.0))
        .unwrap_or(0.0);
    let match_rate_pct = if total > 0 {
        matched as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    MatchStats {
        total_points: total,
        matched_points: matched,
        unmatched_points: total - matched,
        match_rate_pct,
        average_distance,
        confidence,
        tolerance,
    }
}

fn aligned_geometry(projections: Vec<Coord<f64>>) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = projections.into_iter().dedup().collect();
    (coords.len() >= 2).then(|| LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::{build_road_network, model::RoadSegment};

    fn network() -> RoadNetwork {
        build_road_network(vec![
            RoadSegment::new(10, line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)], 1, 2, 1000.0),
            RoadSegment::new(
                20,
                line_string![(x: 0.0, y: 500.0), (x: 1000.0, y: 500.0)],
                3,
                4,
                1000.0,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn tolerance_decides_match() {
        let track = Track::from_projected([(100.0, 40.0), (200.0, 60.0)]).unwrap();
        let result = match_track(&track, &network(), 50.0);

        match result.points[0] {
            PointMatch::Matched { segment, distance } => {
                assert_eq!(segment, 10);
                assert!((distance - 40.0).abs() < 1e-9);
            }
            PointMatch::Unmatched => panic!("point at 40 m should match"),
        }
        assert_eq!(result.points[1], PointMatch::Unmatched);
        assert!((result.stats.match_rate_pct - 50.0).abs() < 1e-9);
        assert!((result.stats.confidence - 20.0).abs() < 1e-9);
    }

    #[test]
    fn no_matches_fall_back_to_track() {
        let track = Track::from_projected([(100.0, 200.0), (200.0, 250.0)]).unwrap();
        let result = match_track(&track, &network(), 50.0);

        assert!(!result.has_matches());
        assert_eq!(result.stats.confidence, 0.0);
        assert_eq!(result.stats.average_distance, None);
        assert_eq!(result.aligned, track.line_string());
    }

    #[test]
    fn aligned_geometry_drops_repeated_projections() {
        let track =
            Track::from_projected([(100.0, 10.0), (100.0, -10.0), (300.0, 5.0), (300.0, 490.0)])
                .unwrap();
        let result = match_track(&track, &network(), 50.0);

        let expected = [(100.0, 0.0), (300.0, 0.0), (300.0, 500.0)];
        assert_eq!(result.aligned.0.len(), expected.len());
        for (coord, (x, y)) in result.aligned.coords().zip(expected) {
            assert!((coord.x - x).abs() < 1e-6 && (coord.y - y).abs() < 1e-6);
        }
        assert_eq!(result.matched_segments(), vec![10, 20]);
    }

    #[test]
    fn points_match_every_part_of_a_multi_part_segment() {
        let far_part = line_string![(x: 0.0, y: 2000.0), (x: 200.0, y: 2000.0)];
        let segment = RoadSegment::new(
            30,
            line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
            1,
            2,
            300.0,
        )
        .with_extra_parts(vec![far_part]);
        let network = build_road_network(vec![segment]).unwrap();
        let track = Track::from_projected([(50.0, 10.0), (150.0, 1990.0)]).unwrap();

        let result = match_track(&track, &network, 50.0);

        assert_eq!(result.stats.matched_points, 2);
        assert_eq!(result.matched_segments(), vec![30]);
        let end = result.aligned.0.last().unwrap();
        assert!((end.x - 150.0).abs() < 1e-9 && (end.y - 2000.0).abs() < 1e-9);
    }
}
