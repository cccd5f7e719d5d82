//! JSON-ready summary of a track analysis.
//!
//! Geometries are left out; see [`crate::geojson_export`] and
//! [`crate::wkt_export`] for those. Distances and shares are rounded for
//! presentation.

use geo::Area;
use serde::Serialize;
use walkshed_core::prelude::*;
use walkshed_core::{MatchStats, SegmentId};

use crate::ReportError;

#[derive(Debug, Clone, Serialize)]
pub struct MatchingSummary {
    #[serde(flatten)]
    pub stats: MatchStats,
    /// Distinct segments in order of first match
    pub matched_segments: Vec<SegmentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceAreaSummary {
    pub reached_nodes: usize,
    pub seed_nodes: usize,
    pub max_distance_m: f64,
    /// Largest network distance among reached junctions
    pub farthest_node_m: Option<f64>,
    pub area_km2: f64,
}

impl ServiceAreaSummary {
    fn new(area: &ServiceArea) -> Self {
        let farthest = area.distances().values().copied().reduce(f64::max);
        let area_m2 = area.polygon().map_or(0.0, |polygon| polygon.unsigned_area());

        Self {
            reached_nodes: area.len(),
            seed_nodes: area.seeds().len(),
            max_distance_m: area.max_distance(),
            farthest_node_m: farthest.map(|d| round_to(d, 1)),
            area_km2: round_to(area_m2 / 1_000_000.0, 3),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageSummary {
    pub served_count: usize,
    /// Only with a region
    pub unserved_count: Option<usize>,
    /// Served zones touched by the track corridor
    pub direct_count: usize,
    pub served_ids: Vec<String>,
    pub served: PopulationStats,
    pub unserved: Option<PopulationStats>,
    pub region_totals: Option<PopulationStats>,
    pub service_area_empty: bool,
}

impl CoverageSummary {
    fn new(coverage: &CoverageResult, blocks: &[Zone]) -> Self {
        let has_region = coverage.region_totals.is_some();
        Self {
            served_count: coverage.served.len(),
            unserved_count: has_region.then_some(coverage.unserved.len()),
            direct_count: coverage.direct_count,
            served_ids: coverage
                .served_zones(blocks)
                .map(|zone| zone.id.clone())
                .collect(),
            served: coverage.served_stats.clone(),
            unserved: coverage.unserved_stats.clone(),
            region_totals: coverage.region_totals.clone(),
            service_area_empty: coverage.service_area_empty,
        }
    }
}

/// Serializable view of a [`TrackAnalysis`]
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub mode: ReachabilityMode,
    pub network_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub metrics: TrackMetrics,
    pub matching: Option<MatchingSummary>,
    pub roads: Option<RoadAttributeSummary>,
    pub service_area: Option<ServiceAreaSummary>,
    pub coverage: CoverageSummary,
    pub localities: LocalityReport,
}

impl AnalysisReport {
    /// `blocks` must be the zone slice the coverage was computed on.
    pub fn new(analysis: &TrackAnalysis, blocks: &[Zone]) -> Self {
        Self {
            mode: analysis.mode,
            network_loaded: analysis.network_loaded,
            region: analysis.region.clone(),
            metrics: analysis.metrics.clone(),
            matching: analysis.matching.as_ref().map(|matching| MatchingSummary {
                stats: matching.stats.clone(),
                matched_segments: matching.matched_segments(),
            }),
            roads: analysis.roads.as_ref().map(rounded_roads),
            service_area: analysis.service_area.as_ref().map(ServiceAreaSummary::new),
            coverage: CoverageSummary::new(&analysis.coverage, blocks),
            localities: analysis.localities.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization fails.
    pub fn to_value(&self) -> Result<serde_json::Value, ReportError> {
        Ok(serde_json::to_value(self)?)
    }
}

fn rounded_roads(summary: &RoadAttributeSummary) -> RoadAttributeSummary {
    let mut rounded = summary.clone();
    rounded.matched_length_m = round_to(rounded.matched_length_m, 1);
    rounded.matched_length_km = round_to(rounded.matched_length_km, 3);
    for km in rounded
        .surface_km
        .values_mut()
        .chain(rounded.administration_km.values_mut())
        .chain(rounded.road_class_km.values_mut())
    {
        *km = round_to(*km, 3);
    }
    rounded.defaulted.surface_km = round_to(rounded.defaulted.surface_km, 3);
    rounded.defaulted.administration_km = round_to(rounded.defaulted.administration_km, 3);
    rounded
}

#[allow(clippy::cast_possible_wrap)]
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_requested_decimals() {
        assert!((round_to(1.23456, 3) - 1.235).abs() < 1e-12);
        assert!((round_to(290.66, 1) - 290.7).abs() < 1e-12);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
