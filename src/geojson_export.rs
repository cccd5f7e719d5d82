//! GeoJSON rendering of analysis geometries.
//!
//! Coordinates stay in the planar system the analysis ran in. Every
//! feature carries a `layer` property so a single collection can hold
//! track, roads, service area and zones.

use geo::{LineString, MultiLineString, MultiPolygon};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Value, json};
use walkshed_core::prelude::*;

use crate::{ReportError, report::round_to};

pub const LAYER_TRACK: &str = "aligned_track";
pub const LAYER_SEGMENT: &str = "matched_segment";
pub const LAYER_SERVICE_AREA: &str = "service_area";
pub const LAYER_ZONE: &str = "zone";

fn feature(geometry: Geometry, properties: Value) -> Result<Feature, ReportError> {
    let Value::Object(properties) = properties else {
        return Err(ReportError::GeoJson(format!(
            "feature properties must be an object, got {properties}"
        )));
    };
    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

fn line_geometry(line: &LineString<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(line))
}

fn segment_geometry(segment: &RoadSegment) -> Geometry {
    if segment.extra_parts.is_empty() {
        line_geometry(&segment.geometry)
    } else {
        let parts: MultiLineString<f64> = segment.parts().cloned().collect();
        Geometry::new(GeoJsonValue::from(&parts))
    }
}

fn area_geometry(area: &MultiPolygon<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(area))
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

/// The matched track as a line with its matching statistics
pub fn aligned_track_feature(matching: &MatchResult) -> Result<Feature, ReportError> {
    let stats = &matching.stats;
    feature(
        line_geometry(&matching.aligned),
        json!({
            "layer": LAYER_TRACK,
            "matched_points": stats.matched_points,
            "total_points": stats.total_points,
            "match_rate_pct": stats.match_rate_pct,
            "confidence": stats.confidence,
        }),
    )
}

/// One feature per distinct matched segment, in order of first match
pub fn matched_segment_features(
    matching: &MatchResult,
    network: &RoadNetwork,
) -> Result<Vec<Feature>, ReportError> {
    matching
        .matched_segments()
        .into_iter()
        .filter_map(|id| network.segment(id))
        .map(|segment| {
            feature(
                segment_geometry(segment),
                json!({
                    "layer": LAYER_SEGMENT,
                    "segment_id": segment.id,
                    "length_m": round_to(segment.length, 1),
                    "surface": segment.attributes.surface,
                    "administration": segment.attributes.administration,
                    "road_class": segment.attributes.road_class,
                }),
            )
        })
        .collect()
}

/// `None` when the area is empty
pub fn service_area_feature(area: &ServiceArea) -> Result<Option<Feature>, ReportError> {
    area.polygon()
        .map(|polygon| {
            feature(
                area_geometry(polygon),
                json!({
                    "layer": LAYER_SERVICE_AREA,
                    "max_distance_m": area.max_distance(),
                    "reached_nodes": area.len(),
                }),
            )
        })
        .transpose()
}

/// Served zones, followed by unserved region zones
pub fn zone_features(
    coverage: &CoverageResult,
    blocks: &[Zone],
) -> Result<Vec<Feature>, ReportError> {
    let served = coverage.served_zones(blocks).map(|zone| (zone, true));
    let unserved = coverage.unserved_zones(blocks).map(|zone| (zone, false));

    served
        .chain(unserved)
        .map(|(zone, is_served)| {
            let counts = &zone.demographics;
            feature(
                area_geometry(&zone.geometry),
                json!({
                    "layer": LAYER_ZONE,
                    "zone_id": zone.id,
                    "served": is_served,
                    "population": counts.total,
                    "disability": counts.disability,
                }),
            )
        })
        .collect()
}

/// All geometries of an analysis in one collection.
///
/// Matched segments are only included when the network is given.
pub fn analysis_to_geojson(
    analysis: &TrackAnalysis,
    network: Option<&RoadNetwork>,
    blocks: &[Zone],
) -> Result<FeatureCollection, ReportError> {
    let mut features = Vec::new();

    if let Some(matching) = &analysis.matching {
        features.push(aligned_track_feature(matching)?);
        if let Some(network) = network {
            features.extend(matched_segment_features(matching, network)?);
        }
    }
    if let Some(area) = &analysis.service_area
        && let Some(polygon) = service_area_feature(area)?
    {
        features.push(polygon);
    }
    features.extend(zone_features(&analysis.coverage, blocks)?);

    Ok(collection(features))
}

/// # Errors
///
/// Returns [`ReportError::Json`] if serialization fails.
pub fn to_geojson_string(collection: &FeatureCollection) -> Result<String, ReportError> {
    Ok(serde_json::to_string(collection)?)
}
