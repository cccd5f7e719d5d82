use std::path::Path;

use geo::{Euclidean, Geometry, Length, LineString};
use hashbrown::HashSet;
use log::{debug, info, warn};

use super::{
    FieldFallbacks,
    features::{
        feature_geometry, parse_feature_collection, parse_identifier, properties_record,
        read_source,
    },
};
use crate::{Error, SegmentId, model::RoadSegment};

/// Reads road segments from a GeoJSON feature collection in projected
/// coordinates.
///
/// Junction identifiers, segment identifier and length are resolved
/// through the field fallbacks. A missing segment identifier falls back to
/// the feature position, or to the next unused value when an explicit
/// identifier already holds that position. A missing length falls back to
/// the planar length of the first part. For multi-part lines the first part
/// is routed and the others are kept for matching. Features without a line
/// geometry or without junction identifiers are skipped.
///
/// # Errors
///
/// Returns [`Error::GeoJson`] if the document is not a feature collection.
pub fn read_road_segments(
    source: &str,
    fields: &FieldFallbacks,
) -> Result<Vec<RoadSegment>, Error> {
    let collection = parse_feature_collection(source)?;
    let total = collection.features.len();

    let mut segments = Vec::with_capacity(total);
    let mut without_line = 0;
    let mut without_junctions = 0;
    // (index into `segments`, feature position) of segments without an id
    let mut unnamed = Vec::new();

    for (position, feature) in collection.features.into_iter().enumerate() {
        let record = properties_record(&feature);

        let Some((line, extra_parts)) = feature_geometry(feature).and_then(split_parts) else {
            without_line += 1;
            continue;
        };

        let junction = |candidates: &[String]| {
            FieldFallbacks::lookup(candidates, &record).and_then(parse_identifier)
        };
        let (Some(from_node), Some(to_node)) =
            (junction(&fields.from_node), junction(&fields.to_node))
        else {
            without_junctions += 1;
            continue;
        };

        let id = junction(&fields.segment_id);
        if id.is_none() {
            unnamed.push((segments.len(), position));
        }
        let length = FieldFallbacks::lookup(&fields.length, &record)
            .and_then(|raw| raw.parse::<f64>().ok())
            .unwrap_or_else(|| Euclidean.length(&line));

        segments.push(
            RoadSegment::from_record(
                id.unwrap_or_default(),
                line,
                from_node,
                to_node,
                length,
                &record,
                fields,
            )
            .with_extra_parts(extra_parts),
        );
    }

    if !unnamed.is_empty() {
        assign_fallback_ids(&mut segments, &unnamed);
    }

    if without_line + without_junctions > 0 {
        warn!(
            "Skipped {} of {total} road features ({without_line} without line geometry, {without_junctions} without junction identifiers)",
            without_line + without_junctions
        );
    }
    info!("Read {} road segments", segments.len());

    Ok(segments)
}

/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, otherwise see
/// [`read_road_segments`].
pub fn read_road_segments_file(
    path: impl AsRef<Path>,
    fields: &FieldFallbacks,
) -> Result<Vec<RoadSegment>, Error> {
    read_road_segments(&read_source(path.as_ref())?, fields)
}

/// Gives each unnamed segment its feature position as identifier, or the
/// next value above every identifier in use when that position is taken.
fn assign_fallback_ids(segments: &mut [RoadSegment], unnamed: &[(usize, usize)]) {
    let unnamed_slots: HashSet<usize> = unnamed.iter().map(|&(slot, _)| slot).collect();
    let mut taken: HashSet<SegmentId> = segments
        .iter()
        .enumerate()
        .filter(|(slot, _)| !unnamed_slots.contains(slot))
        .map(|(_, segment)| segment.id)
        .collect();
    let mut next_free = taken
        .iter()
        .copied()
        .chain(unnamed.iter().map(|&(_, position)| position as SegmentId))
        .max()
        .map_or(0, |max| max + 1);

    for &(slot, position) in unnamed {
        let mut id = position as SegmentId;
        if taken.contains(&id) {
            id = next_free;
            next_free += 1;
            debug!("Feature {position} has no segment id and its position is taken, using {id}");
        }
        taken.insert(id);
        segments[slot].id = id;
    }
}

/// First line of the geometry and any further parts
fn split_parts(geometry: Geometry<f64>) -> Option<(LineString<f64>, Vec<LineString<f64>>)> {
    match geometry {
        Geometry::LineString(line) => Some((line, Vec::new())),
        Geometry::MultiLineString(lines) => {
            let mut parts = lines.0.into_iter();
            parts.next().map(|first| (first, parts.collect()))
        }
        _ => None,
    }
}
