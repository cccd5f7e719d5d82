use std::collections::BTreeMap;

use geo::{BoundingRect, Closest, ClosestPoint, LineString, Point, Rect};
use serde::Serialize;

use crate::{Meters, NodeId, SegmentId, loading::FieldFallbacks};

/// Raw attribute fields of a source record, keyed by column name
pub type AttributeRecord = BTreeMap<String, String>;

/// Descriptive attributes of a road segment.
///
/// `None` means the source record carried no usable value; the attribute
/// classifier decides how missing values are bucketed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoadAttributes {
    /// Surface condition, e.g. paved / unpaved
    pub surface: Option<String>,
    /// Administrative jurisdiction, e.g. federal / state / municipal
    pub administration: Option<String>,
    /// Road class as published by the source network
    pub road_class: Option<String>,
}

impl RoadAttributes {
    /// Resolves attributes from a raw record using the configured column
    /// fallbacks.
    pub fn from_record(record: &AttributeRecord, fields: &FieldFallbacks) -> Self {
        Self {
            surface: FieldFallbacks::lookup(&fields.surface, record).map(str::to_owned),
            administration: FieldFallbacks::lookup(&fields.administration, record)
                .map(str::to_owned),
            road_class: FieldFallbacks::lookup(&fields.road_class, record).map(str::to_owned),
        }
    }
}

/// A single road segment of the source network
#[derive(Debug, Clone)]
pub struct RoadSegment {
    pub id: SegmentId,
    /// Polyline in projected coordinates, running from `from_node` to
    /// `to_node`
    pub geometry: LineString<f64>,
    /// Further parts of a multi-part source line. Matched against, never
    /// routed.
    pub extra_parts: Vec<LineString<f64>>,
    /// Junction at the start of the segment
    pub from_node: NodeId,
    /// Junction at the end of the segment
    pub to_node: NodeId,
    /// Published length in meters
    pub length: Meters,
    pub attributes: RoadAttributes,
}

/// Reason a segment cannot be added to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentDefect {
    TooFewCoordinates,
    NonFiniteCoordinate,
    DegenerateLength,
}

impl RoadSegment {
    pub fn new(
        id: SegmentId,
        geometry: LineString<f64>,
        from_node: NodeId,
        to_node: NodeId,
        length: Meters,
    ) -> Self {
        Self {
            id,
            geometry,
            from_node,
            to_node,
            length,
            extra_parts: Vec::new(),
            attributes: RoadAttributes::default(),
        }
    }

    #[must_use]
    pub fn with_extra_parts(mut self, parts: Vec<LineString<f64>>) -> Self {
        self.extra_parts = parts;
        self
    }

    /// Routed polyline followed by any extra parts
    pub fn parts(&self) -> impl Iterator<Item = &LineString<f64>> {
        std::iter::once(&self.geometry).chain(&self.extra_parts)
    }

    /// Closest point over all parts; ties go to the earlier part
    pub fn closest_point(&self, point: &Point<f64>) -> Option<Point<f64>> {
        self.parts()
            .filter_map(|part| match part.closest_point(point) {
                Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p),
                Closest::Indeterminate => None,
            })
            .min_by(|a, b| {
                let da = (point.x() - a.x()).hypot(point.y() - a.y());
                let db = (point.x() - b.x()).hypot(point.y() - b.y());
                da.total_cmp(&db)
            })
    }

    /// Bounding box over all parts
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.parts()
            .filter_map(|part| part.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: RoadAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builds a segment from a raw source record, resolving attributes by
    /// the configured field fallbacks.
    pub fn from_record(
        id: SegmentId,
        geometry: LineString<f64>,
        from_node: NodeId,
        to_node: NodeId,
        length: Meters,
        record: &AttributeRecord,
        fields: &FieldFallbacks,
    ) -> Self {
        Self::new(id, geometry, from_node, to_node, length)
            .with_attributes(RoadAttributes::from_record(record, fields))
    }

    pub(crate) fn check(&self) -> Result<(), SegmentDefect> {
        if self.geometry.0.len() < 2 {
            return Err(SegmentDefect::TooFewCoordinates);
        }
        if self
            .parts()
            .flat_map(LineString::coords)
            .any(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(SegmentDefect::NonFiniteCoordinate);
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(SegmentDefect::DegenerateLength);
        }
        Ok(())
    }
}
