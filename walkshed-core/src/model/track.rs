//! GPS track model

use chrono::{DateTime, Utc};
use geo::{Coord, Euclidean, Length, LineString, Point};
use log::debug;

use crate::{Error, Meters};

/// A single GPS fix.
///
/// `projected` is the planar position used for matching and routing.
/// `geographic` (longitude, latitude) is kept for track metrics only.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub projected: Point<f64>,
    pub geographic: Option<Point<f64>>,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(projected: Point<f64>) -> Self {
        Self {
            projected,
            geographic: None,
            elevation: None,
            time: None,
        }
    }

    /// Point with both planar and geographic (lon, lat) positions
    pub fn with_geographic(projected: Point<f64>, lon: f64, lat: f64) -> Self {
        Self {
            geographic: Some(Point::new(lon, lat)),
            ..Self::new(projected)
        }
    }

    #[must_use]
    pub fn elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    #[must_use]
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    fn is_valid(&self) -> bool {
        self.projected.x().is_finite() && self.projected.y().is_finite()
    }
}

/// Ordered sequence of GPS fixes, at least two of them with valid
/// coordinates. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Creates a track, discarding fixes with non-finite projected
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if fewer than two valid fixes remain.
    pub fn new(points: Vec<TrackPoint>) -> Result<Self, Error> {
        let total = points.len();
        let points: Vec<TrackPoint> = points.into_iter().filter(TrackPoint::is_valid).collect();

        if points.len() < total {
            debug!(
                "Discarded {} track points with invalid coordinates",
                total - points.len()
            );
        }

        if points.len() < 2 {
            return Err(Error::EmptyInput(format!(
                "track has {} valid points out of {total}, at least 2 are required",
                points.len()
            )));
        }

        Ok(Self { points })
    }

    /// Creates a track from planar coordinates only
    ///
    /// # Errors
    ///
    /// See [`Track::new`].
    pub fn from_projected<I>(coords: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(
            coords
                .into_iter()
                .map(|(x, y)| TrackPoint::new(Point::new(x, y)))
                .collect(),
        )
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Planar polyline through all fixes
    pub fn line_string(&self) -> LineString<f64> {
        self.points
            .iter()
            .map(|p| Coord::from(p.projected))
            .collect()
    }

    /// Planar length in meters
    pub fn length(&self) -> Meters {
        Euclidean.length(&self.line_string())
    }
}
