//! Distance, duration, elevation, slope and speed figures of a track.

use geo::{Distance, Haversine};
use itertools::Itertools;
use serde::Serialize;

use crate::{Meters, model::Track, model::TrackPoint};

/// Elevation changes at or below this are treated as GPS noise
pub const ELEVATION_NOISE: Meters = 1.0;
/// Segments shorter than this give no slope reading
pub const MIN_SLOPE_RUN: Meters = 5.0;
/// Slopes steeper than this, in percent, are discarded as GPS errors
pub const MAX_SLOPE_PCT: f64 = 25.0;
/// Slopes within this band, in percent, count as flat
pub const FLAT_SLOPE_PCT: f64 = 0.5;
/// Time steps shorter than this give no speed reading
pub const MIN_SPEED_STEP_SECS: f64 = 0.36;
/// Speeds outside this range, in km/h, are stops or GPS errors
pub const SPEED_RANGE_KMH: (f64, f64) = (0.5, 150.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationStats {
    pub min_m: f64,
    pub max_m: f64,
    pub gain_m: f64,
    pub loss_m: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SlopeStats {
    pub avg_uphill_pct: Option<f64>,
    /// Negative
    pub avg_downhill_pct: Option<f64>,
    /// Steepest kept slope in either direction; 0 without readings
    pub max_pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpeedStats {
    pub avg_kmh: Option<f64>,
    pub max_kmh: Option<f64>,
}

/// Summary figures of a recorded track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMetrics {
    pub point_count: usize,
    pub distance_km: f64,
    /// Whole minutes between the first and last timestamped fix
    pub duration_minutes: Option<i64>,
    pub elevation: Option<ElevationStats>,
    pub slope: SlopeStats,
    pub speed: SpeedStats,
}

impl TrackMetrics {
    /// Distances use the great-circle formula when both fixes carry
    /// geographic coordinates and planar distance otherwise.
    pub fn from_track(track: &Track) -> Self {
        let points = track.points();
        let distance: Meters = points
            .iter()
            .tuple_windows()
            .map(|(a, b)| step_distance(a, b))
            .sum();

        Self {
            point_count: points.len(),
            distance_km: distance / 1000.0,
            duration_minutes: duration_minutes(points),
            elevation: elevation_stats(points),
            slope: slope_stats(points),
            speed: speed_stats(points),
        }
    }
}

fn step_distance(a: &TrackPoint, b: &TrackPoint) -> Meters {
    match (a.geographic, b.geographic) {
        (Some(from), Some(to)) => Haversine.distance(from, to),
        _ => (b.projected.x() - a.projected.x()).hypot(b.projected.y() - a.projected.y()),
    }
}

fn duration_minutes(points: &[TrackPoint]) -> Option<i64> {
    let mut times = points.iter().filter_map(|point| point.time);
    let first = times.next()?;
    let last = times.last()?;
    Some((last - first).num_minutes())
}

fn elevation_stats(points: &[TrackPoint]) -> Option<ElevationStats> {
    let elevations: Vec<f64> = points.iter().filter_map(|point| point.elevation).collect();
    let (&first, rest) = elevations.split_first()?;

    let mut stats = ElevationStats {
        min_m: first,
        max_m: first,
        gain_m: 0.0,
        loss_m: 0.0,
    };
    let mut previous = first;
    for &elevation in rest {
        stats.min_m = stats.min_m.min(elevation);
        stats.max_m = stats.max_m.max(elevation);

        let change = elevation - previous;
        if change > ELEVATION_NOISE {
            stats.gain_m += change;
        } else if change < -ELEVATION_NOISE {
            stats.loss_m -= change;
        }
        previous = elevation;
    }

    Some(stats)
}

#[allow(clippy::cast_precision_loss)]
fn slope_stats(points: &[TrackPoint]) -> SlopeStats {
    let mut uphill = Vec::new();
    let mut downhill = Vec::new();

    for (a, b) in points.iter().tuple_windows() {
        let (Some(from), Some(to)) = (a.elevation, b.elevation) else {
            continue;
        };
        let run = step_distance(a, b);
        if run < MIN_SLOPE_RUN {
            continue;
        }

        let slope = (to - from) / run * 100.0;
        if slope.abs() > MAX_SLOPE_PCT {
            continue;
        }
        if slope > FLAT_SLOPE_PCT {
            uphill.push(slope);
        } else if slope < -FLAT_SLOPE_PCT {
            downhill.push(slope);
        }
    }

    let mean = |values: &[f64]| {
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    SlopeStats {
        avg_uphill_pct: mean(&uphill),
        avg_downhill_pct: mean(&downhill),
        max_pct: uphill
            .iter()
            .chain(&downhill)
            .map(|slope| slope.abs())
            .fold(0.0, f64::max),
    }
}

#[allow(clippy::cast_precision_loss)]
fn speed_stats(points: &[TrackPoint]) -> SpeedStats {
    let speeds: Vec<f64> = points
        .iter()
        .tuple_windows()
        .filter_map(|(a, b)| {
            let seconds = (b.time? - a.time?).num_milliseconds() as f64 / 1000.0;
            if seconds < MIN_SPEED_STEP_SECS {
                return None;
            }
            let kmh = step_distance(a, b) / 1000.0 / (seconds / 3600.0);
            (kmh > SPEED_RANGE_KMH.0 && kmh < SPEED_RANGE_KMH.1).then_some(kmh)
        })
        .collect();

    if speeds.is_empty() {
        return SpeedStats::default();
    }

    SpeedStats {
        avg_kmh: Some(speeds.iter().sum::<f64>() / speeds.len() as f64),
        max_kmh: speeds.iter().copied().reduce(f64::max),
    }
}
