//! Served and unserved zones of a track, with population totals.

use std::collections::BTreeSet;

use geo::{BooleanOps, Buffer, Intersects, MultiPolygon};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Meters,
    algo::service_area::ServiceArea,
    loading::ReachabilityMode,
    model::{Demographics, RoadNetwork, Track, Zone},
};

/// Parameters of zone classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageParams {
    /// Width of the corridor around the track whose zones are always served
    pub corridor_width: Meters,
    /// Walking distance budget, used as buffer width in straight-line mode
    pub max_distance: Meters,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            corridor_width: 50.0,
            max_distance: 700.0,
        }
    }
}

/// Population counts summed over a set of zones
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationStats {
    pub zone_count: usize,
    pub total: u64,
    pub female: u64,
    pub male: u64,
    pub age_0_14: u64,
    pub age_15_29: u64,
    pub age_30_59: u64,
    pub age_60_plus: u64,
    pub disability: u64,
    /// Disability over total population in percent, two decimals; 0 when
    /// the population is 0
    pub disability_pct: f64,
}

impl PopulationStats {
    pub fn aggregate<'a, I>(zones: I) -> Self
    where
        I: IntoIterator<Item = &'a Zone>,
    {
        let mut stats = zones.into_iter().fold(Self::default(), |mut stats, zone| {
            stats.zone_count += 1;
            stats.add(&zone.demographics);
            stats
        });
        stats.disability_pct = disability_share(stats.disability, stats.total);
        stats
    }

    fn add(&mut self, counts: &Demographics) {
        self.total += counts.total;
        self.female += counts.female;
        self.male += counts.male;
        self.age_0_14 += counts.age_0_14;
        self.age_15_29 += counts.age_15_29;
        self.age_30_59 += counts.age_30_59;
        self.age_60_plus += counts.age_60_plus;
        self.disability += counts.disability;
    }
}

#[allow(clippy::cast_precision_loss)]
fn disability_share(disability: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (disability as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Partition of zones into served and unserved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    pub mode: ReachabilityMode,
    /// Positions of served zones in the input slice, ascending
    pub served: Vec<usize>,
    /// Positions of region zones that are not served; empty without a region
    pub unserved: Vec<usize>,
    pub served_stats: PopulationStats,
    /// Present when a region was given
    pub unserved_stats: Option<PopulationStats>,
    /// Present when a region was given
    pub region_totals: Option<PopulationStats>,
    /// Served zones touched by the track corridor
    pub direct_count: usize,
    /// True when network mode found no reachable junction, so only the
    /// corridor contributed
    pub service_area_empty: bool,
}

impl CoverageResult {
    pub fn served_zones<'a>(&'a self, zones: &'a [Zone]) -> impl Iterator<Item = &'a Zone> {
        self.served.iter().filter_map(|&idx| zones.get(idx))
    }

    pub fn unserved_zones<'a>(&'a self, zones: &'a [Zone]) -> impl Iterator<Item = &'a Zone> {
        self.unserved.iter().filter_map(|&idx| zones.get(idx))
    }
}

/// Classifies zones by network reachability from the track.
///
/// Zones touching the track corridor are always served. Other zones that
/// intersect the service-area polygon are served when their centroid is
/// reachable. With a region, served zones are limited to those touching it
/// and the remaining region zones form the unserved set.
pub fn classify_zones(
    track: &Track,
    service_area: &ServiceArea,
    network: &RoadNetwork,
    zones: &[Zone],
    region: Option<&MultiPolygon<f64>>,
    params: &CoverageParams,
) -> CoverageResult {
    let direct = zones_touching(zones, &corridor(track, params.corridor_width));
    let mut served: BTreeSet<usize> = direct.iter().copied().collect();

    if let Some(polygon) = service_area.polygon() {
        let reachable = zones
            .par_iter()
            .enumerate()
            .filter(|(idx, zone)| {
                !served.contains(idx)
                    && zone.geometry.intersects(polygon)
                    && service_area.is_reachable(&zone.centroid, network)
            })
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        debug!(
            "{} corridor zones, {} reachable through the network",
            direct.len(),
            reachable.len()
        );
        served.extend(reachable);
    } else {
        info!("Service area is empty; only corridor zones are served");
    }

    let direct_count = direct.len();
    finish(
        ReachabilityMode::Network,
        zones,
        served,
        region,
        direct_count,
        service_area.is_empty(),
    )
}

/// Classifies zones by a plain buffer of `max_distance` around the track.
///
/// Only used when the caller explicitly asks for straight-line coverage.
pub fn classify_zones_straight_line(
    track: &Track,
    zones: &[Zone],
    region: Option<&MultiPolygon<f64>>,
    params: &CoverageParams,
) -> CoverageResult {
    let served: BTreeSet<usize> = zones_touching(zones, &corridor(track, params.max_distance))
        .into_iter()
        .collect();
    let direct_count = zones_touching(zones, &corridor(track, params.corridor_width)).len();

    finish(
        ReachabilityMode::StraightLine,
        zones,
        served,
        region,
        direct_count,
        false,
    )
}

fn finish(
    mode: ReachabilityMode,
    zones: &[Zone],
    mut served: BTreeSet<usize>,
    region: Option<&MultiPolygon<f64>>,
    direct_count: usize,
    service_area_empty: bool,
) -> CoverageResult {
    let (unserved, unserved_stats, region_totals) = match region {
        Some(region) => {
            served.retain(|&idx| zones[idx].geometry.intersects(region));
            let in_region = zones_touching(zones, region);
            let unserved: Vec<usize> = in_region
                .iter()
                .copied()
                .filter(|idx| !served.contains(idx))
                .collect();

            let unserved_stats =
                PopulationStats::aggregate(unserved.iter().map(|&idx| &zones[idx]));
            let totals = PopulationStats::aggregate(in_region.iter().map(|&idx| &zones[idx]));
            (unserved, Some(unserved_stats), Some(totals))
        }
        None => (Vec::new(), None, None),
    };

    let served: Vec<usize> = served.into_iter().collect();
    let served_stats = PopulationStats::aggregate(served.iter().map(|&idx| &zones[idx]));

    info!(
        "{} zones served ({} people), {} unserved",
        served.len(),
        served_stats.total,
        unserved.len()
    );

    CoverageResult {
        mode,
        served,
        unserved,
        served_stats,
        unserved_stats,
        region_totals,
        direct_count,
        service_area_empty,
    }
}

fn corridor(track: &Track, width: Meters) -> MultiPolygon<f64> {
    track.line_string().buffer(width)
}

fn zones_touching(zones: &[Zone], area: &MultiPolygon<f64>) -> Vec<usize> {
    zones
        .par_iter()
        .enumerate()
        .filter(|(_, zone)| zone.geometry.intersects(area))
        .map(|(idx, _)| idx)
        .collect()
}

/// Looks up a municipality by name, ignoring case, and returns the union
/// of every matching geometry.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] if no municipality carries that name.
pub fn find_region(municipalities: &[Zone], name: &str) -> Result<MultiPolygon<f64>, Error> {
    let wanted = name.trim().to_uppercase();

    municipalities
        .iter()
        .filter(|zone| {
            zone.name
                .as_deref()
                .is_some_and(|candidate| candidate.trim().to_uppercase() == wanted)
        })
        .map(|zone| zone.geometry.clone())
        .reduce(|acc, geometry| acc.union(&geometry))
        .ok_or_else(|| Error::InvalidData(format!("no municipality named {name}")))
}
