//! Shared road network state and the per-track analysis pipeline

use std::sync::{Arc, PoisonError, RwLock};

use log::info;

use crate::{
    Error,
    algo::{
        coverage::{CoverageResult, classify_zones, classify_zones_straight_line, find_region},
        localities::{LocalityReport, detect_localities, detect_localities_straight_line},
        map_matching::{MatchResult, match_track},
        road_attributes::{RoadAttributeSummary, classify_matched_roads},
        service_area::{ServiceArea, compute_service_area},
        track_metrics::TrackMetrics,
    },
    loading::{AnalysisConfig, ReachabilityMode},
    model::{RoadNetwork, Track, Zone},
};

/// Holder for the network shared by concurrent analyses.
///
/// Readers take an `Arc` snapshot and keep using it even if the network is
/// replaced meanwhile, so a half-built network is never observed.
#[derive(Debug, Default)]
pub struct NetworkHandle {
    current: RwLock<Option<Arc<RoadNetwork>>>,
}

impl NetworkHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(network: RoadNetwork) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(network))),
        }
    }

    /// The network currently loaded, if any
    pub fn snapshot(&self) -> Option<Arc<RoadNetwork>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new network and returns the previous one
    pub fn replace(&self, network: RoadNetwork) -> Option<Arc<RoadNetwork>> {
        info!(
            "Replacing road network ({} nodes, {} edges)",
            network.node_count(),
            network.edge_count()
        );
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.replace(Arc::new(network))
    }

    pub fn clear(&self) -> Option<Arc<RoadNetwork>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Census layers an analysis classifies
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    pub blocks: Vec<Zone>,
    pub localities: Vec<Zone>,
    pub municipalities: Vec<Zone>,
}

impl ZoneSet {
    pub fn new(blocks: Vec<Zone>, localities: Vec<Zone>, municipalities: Vec<Zone>) -> Self {
        Self {
            blocks,
            localities,
            municipalities,
        }
    }
}

/// Everything computed for one track
#[derive(Debug, Clone)]
pub struct TrackAnalysis {
    pub mode: ReachabilityMode,
    /// False when no road network was available; matching and service
    /// area are then absent
    pub network_loaded: bool,
    pub metrics: TrackMetrics,
    pub matching: Option<MatchResult>,
    pub roads: Option<RoadAttributeSummary>,
    pub service_area: Option<ServiceArea>,
    pub coverage: CoverageResult,
    pub localities: LocalityReport,
    /// Municipality the coverage was limited to
    pub region: Option<String>,
}

/// Runs the whole analysis of a track.
///
/// Network mode needs a road network. Straight-line mode works without
/// one and then skips matching.
///
/// # Errors
///
/// Returns [`Error::Config`] for an invalid configuration,
/// [`Error::DataLoad`] when network mode is requested without a network
/// and [`Error::InvalidData`] when the region name is unknown.
pub fn analyze_track(
    track: &Track,
    network: Option<&RoadNetwork>,
    zones: &ZoneSet,
    region: Option<&str>,
    config: &AnalysisConfig,
) -> Result<TrackAnalysis, Error> {
    config.validate()?;

    let region_geometry = region
        .map(|name| find_region(&zones.municipalities, name))
        .transpose()?;
    let coverage_params = config.coverage_params();

    if config.mode == ReachabilityMode::Network && network.is_none() {
        return Err(Error::DataLoad(
            "network mode requested but no road network is loaded".into(),
        ));
    }

    let metrics = TrackMetrics::from_track(track);
    let matching = network.map(|network| match_track(track, network, config.match_tolerance));
    let roads = network
        .zip(matching.as_ref())
        .map(|(network, matching)| classify_matched_roads(matching, network));

    let (service_area, coverage, localities) = match (config.mode, network) {
        (ReachabilityMode::Network, Some(network)) => {
            let area = compute_service_area(track, network, &config.reachability_params());
            let coverage = classify_zones(
                track,
                &area,
                network,
                &zones.blocks,
                region_geometry.as_ref(),
                &coverage_params,
            );
            let localities =
                detect_localities(&area, network, &zones.localities, &zones.municipalities);
            (Some(area), coverage, localities)
        }
        _ => {
            let coverage = classify_zones_straight_line(
                track,
                &zones.blocks,
                region_geometry.as_ref(),
                &coverage_params,
            );
            let localities = detect_localities_straight_line(
                track,
                config.max_walking_distance,
                &zones.localities,
                &zones.municipalities,
            );
            (None, coverage, localities)
        }
    };

    info!(
        "Track analysed: {:.2} km, {} zones served, {} localities",
        metrics.distance_km,
        coverage.served.len(),
        localities.total_localities
    );

    Ok(TrackAnalysis {
        mode: config.mode,
        network_loaded: network.is_some(),
        metrics,
        matching,
        roads,
        service_area,
        coverage,
        localities,
        region: region.map(str::to_owned),
    })
}
