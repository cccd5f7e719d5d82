use geojson::FeatureCollection;
use log::info;
use walkshed_core::BuildReport;
use walkshed_core::prelude::*;

use crate::{ReportError, geojson_export::analysis_to_geojson, report::AnalysisReport};

/// Long-lived analysis context.
///
/// Holds the zone layers and configuration, plus a road network that can be
/// swapped while analyses are running. Every analysis works on the network
/// snapshot taken when it started.
#[derive(Debug)]
pub struct Analyzer {
    network: NetworkHandle,
    zones: ZoneSet,
    config: AnalysisConfig,
}

impl Analyzer {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(zones: ZoneSet, config: AnalysisConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            network: NetworkHandle::new(),
            zones,
            config,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn with_network(
        network: RoadNetwork,
        zones: ZoneSet,
        config: AnalysisConfig,
    ) -> Result<Self, Error> {
        let analyzer = Self::new(zones, config)?;
        analyzer.network.replace(network);
        Ok(analyzer)
    }

    /// Builds a network from `segments` and makes it current.
    ///
    /// The previous network stays in use by analyses already running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataLoad`] if no usable segment remains.
    pub fn load_network(&self, segments: Vec<RoadSegment>) -> Result<BuildReport, Error> {
        let network = build_road_network(segments)?;
        let report = network.build_report().clone();
        self.network.replace(network);
        info!(
            "Road network loaded ({} segments, {} skipped)",
            report.loaded_segments,
            report.skipped_segments()
        );
        Ok(report)
    }

    pub fn clear_network(&self) {
        self.network.clear();
    }

    pub fn network_loaded(&self) -> bool {
        self.network.is_loaded()
    }

    pub fn network(&self) -> &NetworkHandle {
        &self.network
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// # Errors
    ///
    /// See [`analyze_track`].
    pub fn analyze(&self, track: &Track, region: Option<&str>) -> Result<TrackAnalysis, Error> {
        self.analyze_on(self.network.snapshot().as_deref(), track, region)
    }

    /// Runs the pipeline against an already taken network snapshot
    pub(crate) fn analyze_on(
        &self,
        network: Option<&RoadNetwork>,
        track: &Track,
        region: Option<&str>,
    ) -> Result<TrackAnalysis, Error> {
        analyze_track(track, network, &self.zones, region, &self.config)
    }

    /// Analyses a track and renders the JSON-ready report.
    ///
    /// # Errors
    ///
    /// See [`analyze_track`].
    pub fn report(
        &self,
        track: &Track,
        region: Option<&str>,
    ) -> Result<AnalysisReport, ReportError> {
        let analysis = self.analyze(track, region)?;
        Ok(AnalysisReport::new(&analysis, &self.zones.blocks))
    }

    /// Analyses a track and renders its geometries as one feature
    /// collection.
    ///
    /// # Errors
    ///
    /// See [`analyze_track`]; fails with [`ReportError::GeoJson`] if a
    /// feature cannot be built.
    pub fn geojson(
        &self,
        track: &Track,
        region: Option<&str>,
    ) -> Result<FeatureCollection, ReportError> {
        let network = self.network.snapshot();
        let analysis = self.analyze_on(network.as_deref(), track, region)?;
        analysis_to_geojson(&analysis, network.as_deref(), &self.zones.blocks)
    }
}
