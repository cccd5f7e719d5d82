use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Meters,
    algo::{coverage::CoverageParams, service_area::ReachabilityParams},
    model::{AttributeRecord, DemographicLayout},
};

/// How reachability from a track is measured.
///
/// The choice belongs to the caller; the core never switches between the
/// two on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachabilityMode {
    /// Walking distance along the road network
    #[default]
    Network,
    /// Straight-line buffer around the track
    StraightLine,
}

/// Ordered candidate column names for each descriptive field.
///
/// The first candidate holding a usable value wins. Blank values and the
/// `N/A` placeholder count as missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFallbacks {
    pub segment_id: Vec<String>,
    pub from_node: Vec<String>,
    pub to_node: Vec<String>,
    pub length: Vec<String>,
    pub surface: Vec<String>,
    pub administration: Vec<String>,
    pub road_class: Vec<String>,
    pub zone_id: Vec<String>,
    pub zone_name: Vec<String>,
    pub municipality_key: Vec<String>,
    pub settlement: Vec<String>,
}

fn names(candidates: &[&str]) -> Vec<String> {
    candidates.iter().map(|name| (*name).to_string()).collect()
}

impl Default for FieldFallbacks {
    fn default() -> Self {
        Self {
            segment_id: names(&["ID_RED", "OBJECTID", "ID", "id"]),
            from_node: names(&["UNION_INI", "FROM_NODE", "from_node", "u"]),
            to_node: names(&["UNION_FIN", "TO_NODE", "to_node", "v"]),
            length: names(&["LONGITUD", "LENGTH", "length"]),
            surface: names(&["COND_PAV", "SURFACE", "surface"]),
            administration: names(&["ADMINISTRA", "ADMIN", "administration"]),
            road_class: names(&["TIPO_VIAL", "ROAD_CLASS", "road_class"]),
            zone_id: names(&["CVEGEO", "ID", "id"]),
            zone_name: names(&["NOMGEO", "NOM_MUN", "NOMBRE", "NAME", "nombre", "name"]),
            municipality_key: names(&["CVE_MUN", "MUNICIPIO", "municipality"]),
            settlement: names(&["AMBITO", "SETTLEMENT", "settlement"]),
        }
    }
}

impl FieldFallbacks {
    /// Returns the first usable value among `candidates`.
    pub fn lookup<'a>(candidates: &[String], record: &'a AttributeRecord) -> Option<&'a str> {
        candidates
            .iter()
            .filter_map(|name| record.get(name))
            .map(|value| value.trim())
            .find(|value| !is_missing(value))
    }
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("n/a") || value.eq_ignore_ascii_case("nan")
}

/// Analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum distance from a track point to a matched segment
    pub match_tolerance: Meters,
    /// Maximum walking distance along the network
    pub max_walking_distance: Meters,
    /// Spacing of track samples used to seed the network search
    pub sample_spacing: Meters,
    /// Maximum distance from a track sample to its seed node
    pub node_cutoff: Meters,
    /// Inflation applied to the reachable sub-network polygon
    pub polygon_buffer: Meters,
    /// Width of the corridor around the track whose zones are always served
    pub corridor_width: Meters,
    pub mode: ReachabilityMode,
    pub fields: FieldFallbacks,
    pub demographics: DemographicLayout,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            match_tolerance: 50.0,
            max_walking_distance: 700.0,
            sample_spacing: 100.0,
            node_cutoff: 500.0,
            polygon_buffer: 50.0,
            corridor_width: 50.0,
            mode: ReachabilityMode::Network,
            fields: FieldFallbacks::default(),
            demographics: DemographicLayout::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(source).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise see
    /// [`AnalysisConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to read config '{}': {e}", path.as_ref().display()),
            )
        })?;
        Self::from_toml_str(&source)
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first distance that is not a
    /// positive finite number.
    pub fn validate(&self) -> Result<(), Error> {
        let distances = [
            ("match_tolerance", self.match_tolerance),
            ("max_walking_distance", self.max_walking_distance),
            ("sample_spacing", self.sample_spacing),
            ("node_cutoff", self.node_cutoff),
            ("polygon_buffer", self.polygon_buffer),
            ("corridor_width", self.corridor_width),
        ];

        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be a positive distance in meters, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn reachability_params(&self) -> ReachabilityParams {
        ReachabilityParams {
            max_distance: self.max_walking_distance,
            sample_spacing: self.sample_spacing,
            node_cutoff: self.node_cutoff,
            polygon_buffer: self.polygon_buffer,
        }
    }

    pub fn coverage_params(&self) -> CoverageParams {
        CoverageParams {
            corridor_width: self.corridor_width,
            max_distance: self.max_walking_distance,
        }
    }
}
