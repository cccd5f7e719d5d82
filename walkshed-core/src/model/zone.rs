//! Census zones - population blocks, localities and municipalities

use geo::{Centroid, MultiPolygon, Point};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, loading::FieldFallbacks, model::AttributeRecord};

/// Kind of geographic zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Census population block
    Block,
    Locality,
    Municipality,
}

/// Urban / rural classification of a locality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    Urban,
    Rural,
    #[default]
    Unknown,
}

impl Settlement {
    /// Parses the census settlement label (`Urbana` / `Rural`).
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("urbana") || value.eq_ignore_ascii_case("urban") {
            Self::Urban
        } else if value.eq_ignore_ascii_case("rural") {
            Self::Rural
        } else {
            Self::Unknown
        }
    }
}

/// Column positions of the demographic counts in a census record.
///
/// Source column names are unreliable, so counts are read by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicLayout {
    pub total: usize,
    pub female: usize,
    pub male: usize,
    pub age_0_14: usize,
    pub age_15_29: usize,
    pub age_30_59: usize,
    pub age_60_plus: usize,
    pub disability: usize,
}

impl Default for DemographicLayout {
    fn default() -> Self {
        Self {
            total: 6,
            female: 7,
            male: 9,
            age_0_14: 11,
            age_15_29: 13,
            age_30_59: 15,
            age_60_plus: 17,
            disability: 19,
        }
    }
}

impl DemographicLayout {
    /// Minimum number of columns a record must have
    pub fn required_columns(&self) -> usize {
        [
            self.total,
            self.female,
            self.male,
            self.age_0_14,
            self.age_15_29,
            self.age_30_59,
            self.age_60_plus,
            self.disability,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
            + 1
    }
}

/// Demographic counts of a zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub total: u64,
    pub female: u64,
    pub male: u64,
    pub age_0_14: u64,
    pub age_15_29: u64,
    pub age_30_59: u64,
    pub age_60_plus: u64,
    pub disability: u64,
}

impl Demographics {
    /// Extracts counts from an ordered record by column position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when the record is shorter than the layout
    /// requires.
    pub fn from_columns<S: AsRef<str>>(
        columns: &[S],
        layout: &DemographicLayout,
    ) -> Result<Self, Error> {
        let expected = layout.required_columns();
        if columns.len() < expected {
            return Err(Error::Schema {
                expected,
                found: columns.len(),
            });
        }

        let at = |position: usize| parse_count(columns[position].as_ref());

        Ok(Self {
            total: at(layout.total),
            female: at(layout.female),
            male: at(layout.male),
            age_0_14: at(layout.age_0_14),
            age_15_29: at(layout.age_15_29),
            age_30_59: at(layout.age_30_59),
            age_60_plus: at(layout.age_60_plus),
            disability: at(layout.disability),
        })
    }
}

/// Census counts use `*` for suppressed values and may carry thousands
/// separators. Anything unparseable counts as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn parse_count(raw: &str) -> u64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "*" {
        return 0;
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value as u64,
        _ => 0,
    }
}

/// A geographic zone with demographic attributes
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: String,
    pub name: Option<String>,
    pub kind: ZoneKind,
    /// Municipality key the zone belongs to (for municipalities, their own key)
    pub municipality: Option<String>,
    pub settlement: Settlement,
    pub geometry: MultiPolygon<f64>,
    pub centroid: Point<f64>,
    pub demographics: Demographics,
}

impl Zone {
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the geometry has no centroid
    /// (empty polygon set).
    pub fn new(
        id: impl Into<String>,
        kind: ZoneKind,
        geometry: MultiPolygon<f64>,
    ) -> Result<Self, Error> {
        let id = id.into();
        let centroid = geometry
            .centroid()
            .ok_or_else(|| Error::InvalidData(format!("zone {id} has an empty geometry")))?;

        Ok(Self {
            id,
            name: None,
            kind,
            municipality: None,
            settlement: Settlement::Unknown,
            geometry,
            centroid,
            demographics: Demographics::default(),
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_municipality(mut self, key: impl Into<String>) -> Self {
        self.municipality = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_settlement(mut self, settlement: Settlement) -> Self {
        self.settlement = settlement;
        self
    }

    #[must_use]
    pub fn with_demographics(mut self, demographics: Demographics) -> Self {
        self.demographics = demographics;
        self
    }

    /// Builds a zone from named attributes only; demographics stay zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the geometry is empty.
    pub fn from_attributes(
        kind: ZoneKind,
        geometry: MultiPolygon<f64>,
        record: &AttributeRecord,
        fields: &FieldFallbacks,
    ) -> Result<Self, Error> {
        let id = FieldFallbacks::lookup(&fields.zone_id, record).unwrap_or_default();
        let mut zone = Self::new(id, kind, geometry)?;
        zone.name = FieldFallbacks::lookup(&fields.zone_name, record).map(str::to_owned);
        zone.municipality =
            FieldFallbacks::lookup(&fields.municipality_key, record).map(str::to_owned);
        zone.settlement = FieldFallbacks::lookup(&fields.settlement, record)
            .map(Settlement::parse)
            .unwrap_or_default();
        Ok(zone)
    }

    /// Fills demographics from a census row read by position.
    ///
    /// Blocks and localities must carry the full demographic layout;
    /// municipalities may omit it and keep zero counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if a block or locality row is too short
    /// for the layout.
    pub fn apply_census_row<S: AsRef<str>>(
        &mut self,
        values: &[S],
        layout: &DemographicLayout,
    ) -> Result<(), Error> {
        match Demographics::from_columns(values, layout) {
            Ok(demographics) => self.demographics = demographics,
            Err(err) if self.kind == ZoneKind::Municipality => {
                log::trace!("Municipality {} carries no demographics: {err}", self.id);
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }
}

/// Index of zones by municipality key
pub(crate) fn municipalities_by_key(zones: &[Zone]) -> HashMap<&str, &Zone> {
    zones
        .iter()
        .filter_map(|zone| zone.municipality.as_deref().map(|key| (key, zone)))
        .collect()
}
