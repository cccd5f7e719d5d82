use std::{fs, path::Path};

use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;

use crate::{Error, model::AttributeRecord};

pub(crate) fn parse_feature_collection(source: &str) -> Result<FeatureCollection, Error> {
    let geojson: GeoJson = source
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;
    FeatureCollection::try_from(geojson).map_err(|e| Error::GeoJson(e.to_string()))
}

pub(crate) fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {e}", path.display()),
        )
        .into()
    })
}

/// Feature properties as strings; nulls are dropped
pub(crate) fn properties_record(feature: &Feature) -> AttributeRecord {
    feature
        .properties
        .iter()
        .flatten()
        .filter_map(|(name, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some((name.clone(), text))
        })
        .collect()
}

pub(crate) fn feature_geometry(feature: Feature) -> Option<geo::Geometry<f64>> {
    let geometry = feature.geometry?;
    geo::Geometry::<f64>::try_from(geometry.value).ok()
}

/// Parses an integer identifier; shapefile exports often write them as
/// `123.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn parse_identifier(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
            .map(|value| value as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_accept_integral_floats() {
        assert_eq!(parse_identifier("42"), Some(42));
        assert_eq!(parse_identifier(" 42.0 "), Some(42));
        assert_eq!(parse_identifier("42.5"), None);
        assert_eq!(parse_identifier("-1"), None);
        assert_eq!(parse_identifier("node"), None);
    }
}
