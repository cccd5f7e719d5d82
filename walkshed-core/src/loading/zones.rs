use std::{fs::File, io::Read, path::Path};

use geo::{Geometry, MultiPolygon};
use hashbrown::HashMap;
use log::{info, warn};

use super::{
    FieldFallbacks,
    features::{feature_geometry, parse_feature_collection, properties_record, read_source},
};
use crate::{
    Error,
    model::{DemographicLayout, Zone, ZoneKind},
};

/// Census attribute table keyed by zone identifier.
///
/// Rows keep their original column order because demographic counts are
/// read by position.
#[derive(Debug, Clone, Default)]
pub struct CensusTable {
    header: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl CensusTable {
    /// Reads a CSV table with a header row. Fields that are not valid
    /// UTF-8 are decoded as Latin-1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Csv`] on malformed CSV and [`Error::InvalidData`]
    /// if no identifier column from the field fallbacks is present.
    pub fn from_reader<R: Read>(reader: R, fields: &FieldFallbacks) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let header: Vec<String> = reader.byte_headers()?.iter().map(decode_field).collect();

        let id_column = fields
            .zone_id
            .iter()
            .find_map(|name| header.iter().position(|column| column == name))
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "census table has none of the identifier columns {:?}",
                    fields.zone_id
                ))
            })?;

        let mut rows = HashMap::new();
        for record in reader.byte_records() {
            let values: Vec<String> = record?.iter().map(decode_field).collect();
            if let Some(id) = values.get(id_column).map(|id| id.trim().to_owned()) {
                rows.insert(id, values);
            }
        }

        info!("Read census table with {} rows", rows.len());
        Ok(Self { header, rows })
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened, otherwise see
    /// [`CensusTable::from_reader`].
    pub fn from_path(path: impl AsRef<Path>, fields: &FieldFallbacks) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {e}", path.display()),
            )
        })?;
        Self::from_reader(file, fields)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn row(&self, id: &str) -> Option<&[String]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().copied().map(char::from).collect(),
    }
}

/// Reads zones from a GeoJSON feature collection in projected coordinates.
///
/// Descriptive fields come from the feature properties. Demographic counts
/// come from the census row with the same identifier; zones without a row
/// keep zero counts and are reported in the log.
///
/// # Errors
///
/// Returns [`Error::GeoJson`] if the document is not a feature collection
/// and [`Error::Schema`] if a census row is too short for the layout.
pub fn read_zones(
    source: &str,
    kind: ZoneKind,
    census: Option<&CensusTable>,
    fields: &FieldFallbacks,
    layout: &DemographicLayout,
) -> Result<Vec<Zone>, Error> {
    let collection = parse_feature_collection(source)?;
    let total = collection.features.len();

    let mut zones = Vec::with_capacity(total);
    let mut without_area = 0;
    let mut without_census = 0;

    for feature in collection.features {
        let record = properties_record(&feature);
        let Some(geometry) = feature_geometry(feature).and_then(areal) else {
            without_area += 1;
            continue;
        };
        let Ok(mut zone) = Zone::from_attributes(kind, geometry, &record, fields) else {
            without_area += 1;
            continue;
        };

        if let Some(census) = census {
            match census.row(&zone.id) {
                Some(row) => zone.apply_census_row(row, layout)?,
                None => without_census += 1,
            }
        }

        zones.push(zone);
    }

    if without_area > 0 {
        warn!("Skipped {without_area} of {total} {kind:?} features without polygon geometry");
    }
    if without_census > 0 {
        warn!("{without_census} {kind:?} zones have no census row; their counts are zero");
    }
    info!("Read {} {kind:?} zones", zones.len());

    Ok(zones)
}

/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, otherwise see
/// [`read_zones`].
pub fn read_zones_file(
    path: impl AsRef<Path>,
    kind: ZoneKind,
    census: Option<&CensusTable>,
    fields: &FieldFallbacks,
    layout: &DemographicLayout,
) -> Result<Vec<Zone>, Error> {
    read_zones(&read_source(path.as_ref())?, kind, census, fields, layout)
}

fn areal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(polygons) => Some(polygons),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Demographics;

    const BLOCKS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]},
                "properties": {"CVEGEO": "0001", "CVE_MUN": "023"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[20, 0], [30, 0], [30, 10], [20, 10], [20, 0]]]},
                "properties": {"CVEGEO": "0002"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                "properties": {"CVEGEO": "0003"}
            }
        ]
    }"#;

    fn census_csv() -> Vec<u8> {
        let mut header: Vec<String> = (0..20).map(|i| format!("c{i}")).collect();
        header[0] = "CVEGEO".into();
        let mut row: Vec<String> = vec!["0".into(); 20];
        row[0] = "0001".into();
        row[6] = "120".into();
        row[19] = "6".into();

        let mut csv = header.join(",");
        csv.push('\n');
        csv.push_str(&row.join(","));
        csv.push('\n');
        csv.into_bytes()
    }

    #[test]
    fn zones_join_census_rows_by_identifier() {
        let fields = FieldFallbacks::default();
        let census = CensusTable::from_reader(census_csv().as_slice(), &fields).unwrap();
        assert_eq!(census.len(), 1);

        let zones = read_zones(
            BLOCKS,
            ZoneKind::Block,
            Some(&census),
            &fields,
            &DemographicLayout::default(),
        )
        .unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].municipality.as_deref(), Some("023"));
        assert_eq!(zones[0].demographics.total, 120);
        assert_eq!(zones[0].demographics.disability, 6);
        assert_eq!(zones[1].demographics, Demographics::default());
    }

    #[test]
    fn latin1_fields_are_decoded() {
        let mut csv = b"CVEGEO,NOMGEO\n0001,Zapotl".to_vec();
        csv.push(0xE1);
        csv.extend_from_slice(b"n\n");

        let census = CensusTable::from_reader(csv.as_slice(), &FieldFallbacks::default()).unwrap();
        assert_eq!(census.row("0001").unwrap()[1], "Zapotlán");
    }

    #[test]
    fn table_without_identifier_column_is_rejected() {
        let csv = b"NAME,TOTAL\na,1\n".as_slice();
        assert!(matches!(
            CensusTable::from_reader(csv, &FieldFallbacks::default()),
            Err(Error::InvalidData(_))
        ));
    }
}
