//! Urban and rural localities served by a track, grouped by municipality.

use std::collections::BTreeMap;

use geo::{Buffer, Intersects, MultiPolygon};
use hashbrown::HashMap;
use log::info;
use serde::Serialize;

use crate::{
    Meters,
    algo::service_area::{Reach, ServiceArea},
    model::{RoadNetwork, Settlement, Track, Zone, zone::municipalities_by_key},
};

/// Name reported for zones without one
pub const UNNAMED: &str = "Sin nombre";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalityEntry {
    pub id: String,
    pub name: String,
    pub municipality: String,
    pub settlement: Settlement,
    /// Walking distance to the centroid, 0.1 m precision; absent in
    /// straight-line mode
    pub network_distance: Option<Meters>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityEntry {
    pub key: String,
    pub name: String,
    pub urban: Vec<LocalityEntry>,
    pub rural: Vec<LocalityEntry>,
}

/// Municipalities touched by a track with their served localities
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalityReport {
    /// Sorted by name
    pub municipalities: Vec<MunicipalityEntry>,
    pub total_urban: usize,
    pub total_rural: usize,
    pub total_localities: usize,
}

impl LocalityReport {
    pub fn is_empty(&self) -> bool {
        self.municipalities.is_empty()
    }
}

/// Localities whose centroid is walkable from the track.
///
/// Municipalities touching the service-area polygon are listed even when
/// none of their localities is served. An empty service area gives an
/// empty report.
pub fn detect_localities(
    service_area: &ServiceArea,
    network: &RoadNetwork,
    localities: &[Zone],
    municipalities: &[Zone],
) -> LocalityReport {
    let Some(polygon) = service_area.polygon() else {
        return LocalityReport::default();
    };

    let mut grouping = Grouping::new(municipalities, polygon);
    for locality in localities {
        if !locality.geometry.intersects(polygon) {
            continue;
        }
        if let Reach::Reachable { distance } = service_area.reach(&locality.centroid, network) {
            grouping.add(locality, Some((distance * 10.0).round() / 10.0));
        }
    }

    grouping.finish()
}

/// Localities touching a plain buffer of `max_distance` around the track.
pub fn detect_localities_straight_line(
    track: &Track,
    max_distance: Meters,
    localities: &[Zone],
    municipalities: &[Zone],
) -> LocalityReport {
    let area = track.line_string().buffer(max_distance);

    let mut grouping = Grouping::new(municipalities, &area);
    for locality in localities.iter().filter(|zone| zone.geometry.intersects(&area)) {
        grouping.add(locality, None);
    }

    grouping.finish()
}

struct Grouping<'a> {
    by_key: HashMap<&'a str, &'a Zone>,
    groups: BTreeMap<String, MunicipalityEntry>,
}

impl<'a> Grouping<'a> {
    fn new(municipalities: &'a [Zone], area: &MultiPolygon<f64>) -> Self {
        let groups = municipalities
            .iter()
            .filter(|zone| zone.geometry.intersects(area))
            .filter_map(|zone| {
                let key = zone.municipality.clone()?;
                Some((key.clone(), entry(key, zone.name.as_deref().unwrap_or(UNNAMED))))
            })
            .collect();

        Self {
            by_key: municipalities_by_key(municipalities),
            groups,
        }
    }

    fn add(&mut self, locality: &Zone, network_distance: Option<Meters>) {
        let Some(key) = locality.municipality.as_deref() else {
            return;
        };

        let by_key = &self.by_key;
        let group = self.groups.entry(key.to_owned()).or_insert_with(|| {
            let name = by_key
                .get(key)
                .and_then(|zone| zone.name.clone())
                .unwrap_or_else(|| format!("Municipio {key}"));
            entry(key.to_owned(), &name)
        });

        let record = LocalityEntry {
            id: locality.id.clone(),
            name: locality.name.clone().unwrap_or_else(|| UNNAMED.to_owned()),
            municipality: key.to_owned(),
            settlement: locality.settlement,
            network_distance,
        };
        match locality.settlement {
            Settlement::Urban => group.urban.push(record),
            Settlement::Rural => group.rural.push(record),
            Settlement::Unknown => {}
        }
    }

    fn finish(self) -> LocalityReport {
        let mut municipalities: Vec<MunicipalityEntry> = self.groups.into_values().collect();
        municipalities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));

        let total_urban = municipalities.iter().map(|m| m.urban.len()).sum();
        let total_rural = municipalities.iter().map(|m| m.rural.len()).sum();

        info!(
            "{} municipalities, {total_urban} urban and {total_rural} rural localities served",
            municipalities.len()
        );

        LocalityReport {
            municipalities,
            total_urban,
            total_rural,
            total_localities: total_urban + total_rural,
        }
    }
}

fn entry(key: String, name: &str) -> MunicipalityEntry {
    MunicipalityEntry {
        key,
        name: name.to_owned(),
        urban: Vec::new(),
        rural: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use geo::{Rect, coord, line_string};

    use super::*;
    use crate::{
        algo::service_area::{ReachabilityParams, compute_service_area},
        build_road_network,
        model::{RoadSegment, ZoneKind},
    };

    fn zone(kind: ZoneKind, id: &str, min: (f64, f64), size: f64) -> Zone {
        let rect = Rect::new(
            coord! { x: min.0, y: min.1 },
            coord! { x: min.0 + size, y: min.1 + size },
        );
        Zone::new(id, kind, MultiPolygon::new(vec![rect.to_polygon()])).unwrap()
    }

    #[test]
    fn localities_grouped_under_municipalities() {
        let network = build_road_network(vec![RoadSegment::new(
            1,
            line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)],
            1,
            2,
            1000.0,
        )])
        .unwrap();
        let track = Track::from_projected([(0.0, 0.0), (1000.0, 0.0)]).unwrap();
        let area = compute_service_area(&track, &network, &ReachabilityParams::default());

        let municipalities = vec![
            zone(ZoneKind::Municipality, "14023", (-100.0, -100.0), 600.0)
                .with_name("Zapotlán el Grande")
                .with_municipality("023"),
            zone(ZoneKind::Municipality, "14079", (500.0, -100.0), 600.0)
                .with_name("Gómez Farías")
                .with_municipality("079"),
        ];
        let localities = vec![
            zone(ZoneKind::Locality, "a", (100.0, -20.0), 40.0)
                .with_name("Ciudad Guzmán")
                .with_municipality("023")
                .with_settlement(Settlement::Urban),
            zone(ZoneKind::Locality, "b", (700.0, 10.0), 20.0)
                .with_municipality("079")
                .with_settlement(Settlement::Rural),
            zone(ZoneKind::Locality, "c", (300.0, 5.0), 10.0)
                .with_name("El Fresnito")
                .with_municipality("099")
                .with_settlement(Settlement::Rural),
            zone(ZoneKind::Locality, "far", (100.0, 4000.0), 40.0)
                .with_municipality("023")
                .with_settlement(Settlement::Urban),
        ];

        let report = detect_localities(&area, &network, &localities, &municipalities);

        let names: Vec<&str> = report.municipalities.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Gómez Farías", "Municipio 099", "Zapotlán el Grande"]);
        assert_eq!(report.total_urban, 1);
        assert_eq!(report.total_rural, 2);
        assert_eq!(report.total_localities, 3);

        let unnamed = &report.municipalities[0].rural[0];
        assert_eq!(unnamed.name, UNNAMED);
        // centroid (710, 20): 290 m from junction 2
        assert_eq!(unnamed.network_distance, Some(290.7));
    }

    #[test]
    fn empty_service_area_reports_nothing() {
        let report = detect_localities(&ServiceArea::empty(700.0), &build_network(), &[], &[]);
        assert!(report.is_empty());
        assert_eq!(report.total_localities, 0);
    }

    fn build_network() -> RoadNetwork {
        build_road_network(vec![RoadSegment::new(
            1,
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            1,
            2,
            10.0,
        )])
        .unwrap()
    }
}
