//! Loading GeoJSON layers and a census table, then analysing a track
//! over them

use walkshed_core::prelude::*;
use walkshed_core::{FieldFallbacks, Settlement, ZoneKind, read_road_segments, read_zones};

const ROADS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [200, 0]]},
            "properties": {"ID_RED": 10, "UNION_INI": 1, "UNION_FIN": 2, "COND_PAV": "Con pavimento"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[200, 0], [400, 0]]},
            "properties": {"ID_RED": 11, "UNION_INI": 2, "UNION_FIN": 3, "COND_PAV": "Sin pavimento"}
        }
    ]
}"#;

const BLOCKS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[50, 20], [90, 20], [90, 60], [50, 60], [50, 20]]]},
            "properties": {"CVEGEO": "B1", "CVE_MUN": "023"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[250, 20], [290, 20], [290, 60], [250, 60], [250, 20]]]},
            "properties": {"CVEGEO": "B2", "CVE_MUN": "079"}
        }
    ]
}"#;

const LOCALITIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[100, 30], [150, 30], [150, 80], [100, 80], [100, 30]]]},
            "properties": {"CVEGEO": "L1", "NOMGEO": "El Fresnito", "CVE_MUN": "023", "AMBITO": "Rural"}
        }
    ]
}"#;

const MUNICIPALITIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[-100, -100], [200, -100], [200, 200], [-100, 200], [-100, -100]]]},
            "properties": {"CVEGEO": "14023", "NOMGEO": "Zapotlán el Grande", "CVE_MUN": "023"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[200, -100], [500, -100], [500, 200], [200, 200], [200, -100]]]},
            "properties": {"CVEGEO": "14079", "NOMGEO": "Gómez Farías", "CVE_MUN": "079"}
        }
    ]
}"#;

fn census_csv() -> String {
    let header: Vec<String> = std::iter::once("CVEGEO".to_string())
        .chain((1..20).map(|i| format!("C{i}")))
        .collect();
    let row = |id: &str, total: u64, disability: u64| {
        let mut values = vec!["0".to_string(); 20];
        values[0] = id.into();
        values[6] = total.to_string();
        values[19] = disability.to_string();
        values.join(",")
    };
    format!(
        "{}\n{}\n{}\n",
        header.join(","),
        row("B1", 120, 6),
        row("B2", 80, 0)
    )
}

fn load() -> (RoadNetwork, ZoneSet) {
    let config = AnalysisConfig::default();
    let fields = FieldFallbacks::default();

    let segments = read_road_segments(ROADS, &fields).unwrap();
    let network = build_road_network(segments).unwrap();

    let census = CensusTable::from_reader(census_csv().as_bytes(), &fields).unwrap();
    let layout = &config.demographics;
    let zones = ZoneSet::new(
        read_zones(BLOCKS, ZoneKind::Block, Some(&census), &fields, layout).unwrap(),
        read_zones(LOCALITIES, ZoneKind::Locality, None, &fields, layout).unwrap(),
        read_zones(MUNICIPALITIES, ZoneKind::Municipality, None, &fields, layout).unwrap(),
    );

    (network, zones)
}

fn track() -> Track {
    Track::from_projected([(0.0, 5.0), (200.0, 5.0), (400.0, 5.0)]).unwrap()
}

#[test]
fn layers_load_with_census_counts() {
    let (network, zones) = load();

    assert_eq!(network.node_count(), 3);
    assert_eq!(network.edge_count(), 2);
    assert_eq!(zones.blocks.len(), 2);
    assert_eq!(zones.blocks[0].demographics.total, 120);
    assert_eq!(zones.localities[0].settlement, Settlement::Rural);
    assert_eq!(
        zones.municipalities[1].name.as_deref(),
        Some("Gómez Farías")
    );
}

#[test]
fn analysis_without_region_serves_both_blocks() {
    let (network, zones) = load();

    let analysis =
        analyze_track(&track(), Some(&network), &zones, None, &AnalysisConfig::default()).unwrap();

    let roads = analysis.roads.unwrap();
    assert_eq!(roads.matched_segments, 2);
    assert!((roads.surface_km["Con pavimento"] - 0.2).abs() < 1e-9);
    assert!((roads.surface_km["Sin pavimento"] - 0.2).abs() < 1e-9);

    assert_eq!(analysis.coverage.served, vec![0, 1]);
    assert_eq!(analysis.coverage.served_stats.total, 200);
    assert!((analysis.coverage.served_stats.disability_pct - 3.0).abs() < 1e-9);
    assert!(analysis.coverage.unserved_stats.is_none());
    assert!(analysis.coverage.region_totals.is_none());
}

#[test]
fn region_limits_served_blocks() {
    let (network, zones) = load();

    let analysis = analyze_track(
        &track(),
        Some(&network),
        &zones,
        Some("zapotlán el grande"),
        &AnalysisConfig::default(),
    )
    .unwrap();

    assert_eq!(analysis.region.as_deref(), Some("zapotlán el grande"));
    assert_eq!(analysis.coverage.served, vec![0]);
    assert_eq!(analysis.coverage.served_stats.total, 120);
    assert_eq!(analysis.coverage.unserved_stats.map(|s| s.total), Some(0));
    assert_eq!(analysis.coverage.region_totals.map(|s| s.total), Some(120));
}

#[test]
fn localities_are_grouped_under_their_municipality() {
    let (network, zones) = load();

    let analysis =
        analyze_track(&track(), Some(&network), &zones, None, &AnalysisConfig::default()).unwrap();
    let report = analysis.localities;

    let names: Vec<&str> = report
        .municipalities
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(names, ["Gómez Farías", "Zapotlán el Grande"]);
    assert_eq!(report.total_rural, 1);
    assert_eq!(report.total_urban, 0);

    let fresnito = &report.municipalities[1].rural[0];
    assert_eq!(fresnito.name, "El Fresnito");
    // Centroid (125, 55) snaps to junction 2 at (200, 0), a seed
    assert_eq!(fresnito.network_distance, Some(93.0));
}

#[test]
fn straight_line_mode_matches_network_mode_on_corridor_blocks() {
    let (_, zones) = load();
    let config = AnalysisConfig {
        mode: ReachabilityMode::StraightLine,
        ..AnalysisConfig::default()
    };

    let analysis = analyze_track(&track(), None, &zones, None, &config).unwrap();

    assert!(!analysis.network_loaded);
    assert_eq!(analysis.coverage.served, vec![0, 1]);
    assert_eq!(analysis.localities.total_localities, 1);
    assert_eq!(
        analysis.localities.municipalities[1].rural[0].network_distance,
        None
    );
}
