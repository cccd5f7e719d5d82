//! Facade tests: analyzer lifecycle, reports, exports and batches

use geo::{MultiPolygon, Rect, coord, line_string};
use serde_json::json;
use walkshed::{Analyzer, ReportError, analyze_batch, geojson_export, report_batch, wkt_export};
use walkshed_core::prelude::*;
use walkshed_core::{Demographics, RoadAttributes, ZoneKind};

fn segments(length: f64) -> Vec<RoadSegment> {
    vec![
        RoadSegment::new(
            1,
            line_string![(x: 0.0, y: 0.0), (x: length, y: 0.0)],
            1,
            2,
            length,
        )
        .with_attributes(RoadAttributes {
            surface: Some("Sin pavimento".into()),
            administration: None,
            road_class: None,
        }),
        RoadSegment::new(
            2,
            line_string![(x: length, y: 0.0), (x: length, y: length)],
            2,
            3,
            length,
        ),
    ]
}

fn block(id: &str, min: (f64, f64), total: u64) -> Zone {
    let rect = Rect::new(
        coord! { x: min.0, y: min.1 },
        coord! { x: min.0 + 40.0, y: min.1 + 40.0 },
    );
    Zone::new(id, ZoneKind::Block, MultiPolygon::new(vec![rect.to_polygon()]))
        .unwrap()
        .with_demographics(Demographics {
            total,
            disability: 1,
            ..Demographics::default()
        })
}

fn zones() -> ZoneSet {
    ZoneSet::new(
        vec![block("near", (100.0, 10.0), 50), block("far", (5000.0, 5000.0), 70)],
        Vec::new(),
        Vec::new(),
    )
}

fn track() -> Track {
    Track::from_projected([(10.0, 4.0), (300.0, 4.0), (480.0, 3.0)]).unwrap()
}

fn loaded_analyzer() -> Analyzer {
    let network = build_road_network(segments(500.0)).unwrap();
    Analyzer::with_network(network, zones(), AnalysisConfig::default()).unwrap()
}

#[test]
fn invalid_config_is_rejected() {
    let config = AnalysisConfig {
        max_walking_distance: -1.0,
        ..AnalysisConfig::default()
    };
    assert!(matches!(
        Analyzer::new(zones(), config),
        Err(Error::Config(_))
    ));
}

#[test]
fn analysis_without_network_reports_data_load() {
    let analyzer = Analyzer::new(zones(), AnalysisConfig::default()).unwrap();
    assert!(!analyzer.network_loaded());
    assert!(matches!(
        analyzer.analyze(&track(), None),
        Err(Error::DataLoad(_))
    ));
}

#[test]
fn loading_a_network_enables_analysis() {
    let analyzer = Analyzer::new(zones(), AnalysisConfig::default()).unwrap();

    let build = analyzer.load_network(segments(500.0)).unwrap();
    assert_eq!(build.loaded_segments, 2);
    assert!(analyzer.network_loaded());

    let analysis = analyzer.analyze(&track(), None).unwrap();
    assert!(analysis.network_loaded);
    assert_eq!(analysis.coverage.served, vec![0]);

    analyzer.clear_network();
    assert!(!analyzer.network_loaded());
}

#[test]
fn report_serializes_to_json() {
    let analyzer = loaded_analyzer();

    let report = analyzer.report(&track(), None).unwrap();
    let value = report.to_value().unwrap();

    assert_eq!(value["mode"], json!("network"));
    assert_eq!(value["network_loaded"], json!(true));
    assert!(value.get("region").is_none());
    assert_eq!(value["matching"]["matched_points"], json!(3));
    assert_eq!(value["matching"]["matched_segments"], json!([1]));
    assert_eq!(value["roads"]["surface_km"]["Sin pavimento"], json!(0.5));
    assert_eq!(value["coverage"]["served_ids"], json!(["near"]));
    assert_eq!(value["coverage"]["served"]["total"], json!(50));
    assert_eq!(value["coverage"]["unserved_count"], json!(null));

    let text = report.to_json().unwrap();
    assert!(text.contains("\"service_area\""));
}

#[test]
fn geojson_collection_holds_every_layer() {
    let analyzer = loaded_analyzer();

    let collection = analyzer.geojson(&track(), None).unwrap();
    let layers: Vec<String> = collection
        .features
        .iter()
        .filter_map(|feature| feature.property("layer"))
        .filter_map(|layer| layer.as_str().map(str::to_owned))
        .collect();

    assert_eq!(
        layers,
        [
            geojson_export::LAYER_TRACK,
            geojson_export::LAYER_SEGMENT,
            geojson_export::LAYER_SERVICE_AREA,
            geojson_export::LAYER_ZONE,
        ]
    );
    assert!(
        geojson_export::to_geojson_string(&collection)
            .unwrap()
            .starts_with('{')
    );
}

#[test]
fn wkt_exports_follow_the_analysis() {
    let network = build_road_network(segments(500.0)).unwrap();
    let track = wkt_export::track_from_wkt("LINESTRING (10 4, 300 4, 480 3)").unwrap();

    let matching = match_track(&track, &network, 50.0);
    assert!(wkt_export::aligned_track_wkt(&matching).starts_with("LINESTRING"));

    let area = compute_service_area(&track, &network, &ReachabilityParams::default());
    let polygon = wkt_export::service_area_wkt(&area).unwrap();
    assert!(polygon.starts_with("MULTIPOLYGON"));
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let analyzer = loaded_analyzer();
    let far = Track::from_projected([(9000.0, 9000.0), (9100.0, 9000.0)]).unwrap();
    let tracks = vec![track(), far, track()];

    let results = analyze_batch(&analyzer, &tracks, None);
    assert_eq!(results.len(), 3);
    let served: Vec<usize> = results
        .iter()
        .map(|result| result.as_ref().unwrap().coverage.served.len())
        .collect();
    assert_eq!(served, [1, 0, 1]);
    assert!(results[1].as_ref().unwrap().coverage.service_area_empty);

    let reports = report_batch(&analyzer, &tracks, Some("Atlantis"));
    assert!(reports.iter().all(|report| matches!(
        report,
        Err(ReportError::Core(Error::InvalidData(_)))
    )));
}

#[test]
fn geojson_shares_the_network_requirement() {
    let analyzer = Analyzer::new(zones(), AnalysisConfig::default()).unwrap();
    assert!(matches!(
        analyzer.geojson(&track(), None),
        Err(ReportError::Core(Error::DataLoad(_)))
    ));

    analyzer.load_network(segments(500.0)).unwrap();
    let collection = analyzer.geojson(&track(), None).unwrap();
    assert!(!collection.features.is_empty());
}
