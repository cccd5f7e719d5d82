pub mod coverage;
pub mod localities;
pub mod map_matching;
pub mod road_attributes;
pub mod service_area;
pub mod track_metrics;
