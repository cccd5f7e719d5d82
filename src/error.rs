use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Core(#[from] walkshed_core::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GeoJSON conversion failed: {0}")]
    GeoJson(String),
    #[error("WKT parse failed: {0}")]
    Wkt(String),
}
