use geo::LineString;
use walkshed_core::prelude::*;
use wkt::{ToWkt, TryFromWkt};

use crate::ReportError;

/// `None` when the area is empty
pub fn service_area_wkt(area: &ServiceArea) -> Option<String> {
    area.polygon().map(|polygon| polygon.to_wkt().to_string())
}

pub fn aligned_track_wkt(matching: &MatchResult) -> String {
    matching.aligned.to_wkt().to_string()
}

/// Reads a planar `LINESTRING` as a track.
///
/// # Errors
///
/// Returns [`ReportError::Wkt`] if the text is not a line string and
/// [`ReportError::Core`] if it has fewer than two valid points.
pub fn track_from_wkt(text: &str) -> Result<Track, ReportError> {
    let line = LineString::<f64>::try_from_wkt_str(text)
        .map_err(|e| ReportError::Wkt(format!("Failed to parse track WKT: {e}")))?;
    Ok(Track::from_projected(line.coords().map(|c| (c.x, c.y)))?)
}
