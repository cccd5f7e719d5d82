use rayon::prelude::*;
use walkshed_core::prelude::*;

use crate::{Analyzer, ReportError, report::AnalysisReport};

/// Analyses independent tracks in parallel.
///
/// All tracks see the same network snapshot, taken once before the batch
/// starts. Results keep the input order; a failing track does not stop
/// the others.
pub fn analyze_batch(
    analyzer: &Analyzer,
    tracks: &[Track],
    region: Option<&str>,
) -> Vec<Result<TrackAnalysis, Error>> {
    let network = analyzer.network().snapshot();
    let network = network.as_deref();

    tracks
        .par_iter()
        .map(|track| analyzer.analyze_on(network, track, region))
        .collect()
}

/// [`analyze_batch`] rendered as reports
pub fn report_batch(
    analyzer: &Analyzer,
    tracks: &[Track],
    region: Option<&str>,
) -> Vec<Result<AnalysisReport, ReportError>> {
    let blocks = &analyzer.zones().blocks;
    analyze_batch(analyzer, tracks, region)
        .into_iter()
        .map(|analysis| Ok(AnalysisReport::new(&analysis?, blocks)))
        .collect()
}
