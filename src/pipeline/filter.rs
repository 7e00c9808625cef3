use crate::config::FilterConfig;
use crate::observability::metrics;
use crate::types::{EligibilitySignal, FetchedBatch, RawPrediction, Source};
use tracing::{debug, info};

/// Token that marks a same-day change window in FFHUB/FIX tags.
const TONIGHT_TOKEN: &str = "tonight";

/// Per-source eligibility rules. Every source over-reports: FFHUB and FIX
/// list players whose change is days away, LIVEFPL lists everyone with any
/// progress at all. This filter keeps only the records that can still
/// change tonight.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    tonight_progress_threshold: f64,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl SourceFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            tonight_progress_threshold: config.tonight_progress_threshold,
        }
    }

    /// Apply the owning source's eligibility rule to one prediction.
    ///
    /// FFHUB/FIX: the change-window tag must contain "tonight"
    /// (case-insensitive). LIVEFPL: |progress tonight| must strictly exceed
    /// the threshold.
    pub fn is_eligible(&self, prediction: &RawPrediction) -> bool {
        match (prediction.source, &prediction.signal) {
            (Source::Ffhub | Source::Fix, EligibilitySignal::ChangeWindow(tag)) => {
                tag.to_lowercase().contains(TONIGHT_TOKEN)
            }
            (Source::Livefpl, EligibilitySignal::TonightProgress(progress)) => {
                progress.abs() > self.tonight_progress_threshold
            }
            // Signal variant from the wrong source; never eligible.
            _ => false,
        }
    }

    /// Keep the eligible predictions of one batch, counting both outcomes.
    pub fn filter_batch(&self, batch: FetchedBatch) -> Vec<RawPrediction> {
        let source = batch.source;
        let total = batch.predictions.len();
        let mut kept = Vec::new();

        for prediction in batch.predictions {
            if self.is_eligible(&prediction) {
                metrics::filter::record_eligible(source.as_str());
                kept.push(prediction);
            } else {
                debug!(
                    player = %prediction.player_name,
                    "Excluded: outside tonight's change window"
                );
                metrics::filter::record_excluded(source.as_str());
            }
        }

        info!("{}: {} of {} records eligible tonight", source, kept.len(), total);
        kept
    }
}
