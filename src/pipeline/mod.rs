// Prediction pipeline: per-source filtering, cross-source merge, report rendering

pub mod filter;
pub mod merge;
pub mod normalize;
pub mod report;

use crate::types::FetchedBatch;
use filter::SourceFilter;
use merge::{CanonicalPlayerRecord, MergeEngine};

/// Run the pure core of the pipeline over already-fetched batches:
/// keep the records that can still change tonight, then merge them
/// into one canonical record per player.
pub fn process_batches(
    batches: Vec<FetchedBatch>,
    filter: &SourceFilter,
    engine: &MergeEngine,
) -> Vec<CanonicalPlayerRecord> {
    let mut eligible = Vec::new();
    for batch in batches {
        eligible.extend(filter.filter_batch(batch));
    }
    engine.merge(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EligibilitySignal, RawPrediction, Source};
    use chrono::Utc;

    fn batch_of(source: Source, predictions: Vec<RawPrediction>) -> FetchedBatch {
        FetchedBatch {
            source,
            updated_time: None,
            fetched_at: Utc::now(),
            predictions,
        }
    }

    fn tonight_row(source: Source, name: &str, magnitude: f64) -> RawPrediction {
        RawPrediction {
            source,
            player_name: name.to_string(),
            team: "Fulham".to_string(),
            position: "FWD".to_string(),
            magnitude,
            signal: EligibilitySignal::ChangeWindow("Tonight - 90%".to_string()),
        }
    }

    #[test]
    fn batches_flow_through_filter_and_merge() {
        let batches = vec![
            batch_of(
                Source::Ffhub,
                vec![
                    tonight_row(Source::Ffhub, "Rodrigo Muniz", 1.0),
                    RawPrediction {
                        signal: EligibilitySignal::ChangeWindow("Tomorrow".to_string()),
                        ..tonight_row(Source::Ffhub, "Wilson", 0.5)
                    },
                ],
            ),
            batch_of(Source::Fix, vec![tonight_row(Source::Fix, "Muniz", 1.0)]),
        ];

        let filter = SourceFilter::default();
        let engine = MergeEngine::default();
        let records = process_batches(batches, &filter, &engine);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "Rodrigo Muniz");
        assert_eq!(records[0].sources.len(), 2);
    }
}
