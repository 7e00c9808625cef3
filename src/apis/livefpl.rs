use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::SourcesConfig;
use crate::error::Result;
use crate::observability::metrics;
use crate::types::{EligibilitySignal, FetchedBatch, PredictionSource, RawPrediction, Source};

/// Row shape served by the LIVEFPL feed: lower-case field names, and two
/// progress values instead of a change-window tag. `progress` is the
/// overall magnitude; `progressTonight` says how much of it can land
/// tonight and drives eligibility.
#[derive(Debug, Deserialize)]
pub struct LivefplRow {
    name: Option<String>,
    team: Option<String>,
    position: Option<String>,
    progress: Option<Value>,
    #[serde(rename = "progressTonight")]
    progress_tonight: Option<Value>,
}

impl LivefplRow {
    fn into_prediction(self) -> Option<RawPrediction> {
        let source = Source::Livefpl;
        let Some(player_name) = super::non_empty(self.name) else {
            debug!("Skipping {} row without a player name", source);
            metrics::sources::row_skipped(source.as_str());
            return None;
        };
        let Some(team) = super::non_empty(self.team) else {
            debug!(player = %player_name, "Skipping {} row without a team", source);
            metrics::sources::row_skipped(source.as_str());
            return None;
        };
        let Some(magnitude) = super::parse_magnitude(self.progress.as_ref()) else {
            debug!(player = %player_name, "Skipping {} row with malformed magnitude", source);
            metrics::sources::malformed_magnitude(source.as_str());
            return None;
        };

        // Missing progressTonight means nothing lands tonight, not a bad row.
        let tonight = super::parse_magnitude(self.progress_tonight.as_ref()).unwrap_or(0.0);

        Some(RawPrediction {
            source,
            player_name,
            team,
            position: self.position.unwrap_or_else(|| "Unknown".to_string()),
            magnitude,
            signal: EligibilitySignal::TonightProgress(tonight),
        })
    }
}

pub struct LivefplApi {
    client: reqwest::Client,
    endpoint: String,
}

impl LivefplApi {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: super::build_client(config)?,
            endpoint: super::endpoint_for(config, Source::Livefpl),
        })
    }
}

#[async_trait::async_trait]
impl PredictionSource for LivefplApi {
    fn source(&self) -> Source {
        Source::Livefpl
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<FetchedBatch> {
        let payload =
            super::fetch_prediction_payload(&self.client, &self.endpoint, Source::Livefpl).await?;
        let total = payload.list.len();

        let mut predictions = Vec::new();
        for row in payload.list {
            match serde_json::from_value::<LivefplRow>(row) {
                Ok(row) => {
                    if let Some(prediction) = row.into_prediction() {
                        predictions.push(prediction);
                    }
                }
                Err(e) => {
                    debug!("Skipping malformed livefpl row: {}", e);
                    metrics::sources::row_skipped(Source::Livefpl.as_str());
                }
            }
        }

        metrics::sources::rows_adapted(Source::Livefpl.as_str(), predictions.len());
        debug!("Adapted {} of {} livefpl rows", predictions.len(), total);

        Ok(FetchedBatch {
            source: Source::Livefpl,
            updated_time: payload.updated_time,
            fetched_at: Utc::now(),
            predictions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapt(row: Value) -> Option<RawPrediction> {
        serde_json::from_value::<LivefplRow>(row)
            .ok()
            .and_then(LivefplRow::into_prediction)
    }

    #[test]
    fn wire_row_adapts_with_tonight_progress_signal() {
        let prediction = adapt(json!({
            "name": "Muniz",
            "team": "Fulham",
            "position": "FWD",
            "progress": 1.0,
            "progressTonight": 120.5
        }))
        .unwrap();

        assert_eq!(prediction.source, Source::Livefpl);
        assert_eq!(prediction.magnitude, 1.0);
        match prediction.signal {
            EligibilitySignal::TonightProgress(progress) => assert_eq!(progress, 120.5),
            _ => panic!("expected a tonight-progress signal"),
        }
    }

    #[test]
    fn progress_tonight_accepts_numeric_strings() {
        let prediction = adapt(json!({
            "name": "Saliba",
            "team": "Arsenal",
            "progress": "-1.2",
            "progressTonight": "-130.0"
        }))
        .unwrap();

        assert_eq!(prediction.magnitude, -1.2);
        match prediction.signal {
            EligibilitySignal::TonightProgress(progress) => assert_eq!(progress, -130.0),
            _ => panic!("expected a tonight-progress signal"),
        }
    }

    #[test]
    fn missing_progress_tonight_defaults_to_zero() {
        let prediction = adapt(json!({
            "name": "Saliba",
            "team": "Arsenal",
            "progress": 0.5
        }))
        .unwrap();

        match prediction.signal {
            EligibilitySignal::TonightProgress(progress) => assert_eq!(progress, 0.0),
            _ => panic!("expected a tonight-progress signal"),
        }
    }

    #[test]
    fn overall_progress_is_required() {
        assert!(adapt(json!({
            "name": "Saliba",
            "team": "Arsenal",
            "progressTonight": 150.0
        }))
        .is_none());
    }
}
