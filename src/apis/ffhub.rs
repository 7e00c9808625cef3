use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::SourcesConfig;
use crate::error::Result;
use crate::observability::metrics;
use crate::types::{EligibilitySignal, FetchedBatch, PredictionSource, RawPrediction, Source};

/// Row shape served by the FFHUB feed. Field names are upper camel case on
/// the wire; a few legacy lower-case spellings are still accepted.
#[derive(Debug, Deserialize)]
pub struct FfhubRow {
    #[serde(rename = "PlayerName", alias = "name")]
    player_name: Option<String>,
    #[serde(rename = "Team", alias = "team")]
    team: Option<String>,
    #[serde(rename = "Position", alias = "position")]
    position: Option<String>,
    /// Signed change magnitude; a number or a numeric string on the wire.
    #[serde(rename = "Target", alias = "threshold")]
    target: Option<Value>,
    /// Change window tag, e.g. "Tonight - 75%".
    #[serde(rename = "ChangeTime", alias = "change")]
    change_time: Option<String>,
}

impl FfhubRow {
    /// Adapt one wire row to the common shape. Rows with no usable identity
    /// or magnitude are dropped here, so a bad row never sinks the batch.
    fn into_prediction(self) -> Option<RawPrediction> {
        let source = Source::Ffhub;
        let Some(player_name) = super::non_empty(self.player_name) else {
            debug!("Skipping {} row without a player name", source);
            metrics::sources::row_skipped(source.as_str());
            return None;
        };
        let Some(team) = super::non_empty(self.team) else {
            debug!(player = %player_name, "Skipping {} row without a team", source);
            metrics::sources::row_skipped(source.as_str());
            return None;
        };
        let Some(magnitude) = super::parse_magnitude(self.target.as_ref()) else {
            debug!(player = %player_name, "Skipping {} row with malformed magnitude", source);
            metrics::sources::malformed_magnitude(source.as_str());
            return None;
        };

        Some(RawPrediction {
            source,
            player_name,
            team,
            position: self.position.unwrap_or_else(|| "Unknown".to_string()),
            magnitude,
            signal: EligibilitySignal::ChangeWindow(self.change_time.unwrap_or_default()),
        })
    }
}

pub struct FfhubApi {
    client: reqwest::Client,
    endpoint: String,
}

impl FfhubApi {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: super::build_client(config)?,
            endpoint: super::endpoint_for(config, Source::Ffhub),
        })
    }
}

#[async_trait::async_trait]
impl PredictionSource for FfhubApi {
    fn source(&self) -> Source {
        Source::Ffhub
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<FetchedBatch> {
        let payload =
            super::fetch_prediction_payload(&self.client, &self.endpoint, Source::Ffhub).await?;
        let total = payload.list.len();

        let mut predictions = Vec::new();
        for row in payload.list {
            match serde_json::from_value::<FfhubRow>(row) {
                Ok(row) => {
                    if let Some(prediction) = row.into_prediction() {
                        predictions.push(prediction);
                    }
                }
                Err(e) => {
                    debug!("Skipping malformed ffhub row: {}", e);
                    metrics::sources::row_skipped(Source::Ffhub.as_str());
                }
            }
        }

        metrics::sources::rows_adapted(Source::Ffhub.as_str(), predictions.len());
        debug!("Adapted {} of {} ffhub rows", predictions.len(), total);

        Ok(FetchedBatch {
            source: Source::Ffhub,
            updated_time: payload.updated_time,
            fetched_at: Utc::now(),
            predictions,
        })
    }
}
