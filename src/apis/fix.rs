use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::SourcesConfig;
use crate::error::Result;
use crate::observability::metrics;
use crate::types::{EligibilitySignal, FetchedBatch, PredictionSource, RawPrediction, Source};

/// Row shape served by the FIX feed. Same field family as FFHUB on the
/// wire, but kept as its own type: the feeds drift independently, and a
/// FIX row must never be mistaken for an FFHUB one downstream.
#[derive(Debug, Deserialize)]
pub struct FixRow {
    #[serde(rename = "PlayerName", alias = "name")]
    player_name: Option<String>,
    #[serde(rename = "Team", alias = "team")]
    team: Option<String>,
    #[serde(rename = "Position", alias = "position")]
    position: Option<String>,
    #[serde(rename = "Target", alias = "threshold")]
    target: Option<Value>,
    #[serde(rename = "ChangeTime", alias = "change")]
    change_time: Option<String>,
}

impl FixRow {
    fn into_prediction(self) -> Option<RawPrediction> {
        let source = Source::Fix;
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

pub struct FixApi {
    client: reqwest::Client,
    endpoint: String,
}

impl FixApi {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: super::build_client(config)?,
            endpoint: super::endpoint_for(config, Source::Fix),
        })
    }
}

#[async_trait::async_trait]
impl PredictionSource for FixApi {
    fn source(&self) -> Source {
        Source::Fix
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<FetchedBatch> {
        let payload =
            super::fetch_prediction_payload(&self.client, &self.endpoint, Source::Fix).await?;
        let total = payload.list.len();

        let mut predictions = Vec::new();
        for row in payload.list {
            match serde_json::from_value::<FixRow>(row) {
                Ok(row) => {
                    if let Some(prediction) = row.into_prediction() {
                        predictions.push(prediction);
                    }
                }
                Err(e) => {
                    debug!("Skipping malformed fix row: {}", e);
                    metrics::sources::row_skipped(Source::Fix.as_str());
                }
            }
        }

        metrics::sources::rows_adapted(Source::Fix.as_str(), predictions.len());
        debug!("Adapted {} of {} fix rows", predictions.len(), total);

        Ok(FetchedBatch {
            source: Source::Fix,
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

    #[test]
    fn fix_rows_carry_their_own_source_tag() {
        let row: FixRow = serde_json::from_value(json!({
            "PlayerName": "Wood",
            "Team": "Nott'm Forest",
            "Position": "FWD",
            "Target": "95.0",
            "ChangeTime": "Tonight - 95%"
        }))
        .unwrap();

        let prediction = row.into_prediction().unwrap();
        assert_eq!(prediction.source, Source::Fix);
        assert_eq!(prediction.magnitude, 95.0);
    }

    #[test]
    fn short_spellings_are_accepted() {
        let row: FixRow = serde_json::from_value(json!({
            "name": "Wood",
            "team": "Nott'm Forest",
            "threshold": 88,
            "change": "tonight"
        }))
        .unwrap();

        let prediction = row.into_prediction().unwrap();
        assert_eq!(prediction.magnitude, 88.0);
        match prediction.signal {
            EligibilitySignal::ChangeWindow(ref tag) => assert_eq!(tag, "tonight"),
            _ => panic!("expected a change window signal"),
        }
    }

    #[test]
    fn magnitude_is_required() {
        let row: FixRow = serde_json::from_value(json!({
            "PlayerName": "Wood",
            "Team": "Nott'm Forest"
        }))
        .unwrap();
        assert!(row.into_prediction().is_none());
    }
}
