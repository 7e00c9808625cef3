//! HTTP adapters for the three prediction providers.
//!
//! All three feeds are served by one aggregator endpoint behind a `source`
//! query parameter and share the same envelope, but each names its row
//! fields differently. Each adapter owns its row shape and reduces it to
//! the common [`RawPrediction`](crate::types::RawPrediction).

pub mod ffhub;
pub mod fix;
pub mod livefpl;

use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::SourcesConfig;
use crate::error::{MonitorError, Result};
use crate::observability::metrics;
use crate::types::{PredictionSource, Source};

/// Wire envelope shared by all three endpoints.
#[derive(Debug, Deserialize)]
pub struct PredictionPayload {
    #[serde(default)]
    pub list: Vec<Value>,
    #[serde(default)]
    pub updated_time: Option<String>,
}

/// Build the adapter for one source.
pub fn create_source(source: Source, config: &SourcesConfig) -> Result<Box<dyn PredictionSource>> {
    let api: Box<dyn PredictionSource> = match source {
        Source::Ffhub => Box::new(ffhub::FfhubApi::new(config)?),
        Source::Fix => Box::new(fix::FixApi::new(config)?),
        Source::Livefpl => Box::new(livefpl::LivefplApi::new(config)?),
    };
    Ok(api)
}

pub(crate) fn build_client(config: &SourcesConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(MonitorError::from)
}

pub(crate) fn endpoint_for(config: &SourcesConfig, source: Source) -> String {
    format!("{}?source={}", config.base_url, source.cli_name())
}

/// GET one source's prediction payload, recording request metrics.
pub(crate) async fn fetch_prediction_payload(
    client: &reqwest::Client,
    endpoint: &str,
    source: Source,
) -> Result<PredictionPayload> {
    info!("Fetching {} predictions", source);
    let started = Instant::now();

    let response = match client.get(endpoint).send().await {
        Ok(response) => response,
        Err(e) => {
            metrics::sources::request_error(source.as_str());
            return Err(e.into());
        }
    };

    let status = response.status();
    if !status.is_success() {
        metrics::sources::request_error(source.as_str());
        return Err(MonitorError::Source {
            message: format!("{} endpoint returned HTTP {}", source, status),
        });
    }

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            metrics::sources::request_error(source.as_str());
            return Err(e.into());
        }
    };
    metrics::sources::request_success(source.as_str());
    metrics::sources::request_duration(source.as_str(), started.elapsed().as_secs_f64());
    metrics::sources::payload_bytes(source.as_str(), bytes.len());

    let payload: PredictionPayload = serde_json::from_slice(&bytes)?;
    info!(
        "Fetched {} rows from {} (updated {})",
        payload.list.len(),
        source,
        payload.updated_time.as_deref().unwrap_or("unknown")
    );
    Ok(payload)
}

/// Parse a magnitude field that sources emit as either a JSON number or a
/// numeric string. Anything else is unusable.
pub(crate) fn parse_magnitude(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
