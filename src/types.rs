use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three prediction providers, declared in default precedence order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ffhub,
    Fix,
    Livefpl,
}

impl Source {
    /// Every supported source, in default precedence order.
    pub const ALL: [Source; 3] = [Source::Ffhub, Source::Fix, Source::Livefpl];

    /// Upper-case label used in reports and provenance annotations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ffhub => "FFHUB",
            Source::Fix => "FIX",
            Source::Livefpl => "LIVEFPL",
        }
    }

    /// Lower-case identifier used on the command line and in config files.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Source::Ffhub => "ffhub",
            Source::Fix => "fix",
            Source::Livefpl => "livefpl",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = crate::error::MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ffhub" => Ok(Source::Ffhub),
            "fix" => Ok(Source::Fix),
            "livefpl" => Ok(Source::Livefpl),
            other => Err(crate::error::MonitorError::Config(format!(
                "unknown source '{other}' (expected ffhub, fix or livefpl)"
            ))),
        }
    }
}

/// Per-source eligibility signal carried alongside a prediction.
///
/// FFHUB and FIX tag rows with a textual change window ("Tonight - 75%"),
/// while LIVEFPL reports a numeric progress value for tonight only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EligibilitySignal {
    ChangeWindow(String),
    TonightProgress(f64),
}

/// One per-player prediction row from a single source, after shape adaptation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPrediction {
    pub source: Source,
    /// Player name exactly as the source reported it.
    pub player_name: String,
    /// Team name exactly as the source reported it.
    pub team: String,
    /// Raw position label; unified later, at merge time.
    pub position: String,
    /// Signed predicted change magnitude (percent).
    pub magnitude: f64,
    pub signal: EligibilitySignal,
}

/// Everything one source returned for a single fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedBatch {
    pub source: Source,
    /// Freshness stamp reported by the upstream API, when present.
    pub updated_time: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub predictions: Vec<RawPrediction>,
}

/// Core trait that all prediction sources must implement
#[async_trait::async_trait]
pub trait PredictionSource: Send + Sync {
    /// Which provider this adapter speaks for
    fn source(&self) -> Source;

    /// Fetch the current prediction list and adapt it to the common shape
    async fn fetch(&self) -> Result<FetchedBatch>;
}
