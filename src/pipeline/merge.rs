//! Cross-source entity resolution for price predictions.
//!
//! Records from different sources that resolve to the same matching key are
//! folded into a single canonical record. Descriptive fields come from the
//! highest-precedence source that mentioned the player (first writer wins);
//! later sources only corroborate, growing the provenance set.

use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::config::MergeConfig;
use crate::observability::metrics;
use crate::pipeline::normalize::{
    is_canonical_position, normalize_name, normalize_position, normalize_team,
};
use crate::types::{RawPrediction, Source};

/// The key that decides whether two raw records refer to the same player.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MatchKey {
    /// Normalized family-name token.
    pub name: String,
    /// Normalized team name.
    pub team: String,
}

impl MatchKey {
    pub fn new(raw_name: &str, raw_team: &str) -> Self {
        Self {
            name: normalize_name(raw_name),
            team: normalize_team(raw_team),
        }
    }

    pub fn for_prediction(prediction: &RawPrediction) -> Self {
        Self::new(&prediction.player_name, &prediction.team)
    }
}

/// One canonical player assembled from every source that mentioned them.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalPlayerRecord {
    /// Key this record was resolved under.
    pub key: MatchKey,
    /// Player name as first seen, kept raw for readability.
    pub display_name: String,
    /// Unified position label.
    pub position: String,
    /// Signed predicted change magnitude (percent).
    pub magnitude: f64,
    /// Every source that mentioned this player; ordered, so provenance
    /// renders identically on every run.
    pub sources: BTreeSet<Source>,
}

/// Folds eligible predictions into canonical player records.
pub struct MergeEngine {
    /// Field-selection precedence, always covering every source.
    precedence: Vec<Source>,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(&MergeConfig::default())
    }
}

impl MergeEngine {
    /// Build an engine from config. Duplicates in the configured precedence
    /// are dropped and missing sources are appended in default order, so any
    /// list still yields a total ordering over all sources.
    pub fn new(config: &MergeConfig) -> Self {
        let mut precedence: Vec<Source> = Vec::with_capacity(Source::ALL.len());
        for source in config.precedence.iter().copied().chain(Source::ALL) {
            if !precedence.contains(&source) {
                precedence.push(source);
            }
        }
        Self { precedence }
    }

    pub fn precedence(&self) -> &[Source] {
        &self.precedence
    }

    /// Merge eligible predictions into one canonical record per player.
    ///
    /// The result is independent of input order: records are bucketed per
    /// source, deterministically ordered within each bucket, and folded in
    /// precedence order. The first source to mention a player seeds the
    /// descriptive fields; every later mention only adds provenance.
    pub fn merge(&self, eligible: Vec<RawPrediction>) -> Vec<CanonicalPlayerRecord> {
        let mut by_source: BTreeMap<Source, Vec<(MatchKey, RawPrediction)>> = BTreeMap::new();
        for prediction in eligible {
            let key = MatchKey::for_prediction(&prediction);
            by_source
                .entry(prediction.source)
                .or_default()
                .push((key, prediction));
        }

        for bucket in by_source.values_mut() {
            bucket.sort_by(|(key_a, a), (key_b, b)| {
                key_a
                    .cmp(key_b)
                    .then_with(|| a.player_name.cmp(&b.player_name))
                    .then_with(|| a.magnitude.total_cmp(&b.magnitude))
            });
        }

        let mut canonical: BTreeMap<MatchKey, CanonicalPlayerRecord> = BTreeMap::new();
        for source in &self.precedence {
            let Some(bucket) = by_source.remove(source) else {
                continue;
            };
            for (key, prediction) in bucket {
                match canonical.entry(key) {
                    Entry::Vacant(slot) => {
                        metrics::merge::record_created();
                        slot.insert(Self::seed_record(prediction));
                    }
                    Entry::Occupied(mut slot) => {
                        let record = slot.get_mut();
                        if record.sources.insert(prediction.source) {
                            debug!(
                                player = %record.display_name,
                                source = %prediction.source,
                                "Corroborated by additional source"
                            );
                            metrics::merge::source_corroborated();
                        } else {
                            metrics::merge::duplicate_ignored();
                        }
                    }
                }
            }
        }

        canonical.into_values().collect()
    }

    fn seed_record(prediction: RawPrediction) -> CanonicalPlayerRecord {
        let position = normalize_position(&prediction.position);
        if !is_canonical_position(&position) {
            warn!(
                label = %prediction.position,
                player = %prediction.player_name,
                "Position label outside known vocabulary, passing through"
            );
            metrics::normalize::unknown_position();
        }

        CanonicalPlayerRecord {
            key: MatchKey::for_prediction(&prediction),
            display_name: prediction.player_name,
            position,
            magnitude: prediction.magnitude,
            sources: BTreeSet::from([prediction.source]),
        }
    }
}
