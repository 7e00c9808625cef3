//! Grouping and rendering of canonical records into the delivery report.
//!
//! Rendering is pure: the same records produce the same text, byte for
//! byte, so a report can be regenerated and diffed across runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::merge::CanonicalPlayerRecord;

/// Name of the JSON artifact written alongside a delivered report.
pub const ANALYSIS_FILE_NAME: &str = "fpl_price_analysis.json";

const REPORT_TITLE: &str = "🏆 FPL Price Change Predictions";

/// Direction of a predicted price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    fn header(self) -> &'static str {
        match self {
            Direction::Rising => "📈 Rising",
            Direction::Falling => "📉 Falling",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Direction::Rising => "🔺",
            Direction::Falling => "🔻",
        }
    }
}

/// Split records into rising and falling groups, each ordered by descending
/// |magnitude| with ties broken by matching key. Zero-magnitude records
/// belong to neither group.
pub fn partition(
    records: &[CanonicalPlayerRecord],
) -> (Vec<&CanonicalPlayerRecord>, Vec<&CanonicalPlayerRecord>) {
    let mut rising: Vec<&CanonicalPlayerRecord> =
        records.iter().filter(|r| r.magnitude > 0.0).collect();
    let mut falling: Vec<&CanonicalPlayerRecord> =
        records.iter().filter(|r| r.magnitude < 0.0).collect();

    for group in [&mut rising, &mut falling] {
        group.sort_by(|a, b| {
            b.magnitude
                .abs()
                .total_cmp(&a.magnitude.abs())
                .then_with(|| a.key.cmp(&b.key))
        });
    }

    (rising, falling)
}

/// Render the full report text. Both sections always appear, even when
/// empty, so the message keeps a stable structure.
pub fn format_report(records: &[CanonicalPlayerRecord]) -> String {
    let (rising, falling) = partition(records);
    metrics::report::lines_rendered(rising.len() + falling.len());

    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push('\n');
    render_section(&mut out, Direction::Rising, &rising);
    render_section(&mut out, Direction::Falling, &falling);
    out
}

fn render_section(out: &mut String, direction: Direction, group: &[&CanonicalPlayerRecord]) {
    out.push('\n');
    out.push_str(&format!("{} ({})\n", direction.header(), group.len()));
    for (index, record) in group.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} {} {} ({}) {:+.1}%\n",
            index + 1,
            direction.marker(),
            record.display_name,
            record.position,
            provenance(record),
            record.magnitude
        ));
    }
}

/// Contributing sources as a sorted, comma-joined list: "(FFHUB,LIVEFPL)".
fn provenance(record: &CanonicalPlayerRecord) -> String {
    record
        .sources
        .iter()
        .map(|source| source.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// On-disk analysis artifact accompanying a delivered report.
#[derive(Debug, Serialize)]
pub struct AnalysisArtifact<'a> {
    pub generated_at: DateTime<Utc>,
    pub players: &'a [CanonicalPlayerRecord],
}

/// Write the canonical records to `<dir>/fpl_price_analysis.json`.
pub fn write_analysis(dir: &Path, records: &[CanonicalPlayerRecord]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(ANALYSIS_FILE_NAME);
    let artifact = AnalysisArtifact {
        generated_at: Utc::now(),
        players: records,
    };
    fs::write(&path, serde_json::to_string_pretty(&artifact)?)?;
    info!("Wrote analysis file to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::merge::MatchKey;
    use crate::types::Source;
    use std::collections::BTreeSet;

    fn create_test_record(
        name: &str,
        magnitude: f64,
        sources: &[Source],
    ) -> CanonicalPlayerRecord {
        CanonicalPlayerRecord {
            key: MatchKey::new(name, "Test FC"),
            display_name: name.to_string(),
            position: "MID".to_string(),
            magnitude,
            sources: sources.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn partition_splits_on_sign_and_drops_zero() {
        let records = vec![
            create_test_record("Riser", 0.5, &[Source::Ffhub]),
            create_test_record("Faller", -0.5, &[Source::Fix]),
            create_test_record("Flat", 0.0, &[Source::Livefpl]),
        ];
        let (rising, falling) = partition(&records);
        assert_eq!(rising.len(), 1);
        assert_eq!(falling.len(), 1);
        assert_eq!(rising[0].display_name, "Riser");
        assert_eq!(falling[0].display_name, "Faller");
    }

    #[test]
    fn groups_order_by_magnitude_then_key() {
        let records = vec![
            create_test_record("Bell", 0.4, &[Source::Ffhub]),
            create_test_record("Adams", 0.4, &[Source::Ffhub]),
            create_test_record("Cook", 1.2, &[Source::Ffhub]),
        ];
        let (rising, _) = partition(&records);
        let names: Vec<&str> = rising.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Cook", "Adams", "Bell"]);
    }

    #[test]
    fn falling_orders_by_absolute_magnitude() {
        let records = vec![
            create_test_record("Small", -0.3, &[Source::Fix]),
            create_test_record("Large", -1.1, &[Source::Fix]),
        ];
        let (_, falling) = partition(&records);
        let names: Vec<&str> = falling.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Large", "Small"]);
    }

    #[test]
    fn report_keeps_both_sections_when_empty() {
        let report = format_report(&[]);
        assert!(report.contains("📈 Rising (0)"));
        assert!(report.contains("📉 Falling (0)"));
    }

    #[test]
    fn line_format_places_provenance_after_position() {
        let records = vec![create_test_record(
            "Rodrigo Muniz",
            1.0,
            &[Source::Livefpl, Source::Ffhub],
        )];
        let report = format_report(&records);
        assert!(report.contains("1. 🔺 Rodrigo Muniz MID (FFHUB,LIVEFPL) +1.0%"));
    }

    #[test]
    fn falling_lines_use_falling_marker_and_sign() {
        let records = vec![create_test_record("Saliba", -1.2, &[Source::Livefpl])];
        let report = format_report(&records);
        assert!(report.contains("📉 Falling (1)"));
        assert!(report.contains("1. 🔻 Saliba MID (LIVEFPL) -1.2%"));
    }

    #[test]
    fn numbering_restarts_per_section() {
        let records = vec![
            create_test_record("Riser A", 0.9, &[Source::Ffhub]),
            create_test_record("Riser B", 0.4, &[Source::Ffhub]),
            create_test_record("Faller", -0.6, &[Source::Fix]),
        ];
        let report = format_report(&records);
        assert!(report.contains("1. 🔺 Riser A"));
        assert!(report.contains("2. 🔺 Riser B"));
        assert!(report.contains("1. 🔻 Faller"));
    }

    #[test]
    fn rendering_is_byte_identical_across_calls() {
        let records = vec![
            create_test_record("Muniz", 1.0, &[Source::Ffhub, Source::Livefpl]),
            create_test_record("Saliba", -0.7, &[Source::Fix]),
        ];
        assert_eq!(format_report(&records), format_report(&records));
    }
}
