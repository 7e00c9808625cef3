use anyhow::Result;
use chrono::Utc;
use tempfile::tempdir;

use fpl_price_monitor::pipeline::filter::SourceFilter;
use fpl_price_monitor::pipeline::merge::MergeEngine;
use fpl_price_monitor::pipeline::{process_batches, report};
use fpl_price_monitor::types::{EligibilitySignal, FetchedBatch, RawPrediction, Source};

fn window_prediction(
    source: Source,
    name: &str,
    team: &str,
    position: &str,
    magnitude: f64,
    tag: &str,
) -> RawPrediction {
    RawPrediction {
        source,
        player_name: name.to_string(),
        team: team.to_string(),
        position: position.to_string(),
        magnitude,
        signal: EligibilitySignal::ChangeWindow(tag.to_string()),
    }
}

fn progress_prediction(
    name: &str,
    team: &str,
    position: &str,
    magnitude: f64,
    tonight: f64,
) -> RawPrediction {
    RawPrediction {
        source: Source::Livefpl,
        player_name: name.to_string(),
        team: team.to_string(),
        position: position.to_string(),
        magnitude,
        signal: EligibilitySignal::TonightProgress(tonight),
    }
}

fn batch(source: Source, predictions: Vec<RawPrediction>) -> FetchedBatch {
    FetchedBatch {
        source,
        updated_time: Some("2025-08-11 01:30".to_string()),
        fetched_at: Utc::now(),
        predictions,
    }
}

/// Three sources mention the same striker under different spellings; only
/// the sources predicting a change tonight may contribute provenance.
fn muniz_scenario() -> Vec<FetchedBatch> {
    vec![
        batch(
            Source::Ffhub,
            vec![window_prediction(
                Source::Ffhub,
                "Rodrigo Muniz",
                "Fulham",
                "FWD",
                1.0,
                "Tonight - 75%",
            )],
        ),
        batch(
            Source::Fix,
            vec![window_prediction(
                Source::Fix,
                "Rodrigo Muniz",
                "Fulham",
                "FWD",
                1.0,
                "Tomorrow",
            )],
        ),
        batch(
            Source::Livefpl,
            vec![progress_prediction("Muniz", "Fulham", "FWD", 1.0, 120.0)],
        ),
    ]
}

#[tokio::test]
async fn muniz_collapses_to_one_line_with_both_tonight_sources() -> Result<()> {
    let records = process_batches(
        muniz_scenario(),
        &SourceFilter::default(),
        &MergeEngine::default(),
    );

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.display_name, "Rodrigo Muniz");
    assert_eq!(record.position, "FWD");
    let sources: Vec<Source> = record.sources.iter().copied().collect();
    assert_eq!(sources, [Source::Ffhub, Source::Livefpl]);

    let text = report::format_report(&records);
    let muniz_lines: Vec<&str> = text.lines().filter(|l| l.contains("Muniz")).collect();
    assert_eq!(muniz_lines.len(), 1);
    assert!(muniz_lines[0].contains("(FFHUB,LIVEFPL)"));
    assert!(text.contains("📈 Rising (1)"));
    assert!(text.contains("📉 Falling (0)"));
    Ok(())
}

#[tokio::test]
async fn report_is_stable_under_batch_and_row_permutation() -> Result<()> {
    let filter = SourceFilter::default();
    let engine = MergeEngine::default();

    let make_batches = |reversed: bool| {
        let mut ffhub_rows = vec![
            window_prediction(Source::Ffhub, "Rodrigo Muniz", "Fulham", "FWD", 1.0, "Tonight"),
            window_prediction(Source::Ffhub, "Wood", "Nott'm Forest", "FWD", 0.8, "Tonight"),
        ];
        let mut livefpl_rows = vec![
            progress_prediction("Muniz", "Fulham", "FWD", 1.1, 130.0),
            progress_prediction("Saliba", "Arsenal", "DEF", -1.2, -140.0),
        ];
        if reversed {
            ffhub_rows.reverse();
            livefpl_rows.reverse();
        }
        let mut batches = vec![
            batch(Source::Ffhub, ffhub_rows),
            batch(Source::Livefpl, livefpl_rows),
        ];
        if reversed {
            batches.reverse();
        }
        batches
    };

    let baseline = report::format_report(&process_batches(make_batches(false), &filter, &engine));
    let permuted = report::format_report(&process_batches(make_batches(true), &filter, &engine));
    assert_eq!(baseline, permuted);
    Ok(())
}

#[tokio::test]
async fn full_report_text_is_deterministic() -> Result<()> {
    let batches = vec![
        batch(
            Source::Ffhub,
            vec![window_prediction(
                Source::Ffhub,
                "Rodrigo Muniz",
                "Fulham",
                "FWD",
                1.0,
                "Tonight - 75%",
            )],
        ),
        batch(
            Source::Livefpl,
            vec![
                progress_prediction("Muniz", "Fulham", "FWD", 1.0, 120.0),
                progress_prediction("Saliba", "Arsenal", "DEF", -1.2, -130.0),
            ],
        ),
    ];

    let records = process_batches(batches, &SourceFilter::default(), &MergeEngine::default());
    let text = report::format_report(&records);

    assert_eq!(
        text,
        "🏆 FPL Price Change Predictions\n\
         \n\
         📈 Rising (1)\n\
         1. 🔺 Rodrigo Muniz FWD (FFHUB,LIVEFPL) +1.0%\n\
         \n\
         📉 Falling (1)\n\
         1. 🔻 Saliba DEF (LIVEFPL) -1.2%\n"
    );
    Ok(())
}

#[tokio::test]
async fn empty_input_still_renders_both_sections() -> Result<()> {
    let batches = vec![batch(Source::Ffhub, Vec::new())];
    let records = process_batches(batches, &SourceFilter::default(), &MergeEngine::default());
    assert!(records.is_empty());

    let text = report::format_report(&records);
    assert!(text.contains("📈 Rising (0)"));
    assert!(text.contains("📉 Falling (0)"));
    Ok(())
}

#[tokio::test]
async fn analysis_artifact_round_trips_through_disk() -> Result<()> {
    let temp_dir = tempdir()?;
    let records = process_batches(
        muniz_scenario(),
        &SourceFilter::default(),
        &MergeEngine::default(),
    );

    let path = report::write_analysis(temp_dir.path(), &records)?;
    assert!(path.ends_with(report::ANALYSIS_FILE_NAME));

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert!(written["generated_at"].is_string());
    let players = written["players"].as_array().expect("players array");
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["key"]["name"], "muniz");
    assert_eq!(players[0]["key"]["team"], "fulham");
    assert_eq!(
        players[0]["sources"],
        serde_json::json!(["ffhub", "livefpl"])
    );
    Ok(())
}
