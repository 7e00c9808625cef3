//! Simple metrics module for the price monitor pipeline
//!
//! This module provides a straightforward API for recording metrics using
//! the standard Prometheus naming conventions.

use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// Enum representing all metric names used in the system
/// This eliminates magic strings and provides compile-time safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources metrics
    SourcesRequestsSuccess,
    SourcesRequestsError,
    SourcesRequestDuration,
    SourcesPayloadBytes,
    SourcesRowsAdapted,
    SourcesRowsSkipped,
    SourcesMalformedMagnitude,

    // Filter metrics
    FilterRecordsEligible,
    FilterRecordsExcluded,

    // Normalize metrics
    NormalizeUnknownPosition,

    // Merge metrics
    MergeRecordsCreated,
    MergeSourcesCorroborated,
    MergeDuplicatesIgnored,

    // Report metrics
    ReportLinesRendered,

    // Notify metrics
    NotifySendSuccess,
    NotifySendError,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            // Sources metrics
            MetricName::SourcesRequestsSuccess => "fpl_sources_requests_success_total",
            MetricName::SourcesRequestsError => "fpl_sources_requests_error_total",
            MetricName::SourcesRequestDuration => "fpl_sources_request_duration_seconds",
            MetricName::SourcesPayloadBytes => "fpl_sources_payload_bytes",
            MetricName::SourcesRowsAdapted => "fpl_sources_rows_adapted_total",
            MetricName::SourcesRowsSkipped => "fpl_sources_rows_skipped_total",
            MetricName::SourcesMalformedMagnitude => "fpl_sources_malformed_magnitude_total",

            // Filter metrics
            MetricName::FilterRecordsEligible => "fpl_filter_records_eligible_total",
            MetricName::FilterRecordsExcluded => "fpl_filter_records_excluded_total",

            // Normalize metrics
            MetricName::NormalizeUnknownPosition => "fpl_normalize_unknown_position_total",

            // Merge metrics
            MetricName::MergeRecordsCreated => "fpl_merge_records_created_total",
            MetricName::MergeSourcesCorroborated => "fpl_merge_sources_corroborated_total",
            MetricName::MergeDuplicatesIgnored => "fpl_merge_duplicates_ignored_total",

            // Report metrics
            MetricName::ReportLinesRendered => "fpl_report_lines_rendered_total",

            // Notify metrics
            MetricName::NotifySendSuccess => "fpl_notify_send_success_total",
            MetricName::NotifySendError => "fpl_notify_send_error_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with an in-process Prometheus recorder
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metric values in Prometheus exposition format.
/// Returns None until init() has run.
pub fn snapshot() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Sources Metrics
// ============================================================================

pub mod sources {
    use super::MetricName;

    /// Record a successful request
    pub fn request_success(source: &str) {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str(), "source" => source.to_string()).increment(1);
    }

    /// Record a failed request
    pub fn request_error(source: &str) {
        ::metrics::counter!(MetricName::SourcesRequestsError.as_str(), "source" => source.to_string()).increment(1);
    }

    /// Record request duration
    pub fn request_duration(source: &str, secs: f64) {
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str(), "source" => source.to_string()).record(secs);
    }

    /// Record payload size
    pub fn payload_bytes(source: &str, bytes: usize) {
        ::metrics::histogram!(MetricName::SourcesPayloadBytes.as_str(), "source" => source.to_string()).record(bytes as f64);
    }

    /// Record rows successfully adapted to the common prediction shape
    pub fn rows_adapted(source: &str, count: usize) {
        ::metrics::counter!(MetricName::SourcesRowsAdapted.as_str(), "source" => source.to_string()).increment(count as u64);
    }

    /// Record a wire row dropped for missing identity fields or bad shape
    pub fn row_skipped(source: &str) {
        ::metrics::counter!(MetricName::SourcesRowsSkipped.as_str(), "source" => source.to_string()).increment(1);
    }

    /// Record a row dropped for a non-numeric or missing magnitude
    pub fn malformed_magnitude(source: &str) {
        ::metrics::counter!(MetricName::SourcesMalformedMagnitude.as_str(), "source" => source.to_string()).increment(1);
    }
}

// ============================================================================
// Filter Metrics
// ============================================================================

pub mod filter {
    use super::MetricName;

    /// Record a record that passed its source's eligibility rule
    pub fn record_eligible(source: &str) {
        ::metrics::counter!(MetricName::FilterRecordsEligible.as_str(), "source" => source.to_string()).increment(1);
    }

    /// Record a record excluded by its source's eligibility rule
    pub fn record_excluded(source: &str) {
        ::metrics::counter!(MetricName::FilterRecordsExcluded.as_str(), "source" => source.to_string()).increment(1);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    /// Record a position label outside the known vocabulary
    pub fn unknown_position() {
        ::metrics::counter!(MetricName::NormalizeUnknownPosition.as_str()).increment(1);
    }
}

// ============================================================================
// Merge Metrics
// ============================================================================

pub mod merge {
    use super::MetricName;

    /// Record a newly created canonical player record
    pub fn record_created() {
        ::metrics::counter!(MetricName::MergeRecordsCreated.as_str()).increment(1);
    }

    /// Record a cross-source corroboration of an existing record
    pub fn source_corroborated() {
        ::metrics::counter!(MetricName::MergeSourcesCorroborated.as_str()).increment(1);
    }

    /// Record a same-source duplicate folded into an existing record
    pub fn duplicate_ignored() {
        ::metrics::counter!(MetricName::MergeDuplicatesIgnored.as_str()).increment(1);
    }
}

// ============================================================================
// Report Metrics
// ============================================================================

pub mod report {
    use super::MetricName;

    /// Record how many prediction lines a report contained
    pub fn lines_rendered(count: usize) {
        ::metrics::counter!(MetricName::ReportLinesRendered.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Notify Metrics
// ============================================================================

pub mod notify {
    use super::MetricName;

    /// Record a delivered notification
    pub fn send_success() {
        ::metrics::counter!(MetricName::NotifySendSuccess.as_str()).increment(1);
    }

    /// Record a failed notification
    pub fn send_error() {
        ::metrics::counter!(MetricName::NotifySendError.as_str()).increment(1);
    }
}
