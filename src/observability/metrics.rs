//! Metrics for the acquisition engine
//!
//! Counters and histograms are recorded through the `metrics` facade. Nothing is
//! exported unless the embedding binary installs a recorder.

use std::fmt;

/// All metric names used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Transport metrics
    TransportRequestsSuccess,
    TransportAttemptsError,
    TransportRequestDuration,
    TransportPayloadBytes,
    TransportFetchesExhausted,

    // Extraction metrics
    ExtractRecords,
    ExtractFieldMisses,

    // Orchestrator metrics
    OrchestratorTasksCompleted,
    OrchestratorTasksPanicked,
    OrchestratorRunDuration,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Transport metrics
            MetricName::TransportRequestsSuccess => "reconciler_transport_requests_success_total",
            MetricName::TransportAttemptsError => "reconciler_transport_attempts_error_total",
            MetricName::TransportRequestDuration => "reconciler_transport_request_duration_seconds",
            MetricName::TransportPayloadBytes => "reconciler_transport_payload_bytes",
            MetricName::TransportFetchesExhausted => "reconciler_transport_fetches_exhausted_total",

            // Extraction metrics
            MetricName::ExtractRecords => "reconciler_extract_records_total",
            MetricName::ExtractFieldMisses => "reconciler_extract_field_misses_total",

            // Orchestrator metrics
            MetricName::OrchestratorTasksCompleted => "reconciler_orchestrator_tasks_completed_total",
            MetricName::OrchestratorTasksPanicked => "reconciler_orchestrator_tasks_panicked_total",
            MetricName::OrchestratorRunDuration => "reconciler_orchestrator_run_duration_seconds",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            TransportRequestsSuccess,
            TransportAttemptsError,
            TransportRequestDuration,
            TransportPayloadBytes,
            TransportFetchesExhausted,
            ExtractRecords,
            ExtractFieldMisses,
            OrchestratorTasksCompleted,
            OrchestratorTasksPanicked,
            OrchestratorRunDuration,
        ]
        .into_iter()
    }
}

pub mod transport {
    use super::MetricName;

    pub fn request_success(duration_secs: f64, payload_bytes: usize) {
        ::metrics::counter!(MetricName::TransportRequestsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::TransportRequestDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::TransportPayloadBytes.as_str()).record(payload_bytes as f64);
    }

    /// One failed attempt, retried or not
    pub fn attempt_error(kind: &'static str) {
        ::metrics::counter!(MetricName::TransportAttemptsError.as_str(), "kind" => kind).increment(1);
    }

    pub fn fetch_exhausted() {
        ::metrics::counter!(MetricName::TransportFetchesExhausted.as_str()).increment(1);
    }
}

pub mod extract {
    use super::MetricName;

    pub fn record_extracted(catalog: &'static str) {
        ::metrics::counter!(MetricName::ExtractRecords.as_str(), "catalog" => catalog).increment(1);
    }

    pub fn field_missing(catalog: &'static str, field: &'static str) {
        ::metrics::counter!(
            MetricName::ExtractFieldMisses.as_str(),
            "catalog" => catalog,
            "field" => field
        )
        .increment(1);
    }
}

pub mod orchestrator {
    use super::MetricName;

    pub fn task_completed(catalog: &'static str) {
        ::metrics::counter!(MetricName::OrchestratorTasksCompleted.as_str(), "catalog" => catalog)
            .increment(1);
    }

    pub fn task_panicked(catalog: &'static str) {
        ::metrics::counter!(MetricName::OrchestratorTasksPanicked.as_str(), "catalog" => catalog)
            .increment(1);
    }

    pub fn run_duration(catalog: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::OrchestratorRunDuration.as_str(), "catalog" => catalog)
            .record(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("reconciler_")));
    }

    #[test]
    fn recording_without_a_recorder_is_a_no_op() {
        transport::request_success(0.2, 1024);
        transport::attempt_error("timeout");
        extract::field_missing("praktis", "name");
        orchestrator::task_completed("praktiker");
    }
}
