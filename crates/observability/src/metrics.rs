//! Pipeline metrics
//!
//! Prometheus-facing counters/histograms plus an in-memory aggregator for
//! per-stage timing summaries across runs.

use contracts::Message;
use metrics::{counter, histogram};
use std::collections::BTreeMap;
use std::fmt;

/// Record a completed stage invocation
pub fn record_stage_run(stage: &str, duration_ms: f64) {
    counter!("story_pipeline_stage_runs_total", "stage" => stage.to_string()).increment(1);
    histogram!("story_pipeline_stage_duration_ms", "stage" => stage.to_string())
        .record(duration_ms);
}

/// Record a failed stage invocation
pub fn record_stage_failure(stage: &str) {
    counter!("story_pipeline_stage_failures_total", "stage" => stage.to_string()).increment(1);
}

/// Record a hub sub-stage that fell back to its input snapshot
pub fn record_hub_degraded(stage: &str) {
    counter!("story_pipeline_hub_degraded_total", "stage" => stage.to_string()).increment(1);
}

/// Outcome label for RPC request metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcOutcome {
    Ok,
    Error,
    InvalidRequest,
}

impl RpcOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

/// Record one request handled by a stage server
pub fn record_rpc_request(transport: &str, outcome: RpcOutcome) {
    counter!(
        "story_pipeline_rpc_requests_total",
        "transport" => transport.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Per-stage duration statistics across pipeline runs
#[derive(Debug, Clone, Default)]
pub struct StageTimingAggregator {
    /// Completed runs fed in
    pub runs: u64,

    /// Stage name -> duration stats (ms)
    pub stages: BTreeMap<String, RunningStats>,

    /// Whole-run duration stats (ms)
    pub total: RunningStats,
}

impl StageTimingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the timestamps of a finished message into the statistics
    pub fn update(&mut self, message: &Message) {
        self.runs += 1;

        for (name, ts) in &message.timestamps {
            if let Some(duration) = ts.duration_ms() {
                self.stages.entry(name.clone()).or_default().push(duration);
            }
        }

        if let Some(total) = message.total_duration_ms() {
            self.total.push(total);
        }
    }

    pub fn summary(&self) -> TimingSummary {
        TimingSummary {
            runs: self.runs,
            total_ms: StatsSummary::from(&self.total),
            stages: self
                .stages
                .iter()
                .map(|(name, stats)| (name.clone(), StatsSummary::from(stats)))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Timing summary snapshot
#[derive(Debug, Clone, Default)]
pub struct TimingSummary {
    pub runs: u64,
    pub total_ms: StatsSummary,
    pub stages: BTreeMap<String, StatsSummary>,
}

impl fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Stage Timing Summary ===")?;
        writeln!(f, "Runs: {}", self.runs)?;
        writeln!(f, "Total (ms): {}", self.total_ms)?;
        for (name, stats) in &self.stages {
            writeln!(f, "  {}: {}", name, stats)?;
        }
        Ok(())
    }
}

/// Statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TimestampRecord;

    fn finished(name: &str, start: f64, end: f64) -> TimestampRecord {
        TimestampRecord {
            stage_name: name.to_string(),
            received_at: Some(start),
            started_at: Some(start),
            completed_at: Some(end),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [2.0, 4.0, 6.0, 8.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 4);
        assert!((stats.mean() - 5.0).abs() < 1e-10);
        assert!((stats.min() - 2.0).abs() < 1e-10);
        assert!((stats.max() - 8.0).abs() < 1e-10);
        assert!((stats.variance() - 20.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_skips_unfinished_stages() {
        let mut msg = Message::new("prompt");
        msg.timestamps
            .insert("a".into(), finished("a", 10.0, 10.5));
        let mut pending = TimestampRecord::new("b");
        pending.started_at = Some(10.5);
        msg.timestamps.insert("b".into(), pending);

        let mut aggregator = StageTimingAggregator::new();
        aggregator.update(&msg);
        aggregator.update(&msg);

        let summary = aggregator.summary();
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.stages["a"].count, 2);
        assert!((summary.stages["a"].mean - 500.0).abs() < 1e-6);
        assert!(!summary.stages.contains_key("b"));
        assert_eq!(summary.total_ms.count, 2);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = StageTimingAggregator::new();
        assert!(aggregator.summary().to_string().contains("Total (ms): N/A"));

        let mut msg = Message::new("prompt");
        msg.timestamps.insert("a".into(), finished("a", 1.0, 2.0));
        aggregator.update(&msg);

        let text = aggregator.summary().to_string();
        assert!(text.contains("Runs: 1"));
        assert!(text.contains("a: min=1000.00"));

        aggregator.reset();
        assert_eq!(aggregator.runs, 0);
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_stage_run("a", 1.0);
        record_stage_failure("a");
        record_hub_degraded("c1");
        record_rpc_request("json_rpc", RpcOutcome::Ok);
        assert_eq!(RpcOutcome::InvalidRequest.as_str(), "invalid_request");
    }
}
