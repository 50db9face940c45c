//! Execution report rendering
//!
//! Pure read of the message timestamps; nothing here mutates the message.

use chrono::{DateTime, Local, SecondsFormat};
use contracts::{stage_names, Message, TimestampRecord};
use std::fmt;

const RULE_WIDTH: usize = 60;

/// Top-level stages in display order
const STAGE_ORDER: [(&str, &str); 4] = [
    (stage_names::STORY_GENERATOR, "Service A: Story Generator"),
    (stage_names::STORY_ANALYZER, "Service B: Story Analyzer"),
    (
        stage_names::PARALLEL_HUB,
        "Service C: Parallel Processing Hub",
    ),
    (stage_names::AGGREGATOR, "Service D: Final Aggregator"),
];

/// Hub sub-stages in display order
const BRANCH_ORDER: [(&str, &str); 4] = [
    (stage_names::IMAGE_CONCEPT, "Service C1: Image Concept"),
    (stage_names::AUDIO_SCRIPT, "Service C2: Audio Script"),
    (stage_names::TRANSLATION, "Service C3: Translation"),
    (stage_names::FORMATTING, "Service C4: Formatting"),
];

fn local_time(epoch_secs: f64) -> Option<DateTime<Local>> {
    let secs = epoch_secs.floor();
    let nanos = ((epoch_secs - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos).map(|dt| dt.with_timezone(&Local))
}

/// Full local date and time with milliseconds
pub fn format_instant(epoch_secs: f64) -> String {
    local_time(epoch_secs)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| format!("{epoch_secs:.3}"))
}

/// RFC 3339 local timestamp with microseconds
pub fn format_rfc3339(epoch_secs: f64) -> String {
    local_time(epoch_secs)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, false))
        .unwrap_or_else(|| format!("{epoch_secs:.6}"))
}

/// Local time of day with milliseconds
pub fn format_time_of_day(epoch_secs: f64) -> String {
    local_time(epoch_secs)
        .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| format!("{epoch_secs:.3}"))
}

struct TimelineReport<'a>(&'a Message);

impl TimelineReport<'_> {
    fn write_stage(f: &mut fmt::Formatter<'_>, ts: &TimestampRecord) -> fmt::Result {
        let Some(started) = ts.started_at else {
            return Ok(());
        };

        writeln!(f, "  [{}]", ts.stage_name)?;
        if let Some(received) = ts.received_at {
            writeln!(f, "    Received: {}", format_instant(received))?;
        }
        writeln!(f, "    Started: {}", format_instant(started))?;

        match (ts.completed_at, ts.duration_ms()) {
            (Some(completed), Some(duration)) => {
                writeln!(f, "    Completed: {}", format_instant(completed))?;
                writeln!(f, "    Duration: {duration:.2}ms")?;
            }
            _ => writeln!(f, "    Status: Processing...")?,
        }
        Ok(())
    }

    fn write_branches(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let branches: Vec<(&TimestampRecord, &str)> = BRANCH_ORDER
            .iter()
            .filter_map(|(name, label)| {
                self.0
                    .timestamp(name)
                    .filter(|ts| ts.started_at.is_some())
                    .map(|ts| (ts, *label))
            })
            .collect();

        if branches.is_empty() {
            return Ok(());
        }

        writeln!(f, "\n  [Parallel Services]")?;
        for (ts, label) in &branches {
            let start = ts.started_at.map(format_time_of_day).unwrap_or_default();
            match (ts.completed_at, ts.duration_ms()) {
                (Some(end), Some(duration)) => writeln!(
                    f,
                    "    [{label}] Started: {start}, Completed: {} ({duration:.2}ms)",
                    format_time_of_day(end)
                )?,
                _ => writeln!(f, "    [{label}] Started: {start}, Status: Processing...")?,
            }
        }

        if let Some((batch_end, batch_ms)) = batch_window(&branches) {
            writeln!(
                f,
                "\n    Parallel Batch Completed: {} (max duration: {batch_ms:.2}ms)",
                format_time_of_day(batch_end)
            )?;
        }
        Ok(())
    }
}

/// Latest end and (latest end - earliest start) in ms, only when every
/// branch completed
fn batch_window(branches: &[(&TimestampRecord, &str)]) -> Option<(f64, f64)> {
    let mut min_start = f64::INFINITY;
    let mut max_end = f64::NEG_INFINITY;
    for (ts, _) in branches {
        min_start = min_start.min(ts.started_at?);
        max_end = max_end.max(ts.completed_at?);
    }
    Some((max_end, (max_end - min_start) * 1000.0))
}

impl fmt::Display for TimelineReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "\n{rule}")?;
        writeln!(f, "=== Pipeline Execution Timeline ===")?;
        writeln!(f, "{rule}")?;

        for (name, label) in STAGE_ORDER {
            let Some(ts) = self.0.timestamp(name) else {
                continue;
            };
            writeln!(f, "\n[{label}]")?;
            Self::write_stage(f, ts)?;

            if name == stage_names::PARALLEL_HUB {
                self.write_branches(f)?;
            }
        }

        if let Some(total) = self.0.total_duration_ms() {
            writeln!(f, "\n{rule}")?;
            writeln!(f, "Total Pipeline Duration: {total:.2}ms")?;
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

/// Render the execution timeline of a message
pub fn render(message: &Message) -> String {
    TimelineReport(message).to_string()
}

/// Print the execution timeline to stdout
pub fn display(message: &Message) {
    println!("{}", render(message));
}
