//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{stage_names, Message, PipelineBlueprint, TransportKind};
use observability::StageTimingAggregator;
use pipeline::{Pipeline, PipelineError};
use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;
use timeline::TimelineTracker;
use tracing::{error, info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::report::print_results;

/// Used when no prompt is given
pub const DEFAULT_PROMPT: &str = "A space adventure about robots";

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.config.display()))?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    info!(
        mode = %blueprint.mode,
        rpc_timeout_ms = blueprint.rpc_timeout_ms,
        iterations = args.iterations,
        "Configuration loaded"
    );

    let pipeline = Pipeline::from_blueprint(&blueprint).context("Failed to bind pipeline stages")?;
    let prompt = resolve_prompt(&args.prompt)?;
    info!(prompt = %prompt, "Starting pipeline execution");

    let mut timings = StageTimingAggregator::new();
    let mut last = None;
    for iteration in 1..=args.iterations {
        let message = run_once(&pipeline, &prompt, blueprint.mode)
            .await
            .with_context(|| format!("Pipeline execution failed (iteration {iteration})"))?;
        timings.update(&message);
        last = Some(message);
    }
    let message = last.context("Pipeline produced no result")?;

    if !args.no_timeline {
        timeline::display(&message);
    }
    print_results(&message);

    if args.iterations > 1 {
        println!("\n{}", timings.summary());
    }

    if let Some(path) = &args.output {
        write_output(path, &message, &blueprint)?;
        println!("\nFull output saved to: {}", path.display());
    }

    info!("Pipeline execution completed successfully");
    Ok(())
}

/// One pass of the chain, bracketed by the `main_program` record
async fn run_once(
    pipeline: &Pipeline,
    prompt: &str,
    mode: TransportKind,
) -> std::result::Result<Message, PipelineError> {
    let tracker = TimelineTracker::new();
    let mut message = Message::new(prompt);
    message
        .metadata
        .insert("execution_mode".into(), json!(mode.as_str()));
    tracker.mark_started(&mut message, stage_names::MAIN_PROGRAM);

    match pipeline.run(message).await {
        Ok(mut out) => {
            tracker.mark_completed(&mut out, stage_names::MAIN_PROGRAM);
            Ok(out)
        }
        Err(e) => {
            if let Some(partial) = e.partial() {
                let produced: Vec<&str> = [
                    ("story_text", partial.story_text.is_some()),
                    ("analysis", partial.analysis.is_some()),
                    ("image_concept", partial.image_concept.is_some()),
                    ("audio_script", partial.audio_script.is_some()),
                    ("translations", partial.translations.is_some()),
                    ("formatted_output", partial.formatted_output.is_some()),
                ]
                .into_iter()
                .filter_map(|(field, present)| present.then_some(field))
                .collect();
                warn!(produced = ?produced, "Pipeline aborted with partial results");
            }
            error!(error = %e, "Pipeline failed");
            Err(e)
        }
    }
}

/// Prompt from the arguments, `-` for stdin, or the default
fn resolve_prompt(words: &[String]) -> Result<String> {
    let prompt = match words {
        [dash] if dash == "-" => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read prompt from stdin")?;
            input.trim().to_string()
        }
        _ => words.join(" ").trim().to_string(),
    };

    if prompt.is_empty() {
        warn!(default = DEFAULT_PROMPT, "No prompt provided, using default");
        return Ok(DEFAULT_PROMPT.to_string());
    }
    Ok(prompt)
}

/// Dictionary form of the final message plus `execution_mode`
pub fn output_payload(message: &Message, mode: TransportKind) -> Value {
    let mut payload = transport::to_dict(message);
    if let Value::Object(map) = &mut payload {
        map.insert("execution_mode".into(), json!(mode.as_str()));
    }
    payload
}

fn write_output(path: &Path, message: &Message, blueprint: &PipelineBlueprint) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let payload = output_payload(message, blueprint.mode);
    let json = serde_json::to_string_pretty(&payload).context("Failed to serialize output")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
