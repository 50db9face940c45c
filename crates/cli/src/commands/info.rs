//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{stage_names, PipelineBlueprint};
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Resolved configuration for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    mode: String,
    rpc_timeout_ms: u64,
    server_host: String,
    stages: Vec<StageInfo>,
}

#[derive(Serialize)]
struct StageInfo {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    binding: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.config.display()))?;
    let config_info = extract_info(&blueprint);

    if args.json {
        let json =
            serde_json::to_string_pretty(&config_info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_info(&config_info);
    }

    Ok(())
}

fn extract_info(blueprint: &PipelineBlueprint) -> ConfigInfo {
    let stages = stage_names::ALL
        .iter()
        .map(|&name| StageInfo {
            name: name.to_string(),
            endpoint: blueprint.endpoint(name).map(str::to_string),
            binding: match pipeline::resolve_binding(name, blueprint) {
                Ok(binding) => binding.to_string(),
                Err(e) => format!("unresolved ({e})"),
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        mode: blueprint.mode.to_string(),
        rpc_timeout_ms: blueprint.rpc_timeout_ms,
        server_host: blueprint.server.host.clone(),
        stages,
    }
}

fn print_info(info: &ConfigInfo) {
    println!("Story Pipeline Configuration");
    println!("============================\n");

    println!("Version: {}", info.version);
    println!("Mode: {}", info.mode);
    println!("RPC timeout: {} ms", info.rpc_timeout_ms);
    println!("Server host: {}", info.server_host);

    println!("\nStages ({}):", info.stages.len());
    for stage in &info.stages {
        println!("  [{}]", stage.name);
        if let Some(ref endpoint) = stage.endpoint {
            println!("    Endpoint: {}", endpoint);
        }
        println!("    Binding: {}", stage.binding);
    }
}
