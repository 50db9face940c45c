//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{stage_names, PipelineBlueprint};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    mode: String,
    rpc_timeout_ms: u64,
    endpoint_count: usize,
    server_host: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    mode: blueprint.mode.to_string(),
                    rpc_timeout_ms: blueprint.rpc_timeout_ms,
                    endpoint_count: blueprint.endpoints.len(),
                    server_host: blueprint.server.host.clone(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(blueprint: &PipelineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.mode.is_remote() && blueprint.endpoints.len() < stage_names::ALL.len() {
        warnings.push(
            "Some stages have no endpoint - `serve` and remote modes will not reach them"
                .to_string(),
        );
    }

    if blueprint.rpc_timeout_ms < 1_000 {
        warnings.push(format!(
            "rpc_timeout_ms is {} - the parallel hub may degrade sub-stages under load",
            blueprint.rpc_timeout_ms
        ));
    }

    let mut seen = std::collections::HashMap::new();
    for (stage, addr) in &blueprint.endpoints {
        if let Some(other) = seen.insert(addr.as_str(), stage.as_str()) {
            warnings.push(format!("'{stage}' and '{other}' share endpoint {addr}"));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Mode: {}", summary.mode);
            println!("  RPC timeout: {} ms", summary.rpc_timeout_ms);
            println!("  Endpoints: {}", summary.endpoint_count);
            println!("  Server host: {}", summary.server_host);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
