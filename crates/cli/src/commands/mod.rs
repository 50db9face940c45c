//! Command implementations.

mod info;
mod run;
mod serve;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use serve::run_serve;
pub use validate::run_validate;

use config_loader::ConfigLoader;
use contracts::{stage_names, PipelineBlueprint};
use tracing::info;

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};

/// Load the config file (defaults when absent) and apply CLI overrides
pub(crate) fn load_blueprint(args: &ConfigArgs) -> Result<PipelineBlueprint> {
    let mut blueprint = ConfigLoader::load_or_default(&args.config)?;
    apply_overrides(&mut blueprint, args)?;
    config_loader::validate(&blueprint)?;
    Ok(blueprint)
}

fn apply_overrides(blueprint: &mut PipelineBlueprint, args: &ConfigArgs) -> Result<()> {
    if let Some(mode) = args.mode {
        info!(mode = ?mode, "Overriding execution mode from CLI");
        blueprint.mode = mode.into();
    }
    if let Some(timeout) = args.rpc_timeout_ms {
        info!(timeout_ms = timeout, "Overriding RPC timeout from CLI");
        blueprint.rpc_timeout_ms = timeout;
    }
    for value in &args.endpoints {
        let (stage, addr) = parse_endpoint_override(value)?;
        info!(stage, addr, "Overriding endpoint from CLI");
        blueprint.endpoints.insert(stage.to_string(), addr.to_string());
    }
    Ok(())
}

/// Split `stage=host:port`
fn parse_endpoint_override(value: &str) -> Result<(&str, &str)> {
    let (stage, addr) = value
        .split_once('=')
        .ok_or_else(|| CliError::invalid_endpoint(value, "expected STAGE=HOST:PORT"))?;
    let (stage, addr) = (stage.trim(), addr.trim());
    if !stage_names::ALL.contains(&stage) {
        return Err(CliError::invalid_endpoint(value, format!("unknown stage '{stage}'")));
    }
    config_loader::parse_endpoint(addr).map_err(|msg| CliError::invalid_endpoint(value, msg))?;
    Ok((stage, addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ModeArg;
    use contracts::TransportKind;
    use std::io::Write;

    fn config_args(config: std::path::PathBuf) -> ConfigArgs {
        ConfigArgs {
            config,
            mode: None,
            rpc_timeout_ms: None,
            endpoints: Vec::new(),
        }
    }

    #[test]
    fn test_parse_endpoint_override() {
        assert_eq!(
            parse_endpoint_override("service_d_aggregator=localhost:9000").unwrap(),
            ("service_d_aggregator", "localhost:9000")
        );
        assert!(parse_endpoint_override("service_d_aggregator").is_err());
        assert!(parse_endpoint_override("service_q=localhost:9000").is_err());
        assert!(parse_endpoint_override("service_d_aggregator=localhost").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"mode = \"json_rpc\"\nrpc_timeout_ms = 500\n").unwrap();

        let mut args = config_args(file.path().to_path_buf());
        args.mode = Some(ModeArg::Grpc);
        args.endpoints = vec!["service_b_story_analyzer=127.0.0.1:6002".into()];

        let bp = load_blueprint(&args).unwrap();
        assert_eq!(bp.mode, TransportKind::Grpc);
        assert_eq!(bp.rpc_timeout_ms, 500);
        assert_eq!(bp.endpoint(stage_names::STORY_ANALYZER), Some("127.0.0.1:6002"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = config_args(dir.path().join("missing.toml"));
        args.rpc_timeout_ms = Some(0);

        assert!(matches!(load_blueprint(&args), Err(CliError::Config(_))));
    }
}
