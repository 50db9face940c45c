//! Config validation
//!
//! Rules:
//! - rpc_timeout_ms > 0
//! - endpoint keys are known stage names
//! - every endpoint is a `host:port` with a non-zero port
//! - remote modes need an endpoint for every stage
//! - server.host is not empty

use contracts::{stage_names, ContractError, PipelineBlueprint};

/// Validate a blueprint, returning the first problem found
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    validate_timeout(blueprint)?;
    validate_endpoints(blueprint)?;
    validate_remote_coverage(blueprint)?;
    validate_server(blueprint)?;
    Ok(())
}

fn validate_timeout(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    if blueprint.rpc_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "rpc_timeout_ms",
            "rpc_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// Split "host:port", rejecting empty hosts and port 0
pub fn parse_endpoint(addr: &str) -> Result<(&str, u16), String> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| format!("'{addr}' is not in host:port form"))?;
    if host.is_empty() {
        return Err(format!("'{addr}' has an empty host"));
    }
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("'{addr}' has an invalid port '{port}'")),
        Ok(port) => Ok((host, port)),
    }
}

fn validate_endpoints(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    for (name, addr) in &blueprint.endpoints {
        if !stage_names::ALL.contains(&name.as_str()) {
            return Err(ContractError::config_validation(
                format!("endpoints.{name}"),
                "unknown stage name",
            ));
        }
        parse_endpoint(addr)
            .map_err(|msg| ContractError::config_validation(format!("endpoints.{name}"), msg))?;
    }
    Ok(())
}

fn validate_remote_coverage(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    if !blueprint.mode.is_remote() {
        return Ok(());
    }
    for name in stage_names::ALL {
        if blueprint.endpoint(name).is_none() {
            return Err(ContractError::config_validation(
                format!("endpoints.{name}"),
                format!("mode '{}' needs an endpoint for every stage", blueprint.mode),
            ));
        }
    }
    Ok(())
}

fn validate_server(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    if blueprint.server.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.host",
            "server host cannot be empty",
        ));
    }
    Ok(())
}
