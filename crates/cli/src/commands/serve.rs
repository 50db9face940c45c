//! `serve` command implementation.

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, TransportKind};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::ServeArgs;
use crate::error::CliError;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.config.display()))?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let transport = serve_transport(args, &blueprint);
    let host = args.host.as_deref().unwrap_or(&blueprint.server.host);
    let port = args
        .port
        .or_else(|| blueprint.endpoint_port(&args.stage))
        .ok_or_else(|| CliError::MissingPort {
            stage: args.stage.clone(),
        })?;

    let stage = pipeline::hosted_stage(&args.stage, &blueprint).map_err(CliError::from)?;
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(CliError::from)
        .with_context(|| format!("Failed to bind {host}:{port}"))?;

    let addr = listener.local_addr().context("Failed to read listen address")?;
    info!(
        stage = %args.stage,
        transport = %transport,
        addr = %addr,
        "Stage server listening"
    );

    transport::serve_stage(transport, listener, stage, shutdown_signal())
        .await
        .map_err(CliError::from)?;

    info!(stage = %args.stage, "Stage server stopped");
    Ok(())
}

/// Explicit `--transport`, else the configured mode, else JSON lines
fn serve_transport(args: &ServeArgs, blueprint: &PipelineBlueprint) -> TransportKind {
    match args.transport {
        Some(transport) => transport.into(),
        None if blueprint.mode.is_remote() => blueprint.mode,
        None => TransportKind::JsonRpc,
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConfigArgs, ServeTransport};
    use contracts::stage_names;

    fn serve_args(transport: Option<ServeTransport>) -> ServeArgs {
        ServeArgs {
            config: ConfigArgs {
                config: "absent.toml".into(),
                mode: None,
                rpc_timeout_ms: None,
                endpoints: Vec::new(),
            },
            stage: stage_names::AGGREGATOR.to_string(),
            transport,
            host: None,
            port: None,
            metrics_port: 0,
        }
    }

    #[test]
    fn test_serve_transport_choice() {
        let local = PipelineBlueprint::default();
        let grpc = PipelineBlueprint {
            mode: TransportKind::Grpc,
            ..Default::default()
        };

        assert_eq!(serve_transport(&serve_args(None), &local), TransportKind::JsonRpc);
        assert_eq!(serve_transport(&serve_args(None), &grpc), TransportKind::Grpc);
        assert_eq!(
            serve_transport(&serve_args(Some(ServeTransport::JsonRpc)), &grpc),
            TransportKind::JsonRpc
        );
    }
}
