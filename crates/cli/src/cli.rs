//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{stage_names, TransportKind};
use std::path::PathBuf;

/// Story Pipeline - multi-stage story generation over local or remote stages
#[derive(Parser, Debug)]
#[command(
    name = "story-pipeline",
    author,
    version,
    about = "Multi-stage story generation pipeline",
    long_about = "Generates a story from a prompt, analyzes it, fans out to image, audio, \n\
                  translation and formatting stages in parallel, then aggregates the result.\n\n\
                  Every stage can run in-process or behind a JSON-lines or gRPC server."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STORY_PIPELINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "STORY_PIPELINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the A, B, C, D chain for one prompt
    Run(RunArgs),

    /// Host one stage behind a JSON-lines or gRPC server
    Serve(ServeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display resolved configuration
    Info(InfoArgs),
}

/// Config file plus command-line overrides
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(
        short,
        long,
        default_value = "pipeline.toml",
        env = "STORY_PIPELINE_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the execution mode
    #[arg(long, value_enum, env = "PIPELINE_MODE")]
    pub mode: Option<ModeArg>,

    /// Override the remote call timeout
    #[arg(long, env = "STORY_PIPELINE_RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Override a stage endpoint, e.g. `service_a_story_generator=localhost:50051`
    #[arg(
        long = "endpoint",
        value_name = "STAGE=HOST:PORT",
        env = "STORY_PIPELINE_ENDPOINTS",
        value_delimiter = ','
    )]
    pub endpoints: Vec<String>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Story prompt; `-` reads it from stdin
    #[arg(trailing_var_arg = true)]
    pub prompt: Vec<String>,

    /// Write the final message (dictionary form) to this JSON file
    #[arg(short, long, env = "STORY_PIPELINE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Run the chain this many times and print per-stage timing statistics
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub iterations: u32,

    /// Skip the execution timeline report
    #[arg(long)]
    pub no_timeline: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STORY_PIPELINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `serve` command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Stage to host
    #[arg(value_parser = clap::builder::PossibleValuesParser::new(stage_names::ALL))]
    pub stage: String,

    /// Server binding (defaults to the configured mode, or json-rpc in local mode)
    #[arg(long, value_enum, env = "STORY_PIPELINE_TRANSPORT")]
    pub transport: Option<ServeTransport>,

    /// Listen host (defaults to `server.host`)
    #[arg(long, env = "STORY_PIPELINE_HOST")]
    pub host: Option<String>,

    /// Listen port (defaults to the stage's endpoint port)
    #[arg(long, env = "SERVICE_PORT")]
    pub port: Option<u16>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STORY_PIPELINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execution mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// In-process calls
    Local,
    /// JSON lines over TCP
    #[value(alias = "rpc", alias = "json_rpc")]
    JsonRpc,
    /// gRPC
    Grpc,
}

impl From<ModeArg> for TransportKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => TransportKind::Local,
            ModeArg::JsonRpc => TransportKind::JsonRpc,
            ModeArg::Grpc => TransportKind::Grpc,
        }
    }
}

/// Server binding
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServeTransport {
    #[value(alias = "rpc", alias = "json_rpc")]
    JsonRpc,
    Grpc,
}

impl From<ServeTransport> for TransportKind {
    fn from(transport: ServeTransport) -> Self {
        match transport {
            ServeTransport::JsonRpc => TransportKind::JsonRpc,
            ServeTransport::Grpc => TransportKind::Grpc,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "story-pipeline",
            "run",
            "--mode",
            "grpc",
            "--endpoint",
            "service_a_story_generator=localhost:7001",
            "--iterations",
            "3",
            "A",
            "fantasy",
            "tale",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.mode, Some(ModeArg::Grpc));
        assert_eq!(args.config.endpoints.len(), 1);
        assert_eq!(args.iterations, 3);
        assert_eq!(args.prompt.join(" "), "A fantasy tale");
    }

    #[test]
    fn test_rpc_alias() {
        let cli = Cli::try_parse_from(["story-pipeline", "run", "--mode", "rpc"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.mode.map(TransportKind::from), Some(TransportKind::JsonRpc));
    }

    #[test]
    fn test_serve_rejects_unknown_stage() {
        assert!(Cli::try_parse_from(["story-pipeline", "serve", "service_x"]).is_err());
        let cli = Cli::try_parse_from([
            "story-pipeline",
            "serve",
            "service_c_parallel_hub",
            "--transport",
            "grpc",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.transport, Some(ServeTransport::Grpc));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(Cli::try_parse_from(["story-pipeline", "run", "--iterations", "0"]).is_err());
    }
}
