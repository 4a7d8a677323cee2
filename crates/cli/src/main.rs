//! CLI binary to validate, deploy and diagnose a stack.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use convoy_config::{ConfigDocument, Edition, ValidationResult, validate};
use convoy_diagnostics::{Analyzer, AnalyzerOptions, ComposeLogSource, DiagnosticFinding};
use convoy_probe::HttpProber;
use convoy_sequencer::{
    ComposeStarter, DeploymentReport, RunState, Sequencer, SequencerOptions, StartPolicy,
    TokioSleeper,
};
use convoy_topology::{OrderPolicy, ServicePorts, Topology, TopologyOptions};
use tracing::info;

/// Exit code for a degraded deployment or an unhealthy diagnosis.
const EXIT_DEGRADED: u8 = 1;

/// Exit code for a configuration rejected by validation.
const EXIT_REJECTED: u8 = 2;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration load error
    #[error(transparent)]
    Config(#[from] convoy_config::Error),

    /// Log retrieval error
    #[error(transparent)]
    Diagnostics(#[from] convoy_diagnostics::Error),

    /// Sequencing error
    #[error(transparent)]
    Sequencer(#[from] convoy_sequencer::Error),

    /// JSON rendering error
    #[error("failed to render JSON output")]
    Render(#[from] serde_json::Error),

    /// Topology construction error
    #[error(transparent)]
    Topology(#[from] convoy_topology::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(name = "convoy", version, about = "Deploys an artifact-repository stack")]
struct Cli {
    /// Emit results as JSON instead of tables
    #[arg(long, global = true, env = "CONVOY_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Validate the configuration without starting anything
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Validate, then start the stack and wait for it to become healthy
    Deploy {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        stack: StackArgs,
    },

    /// Diagnose a presumed-running stack
    Diagnose {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        stack: StackArgs,

        /// Log lines to inspect per service
        #[arg(long, default_value_t = 200, env = "CONVOY_TAIL_LINES")]
        tail_lines: u32,
    },

    /// Tear the stack down, removing volumes and orphans
    Down {
        /// Compose file describing the stack
        #[arg(long, default_value = "docker-compose.yaml", env = "CONVOY_COMPOSE_FILE")]
        compose_file: PathBuf,
    },
}

#[derive(Args, Clone, Debug)]
struct ConfigArgs {
    /// Path to the resolved stack configuration
    #[arg(long, default_value = "system.yaml", env = "CONVOY_CONFIG")]
    config: PathBuf,

    /// Edition the configuration is validated against
    #[arg(long, default_value = "oss", env = "CONVOY_EDITION")]
    edition: Edition,
}

#[derive(Args, Clone, Debug)]
struct StackArgs {
    /// Host the services are reachable on
    #[arg(long, default_value = "localhost", env = "CONVOY_HOST")]
    host: String,

    /// Compose file describing the stack
    #[arg(long, default_value = "docker-compose.yaml", env = "CONVOY_COMPOSE_FILE")]
    compose_file: PathBuf,

    /// Access service port
    #[arg(long, default_value_t = 8040, env = "CONVOY_ACCESS_PORT")]
    access_port: u16,

    /// Router service port
    #[arg(long, default_value_t = 8046, env = "CONVOY_ROUTER_PORT")]
    router_port: u16,

    /// Primary server port
    #[arg(long, default_value_t = 8081, env = "CONVOY_SERVER_PORT")]
    server_port: u16,

    /// Database port
    #[arg(long, default_value_t = 5432, env = "CONVOY_POSTGRES_PORT")]
    postgres_port: u16,

    /// Treat the database as externally managed (observe, never start)
    #[arg(long, env = "CONVOY_EXTERNAL_DB")]
    external_db: bool,
}

impl StackArgs {
    fn topology_options(&self) -> TopologyOptions {
        TopologyOptions {
            host: self.host.clone(),
            ports: ServicePorts {
                access: self.access_port,
                router: self.router_port,
                server: self.server_port,
                postgres: self.postgres_port,
            },
            compose_file: self.compose_file.clone(),
            manage_database: !self.external_db,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Error> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { config } => check(&config, cli.json),
        Command::Deploy { config, stack } => deploy(&config, &stack, cli.json).await,
        Command::Diagnose {
            config,
            stack,
            tail_lines,
        } => diagnose(&config, &stack, tail_lines, cli.json).await,
        Command::Down { compose_file } => {
            ComposeStarter::new(compose_file).down().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(args: &ConfigArgs, json: bool) -> Result<ExitCode, Error> {
    let document = ConfigDocument::from_yaml_file(&args.config)?;
    let result = validate(&document, args.edition);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_validation(&result);

        if result.is_valid() {
            println!("configuration is valid for the {} edition", args.edition);
        }
    }

    if result.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_REJECTED))
    }
}

async fn deploy(config: &ConfigArgs, stack: &StackArgs, json: bool) -> Result<ExitCode, Error> {
    let document = ConfigDocument::from_yaml_file(&config.config)?;
    let result = validate(&document, config.edition);

    if !result.is_valid() {
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            render_validation(&result);
        }

        return Ok(ExitCode::from(EXIT_REJECTED));
    }

    if !json {
        render_validation(&result);
    }

    let topology = Topology::from_document(&document, &stack.topology_options())?;
    info!("deploying {} service(s)", topology.services().len());

    let analyzer = Analyzer::new(AnalyzerOptions {
        prober: HttpProber::new(),
        logs: ComposeLogSource::new(stack.compose_file.clone()),
        probe_timeout: StartPolicy::default().probe_timeout(),
        tail_lines: 200,
    });
    let sequencer = Sequencer::new(SequencerOptions {
        prober: HttpProber::new(),
        starter: ComposeStarter::new(stack.compose_file.clone()),
        sleeper: TokioSleeper,
        policy: StartPolicy::default(),
        order_policy: OrderPolicy::default(),
        diagnoser: Some(Box::new(analyzer)),
    });

    let report = sequencer.start_all(&topology).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report);
    }

    Ok(if report.state == RunState::Complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DEGRADED)
    })
}

async fn diagnose(
    config: &ConfigArgs,
    stack: &StackArgs,
    tail_lines: u32,
    json: bool,
) -> Result<ExitCode, Error> {
    let document = ConfigDocument::from_yaml_file(&config.config)?;
    let topology = Topology::from_document(&document, &stack.topology_options())?;

    let analyzer = Analyzer::new(AnalyzerOptions {
        prober: HttpProber::new(),
        logs: ComposeLogSource::new(stack.compose_file.clone()),
        probe_timeout: StartPolicy::default().probe_timeout(),
        tail_lines,
    });

    let findings = analyzer.diagnose(&topology, &[]).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        render_findings(&findings);

        if findings.is_empty() {
            println!("no findings; the stack looks healthy");
        }
    }

    Ok(if findings.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DEGRADED)
    })
}

fn render_validation(result: &ValidationResult) {
    for violation in &result.errors {
        println!("error: {}: {}", violation.key_path, violation.reason);
    }

    for warning in &result.warnings {
        println!("warning: {warning}");
    }
}

fn render_report(report: &DeploymentReport) {
    println!("{:<10} {:<16} {:>8}  last probe", "service", "state", "attempts");

    for service in &report.services {
        let last = service
            .last_outcome
            .as_ref()
            .map_or("-", |outcome| outcome.detail.as_str());

        println!(
            "{:<10} {:<16} {:>8}  {last}",
            service.name,
            service.state.to_string(),
            service.attempts.len()
        );
    }

    println!("run state: {}", report.state);
    render_findings(&report.findings);
}

fn render_findings(findings: &[DiagnosticFinding]) {
    for finding in findings {
        println!("[{}] {}", finding.category, finding.message);
        println!("    suggested action: {}", finding.suggested_action);
    }
}
