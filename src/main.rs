/// Trade feed client - entry point
///
/// Streams all records, recovers gaps one connection at a time and writes the
/// ordered result to JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trade_feed_client::config::ClientConfig;
use trade_feed_client::output::write_json;
use trade_feed_client::{ClientError, RecoveryOrchestrator, RunOutcome, TcpSession};

const EXIT_FAILURE: u8 = 1;
const EXIT_INITIAL_STREAM: u8 = 2;
const EXIT_PARTIAL: u8 = 3;

/// Trade feed snapshot and gap recovery client
#[derive(Parser, Debug)]
#[command(name = "trade-feed-client")]
#[command(version)]
#[command(about = "Collects the full trade feed and recovers missing sequences", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "TRADE_FEED_CONFIG")]
    config: Option<PathBuf>,

    /// Exchange host
    #[arg(long, env = "TRADE_FEED_HOST")]
    host: Option<String>,

    /// Exchange port
    #[arg(short, long, env = "TRADE_FEED_PORT")]
    port: Option<u16>,

    /// Output JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Connect timeout in milliseconds (0 disables)
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Read idle timeout in milliseconds (0 disables)
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout_ms = ms;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let config = args.resolve_config()?;
    let session = TcpSession::new(&config);
    tracing::info!(addr = %session.addr(), output = %config.output.display(), "starting");

    let mut orchestrator = RecoveryOrchestrator::new(session);
    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(ClientError::InitialStream(e)) => {
            tracing::error!("initial stream failed: {e}");
            return Ok(ExitCode::from(EXIT_INITIAL_STREAM));
        }
        Err(e) => return Err(e.into()),
    };
    orchestrator.stats().log_summary();

    write_json(&config.output, &report.records).context("write output")?;

    match report.outcome() {
        RunOutcome::Complete => Ok(ExitCode::SUCCESS),
        RunOutcome::Partial => {
            tracing::warn!(unrecovered = ?report.unrecovered, "finished with gaps");
            Ok(ExitCode::from(EXIT_PARTIAL))
        }
    }
}
