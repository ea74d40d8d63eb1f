//! # Wallet Mediator
//!
//! Serves the mediator over JSON lines.
//!
//! Every stdin line is one request (`{id?, method, params, networkName?,
//! _inpage?, _origin?, _popup?}`); every stdout line is either a response
//! envelope or a site push (`{"origin", "event", "params"}`). Requests run
//! concurrently, so a call parked on consent never blocks the popup call
//! that resolves it.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then environment)
//! 2. Initialize telemetry
//! 3. Bootstrap builtin networks and register methods
//! 4. Serve until stdin closes or ctrl-c

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shared_bus::{EventFilter, EventTopic, WalletEvent};
use shared_types::RpcResponse;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{error, info, warn, Instrument};

use mediator_runtime::{parse_request, Mediator, MediatorConfig};
use wm_telemetry::{component_span, init_telemetry, log_event, TelemetryConfig};

/// How long shutdown waits for queued output.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(author, version, about = "Wallet request mediator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON lines on stdin/stdout
    Serve {
        /// TOML config file (falls back to WM_CONFIG, then defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the log filter
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Print the default configuration as TOML
    GenerateConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config, log_level } => serve(config, log_level).await,
        Commands::GenerateConfig { path } => generate_config(path),
    }
}

fn generate_config(path: Option<PathBuf>) -> Result<()> {
    let encoded = MediatorConfig::default()
        .to_toml()
        .context("Failed to encode default config")?;
    match path {
        Some(path) => std::fs::write(&path, encoded)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{encoded}"),
    }
    Ok(())
}

async fn serve(config_path: Option<PathBuf>, log_level: Option<String>) -> Result<()> {
    let config =
        MediatorConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let mut telemetry = config.telemetry.apply(TelemetryConfig::from_env());
    if let Some(level) = log_level {
        telemetry = telemetry.with_log_level(level);
    }
    let _guard = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let mediator = Mediator::start(config).await?;
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(write_lines(out_rx));
    let pushes = tokio::spawn(forward_site_events(mediator.clone(), out_tx.clone()));

    log_event!(info, "runtime", "Serving JSON lines on stdin/stdout");
    tokio::select! {
        result = read_requests(mediator, out_tx) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    pushes.abort();
    match tokio::time::timeout(DRAIN_TIMEOUT, writer).await {
        Ok(Err(e)) => error!(error = %e, "Output writer failed"),
        Err(_) => warn!("Output not drained, parked calls still open"),
        Ok(Ok(())) => {}
    }
    info!("Wallet mediator stopped");
    Ok(())
}

/// One task per request; responses are written as they complete.
async fn read_requests(mediator: Mediator, out: mpsc::UnboundedSender<String>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = Vec::new();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let out = out.clone();
        match parse_request(&line) {
            Ok(request) => {
                let id = request.id.clone();
                let span = component_span!(
                    "request",
                    component = "runtime",
                    method = %request.method,
                    origin = request.origin.as_deref().unwrap_or("popup")
                );
                let call = mediator.dispatch(request);
                in_flight.push(tokio::spawn(
                    async move {
                        let response = RpcResponse::from_result(id, call.await);
                        send(&out, &response);
                    }
                    .instrument(span),
                ));
            }
            Err(err) => send(&out, &RpcResponse::failure(None, &err)),
        }
    }

    log_event!(info, "runtime", "stdin closed, draining requests", pending = in_flight.len());
    for task in in_flight {
        if let Err(e) = task.await {
            log_event!(warn, "runtime", "Request task failed", error = %e);
        }
    }
    Ok(())
}

async fn forward_site_events(mediator: Mediator, out: mpsc::UnboundedSender<String>) {
    let mut events = mediator
        .subscribe(EventFilter::topics(vec![EventTopic::Site]))
        .into_stream();
    while let Some(event) = events.next().await {
        if let WalletEvent::SiteEvent {
            origin,
            event,
            params,
        } = event
        {
            let push = json!({"origin": origin, "event": event, "params": params});
            if out.send(push.to_string()).is_err() {
                break;
            }
        }
    }
}

fn send(out: &mpsc::UnboundedSender<String>, response: &RpcResponse) {
    match serde_json::to_string(response) {
        Ok(line) => {
            if out.send(line).is_err() {
                warn!("Output closed, dropping response");
            }
        }
        Err(e) => error!(error = %e, "Failed to encode response"),
    }
}

async fn write_lines(mut rx: mpsc::UnboundedReceiver<String>) {
    let mut stdout = tokio::io::stdout();
    while let Some(line) = rx.recv().await {
        let written = async {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await
        }
        .await;
        if let Err(e) = written {
            error!(error = %e, "Failed to write stdout");
            break;
        }
    }
}
