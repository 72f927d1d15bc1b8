use std::{env, process::ExitCode};

use checkpointz_beacon::FinalityProvider;
use checkpointz_rpc::start_server;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.global.log_level);

    if let Err(err) = run(config).await {
        error!(error = format!("{err:#}"), "Fatal error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_tracing(log_level: &str) {
    // RUST_LOG wins over the configured level when set.
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy(log_level),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let listen_addr = config.listen_addr()?;
    let metrics_addr = config.metrics_addr()?;

    prometheus_exporter::start(metrics_addr)?;
    info!(address = %metrics_addr, "Serving metrics");

    let provider = FinalityProvider::new(config.checkpointz, config.beacon.upstreams)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    provider.start(shutdown_rx.clone());

    let server = tokio::spawn(start_server(listen_addr, provider, shutdown_rx));

    wait_for_signal().await?;

    info!("Shutting down");

    let _ = shutdown_tx.send(true);
    server.await??;

    Ok(())
}

async fn wait_for_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
