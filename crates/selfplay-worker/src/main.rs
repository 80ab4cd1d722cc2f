//! Selfplay Worker - Main entry point

use clap::Parser;
use selfplay_common::logging::{init_logging, LogConfig, LogOutput};
use selfplay_worker::{Cli, Worker, WorkerConfig};
use std::process;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .verbose(cli.verbose)
        .output(LogOutput::Console)
        .log_file_prefix("selfplay-worker")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().with_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring invalid logging environment: {}", e);
            log_config
        },
    };

    // The worker runs fine without logging
    let _ = init_logging(&log_config);

    let config = match WorkerConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        },
    };

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let result = match Worker::new(config, cancel) {
        Ok(mut worker) => worker.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!(error = %e, "Worker failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Cancel the worker on Ctrl+C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, finishing up"),
        _ = terminate => info!("Received terminate signal, finishing up"),
    }

    cancel.cancel();
}
