// PROBCALC - Core Service
// Keyword based probability lookup over HTTP

mod config;
mod http;
mod resolver;
mod types;

use std::sync::Arc;

use log::{error, info};
use tokio::sync::oneshot;

use crate::config::CoreConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run_console() {
        error!("{}", error);
        std::process::exit(1);
    }
}

fn run_console() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = shutdown_tx.send(());
                }
                Err(error) => error!("failed to listen for shutdown: {}", error),
            }
        });

        run_until_shutdown(shutdown_rx).await
    })
}

pub async fn run_until_shutdown(
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(CoreConfig::from_env());
    info!("starting probability service on {}", config.api_addr);

    crate::http::serve(config, wait_for_shutdown(shutdown_rx)).await
}

/// Resolves once a shutdown is signalled. A dropped sender means no signal
/// source exists, so the server keeps running until the process is killed.
async fn wait_for_shutdown(shutdown_rx: oneshot::Receiver<()>) {
    if shutdown_rx.await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutting down gracefully");
}
