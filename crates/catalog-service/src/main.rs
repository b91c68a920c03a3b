//! Process entrypoint. Loads layered configuration, wires the
//! stores/bus/coordinator together once, and runs until a shutdown signal
//! arrives. Exposes no transport of its own — HTTP/RPC endpoints live
//! outside this process.

mod config;
mod logging;
mod wiring;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let settings = config::settings();
    tracing::info!(app_env = config::app_env().as_str(), "loaded configuration");

    let runtime = wiring::build(settings);

    runtime
        .consumer
        .start(vec![
            settings.kafka.resources_topic.clone(),
            settings.kafka.relationships_topic.clone(),
        ])
        .await;
    tracing::info!("event consumer started");

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("failed to listen for CTRL-C");
        tracing::info!("received shutdown signal");
        ctrl_c_token.cancel();
    });

    shutdown.cancelled().await;

    runtime.consumer.stop().await;
    // Give in-flight handlers a moment to finish or time out on their own
    // cancellation token before the process exits.
    tokio::time::sleep(Duration::from_millis(50)).await;

    tracing::info!("catalog-service shut down cleanly");
    Ok(())
}
