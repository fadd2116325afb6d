use std::process::ExitCode;

use sequential_producer::config::ProducerConfig;
use sequential_producer::{rabbitmq, shutdown};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ProducerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let (handle, signal) = shutdown::shutdown_channel();
    shutdown::listen_for_interrupt(handle);

    match rabbitmq::run(&config, signal).await {
        Ok(report) => {
            info!(
                "published {} message(s): {} acked, {} nacked",
                report.published, report.acked, report.nacked
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
