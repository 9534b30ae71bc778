use tracing::*;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

pub struct LoggerConfig {
    whoami: String,
}

impl LoggerConfig {
    pub fn new(whoami: String) -> Self {
        Self { whoami }
    }
}

/// Initializes the logging subsystem with the provided config.
pub fn init(config: LoggerConfig) {
    let filt = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filt)
        .finish()
        .init();

    info!(whoami = %config.whoami, "logging started");
}

/// Shuts down the logging subsystem.
pub fn finalize() {
    info!("shutting down logging");
}
