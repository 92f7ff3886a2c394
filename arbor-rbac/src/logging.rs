//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::config::RbacConfig;

/// Initialize console tracing from a filter directive.
///
/// Falls back to `RUST_LOG`, then to `info`. Installing twice is not an error.
pub fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }
}

/// Initialize tracing with the level from configuration
pub fn init_tracing_from_config(config: &RbacConfig) {
    init_tracing(&config.log_level);
}
