use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LogFormat};

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level. Logs go to stderr so stdout carries only command output.
pub fn init(config: &CliConfig) -> eyre::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            eyre::eyre!("invalid log level/filter '{}': {e}", config.log_level)
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let installed = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.with_target(false).try_init(),
    };
    installed.map_err(|e| eyre::eyre!("failed to install tracing subscriber: {e}"))
}
