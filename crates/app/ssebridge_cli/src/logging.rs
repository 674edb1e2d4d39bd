use tracing_subscriber::EnvFilter;

use crate::Error;

/// Install the tracing subscriber.
///
/// Logs go to stderr; stdout carries only the JSON result. `RUST_LOG`
/// overrides the default filter and is rejected when it does not parse.
pub fn init(verbose: bool) -> Result<(), Error> {
    let default_filter = if verbose {
        "info,ssebridge_core=debug"
    } else {
        "warn"
    };
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_filter)?,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::Custom(format!("failed to initialise logging: {e}")))?;

    Ok(())
}
