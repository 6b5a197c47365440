use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` selects the level, defaulting to "warn". `verbose` forces
/// "debug".
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = if verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!(verbose, "logging initialized");
    Ok(())
}
