use color_eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. With the `bunyan` feature, a JSON
/// log is also written to `.logs/`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the log directory
/// cannot be created.
pub fn setup_logger(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false));

    #[cfg(feature = "bunyan")]
    {
        use std::{fs::create_dir_all, path::PathBuf};
        use tracing_appender::rolling;
        use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};

        let log_dir_path = PathBuf::from(".logs");
        create_dir_all(&log_dir_path)?;

        let logfile = if cfg!(debug_assertions) {
            rolling::daily(log_dir_path, "x-relay.log")
        } else {
            rolling::never(log_dir_path, "x-relay.log")
        };

        registry
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new("x-relay".into(), logfile))
            .try_init()?;
    }

    #[cfg(not(feature = "bunyan"))]
    registry.try_init()?;

    Ok(())
}
