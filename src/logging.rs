use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR: &str = "./logs";
pub const LOG_FILE: &str = "nse-oc-signals.log";

/// Console plus daily-rotated JSON file under ./logs.
/// Keep the returned guard alive for the life of the process.
pub fn init_logging() -> Result<WorkerGuard> {
    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(LOG_DIR).context("Failed to create logs directory")?;

    // File appender with daily rotation, written from a background thread
    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            // Console output
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .with(
            // File output with JSON formatting
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_ansi(false)
                .json(),
        )
        .with(
            // Environment filter (set via RUST_LOG env var)
            // Default to info level if not set
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // Errors on a second call instead of panicking
        .try_init()
        .context("Logging already initialised")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_logging() {
        let _guard = init_logging().unwrap();

        info!("This is an info message");
        warn!("This is a warning message");

        // Check the logs directory exists and a second init is refused
        assert!(std::path::Path::new(LOG_DIR).exists());
        assert!(init_logging().is_err());
    }
}
