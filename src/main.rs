//! Myopia Risk: questionnaire-driven myopia risk estimation.
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use myopia_risk::tui::App;
use myopia_risk::Config;

fn main() -> Result<()> {
    // Writing logs to the terminal would corrupt the TUI (alternate screen).
    // - interactive TTY: log to a file
    // - non-interactive: log to stdout
    let log_mode = std::env::var("MYOPIA_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let interactive = std::io::stdout().is_terminal();
    let use_file = match log_mode.as_str() {
        "file" => true,
        "stdout" => false,
        // auto
        _ => interactive,
    };

    let (writer, _guard) = if use_file {
        let log_file =
            std::env::var("MYOPIA_LOG_FILE").unwrap_or_else(|_| "myopia-risk.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: a missing log directory must not block startup.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Starting myopia-risk (models: {:?}, output: {:?}, cache: {})",
        config.model_dir,
        config.output_mode,
        config.cache_models
    );

    let mut app = App::new(&config);
    app.run()?;

    tracing::info!("myopia-risk shutdown complete.");
    Ok(())
}
