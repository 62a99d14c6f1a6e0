//! reelqueue CLI entrypoint

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelqueue::cli::Cli;
use reelqueue::config::{paths, Config};

/// Rotated log files kept on disk
const MAX_LOG_FILES: usize = 5;

#[tokio::main]
async fn main() {
    // Usage errors exit 1, help/version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config = Config::load(cli.config.as_deref());
    let guard = init_tracing(config.as_ref().ok().map(|c| c.log_dir.as_path()));

    let result = cli.execute(config).await;
    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }

    // Flush the file writer before exiting
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
}

/// Console logging plus a daily-rotated file in `log_dir` when it is usable
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let file_writer = log_dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        Builder::new()
            .rotation(Rotation::DAILY)
            .filename_prefix(paths::LOG_FILE_PREFIX)
            .filename_suffix("log")
            .max_log_files(MAX_LOG_FILES)
            .build(dir)
            .ok()
    });

    let (file_layer, guard) = match file_writer {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}
