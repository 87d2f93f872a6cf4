use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;

use cli::{Args, Mode};
use config::StoreshiftConfig;

/// Initialize tracing with two outputs:
/// 1. Console output (stderr) - progress of the running command
/// 2. File output (~/.storeshift/storeshift.log) - full history across runs
///
/// File logging stops when the returned guard is dropped.
fn initialize_tracing() -> Result<WorkerGuard> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         storeshift_orchestrations=debug,\
         storeshift=debug"
            .into()
    });

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let storeshift_dir = PathBuf::from(home).join(".storeshift");
    std::fs::create_dir_all(&storeshift_dir).ok();

    let file_appender = tracing_appender::rolling::never(&storeshift_dir, "storeshift.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::load_from(None, std::env::args_os()).unwrap_or_else(|e| e.exit());

    // Flow diagrams need neither logging nor AWS
    if let Mode::Flow { name } = &args.mode {
        return commands::flow::run(name.as_deref());
    }

    let _guard = initialize_tracing()?;
    let config = StoreshiftConfig::load()?;

    match args.mode {
        Mode::Setup(setup) => commands::setup::run(&config, setup).await,
        Mode::Upgrade(upgrade) => commands::upgrade::run(&config, upgrade).await,
        Mode::ExportVars(export) => commands::export::run(&config, export).await,
        Mode::Flow { .. } => Ok(()),
    }
}
