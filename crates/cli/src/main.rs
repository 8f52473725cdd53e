mod metrics;
mod presenter;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convertino_core::{
    load_config, load_config_or_default, validate_config, ConversionBackend,
    ConversionOrchestrator, FileDownloader, HttpBackend, LogPresenter, OrchestratorStatus,
    Presenter, SelectedFile, SelectionStore, SideEffectDispatcher,
};

use presenter::TerminalPresenter;

/// Config file used when none is given
const DEFAULT_CONFIG: &str = "config.toml";

/// Convert media files with a remote conversion service.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./config.toml if present)
    #[arg(short, long, env = "CONVERTINO_CONFIG")]
    config: Option<PathBuf>,
    /// Output format; defaults to the first format offered for the selection
    #[arg(short, long)]
    format: Option<String>,
    /// Quality level sent to the backend
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,
    /// Directory finished artifacts are downloaded into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    no_download: bool,
    #[arg(long)]
    no_preview: bool,
    /// Report progress through the log only
    #[arg(long)]
    quiet: bool,
    /// Print Prometheus metrics before exiting
    #[arg(long)]
    print_metrics: bool,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    match run(Cli::parse()).await {
        Ok(status) if status.failed == 0 && status.all_finished() => {}
        Ok(_) => std::process::exit(2),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<OrchestratorStatus> {
    // Initialize logging; stdout belongs to the presenter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_or_default(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG))?,
    };

    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }
    if cli.no_download {
        config.output.auto_download = false;
    }
    if cli.no_preview {
        config.output.show_previews = false;
    }

    validate_config(&config).context("Configuration validation failed")?;
    info!("Backend: {}", config.backend.url);

    // Build the selection
    let store = SelectionStore::new();
    let files = cli
        .files
        .iter()
        .map(|path| SelectedFile::from_path(path).with_context(|| format!("Cannot select {:?}", path)))
        .collect::<Result<Vec<_>>>()?;
    let selection = store.add(files);

    let choices = store.format_choices();
    let format = match cli.format {
        Some(format) => format.trim().to_lowercase(),
        None => choices
            .default_format()
            .map(str::to_string)
            .context("No output format available for the selection")?,
    };
    if !choices.contains(&format) {
        bail!(
            "'{}' is not offered for this selection (choose from: {})",
            format,
            choices.formats().join(", ")
        );
    }
    let quality = cli.quality.unwrap_or(config.default_quality);

    // Wire the orchestrator
    let backend: Arc<dyn ConversionBackend> =
        Arc::new(HttpBackend::new(&config.backend).context("Failed to create backend client")?);

    let presenter: Arc<dyn Presenter> = if cli.quiet {
        Arc::new(LogPresenter)
    } else {
        Arc::new(TerminalPresenter::new())
    };

    let mut effects = SideEffectDispatcher::new(Arc::clone(&backend), Arc::clone(&presenter))
        .with_previews(config.output.show_previews);
    let downloader = if config.output.auto_download {
        info!("Downloading into {:?}", config.output.dir);
        let downloader = Arc::new(FileDownloader::new(
            Arc::clone(&backend),
            config.output.dir.clone(),
        ));
        effects = effects.with_downloader(downloader.clone());
        Some(downloader)
    } else {
        None
    };

    let orchestrator = ConversionOrchestrator::new(
        config.poller.clone(),
        backend,
        Arc::new(effects),
        presenter,
    );

    orchestrator
        .submit(&selection, &format, quality)
        .await
        .context("Submission failed")?;

    let status = tokio::select! {
        status = orchestrator.wait_all() => status,
        _ = shutdown_signal() => {
            warn!("Interrupted, abandoning running tasks");
            orchestrator.abandon().await;
            orchestrator.status().await
        }
    };

    if let Some(downloader) = downloader {
        downloader.drain().await;
    }

    info!(
        "{} task(s): {} succeeded, {} failed, {} unfinished",
        status.total, status.succeeded, status.failed, status.running
    );

    if cli.print_metrics {
        print!("{}", metrics::encode_metrics());
    }

    Ok(status)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
