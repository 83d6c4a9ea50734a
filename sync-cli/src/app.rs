//! Wiring between configuration, providers and the sync core.

use anyhow::{Context, Result};
use bridge_desktop::TokioFileSystem;
use bridge_traits::{BridgeError, DestinationCatalog, FileSystemAccess, SourceCatalog};
use core_runtime::config::{SyncConfig, DEFAULT_CONFIG_FILE};
use core_runtime::logging::init_logging;
use core_sync::{
    CatalogView, MediaFilter, Reconciler, RetryPolicy, StagingArea, SyncError, SyncReport,
    TransferPipeline,
};
use provider_local::{LocalAlbumStore, LocalSourceCatalog};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cli::{Cli, Command, ListArgs, SyncArgs};

/// Exit status for configuration problems
pub const EXIT_CONFIG: u8 = 2;
/// Exit status for every other failure
pub const EXIT_FAILURE: u8 = 1;

/// Parse-independent entry point used by `main`.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = load_config(&cli)?;

    init_logging(config.logging.clone()).context("failed to initialise logging")?;
    info!(config = ?config, "Configuration loaded");

    match cli.command {
        Command::List(args) => {
            let view = build_view(&config)?;
            list(&view, &args, out).await
        }
        Command::Sync(args) => {
            let dry_run = args.dry_run || config.dry_run;
            let reconciler = build_reconciler(&config).await?.with_dry_run(dry_run);
            sync(&reconciler, &args, out).await.map(|_| ())
        }
    }
}

/// Load the configuration file and apply command-line overrides
pub fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = SyncConfig::load(&path)?;
    if let Some(level) = cli.log_level {
        config.logging = config.logging.with_level(level);
    }
    if let Some(format) = cli.log_format {
        config.logging = config.logging.with_format(format);
    }
    Ok(config)
}

/// Build a listing-only view over the local providers.
///
/// Nothing is created on disk: a destination that was never synced lists as
/// empty.
pub fn build_view(config: &SyncConfig) -> Result<CatalogView> {
    config.validate()?;

    let source: Arc<dyn SourceCatalog> = Arc::new(LocalSourceCatalog::new(&config.source_root));
    let destination: Arc<dyn DestinationCatalog> = Arc::new(LocalAlbumStore::new(
        &config.destination_root,
        config.destination_quota_bytes,
    ));

    Ok(CatalogView::new(
        source,
        destination,
        MediaFilter::from_settings(&config.media),
    ))
}

/// Build a reconciler over the local providers described by `config`.
pub async fn build_reconciler(config: &SyncConfig) -> Result<Reconciler> {
    config.validate()?;

    let source: Arc<dyn SourceCatalog> = Arc::new(LocalSourceCatalog::new(&config.source_root));
    let store = LocalAlbumStore::open(&config.destination_root, config.destination_quota_bytes)
        .await
        .map_err(|e| SyncError::from(BridgeError::from(e)))
        .with_context(|| {
            format!(
                "failed to open album store at {}",
                config.destination_root.display()
            )
        })?;
    let destination: Arc<dyn DestinationCatalog> = Arc::new(store);

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    let staging = StagingArea::open(fs, config.staging_dir.clone(), &config.identity)
        .await
        .context("failed to prepare staging area")?;

    let retry = RetryPolicy::from_settings(&config.retry)?;
    let filter = MediaFilter::from_settings(&config.media);
    let pipeline = TransferPipeline::new(
        Arc::clone(&source),
        Arc::clone(&destination),
        staging,
        retry,
    );

    Ok(Reconciler::new(source, destination, pipeline, filter))
}

/// Print the name sets selected by `args`
pub async fn list(view: &CatalogView, args: &ListArgs, out: &mut impl Write) -> Result<()> {
    let (source, destination) = args.targets();

    if let Some(path) = source {
        let names = view.list_source(path).await?;
        let label = if path.is_empty() { "/" } else { path };
        writeln!(out, "source {}:", label)?;
        for name in names {
            writeln!(out, "  {}", name)?;
        }
    }

    if let Some(collection) = destination {
        let names = view.list_destination(collection).await?;
        match collection {
            Some(name) => writeln!(out, "destination {}:", name)?,
            None => writeln!(out, "destination collections:")?,
        }
        for name in names {
            writeln!(out, "  {}", name)?;
        }
    }

    Ok(())
}

/// Run a pass and print its report
pub async fn sync(
    reconciler: &Reconciler,
    args: &SyncArgs,
    out: &mut impl Write,
) -> Result<SyncReport> {
    let report = match &args.collection {
        Some(name) => reconciler.reconcile_collection(name).await?,
        None => reconciler.reconcile_root().await?,
    };

    writeln!(out, "{}", report)?;
    Ok(report)
}

/// Map a failure onto the process exit status
pub fn exit_code(error: &anyhow::Error) -> u8 {
    let is_config = error.chain().any(|cause| {
        cause.downcast_ref::<core_runtime::Error>().is_some()
            || matches!(
                cause.downcast_ref::<SyncError>(),
                Some(SyncError::Configuration(_))
            )
    });

    if is_config {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}
