use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use swift_blobstore::{
    application::{
        metrics::BlobStoreMetricsStoreSupport,
        ports::{BlobStoreQuotaService, ObjectStorage},
        scheduler::PeriodicJobService,
        SpaceUsedQuota,
    },
    infrastructure::{
        InMemoryObjectStorage, SwiftBlobAttributes, SwiftBlobStoreMetricsStore, SwiftClient,
    },
    value_objects::BlobId,
    Config,
};

#[derive(Parser)]
#[command(name = "swift-blobstore")]
#[command(about = "Blob attribute and metrics stores on OpenStack Swift", long_about = None)]
struct Cli {
    /// TOML config file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, default_value = "swift", global = true)]
    backend: Backend,

    /// Override the configured container
    #[arg(long, global = true)]
    container: Option<String>,

    /// Override the configured node id
    #[arg(long, global = true)]
    node_id: Option<String>,

    /// Blob store name used in logs and quota reports
    #[arg(long, default_value = "default", global = true)]
    blob_store: String,

    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep this node's metrics flushed until interrupted
    Serve,
    /// Print the blob store's metrics summed across nodes
    Metrics,
    /// Print a blob's attributes
    Attributes {
        blob_id: String,
    },
    /// Soft-delete a blob by marking its attributes
    SoftDelete {
        blob_id: String,
        #[arg(short, long, default_value = "No reason supplied")]
        reason: String,
    },
    /// Delete every node's metrics object
    RemoveMetrics,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    Swift,
    /// Process-local storage, for dry runs
    Memory,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env()?,
    };

    if let Some(container) = &cli.container {
        config.container = container.clone();
    }
    if let Some(node_id) = &cli.node_id {
        config.node_id = node_id.clone();
    }

    config.validate()?;
    Ok(config)
}

fn storage_for(backend: Backend, config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    Ok(match backend {
        Backend::Swift => Arc::new(
            SwiftClient::new(config.credentials(), config.request_timeout())
                .context("Failed to create Swift client")?,
        ),
        Backend::Memory => Arc::new(InMemoryObjectStorage::with_container(config.container.clone())),
    })
}

fn metrics_store(
    cli: &Cli,
    config: &Config,
    storage: Arc<dyn ObjectStorage>,
) -> Result<Arc<BlobStoreMetricsStoreSupport<SwiftBlobStoreMetricsStore>>> {
    let backend = SwiftBlobStoreMetricsStore::builder()
        .node_id(config.node_id()?)?
        .container(config.container.clone())?
        .storage(storage)?
        .build()?;

    let mut support = BlobStoreMetricsStoreSupport::new(
        cli.blob_store.clone(),
        backend,
        PeriodicJobService::new(),
        config.metrics_settings(),
    );
    if let Some(limit) = config.quota_limit_bytes {
        let quota: Arc<dyn BlobStoreQuotaService> = Arc::new(SpaceUsedQuota::new(limit));
        support = support.with_quota_service(quota);
    }
    Ok(Arc::new(support))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = load_config(&cli)?;
    info!(
        "Using container {} as node {} ({:?} backend)",
        config.container, config.node_id, cli.backend
    );
    let storage = storage_for(cli.backend, &config)?;

    match &cli.command {
        Commands::Serve => {
            storage.ensure_container(&config.container).await?;
            let store = metrics_store(&cli, &config, storage)?;
            store.start().await?;
            info!("Metrics store started, press Ctrl-C to stop");

            tokio::signal::ctrl_c().await?;
            info!("Shutting down, flushing metrics");
            store.stop().await?;
        }
        Commands::Metrics => {
            let store = metrics_store(&cli, &config, storage)?;
            let metrics = store.metrics().await?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Attributes { blob_id } => {
            let blob_id = BlobId::from_string(blob_id.clone())?;
            let mut attributes = SwiftBlobAttributes::for_blob(storage, config.container.clone(), &blob_id);
            if !attributes.load().await? {
                bail!("No attributes found for blob {}", blob_id);
            }
            println!("{}", serde_json::to_string_pretty(&attributes.attributes())?);
        }
        Commands::SoftDelete { blob_id, reason } => {
            let blob_id = BlobId::from_string(blob_id.clone())?;
            let mut attributes = SwiftBlobAttributes::for_blob(storage, config.container.clone(), &blob_id);
            if !attributes.load().await? {
                bail!("No attributes found for blob {}", blob_id);
            }
            attributes.mark_deleted(reason.clone())?;
            attributes.store().await?;
            info!("Blob {} soft-deleted: {}", blob_id, reason);
        }
        Commands::RemoveMetrics => {
            let store = metrics_store(&cli, &config, storage)?;
            store.remove().await?;
            info!("Removed metrics for blob store {}", cli.blob_store);
        }
    }

    Ok(())
}
