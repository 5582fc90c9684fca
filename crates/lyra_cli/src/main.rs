use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use lyra_core::dataset::Dataset;
use lyra_core::dump::{RawBuildRecord, RawCollectionRecord};
use lyra_core::{assemble::assemble, normalize::normalize_record};
use lyra_fs::FsStore;
use lyra_server::{LyraServer, LyraServerConfig};

/// Public base URL under which the monolith tree is directly reachable.
const TOP_URL: &str = "https://datasets.datalad.org/shub";

/// Browse UI, the target of root and collection redirects.
const GOTO_URL: &str = "https://datasets.datalad.org/?dir=/shub";

#[derive(Parser)]
#[command(name = "lyra")]
#[command(about = "Lookup and redirect service for archived container images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the served dataset from a database dump and the monolith tree
    ProcessDump {
        /// Directory holding main.container.json and main.collection.json
        dump_path: PathBuf,

        /// Root of the content-addressed artifact tree
        monolith_path: PathBuf,

        /// Where to write the dataset JSON
        output_json: PathBuf,

        /// Public base URL substituted for the monolith root
        #[arg(long, default_value = TOP_URL)]
        top_url: String,
    },
    /// Serve a previously built dataset
    Serve {
        dataset_json: PathBuf,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 5003)]
        port: u16,

        /// Browse UI the root and collection redirects point at
        #[arg(long, default_value = GOTO_URL)]
        goto_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ProcessDump {
            dump_path,
            monolith_path,
            output_json,
            top_url,
        } => process_dump(&dump_path, &monolith_path, &output_json, &top_url),
        Commands::Serve {
            dataset_json,
            host,
            port,
            goto_url,
        } => serve(&dataset_json, &host, port, goto_url).await,
    }
}

/// Runs the offline pipeline: normalize every dump row, build the indices,
/// write the dataset. Any invariant violation aborts the whole run.
fn process_dump(
    dump_path: &Path,
    monolith_path: &Path,
    output_json: &Path,
    top_url: &str,
) -> anyhow::Result<()> {
    let containers: Vec<RawBuildRecord> = read_json(&dump_path.join("main.container.json"))
        .context("cannot read container dump")?;
    let collections: Vec<RawCollectionRecord> = read_json(&dump_path.join("main.collection.json"))
        .context("cannot read collection dump")?;
    let store = FsStore::new(monolith_path);

    let bar = ProgressBar::new(containers.len() as u64);
    let mut normalized = Vec::new();
    for raw in &containers {
        if let Some(record) = normalize_record(raw, &store)? {
            normalized.push(record);
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    tracing::info!(
        rows = containers.len(),
        kept = normalized.len(),
        "normalized dump records"
    );

    let dataset = assemble(normalized, &collections, &store, top_url)?;

    let file = File::create(output_json)
        .with_context(|| format!("cannot create {}", output_json.display()))?;
    dataset.write_to(file)?;
    tracing::info!(
        images = dataset.images.len(),
        collections = dataset.collections.len(),
        output = %output_json.display(),
        "dataset written"
    );
    Ok(())
}

/// Loads and validates the dataset, then serves it. The load completes,
/// invariant checks included, before the listener accepts anything.
async fn serve(dataset_json: &Path, host: &str, port: u16, goto_url: String) -> anyhow::Result<()> {
    tracing::info!(path = %dataset_json.display(), "loading dataset");
    let dataset = Dataset::load(dataset_json)
        .with_context(|| format!("cannot load dataset from {}", dataset_json.display()))?;
    tracing::info!(
        images = dataset.images.len(),
        collections = dataset.collections.len(),
        "dataset ready"
    );

    let app = LyraServer::new(LyraServerConfig { goto_url }).build(Arc::new(dataset));

    let addr = format!("{host}:{port}");
    tracing::info!(%addr, "starting backend");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
