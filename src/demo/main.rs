//! Command-line driver for the test-data harness.
//!
//! Imports bulk fixtures, runs searches, and deletes indices against a
//! cluster configured through flags, environment variables, or a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use esdemo::elasticsearch::{
    clear_test_data, import_test_file, refresh_indices, search, BulkOptions, EsClient,
    HitTracking, RefreshPolicy, SearchOptions,
};
use esdemo::{Config, EsConfig, SearchResponse};

const DOC_COUNT_ATTEMPTS: u32 = 10;
const DOC_COUNT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "esdemo")]
#[command(about = "Load, search, and clear Elasticsearch test data")]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct ConnectionArgs {
    /// TOML config file; flags and environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Elasticsearch URL
    #[arg(long, global = true, env = "ELASTICSEARCH_URL")]
    es_url: Option<String>,

    /// Basic auth username
    #[arg(long, global = true, env = "ELASTICSEARCH_USERNAME")]
    username: Option<String>,

    /// Basic auth password
    #[arg(long, global = true, env = "ELASTICSEARCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bulk-import a pre-formatted NDJSON file into an index
    Import {
        #[arg(short, long, default_value = "test")]
        index: String,

        #[arg(short, long, default_value = "testdata/data.bulk.json")]
        file: PathBuf,

        /// Wait for the imported documents to become searchable
        #[arg(long)]
        wait_for_refresh: bool,
    },

    /// Run a search and print the hits
    Search {
        #[arg(short, long)]
        index: Vec<String>,

        /// Query document as JSON; defaults to match_all
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long)]
        size: Option<i64>,
    },

    /// Delete one or more indices
    Clear {
        #[arg(required = true)]
        indices: Vec<String>,
    },

    /// Import, search, and clear in one run
    Demo {
        #[arg(short, long, default_value = "test")]
        index: String,

        #[arg(short, long, default_value = "testdata/data.bulk.json")]
        file: PathBuf,

        /// Keep the index after the run
        #[arg(long)]
        keep: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config(&args.connection)?;

    info!("Connecting to Elasticsearch at {}", config.elasticsearch.url);
    let client =
        EsClient::new(&config.elasticsearch).context("Failed to create Elasticsearch client")?;

    let bulk_options = BulkOptions::from(config.bulk);

    match args.command {
        Command::Import {
            index,
            file,
            wait_for_refresh,
        } => {
            let options = if wait_for_refresh {
                bulk_options.with_refresh(RefreshPolicy::WaitFor)
            } else {
                bulk_options
            };
            let summary = import_test_file(&client, &index, &file, &options)
                .await
                .with_context(|| format!("Failed to import {}", file.display()))?;
            info!(
                "Imported {} documents into [{}] in {}ms",
                summary.indexed, summary.index, summary.took
            );
        }
        Command::Search { index, query, size } => {
            let query: Value = match query {
                Some(raw) => serde_json::from_str(&raw).context("Query is not valid JSON")?,
                None => match_all(),
            };
            let mut options = SearchOptions::new().with_indices(index);
            if let Some(size) = size {
                options = options.with_size(size);
            }
            let resp = search(&client, &query, &options).await.context("Search failed")?;
            print_hits(&resp)?;
        }
        Command::Clear { indices } => {
            clear_test_data(&client, indices.as_slice())
                .await
                .context("Failed to delete indices")?;
        }
        Command::Demo { index, file, keep } => {
            run_demo(&client, &index, &file, bulk_options, keep).await?;
        }
    }

    Ok(())
}

fn load_config(args: &ConnectionArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config {
            elasticsearch: EsConfig::from_env()?,
            ..Default::default()
        },
    };

    if let Some(url) = &args.es_url {
        config.elasticsearch.url = url.clone();
    }
    if args.username.is_some() {
        config.elasticsearch.username = args.username.clone();
    }
    if args.password.is_some() {
        config.elasticsearch.password = args.password.clone();
    }

    Ok(config)
}

fn match_all() -> Value {
    json!({ "query": { "match_all": {} } })
}

fn print_hits(resp: &SearchResponse) -> Result<()> {
    match resp.hits.total {
        Some(total) => info!("Got {} ({}) results in {}ms", total.value, total.relation, resp.took),
        None => info!("Got {} results in {}ms", resp.hits.hits.len(), resp.took),
    }
    for hit in &resp.hits.hits {
        let doc = serde_json::to_string(&hit.source)?;
        info!("doc ID: {}, doc: {}", hit.id, doc);
    }
    if !resp.aggregations.is_empty() {
        info!("aggregations: {}", serde_json::to_string(&resp.aggregations)?);
    }
    Ok(())
}

/// Import the fixture, confirm every document is searchable, then clean up.
async fn run_demo(
    client: &EsClient,
    index: &str,
    file: &Path,
    options: BulkOptions,
    keep: bool,
) -> Result<()> {
    if !client.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }

    let summary = import_test_file(client, index, file, &options)
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;
    refresh_indices(client, &[index]).await?;

    let expected = summary.indexed as u64;
    let counted = wait_for_doc_count(client, index, expected).await?;
    if counted != expected {
        warn!("Indexed {} documents but [{}] holds {}", expected, index, counted);
    }

    let query = match_all();
    let options = SearchOptions::new()
        .with_index(index)
        .with_track_total_hits(HitTracking::Exact)
        .with_request_timeout(Duration::from_secs(30));
    let resp = search(client, &query, &options).await.context("Search failed")?;
    print_hits(&resp)?;

    let found = resp.total_hits().unwrap_or_default();
    if found != expected {
        warn!(
            "Indexed {} documents but search found {}",
            summary.indexed, found
        );
    }

    if keep {
        info!("Keeping index [{}]", index);
        return Ok(());
    }

    clear_test_data(client, &[index])
        .await
        .context("Failed to delete test index")?;

    Ok(())
}

/// Poll the count API until `index` holds `expected` documents or the attempts run out.
async fn wait_for_doc_count(client: &EsClient, index: &str, expected: u64) -> Result<u64> {
    let mut counted = 0;
    for attempt in 1..=DOC_COUNT_ATTEMPTS {
        counted = client
            .doc_count(index)
            .await
            .with_context(|| format!("Failed to count documents in [{}]", index))?;
        if counted == expected {
            info!("[{}] holds {} documents after {} checks", index, counted, attempt);
            break;
        }
        if attempt < DOC_COUNT_ATTEMPTS {
            tokio::time::sleep(DOC_COUNT_INTERVAL).await;
        }
    }
    Ok(counted)
}
