//! pubmeta - Scholar profile collection and dataset reconciliation
//!
//! ## Usage
//!
//! ```bash
//! pubmeta collect "Jane Doe"
//! pubmeta filter-incomplete --input meta.json --output meta_empty.json
//! pubmeta merge --corrections meta_updated.json --target meta.json --output meta2.json
//! pubmeta normalize-authors --file meta_paper.json
//! pubmeta resolve-links --input meta_paper.json --output meta_paper2.json
//! pubmeta validate-links --input meta_paper2.json --output meta_paper3.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pubmeta::{
    arxiv::ArxivClient,
    collector::{default_snapshot_path, CachePolicy, Collector},
    config::PipelineConfig,
    cookies::CookieManager,
    export,
    gscholar::ScholarClient,
    links::{validate_links, LinkResolver},
    reconcile::{filter_incomplete, merge_keywords, AuthorNormalizer},
    store::{load_dataset, save_dataset},
    throttle::Throttle,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Collect and reconcile a researcher's publication metadata
#[derive(Parser)]
#[command(name = "pubmeta")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every publication of a Google Scholar profile
    Collect {
        /// Author name to search for
        subject: String,

        /// Snapshot file (default: meta_<subject>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore an existing snapshot and fetch again
        #[arg(long)]
        refresh: bool,

        /// Delay between detail fetches in milliseconds
        #[arg(long, default_value = "400")]
        delay_ms: u64,

        /// Records between snapshot writes
        #[arg(long, default_value = "5")]
        checkpoint_every: usize,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Proxy URL (e.g., http://127.0.0.1:7890)
        #[arg(long, env = "PUBMETA_PROXY")]
        proxy: Option<String>,

        /// Google Scholar mirror site URL
        #[arg(long, env = "PUBMETA_MIRROR")]
        mirror: Option<String>,
    },

    /// Extract records with empty keywords into a side file
    FilterIncomplete {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Copy keywords from a corrections file onto matching titles of a target
    Merge {
        #[arg(long)]
        corrections: PathBuf,
        #[arg(long)]
        target: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Canonicalize author separators and name variants in place
    NormalizeAuthors {
        #[arg(short, long)]
        file: PathBuf,

        /// JSON file of [from, to] substitution pairs (default: built-in rules)
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Search arXiv for records without a link and attach the top candidate
    ResolveLinks {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,

        /// Delay between searches in milliseconds
        #[arg(long, default_value = "200")]
        delay_ms: u64,

        /// Records between snapshot writes
        #[arg(long, default_value = "5")]
        checkpoint_every: usize,

        /// arXiv API endpoint
        #[arg(long, default_value = pubmeta::arxiv::ARXIV_API_URL)]
        arxiv_url: String,
    },

    /// Accept candidate links whose title matches, clear the rest
    ValidateLinks {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a dataset as CSV
    ExportCsv {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage Google Scholar cookies
    Cookies {
        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Subcommand)]
enum CookieAction {
    /// Clear stored cookies
    Clear,
    /// Show cookie file path
    Path,
    /// Import a browser cookie export (JSON array)
    Import { file: PathBuf },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Collect {
            subject,
            output,
            refresh,
            delay_ms,
            checkpoint_every,
            timeout_secs,
            proxy,
            mirror,
        } => {
            let config = PipelineConfig {
                checkpoint_every,
                detail_delay: Duration::from_millis(delay_ms),
                request_timeout: Duration::from_secs(timeout_secs),
                proxy,
                mirror,
                ..Default::default()
            };
            let output = output.unwrap_or_else(|| default_snapshot_path(&subject));
            let policy = if refresh {
                CachePolicy::ForceRefresh
            } else {
                CachePolicy::ReuseIfPresent
            };
            run_collect(&subject, output, policy, config).await
        }
        Commands::FilterIncomplete { input, output } => run_filter(input, output),
        Commands::Merge {
            corrections,
            target,
            output,
        } => run_merge(corrections, target, output),
        Commands::NormalizeAuthors { file, rules } => run_normalize(file, rules),
        Commands::ResolveLinks {
            input,
            output,
            delay_ms,
            checkpoint_every,
            arxiv_url,
        } => {
            let config = PipelineConfig {
                checkpoint_every,
                link_delay: Duration::from_millis(delay_ms),
                ..Default::default()
            };
            run_resolve(input, output, &arxiv_url, config).await
        }
        Commands::ValidateLinks { input, output } => run_validate(input, output),
        Commands::ExportCsv { input, output } => {
            let dataset = load(&input)?;
            export::save_csv(&output, &dataset).context("Failed to write CSV")?;
            println!("Saved: {:?}", output);
            Ok(())
        }
        Commands::Cookies { action } => handle_cookies(action),
    }
}

fn load(path: &Path) -> Result<pubmeta::Dataset> {
    load_dataset(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn save(path: &Path, dataset: &pubmeta::Dataset) -> Result<()> {
    save_dataset(path, dataset).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

async fn run_collect(
    subject: &str,
    output: PathBuf,
    policy: CachePolicy,
    config: PipelineConfig,
) -> Result<()> {
    config.validate()?;
    println!("Fetching metadata for: {}", subject);

    let source = ScholarClient::new(&config)?;
    let mut collector = Collector::new(
        source,
        Throttle::fixed(config.detail_delay),
        config.checkpoint_every,
    )
    .with_policy(policy);

    let dataset = collector
        .collect(subject, &output)
        .await
        .with_context(|| format!("Collection for {:?} failed", subject))?;

    println!("Saved {} records to {:?}", dataset.len(), output);
    Ok(())
}

fn run_filter(input: PathBuf, output: PathBuf) -> Result<()> {
    let dataset = load(&input)?;
    let incomplete = filter_incomplete(&dataset);
    save(&output, &incomplete)?;
    info!(total = dataset.len(), incomplete = incomplete.len(), "Filtered incomplete records");
    println!(
        "{} of {} records need keywords -> {:?}",
        incomplete.len(),
        dataset.len(),
        output
    );
    Ok(())
}

fn run_merge(corrections: PathBuf, target: PathBuf, output: PathBuf) -> Result<()> {
    let corrections = load(&corrections)?;
    let target = load(&target)?;
    let (merged, report) = merge_keywords(&corrections, target);
    save(&output, &merged)?;

    for title in &report.unmatched {
        warn!(title = %title, "Correction not applied, no matching title");
    }
    println!(
        "Merged {} corrections ({} unmatched, {} duplicate titles) -> {:?}",
        report.applied,
        report.unmatched.len(),
        report.duplicate_titles.len(),
        output
    );
    Ok(())
}

fn run_normalize(file: PathBuf, rules: Option<PathBuf>) -> Result<()> {
    let normalizer = match rules {
        Some(path) => AuthorNormalizer::from_file(&path)
            .with_context(|| format!("Invalid rules file {}", path.display()))?,
        None => AuthorNormalizer::default(),
    };
    let mut dataset = load(&file)?;
    let changed = normalizer
        .apply(&mut dataset)
        .context("Author rules did not settle")?;
    save(&file, &dataset)?;
    println!("Normalized authors in {} of {} records", changed, dataset.len());
    Ok(())
}

async fn run_resolve(
    input: PathBuf,
    output: PathBuf,
    arxiv_url: &str,
    config: PipelineConfig,
) -> Result<()> {
    config.validate()?;
    let dataset = load(&input)?;
    let search = ArxivClient::with_base_url(arxiv_url, config.request_timeout, config.retry)?;
    let mut resolver = LinkResolver::new(
        search,
        Throttle::fixed(config.link_delay),
        config.checkpoint_every,
    );

    let (_, summary) = resolver
        .resolve(dataset, &output)
        .await
        .context("Link resolution failed")?;

    println!(
        "Searched {} titles: {} candidates, {} failures -> {:?}",
        summary.attempted, summary.found, summary.failed, output
    );
    Ok(())
}

fn run_validate(input: PathBuf, output: PathBuf) -> Result<()> {
    let dataset = load(&input)?;
    let (validated, diagnostics) = validate_links(dataset);
    save(&output, &validated)?;

    for d in &diagnostics {
        println!("wrong url: {} ({}) for {:?}", d.candidate_title, d.candidate_link, d.title);
    }
    println!(
        "Rejected {} candidate links -> {:?}",
        diagnostics.len(),
        output
    );
    Ok(())
}

// ============================================================================
// Cookie Management
// ============================================================================

fn handle_cookies(action: CookieAction) -> Result<()> {
    let manager = CookieManager::new()?;

    match action {
        CookieAction::Clear => {
            manager.clear()?;
            println!("Cookies cleared.");
        }
        CookieAction::Path => {
            println!("Cookie file: {:?}", manager.path());
        }
        CookieAction::Import { file } => {
            let count = manager
                .import(&file)
                .with_context(|| format!("Failed to import cookies from {}", file.display()))?;
            println!("Saved {} cookies to {:?}", count, manager.path());
        }
    }

    Ok(())
}
