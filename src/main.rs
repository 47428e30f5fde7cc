//! citefetch - citation list scraper and bibliographic metadata updater
//!
//! ## Usage
//!
//! ```bash
//! citefetch cite --title "Attention is all you need"
//! citefetch update --input data/papers.csv
//! citefetch search --query "graph neural networks" --limit 5
//! ```

use anyhow::{Context, Result};
use citefetch::captcha::PromptResolver;
use citefetch::config::{ScrapeConfig, DEFAULT_NRESULTS, DEFAULT_SORT_COLUMN};
use citefetch::cookies::CookieStore;
use citefetch::semantic::SemanticClient;
use citefetch::table::{csv_output_path, CitationRecord};
use citefetch::{scholar, update};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Citation list scraper and bibliographic metadata updater
#[derive(Parser)]
#[command(name = "citefetch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the list of works citing a paper and rank them
    Cite {
        /// Title of the paper to get the citation list for
        #[arg(long)]
        title: String,

        /// Column to sort by (e.g. "Citations", "cit/year", "Year")
        #[arg(long)]
        sortby: Option<String>,

        /// Number of citing works to fetch
        #[arg(long, default_value_t = DEFAULT_NRESULTS)]
        nresults: usize,

        /// Directory for the exported CSV file
        #[arg(long, default_value = ".")]
        csvpath: PathBuf,

        /// Do not save the results as a CSV file
        #[arg(long)]
        notsavecsv: bool,

        /// Print a rank-vs-citations chart
        #[arg(long)]
        plotresults: bool,

        /// Lower bound on publication year
        #[arg(long)]
        startyear: Option<i32>,

        /// Upper bound on publication year (default: current year)
        #[arg(long)]
        endyear: Option<i32>,
    },

    /// Update citation counts in a CSV of paper titles
    Update {
        /// Input CSV file with a Title column
        #[arg(long, default_value = "data/papers.csv")]
        input: PathBuf,

        /// Output CSV file (default: overwrite the input)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip rows before this index
        #[arg(long)]
        idx: Option<usize>,
    },

    /// Search papers or fetch recommendations from Semantic Scholar
    Search {
        /// Keyword query
        #[arg(long)]
        query: Option<String>,

        /// Paper id for recommendations
        #[arg(long)]
        id: Option<String>,

        /// Number of results
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage stored Scholar session cookies
    Cookies {
        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Subcommand)]
enum CookieAction {
    /// Clear stored cookies
    Clear,
    /// Show the cookie file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    fmt().with_env_filter(filter).with_target(true).init();

    match cli.command {
        Commands::Cite {
            title,
            sortby,
            nresults,
            csvpath,
            notsavecsv,
            plotresults,
            startyear,
            endyear,
        } => {
            run_cite(
                title,
                sortby,
                nresults,
                csvpath,
                !notsavecsv,
                plotresults,
                startyear,
                endyear,
            )
            .await
        }
        Commands::Update { input, output, idx } => run_update(input, output, idx).await,
        Commands::Search { query, id, limit } => run_search(query, id, limit).await,
        Commands::Cookies { action } => handle_cookies(action),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_cite(
    title: String,
    sortby: Option<String>,
    nresults: usize,
    csvpath: PathBuf,
    save_csv: bool,
    plotresults: bool,
    startyear: Option<i32>,
    endyear: Option<i32>,
) -> Result<()> {
    let mut config = ScrapeConfig {
        n_results: nresults,
        sort_by: sortby.unwrap_or_else(|| DEFAULT_SORT_COLUMN.to_string()),
        start_year: startyear,
        ..Default::default()
    };
    if let Some(year) = endyear {
        config.end_year = year;
    }

    println!("Searching for citations of: {}", title);

    let resolver = PromptResolver::new(scholar::build_http_client(config.proxy.as_deref())?);

    let paper_id = scholar::resolve_paper_id(&title, &config, &resolver)
        .await
        .context("Could not resolve the paper's citation id")?;

    let mut set = scholar::fetch_citations(&paper_id, &config, &resolver).await?;
    if set.is_empty() {
        println!("No citing works found.");
        return Ok(());
    }

    let view = set.rank_and_derive(config.end_year, &config.sort_by);
    print_table(&view);

    if plotresults {
        print_chart(set.records());
    }

    if save_csv {
        let path = csv_output_path(&csvpath, &title);
        set.save_csv(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Results saved to {}", path.display());
    }

    Ok(())
}

/// Print the sorted view, one line per citing work.
fn print_table(view: &[CitationRecord]) {
    println!(
        "{:>4}  {:>9}  {:>4}  {:>8}  {}",
        "Rank", "Citations", "Year", "cit/year", "Title"
    );
    for record in view {
        println!(
            "{:>4}  {:>9}  {:>4}  {:>8}  {}",
            record.rank, record.citations, record.year, record.citations_per_year, record.title
        );
    }
}

/// Plain-text rank-vs-citations chart, in fetch order.
fn print_chart(records: &[CitationRecord]) {
    const WIDTH: usize = 60;
    let max = records.iter().map(|r| r.citations).max().unwrap_or(0).max(1);
    println!("\nCitations by rank:");
    for record in records {
        let bar = (record.citations as usize * WIDTH) / max as usize;
        println!("{:>4} | {} {}", record.rank, "#".repeat(bar), record.citations);
    }
}

async fn run_update(input: PathBuf, output: Option<PathBuf>, idx: Option<usize>) -> Result<()> {
    let output = output.unwrap_or_else(|| input.clone());
    let client = SemanticClient::new(api_key_from_env())?;

    let report = update::run_update(&client, &input, &output, idx).await?;
    println!(
        "citation count update completed: {} updated, {} skipped, {} failed",
        report.updated, report.skipped, report.failed
    );
    Ok(())
}

async fn run_search(query: Option<String>, id: Option<String>, limit: usize) -> Result<()> {
    let client = SemanticClient::new(api_key_from_env())?;

    if let Some(query) = query {
        let results = client.search(&query, limit).await?;
        for paper in &results {
            let year = paper
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "unknown year".to_string());
            println!("{} is published in {}, {}.", paper.title, year, paper.venue);
            println!(
                "with citation count {}",
                paper
                    .citation_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            println!();
        }
        println!("{} results", results.len());
    } else if let Some(id) = id {
        let results = client.recommendations(&id, limit).await?;
        for paper in &results {
            println!("{}", paper.title);
        }
    } else {
        anyhow::bail!("Provide either --query or --id");
    }

    Ok(())
}

fn api_key_from_env() -> Option<String> {
    std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok()
}

fn handle_cookies(action: CookieAction) -> Result<()> {
    let store = CookieStore::new()?;
    match action {
        CookieAction::Clear => {
            store.clear()?;
            println!("Cookies cleared.");
        }
        CookieAction::Path => {
            println!("Cookie file: {:?}", store.path());
        }
    }
    Ok(())
}
