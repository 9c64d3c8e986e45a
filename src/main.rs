mod api;
mod app;
mod browser;
mod config;
mod error;
mod flows;
mod logging;
mod markup;
mod models;
mod tui;

use anyhow::{anyhow, Context, Result};
use api::{JobApiClient, JobSource};
use clap::{Parser, Subcommand};
use config::{Config, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};
use models::{JobDetails, SearchQuery};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser)]
#[command(name = "jobfinder")]
#[command(about = "Search job listings by keyword and location")]
struct Cli {
    /// Base URL of the job service API
    #[arg(long, global = true, env = "JOBFINDER_API_BASE_URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "JOBFINDER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Write logs here instead of the data directory
    #[arg(long, global = true, env = "JOBFINDER_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse jobs interactively (default)
    Browse {
        /// Prefill the keywords field
        #[arg(short, long)]
        keywords: Option<String>,

        /// Prefill the location field; with --keywords, searches on start
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Search once and print the results
    Search {
        /// Keywords, e.g. "Data Analyst"
        keywords: String,

        /// Location, e.g. Mumbai
        location: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show job details
    Show {
        /// Job ID
        id: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Open a job's posting in the browser
    Open {
        /// Job ID
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli.api_base, cli.timeout_secs, cli.log_file)?;

    if let Err(err) = logging::init(&config.log_file) {
        eprintln!("warning: logging disabled: {:#}", err);
    }
    tracing::info!(api_base = %config.api_base, "starting jobfinder");

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let client = JobApiClient::new(config.api_base.clone(), config.timeout)?;

    match cli.command.unwrap_or(Commands::Browse {
        keywords: None,
        location: None,
    }) {
        Commands::Browse { keywords, location } => {
            let prefill = match (keywords, location) {
                (None, None) => None,
                (keywords, location) => Some(SearchQuery::new(
                    keywords.unwrap_or_default(),
                    location.unwrap_or_default(),
                )),
            };
            tui::run_browse(runtime.handle().clone(), Arc::new(client), prefill)?;
        }

        Commands::Search {
            keywords,
            location,
            json,
        } => {
            let query = SearchQuery::new(keywords, location);
            query.validate()?;
            let jobs = runtime
                .block_on(client.search(&query))
                .with_context(|| format!("Search against {} failed", config.api_base))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<14} {:<34} {:<22} {:<20}", "ID", "TITLE", "COMPANY", "LOCATION");
                println!("{}", "-".repeat(93));
                for (index, job) in jobs.iter().enumerate() {
                    println!(
                        "{:<14} {:<34} {:<22} {:<20}",
                        tui::truncate(&job.key(index), 12),
                        tui::truncate(&job.title, 32),
                        tui::truncate(&job.company, 20),
                        tui::truncate(&job.location, 18)
                    );
                }
            }
        }

        Commands::Show { id, json } => {
            let details = fetch_details(&runtime, &client, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                print_details(&id, &details);
            }
        }

        Commands::Open { id } => {
            let details = fetch_details(&runtime, &client, &id)?;
            let url = details
                .apply_url()
                .ok_or_else(|| anyhow!("Job {} has no posting link", id))?;
            browser::open_url(url)?;
            println!("Opened {}", url);
        }
    }

    Ok(())
}

fn fetch_details(runtime: &Runtime, client: &JobApiClient, id: &str) -> Result<JobDetails> {
    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("Job ID must not be empty"));
    }
    runtime
        .block_on(client.job_details(id))
        .with_context(|| format!("Could not load job {}", id))
}

fn print_details(id: &str, details: &JobDetails) {
    println!("Job {}", details.id.as_deref().unwrap_or(id));
    println!("Title: {}", details.title);
    println!("Company: {}", details.company);
    println!("Location: {}", details.location);
    if let Some(salary) = details.salary.display() {
        println!("Salary: {}", salary);
    }
    if let Some(contract) = &details.contract_type {
        println!("Contract: {}", contract);
    }
    if let Some(job_type) = &details.job_type {
        println!("Type: {}", job_type);
    }
    if let Some(url) = details.apply_url() {
        println!("Apply: {}", url);
    }
    if let Some(description) = &details.description {
        println!(
            "\n--- Description ---\n{}",
            textwrap::fill(&markup::plain_text(description), 80)
        );
    }
}
