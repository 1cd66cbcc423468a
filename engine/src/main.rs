//! Main entry point for the engine binary
//!
//! Runs the quote pipeline offline against JSON data files and prints the
//! result as JSON. The HTTP surface lives in the webserver binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use engine::EngineSources;
use shared::{
    logging, service_debug, BenchmarkRequest, CountyId, GroupId, MemberId, PreviewRequest,
    RunQuotesRequest, ServiceId, ZipCode,
};

/// Quote generation and subsidy engine
#[derive(Parser)]
#[command(name = "engine")]
#[command(about = "Generates health plan quotes and premium tax credit estimates for employer groups")]
pub struct Args {
    /// Reference dataset (plans, pricing, ZIP and county tables)
    #[arg(long, default_value = "data/reference.json")]
    pub reference: PathBuf,

    /// Member directory (groups and their members)
    #[arg(long, default_value = "data/members.json")]
    pub members: PathBuf,

    /// Directory holding the per-group batch history
    #[arg(long, default_value = "data/batches")]
    pub store_dir: PathBuf,

    /// Poverty guideline table replacing the built-in years
    #[arg(long)]
    pub poverty_table: Option<PathBuf>,

    /// Members priced concurrently within one run
    #[arg(long, default_value = "8")]
    pub concurrency: usize,

    /// Upper bound on one external affordability determination, in seconds
    #[arg(long, default_value = "90")]
    pub provider_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Price every member of a group and persist a new batch
    Run {
        #[arg(long)]
        group: String,
        /// Coverage effective date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        effective_date: Option<NaiveDate>,
        /// Tobacco status applied to every member
        #[arg(long)]
        tobacco: Option<bool>,
        /// County used for members whose county cannot be resolved
        #[arg(long)]
        county: Option<String>,
        /// Per-member county choice, as MEMBER_ID=COUNTY_ID
        #[arg(long = "choose", value_parser = parse_choice)]
        choices: Vec<(MemberId, CountyId)>,
    },
    /// Price one member against one county without persisting
    Preview {
        #[arg(long)]
        group: String,
        #[arg(long)]
        member: String,
        #[arg(long)]
        county: String,
        #[arg(long)]
        effective_date: Option<NaiveDate>,
        #[arg(long)]
        tobacco: Option<bool>,
    },
    /// Benchmark silver plan and subsidy breakdown for one member
    Benchmark {
        #[arg(long)]
        group: String,
        #[arg(long)]
        member: String,
        #[arg(long)]
        county: String,
        #[arg(long)]
        effective_date: Option<NaiveDate>,
        #[arg(long)]
        tobacco: Option<bool>,
        /// State used to pick the poverty guideline table
        #[arg(long)]
        state: Option<String>,
    },
    /// Candidate counties for a ZIP code
    Counties {
        #[arg(long)]
        zip: String,
    },
    /// Batch history of a group, newest first
    History {
        #[arg(long)]
        group: String,
    },
}

fn parse_choice(value: &str) -> Result<(MemberId, CountyId), String> {
    let (member, county) = value
        .split_once('=')
        .ok_or_else(|| format!("expected MEMBER_ID=COUNTY_ID, got '{value}'"))?;
    if member.trim().is_empty() || county.trim().is_empty() {
        return Err(format!("expected MEMBER_ID=COUNTY_ID, got '{value}'"));
    }
    Ok((MemberId::from(member.trim()), CountyId::from(county.trim())))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    ServiceId::init_engine();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ServiceId::current(), "quote engine (offline mode)");

    let engine = EngineSources {
        reference: args.reference,
        members: args.members,
        store_dir: args.store_dir,
        poverty_table: args.poverty_table,
        max_concurrency: args.concurrency,
        provider_timeout: Duration::from_secs(args.provider_timeout),
    }
    .build()
    .await
    .context("loading engine data")?;

    let output = match args.command {
        Command::Run {
            group,
            effective_date,
            tobacco,
            county,
            choices,
        } => {
            let request = RunQuotesRequest {
                effective_date,
                tobacco,
                county_id: county.map(CountyId::from),
                county_choices: choices.into_iter().collect(),
            };
            let batch = engine.generate_batch(&GroupId::from(group), request).await?;
            serde_json::to_string_pretty(&batch)?
        }
        Command::Preview {
            group,
            member,
            county,
            effective_date,
            tobacco,
        } => {
            let request = PreviewRequest {
                member_id: Some(MemberId::from(member)),
                county_id: Some(CountyId::from(county)),
                effective_date,
                tobacco,
            };
            let entry = engine.preview_member(&GroupId::from(group), request).await?;
            serde_json::to_string_pretty(&entry)?
        }
        Command::Benchmark {
            group,
            member,
            county,
            effective_date,
            tobacco,
            state,
        } => {
            let request = BenchmarkRequest {
                member_id: Some(MemberId::from(member)),
                county_id: Some(CountyId::from(county)),
                effective_date,
                tobacco,
                state_code: state,
            };
            let response = engine.benchmark_for_member(&GroupId::from(group), request).await?;
            serde_json::to_string_pretty(&response)?
        }
        Command::Counties { zip } => {
            let zip_code = ZipCode::parse(&zip)?;
            let candidates = engine.counties_for_zip(&zip_code).await?;
            serde_json::to_string_pretty(&candidates)?
        }
        Command::History { group } => {
            let history = engine.batch_history(&GroupId::from(group)).await?;
            service_debug!(ServiceId::current(), "📜 {} batches in history", history.len());
            serde_json::to_string_pretty(&history)?
        }
    };

    println!("{output}");
    logging::log_success(ServiceId::current(), "Engine finished");
    Ok(())
}
