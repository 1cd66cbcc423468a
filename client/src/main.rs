//! quote-client entry point
//!
//! Runs quotes for one group against a quote webserver, resolves members
//! whose ZIP spans several counties, and prints a summary.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use client::{
    render_summary, HttpQuoteApi, PresetCountyChooser, QuoteSession, RunOutcome, SessionConfig,
    StdinCountyChooser,
};
use shared::{logging, service_info, service_warn, CountyId, GroupId, MemberId, RunQuotesRequest, ServiceId};

#[derive(Parser, Debug)]
#[command(name = "quote-client")]
#[command(about = "Generate group quotes and resolve ambiguous member counties")]
struct Args {
    /// Quote webserver address
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    #[arg(long)]
    group: String,

    /// Coverage effective date (YYYY-MM-DD), defaults to the server's today
    #[arg(long)]
    effective_date: Option<NaiveDate>,

    /// Tobacco status applied to every member
    #[arg(long)]
    tobacco: Option<bool>,

    /// County used for members whose county cannot be resolved
    #[arg(long)]
    county: Option<String>,

    /// Preset county choice, as MEMBER_ID=COUNTY_ID
    #[arg(long = "choose", value_parser = parse_choice)]
    choices: Vec<(MemberId, CountyId)>,

    /// Never prompt; members without a preset choice stay unresolved
    #[arg(long)]
    non_interactive: bool,

    /// Interval between polls of the latest batch, in milliseconds
    #[arg(long, default_value = "1200")]
    poll_interval_ms: u64,

    /// Give up polling after this many seconds
    #[arg(long, default_value = "120")]
    poll_timeout_secs: u64,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_choice(value: &str) -> Result<(MemberId, CountyId), String> {
    match value.split_once('=') {
        Some((member, county)) if !member.trim().is_empty() && !county.trim().is_empty() => {
            Ok((MemberId::from(member.trim()), CountyId::from(county.trim())))
        }
        _ => Err(format!("expected MEMBER_ID=COUNTY_ID, got '{value}'")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    ServiceId::init_client();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ServiceId::current(), &format!("quote client for {}", args.server));

    let api = HttpQuoteApi::new(&args.server, Duration::from_secs(args.request_timeout_secs))?;
    let session = QuoteSession::new(api, GroupId::from(args.group.as_str())).with_config(SessionConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        poll_timeout: Duration::from_secs(args.poll_timeout_secs),
    });

    let preset: BTreeMap<MemberId, CountyId> = args.choices.into_iter().collect();
    let chooser = if args.non_interactive {
        PresetCountyChooser::new(preset)
    } else {
        PresetCountyChooser::new(preset).with_fallback(StdinCountyChooser::new())
    };

    let request = RunQuotesRequest {
        effective_date: args.effective_date,
        tobacco: args.tobacco,
        county_id: args.county.map(CountyId::from),
        county_choices: BTreeMap::new(),
    };

    let workflow = async {
        let outcome = session.run_quotes(request).await?;
        match outcome {
            RunOutcome::Batch(batch) if !batch.is_fully_resolved() => {
                service_info!(
                    ServiceId::current(),
                    "📍 {} members need a county choice",
                    batch.pending_county_entries().count()
                );
                session.resolve_pending(&chooser).await
            }
            other => Ok(other),
        }
    };

    let outcome = tokio::select! {
        outcome = workflow => outcome?,
        _ = tokio::signal::ctrl_c() => {
            session.cancel().await;
            logging::log_shutdown(ServiceId::current(), "Received Ctrl+C signal");
            return Ok(());
        }
    };

    match outcome {
        RunOutcome::Batch(batch) => {
            print!("{}", render_summary(&batch));
            if !batch.is_fully_resolved() {
                service_warn!(
                    ServiceId::current(),
                    "⚠️ Some members still need a county; rerun with --choose MEMBER=COUNTY"
                );
            }
        }
        RunOutcome::TakingLonger => {
            service_warn!(
                ServiceId::current(),
                "⏰ Quotes are taking longer than expected; check again later"
            );
        }
    }

    logging::log_success(ServiceId::current(), "Quote client finished");
    Ok(())
}
