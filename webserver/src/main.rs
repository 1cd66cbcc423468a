//! WebServer entry point
//!
//! Loads the engine's data files and serves the quote API over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use engine::EngineSources;
use shared::{logging, service_info, ServiceId};
use webserver::{WebServer, WebServerError};

#[derive(Parser, Debug)]
#[command(name = "webserver")]
#[command(about = "HTTP API for group quote generation")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for HTTP server
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Reference dataset (plans, pricing, ZIP and county tables)
    #[arg(long, default_value = "data/reference.json")]
    reference: PathBuf,

    /// Member directory
    #[arg(long, default_value = "data/members.json")]
    members: PathBuf,

    /// Directory holding the per-group batch history
    #[arg(long, default_value = "data/batches")]
    store_dir: PathBuf,

    /// Poverty guideline table replacing the built-in years
    #[arg(long)]
    poverty_table: Option<PathBuf>,

    /// Members priced concurrently within one run
    #[arg(long, default_value = "8")]
    concurrency: usize,

    /// Upper bound on one external affordability determination, in seconds
    #[arg(long, default_value = "90")]
    provider_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    ServiceId::init_webserver();
    logging::init_tracing_with_level(Some(&args.log_level));

    let http_addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| WebServerError::config(format!("Invalid bind address: {e}")))?;

    logging::log_startup(ServiceId::current(), &format!("quote API on {http_addr}"));

    let engine = EngineSources {
        reference: args.reference,
        members: args.members,
        store_dir: args.store_dir,
        poverty_table: args.poverty_table,
        max_concurrency: args.concurrency,
        provider_timeout: Duration::from_secs(args.provider_timeout),
    }
    .build()
    .await?;
    service_info!(ServiceId::current(), "✅ Engine data loaded");

    WebServer::new(http_addr, engine).run().await?;

    logging::log_success(ServiceId::current(), "WebServer stopped gracefully");
    Ok(())
}
