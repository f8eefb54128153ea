//! gathering - merge recorded fan-out responses from the command line
//!
//! Reads one payload file per backend node and prints the aggregated
//! document, exactly as the gateway would have returned it to the client.

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gathering::aggregate::{self, AggregationRequest};
use gathering::config::Args;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gathering={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut payloads = Vec::with_capacity(args.payloads.len());
    for path in &args.payloads {
        let payload = std::fs::read_to_string(path)
            .with_context(|| format!("reading payload {}", path.display()))?;
        debug!(path = %path.display(), bytes = payload.len(), "loaded payload");
        payloads.push(payload);
    }

    let mut request = AggregationRequest::new();
    if let Some(field) = args.sort {
        request = request.sorted_by(field, !args.descending);
    }
    if let (Some(page), Some(size)) = (args.page, args.page_size) {
        request = request.paged(page, size);
    }

    let merged = aggregate::dispatch(&payloads, &args.format, &request)
        .context("aggregating payloads")?;
    println!("{merged}");

    Ok(())
}
