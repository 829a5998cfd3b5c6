// src/main.rs
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::{env, fs, process, sync::Arc, time::Instant};

use txnmatch_lib::{
    CharGramEmbedder, MatchError, MatcherConfig, MatcherService, RosterBuilder, TransactionIndex,
};

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    id: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct UserInput {
    id: String,
    name: String,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <transactions.json> <users.json> <transaction_id>", args[0]);
        process::exit(2);
    }

    let start_time = Instant::now();
    info!("Starting counterparty name resolution");

    let transactions_raw = fs::read_to_string(&args[1])
        .with_context(|| format!("Failed to read transactions file {}", args[1]))?;
    let transactions: Vec<TransactionRecord> =
        serde_json::from_str(&transactions_raw).context("Failed to parse transactions file")?;
    let index = TransactionIndex::from_records(
        transactions.into_iter().map(|t| (t.id, t.description)),
    );
    info!("Loaded {} transactions", index.len());

    let users_raw = fs::read_to_string(&args[2])
        .with_context(|| format!("Failed to read users file {}", args[2]))?;
    let users: Vec<UserInput> =
        serde_json::from_str(&users_raw).context("Failed to parse users file")?;
    let user_records: Vec<(String, String)> =
        users.into_iter().map(|u| (u.id, u.name)).collect();

    let embedder = Arc::new(CharGramEmbedder::default());
    let roster = RosterBuilder::new(embedder.as_ref())
        .build(&user_records)
        .context("Failed to build user roster")?;
    info!(
        "Built roster with {} users (embedding dim {})",
        roster.records.len(),
        roster.embedding_dim
    );

    let service = MatcherService::new(Arc::new(roster), embedder, MatcherConfig::default());

    match service.resolve_transaction(&index, &args[3]) {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Err(e @ MatchError::TransactionNotFound) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Resolution completed in {:.2?}. Metrics: {:?}",
        start_time.elapsed(),
        service.metrics().snapshot()
    );
    Ok(())
}
