//! `hardfork-migrate`: offline assembly front-end for the migration engine.
//!
//! Reads a ledger snapshot file and the protocol configuration, runs the
//! pipeline up to the consistency-checked transaction candidate, and emits
//! the candidate plus the CBOR hex of every authorization payload. Signing
//! and submission are deliberately out of reach of this binary; the emitted
//! artifact is what an operator hands to the balancing/signing tooling.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

use hardfork_core::assembler::TransactionCandidate;
use hardfork_core::config::ProtocolConfig;
use hardfork_core::errors::MigrationError;
use hardfork_core::migrate::assemble_candidate;
use hardfork_core::types::Amount;

mod snapshot;

use snapshot::SnapshotLedger;

#[derive(Debug, Parser)]
#[command(
    name = "hardfork-migrate",
    about = "Assemble the hard-fork migration transaction from a ledger snapshot"
)]
struct Args {
    /// Migration amount in base units of the legacy token
    #[arg(long)]
    amount: u128,

    /// Ledger snapshot JSON (vault UTxO plus the two reference-script UTxOs)
    #[arg(long)]
    snapshot: PathBuf,

    /// Protocol configuration JSON; defaults to the mainnet deployment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the assembled candidate as JSON to this path
    #[arg(long)]
    out: Option<PathBuf>,
}

/// All file access goes through blocking `std::fs`, so the runtime needs
/// no I/O reactor
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("could not create tokio runtime")
}

pub fn main() -> Result<()> {
    let tokio_runtime = runtime()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set trace subscriber")?;

    tokio_runtime.block_on(run(Args::parse()))
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<ProtocolConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ProtocolConfig::mainnet().map_err(stage_error)?,
    };

    let ledger = SnapshotLedger::load(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;

    let candidate = assemble_candidate(&ledger, &config, Amount::new(args.amount))
        .await
        .map_err(stage_error)?;

    let report = render(&candidate).map_err(stage_error)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(out) = &args.out {
        std::fs::write(out, serde_json::to_vec_pretty(&report)?)
            .with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), "candidate written");
    }
    Ok(())
}

/// Keeps the stage and stable code visible in the operator-facing report
fn stage_error(e: MigrationError) -> anyhow::Error {
    anyhow!("[{} {}] {}", e.stage(), e.code(), e)
}

/// The operator-facing artifact: the candidate itself plus the CBOR hex of
/// every authorization payload, ready for the signing tooling
fn render(candidate: &TransactionCandidate) -> Result<serde_json::Value, MigrationError> {
    let unlock = candidate.vault_input.redeemer.to_bytes()?;
    let mint = candidate.mint.redeemer.to_bytes()?;
    let withdraw = candidate.withdrawal.redeemer.to_bytes()?;

    Ok(serde_json::json!({
        "reference_inputs": candidate
            .reference_inputs
            .iter()
            .map(|r| r.input.to_string())
            .collect::<Vec<_>>(),
        "vault_input": {
            "utxo": candidate.vault_input.utxo,
            "redeemer_cbor": hex::encode(unlock),
        },
        "outputs": candidate
            .outputs
            .iter()
            .map(|o| serde_json::json!({
                "address": o.address,
                "value": o.value,
                "datum_cbor": o.datum.as_ref().map(|d| hex::encode(&d.0)),
            }))
            .collect::<Vec<_>>(),
        "mint": {
            "token": candidate.mint.token,
            "amount": candidate.mint.amount,
            "redeemer_cbor": hex::encode(mint),
        },
        "withdrawal": {
            "account": candidate.withdrawal.account.to_bech32(),
            "lovelace": candidate.withdrawal.lovelace,
            "redeemer_cbor": hex::encode(withdraw),
        },
    }))
}
