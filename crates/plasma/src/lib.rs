mod logging;
mod opts;

use std::path::Path;
use std::str::FromStr as _;

use clap::Parser as _;
use data_encoding::HEXLOWER_PERMISSIVE;
use opts::{Commands, Opts};
use plasma_core::key::SecretKey;
use plasma_core::signer::{ChainId, ChainSigner, Signer as _};
use plasma_core::transaction::Transaction;
use plasma_util_error::WhateverResult;
use snafu::ResultExt as _;
use tracing::{debug, info};

const LOG_TARGET: &str = "plasma::cli";

pub async fn run() -> WhateverResult<()> {
    let opts = Opts::parse();
    logging::init_logging(opts.verbose)?;

    let signer = ChainSigner::new(ChainId::new(opts.chain_id));
    debug!(target: LOG_TARGET, chain_id = %signer.chain_id(), "Starting");

    match opts.command {
        Commands::GenKey => {
            let key = SecretKey::generate();
            eprintln!("Address: {}", key.address());
            eprintln!();
            println!("{}", key.reveal_hex());
            eprintln!();
            eprintln!("This key is irrecoverable if lost. Please make a back up before using it!");
        }
        Commands::Address { key_file } => {
            println!("{}", read_key(&key_file).await?.address());
        }
        Commands::Sign {
            tx,
            key_file,
            key2_file,
        } => {
            let key1 = read_key(&key_file).await?;
            let key2 = match key2_file {
                Some(path) => Some(read_key(&path).await?),
                None => None,
            };
            let tx = read_tx(&tx).await?;
            let signed = sign_tx(&signer, &tx, &key1, key2.as_ref())?;
            println!("{}", signed.to_json_pretty());
        }
        Commands::Verify { tx } => {
            let tx = read_tx(&tx).await?;
            tx.verify(&signer)
                .whatever_context("Transaction signatures do not verify")?;
            info!(target: LOG_TARGET, hash = %tx.hash(&signer), "Transaction valid");
            println!("{}", tx.hash(&signer));
        }
        Commands::Encode { tx } => {
            println!("0x{}", encode_hex(&read_tx(&tx).await?));
        }
        Commands::Decode { hex } => {
            println!("{}", decode_hex(&hex)?.to_json_pretty());
        }
    }

    Ok(())
}

async fn read_key(path: &Path) -> WhateverResult<SecretKey> {
    SecretKey::from_str(
        tokio::fs::read_to_string(path)
            .await
            .whatever_context("Failed to read key file")?
            .trim(),
    )
    .whatever_context("Failed to parse key")
}

async fn read_tx(path: &Path) -> WhateverResult<Transaction> {
    Transaction::from_json(
        &tokio::fs::read_to_string(path)
            .await
            .whatever_context("Failed to read transaction file")?,
    )
    .whatever_context("Failed to parse transaction")
}

fn sign_tx(
    signer: &ChainSigner,
    tx: &Transaction,
    key1: &SecretKey,
    key2: Option<&SecretKey>,
) -> WhateverResult<Transaction> {
    tx.sign(signer, Some(key1), key2)
        .whatever_context("Failed to sign transaction")
}

fn encode_hex(tx: &Transaction) -> String {
    data_encoding::HEXLOWER.encode(&tx.encode_to_vec())
}

fn decode_hex(hex: &str) -> WhateverResult<Transaction> {
    let hex = hex.trim();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    let bytes = HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .whatever_context("Invalid hex")?;

    Transaction::decode(&bytes).whatever_context("Failed to decode transaction")
}
