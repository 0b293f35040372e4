//! Header inspection tool.
//!
//! Decodes a block header from wire hex, display JSON or a network's genesis
//! and prints its display form, identity hash, proof-of-work hash and verdict.

use std::{fs, io::Read};

use clap::{Parser, ValueEnum};
use litecore_common::chain::{
    blockdata::{block::BlockHeader, genesis::GenesisInfo},
    hashes::PowAlgorithm,
    network::Network,
};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command line arguments for the header tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network whose parameters judge the proof-of-work (main, testnet, regtest)
    #[arg(short, long, default_value = "main")]
    network: Network,

    /// 80-byte header in wire order, as hex
    #[arg(long, conflicts_with_all = ["json", "genesis"])]
    hex: Option<String>,

    /// Path to a display JSON header, or `-` for stdin
    #[arg(long, conflicts_with = "genesis")]
    json: Option<String>,

    /// Inspect the network's genesis header
    #[arg(long)]
    genesis: bool,

    /// Proof-of-work digest; defaults to the network's
    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Algorithm {
    Scrypt,
    Sha256d,
}

impl From<Algorithm> for PowAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Scrypt => PowAlgorithm::Scrypt,
            Algorithm::Sha256d => PowAlgorithm::Sha256d,
        }
    }
}

/// Initializes tracing with the specified log level.
fn init_tracing(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    debug!("Logging initialized with level: {}", args.log_level);
    Ok(())
}

/// Loads the header selected by the arguments.
fn load_header(args: &Args) -> Result<BlockHeader, Box<dyn std::error::Error>> {
    if let Some(hex) = &args.hex {
        let bytes = hex::decode(hex.trim())?;
        return Ok(BlockHeader::decode_exact(&bytes)?);
    }

    if let Some(path) = &args.json {
        let text = if path == "-" {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        } else {
            fs::read_to_string(path)?
        };
        let value: Value = serde_json::from_str(&text)?;
        return Ok(BlockHeader::from_display(&value)?);
    }

    if args.genesis {
        return Ok(GenesisInfo::for_network(args.network).to_header());
    }

    Err("one of --hex, --json or --genesis is required".into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut params = args.network.consensus_params();
    if let Some(algorithm) = args.algorithm {
        params = params.with_pow_algorithm(algorithm.into());
    }

    let header = load_header(&args)?;
    info!(network = %args.network, hash = %header.reverse_hash(), "Loaded header");

    let pow_hash = header.pow_hash_with(params.pow_algorithm);
    let valid = header.verify_pow_for(&params);

    let report = json!({
        "network": args.network.as_str(),
        "header": header.to_display(),
        "hex": hex::encode(header.encode()),
        "powAlgorithm": format!("{:?}", params.pow_algorithm).to_lowercase(),
        "powHash": pow_hash.to_string(),
        "target": header.target().map(|target| format!("{target:x}")),
        "genesis": header.is_genesis(),
        "validPow": valid,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
