//! Proof bundle verification driver.
//!
//! You can run this tool using the following commands:
//! ```shell
//! RUST_LOG=info cargo run --release -- demo > bundle.json
//! RUST_LOG=info cargo run --release -- include --bundle bundle.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use alloy_sol_types::SolValue;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use nonarrival_mpt::{
    get, keccak256, verify_inclusion, verify_non_inclusion, DisputeOutcome, ProofInput,
    ReferenceTrie, VerificationReport, H256,
};

/// The arguments for the command.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the bundle proves its key arrived with the claimed value
    Include {
        /// Path to a proof bundle JSON file
        #[arg(long)]
        bundle: PathBuf,
        /// Also print the ABI-encoded outcome for the settlement layer
        #[arg(long)]
        abi: bool,
    },
    /// Check that the bundle proves its key never arrived
    Absent {
        #[arg(long)]
        bundle: PathBuf,
        #[arg(long)]
        abi: bool,
    },
    /// Resolve the bundle's key and print the stored value
    Get {
        #[arg(long)]
        bundle: PathBuf,
    },
    /// Build a demo trie and print bundles for a settled and a missing key
    Demo,
}

/// On-disk proof bundle with 0x-hex fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Bundle {
    root: String,
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    proof: Vec<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Include { bundle, abi } => run_include(&bundle, abi),
        Command::Absent { bundle, abi } => run_absent(&bundle, abi),
        Command::Get { bundle } => run_get(&bundle),
        Command::Demo => run_demo(),
    }
}

fn run_include(path: &Path, abi: bool) -> Result<()> {
    let input = load_bundle(path)?;
    if input.value.is_empty() {
        bail!("inclusion bundles must carry a value field");
    }

    let verified = verify_inclusion(&input.proof, &input.root, &input.key, &input.value)
        .context("proof rejected")?;
    let report = VerificationReport {
        verified,
        key: input.key,
        value: input.value,
        root: input.root,
    };
    print_report(&report, abi);

    if !verified {
        bail!("inclusion claim does not verify against the root");
    }
    Ok(())
}

fn run_absent(path: &Path, abi: bool) -> Result<()> {
    let input = load_bundle(path)?;

    let verified =
        verify_non_inclusion(&input.proof, &input.root, &input.key).context("proof rejected")?;
    let report = VerificationReport {
        verified,
        key: input.key,
        value: Vec::new(),
        root: input.root,
    };
    print_report(&report, abi);

    if !verified {
        bail!("the key is present, the non-arrival claim does not hold");
    }
    Ok(())
}

fn run_get(path: &Path) -> Result<()> {
    let input = load_bundle(path)?;

    let value = get(&input.proof, &input.root, &input.key).context("proof rejected")?;
    if value.is_empty() {
        println!("(absent)");
    } else {
        println!("0x{}", hex::encode(&value));
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    let mut trie = ReferenceTrie::new();

    let key_arrived = keccak256(b"real-tx");
    trie.insert(&key_arrived, b"arrived");
    for i in 0u8..4 {
        let key = keccak256(&[b"tx-".as_slice(), &[i]].concat());
        trie.insert(&key, format!("receipt-{i}").as_bytes());
    }
    let root = trie.root().ok_or_else(|| anyhow!("empty demo trie"))?;
    let key_missing = keccak256(b"missing-tx");

    info!(root = %hex::encode(root), "demo trie built");

    let bundles = [
        bundle_for(&trie, &root, &key_arrived, Some(b"arrived")),
        bundle_for(&trie, &root, &key_missing, None),
    ];
    println!("{}", serde_json::to_string_pretty(&bundles)?);
    Ok(())
}

fn bundle_for(trie: &ReferenceTrie, root: &H256, key: &[u8], value: Option<&[u8]>) -> Bundle {
    Bundle {
        root: hex_field(root),
        key: hex_field(key),
        value: value.map(hex_field),
        proof: trie.prove(key).iter().map(|node| hex_field(node)).collect(),
    }
}

fn print_report(report: &VerificationReport, abi: bool) {
    println!("Verification Result:");
    println!("  Verified: {}", report.verified);
    println!("  Key: 0x{}", hex::encode(&report.key));
    println!("  Value: 0x{}", hex::encode(&report.value));
    println!("  Root: 0x{}", hex::encode(report.root));

    if abi {
        let outcome = DisputeOutcome {
            verified: report.verified,
            root: report.root.into(),
            key: report.key.clone().into(),
            value: report.value.clone().into(),
        };
        println!("  ABI: 0x{}", hex::encode(outcome.abi_encode()));
    }
}

fn load_bundle(path: &Path) -> Result<ProofInput> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading bundle {}", path.display()))?;
    let bundle: Bundle = serde_json::from_str(&raw).context("parsing bundle json")?;

    let root_bytes = parse_hex(&bundle.root).context("root field")?;
    let root: H256 = root_bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("root must be 32 bytes, got {}", root_bytes.len()))?;
    let key = parse_hex(&bundle.key).context("key field")?;
    let value = match &bundle.value {
        Some(value) => parse_hex(value).context("value field")?,
        None => Vec::new(),
    };
    let proof = bundle
        .proof
        .iter()
        .enumerate()
        .map(|(i, node)| parse_hex(node).with_context(|| format!("proof node {i}")))
        .collect::<Result<Vec<_>>>()?;

    info!(
        nodes = proof.len(),
        key = %hex::encode(&key),
        "bundle loaded"
    );
    Ok(ProofInput {
        key,
        value,
        proof,
        root,
    })
}

fn hex_field(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_hex(field: &str) -> Result<Vec<u8>> {
    let stripped = field.strip_prefix("0x").unwrap_or(field);
    hex::decode(stripped).map_err(|err| anyhow!("invalid hex: {err}"))
}
