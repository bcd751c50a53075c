use serde::{Deserialize, Serialize};

/// 32-byte hash type
pub type H256 = [u8; 32];

/// What a walked proof demonstrates about a key.
///
/// Both variants are authoritative: `NotFound` means the chain proves the
/// key is absent from the trie, not that the lookup merely failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The key is present and holds this value
    Found(Vec<u8>),
    /// The key is provably absent
    NotFound,
}

impl Outcome {
    /// The value for a present key, empty bytes for a proven absence.
    pub fn into_value(self) -> Vec<u8> {
        match self {
            Outcome::Found(value) => value,
            Outcome::NotFound => Vec::new(),
        }
    }
}

/// One verification request as it crosses a process boundary.
///
/// `key` is used exactly as given. The non-arrival ledgers key their tries
/// by `keccak256` of the transaction id, so callers hash before building
/// the input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofInput {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub proof: Vec<Vec<u8>>, // RLP-encoded nodes, root first
    pub root: H256,
}

/// Result handed back to the settlement layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub root: H256,
}
