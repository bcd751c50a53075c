//! Merkle Patricia Trie proof verification for non-arrival disputes.
//!
//! Given a trusted state root, an ordered chain of RLP-encoded trie nodes,
//! and a key, the engine decides whether the key is present (and with what
//! value) or provably absent. Watcher and settlement layers feed it
//! `(proof, root, key[, value])` and act on the outcome; a rejected proof
//! is always reported as an error, never mistaken for a proven absence.
//!
//! Keys are used exactly as given. The ledgers this engine fronts key their
//! tries by `keccak256` of the transaction id, so callers hash before
//! building a request.

use alloy_sol_types::sol;

pub mod error;
pub mod node;
pub mod path;
pub mod rlp;
pub mod types;
pub mod verify;

#[cfg(feature = "std")]
pub mod builder;

pub use error::*;
pub use node::*;
pub use path::*;
pub use rlp::*;
pub use types::*;
pub use verify::*;

#[cfg(feature = "std")]
pub use builder::*;

sol! {
    /// Verification outcome in the shape the settlement contracts consume.
    struct DisputeOutcome {
        bool verified;
        bytes32 root;
        bytes key;
        bytes value;
    }
}
