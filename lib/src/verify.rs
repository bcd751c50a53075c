//! The proof walker and the verification entry points built on it.
//!
//! Every function here is a pure function of `(proof, root, key[, value])`.
//! Proofs are adversarial input: any malformed or inconsistent chain is
//! rejected with a typed error, never folded into "absent".

use crate::error::{FormatError, IntegrityError, VerifyError};
use crate::node::{Child, Node};
use crate::path::to_nibbles;
use crate::rlp::{decode, keccak256, Item};
use crate::types::{Outcome, H256};

/// Loop iterations allowed per proof node and per key nibble. Embedded hops
/// burn fuel without consuming nibbles, so honest proofs need slack beyond
/// one iteration per unit.
const FUEL_PER_UNIT: usize = 4;

/// Flat allowance so degenerate inputs (empty key, single node) still walk.
const FUEL_FLOOR: usize = 16;

/// Walk a proof chain from `root` toward `key` and report what it shows.
///
/// The proof is ordered root first. Every hop across a 32-byte reference is
/// checked against the keccak hash of the next node; embedded sub-nodes are
/// consumed in place. `key` is used exactly as given, so callers whose trie
/// is keyed by hash must hash before calling.
pub fn walk(proof: &[Vec<u8>], root: &H256, key: &[u8]) -> Result<Outcome, VerifyError> {
    let first = proof.first().ok_or(IntegrityError::EmptyProof)?;
    let computed = keccak256(first);
    if computed != *root {
        return Err(IntegrityError::RootMismatch {
            expected: *root,
            computed,
        }
        .into());
    }

    let path = to_nibbles(key);
    let mut cursor = 0; // nibbles consumed so far
    let mut index = 0; // position in the proof chain
    let mut current = decode(first)?;
    let mut fuel = FUEL_PER_UNIT * (proof.len() + path.len()) + FUEL_FLOOR;

    loop {
        fuel = fuel
            .checked_sub(1)
            .ok_or(IntegrityError::FuelExhausted)?;

        match Node::classify(&current)? {
            Node::Branch { children, value } => {
                if cursor == path.len() {
                    // Path fully consumed, the terminal slot decides
                    return Ok(match value {
                        Some(value) => Outcome::Found(value.to_vec()),
                        None => Outcome::NotFound,
                    });
                }
                let slot = path[cursor] as usize;
                cursor += 1;
                match children[slot] {
                    Child::Empty => return Ok(Outcome::NotFound),
                    child => current = follow(proof, &mut index, child)?,
                }
            }
            Node::Extension { path: shared, child } => {
                if !path[cursor..].starts_with(&shared) {
                    // Divergence from the shared run proves absence
                    return Ok(Outcome::NotFound);
                }
                cursor += shared.len();
                current = follow(proof, &mut index, child)?;
            }
            Node::Leaf { path: remaining, value } => {
                // A match must cover the whole remaining path, not a prefix
                return Ok(if path[cursor..] == remaining[..] {
                    Outcome::Found(value.to_vec())
                } else {
                    Outcome::NotFound
                });
            }
        }
    }
}

/// Step into a child: embedded nodes resolve in place, hash references
/// advance to the next proof entry after its hash checks out.
fn follow<'p>(
    proof: &'p [Vec<u8>],
    index: &mut usize,
    child: Child<'p>,
) -> Result<Item<'p>, VerifyError> {
    match child {
        Child::Embedded(item) => Ok(item),
        Child::Hash(expected) => {
            let next = *index + 1;
            let encoded = proof
                .get(next)
                .ok_or(IntegrityError::ProofExhausted(next))?;
            let computed = keccak256(encoded);
            if computed != *expected {
                return Err(IntegrityError::HashMismatch {
                    index: next,
                    expected: *expected,
                    computed,
                }
                .into());
            }
            *index = next;
            Ok(decode(encoded)?)
        }
        Child::Empty => Err(FormatError::EmptyExtensionChild.into()),
    }
}

/// Resolve `key` against `root` and return its value.
///
/// A proven absence comes back as empty bytes. A rejected proof surfaces as
/// an error, never as an empty value.
pub fn get(proof: &[Vec<u8>], root: &H256, key: &[u8]) -> Result<Vec<u8>, VerifyError> {
    Ok(walk(proof, root, key)?.into_value())
}

/// Check that the proof shows `key` present with exactly `value`.
pub fn verify_inclusion(
    proof: &[Vec<u8>],
    root: &H256,
    key: &[u8],
    value: &[u8],
) -> Result<bool, VerifyError> {
    match walk(proof, root, key)? {
        Outcome::Found(found) => Ok(found.as_slice() == value),
        Outcome::NotFound => Ok(false),
    }
}

/// Check that the proof shows `key` absent from the trie.
///
/// A rejected proof is an error, not `false`: a dispute flow must be able
/// to tell a broken proof from a genuine non-arrival.
pub fn verify_non_inclusion(
    proof: &[Vec<u8>],
    root: &H256,
    key: &[u8],
) -> Result<bool, VerifyError> {
    Ok(matches!(walk(proof, root, key)?, Outcome::NotFound))
}
