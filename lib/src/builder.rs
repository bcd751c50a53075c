//! In-memory reference trie for exercising the verifier.
//!
//! Produces the same node encodings a production trie would and extracts
//! the node chains the walker consumes, for present and for absent keys.
//! Test and demo support, not a production proof source.

use std::collections::HashMap;

use crate::path::{encode_path, to_nibbles};
use crate::rlp::{encode_bytes, encode_list, keccak256};
use crate::types::H256;

#[derive(Clone, Debug)]
enum BuiltNode {
    Leaf(Vec<u8>, Vec<u8>),                      // (path, value)
    Extension(Vec<u8>, H256),                    // (path, child hash)
    Branch([Option<H256>; 16], Option<Vec<u8>>), // (children, value)
}

/// A Merkle Patricia Trie held fully in memory, keyed by node hash.
pub struct ReferenceTrie {
    encoded: HashMap<H256, Vec<u8>>,
    nodes: HashMap<H256, BuiltNode>,
    root: Option<H256>,
}

impl ReferenceTrie {
    pub fn new() -> Self {
        Self {
            encoded: HashMap::new(),
            nodes: HashMap::new(),
            root: None,
        }
    }

    /// Insert a key-value pair and return the new root.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> H256 {
        let nibbles = to_nibbles(key);
        let new_root = self.insert_at(self.root, &nibbles, value.to_vec());
        self.root = Some(new_root);
        new_root
    }

    /// The current root hash, if anything has been inserted.
    pub fn root(&self) -> Option<H256> {
        self.root
    }

    fn insert_at(&mut self, node: Option<H256>, path: &[u8], value: Vec<u8>) -> H256 {
        let Some(hash) = node else {
            return self.store_leaf(path, value);
        };
        let Some(node) = self.nodes.get(&hash).cloned() else {
            return self.store_leaf(path, value);
        };

        match node {
            BuiltNode::Leaf(leaf_path, leaf_value) => {
                let common = common_prefix_len(&leaf_path, path);
                if common == leaf_path.len() && common == path.len() {
                    // Exact match, replace the value
                    return self.store_leaf(path, value);
                }

                let mut children: [Option<H256>; 16] = Default::default();
                let mut branch_value = None;

                if common == leaf_path.len() {
                    // Old path ends at the split, its value rides the branch
                    branch_value = Some(leaf_value);
                } else {
                    let slot = leaf_path[common] as usize;
                    children[slot] = Some(self.store_leaf(&leaf_path[common + 1..], leaf_value));
                }

                if common == path.len() {
                    branch_value = Some(value);
                } else {
                    let slot = path[common] as usize;
                    children[slot] = Some(self.store_leaf(&path[common + 1..], value));
                }

                let branch = self.store_branch(children, branch_value);
                if common == 0 {
                    branch
                } else {
                    self.store_extension(&path[..common], branch)
                }
            }
            BuiltNode::Extension(ext_path, child) => {
                let common = common_prefix_len(&ext_path, path);
                if common == ext_path.len() {
                    // Continue below the extension
                    let new_child = self.insert_at(Some(child), &path[common..], value);
                    return self.store_extension(&ext_path, new_child);
                }

                // Split the extension at the divergence point
                let mut children: [Option<H256>; 16] = Default::default();
                let mut branch_value = None;

                let old_slot = ext_path[common] as usize;
                children[old_slot] = if common + 1 == ext_path.len() {
                    Some(child)
                } else {
                    Some(self.store_extension(&ext_path[common + 1..], child))
                };

                if common == path.len() {
                    branch_value = Some(value);
                } else {
                    let slot = path[common] as usize;
                    children[slot] = Some(self.store_leaf(&path[common + 1..], value));
                }

                let branch = self.store_branch(children, branch_value);
                if common == 0 {
                    branch
                } else {
                    self.store_extension(&path[..common], branch)
                }
            }
            BuiltNode::Branch(mut children, branch_value) => {
                if path.is_empty() {
                    return self.store_branch(children, Some(value));
                }
                let slot = path[0] as usize;
                let new_child = self.insert_at(children[slot], &path[1..], value);
                children[slot] = Some(new_child);
                self.store_branch(children, branch_value)
            }
        }
    }

    fn store_leaf(&mut self, path: &[u8], value: Vec<u8>) -> H256 {
        let encoded = encode_list(&[
            encode_bytes(&encode_path(path, true)),
            encode_bytes(&value),
        ]);
        let hash = keccak256(&encoded);
        self.encoded.insert(hash, encoded);
        self.nodes.insert(hash, BuiltNode::Leaf(path.to_vec(), value));
        hash
    }

    fn store_extension(&mut self, path: &[u8], child: H256) -> H256 {
        let encoded = encode_list(&[
            encode_bytes(&encode_path(path, false)),
            encode_bytes(&child),
        ]);
        let hash = keccak256(&encoded);
        self.encoded.insert(hash, encoded);
        self.nodes
            .insert(hash, BuiltNode::Extension(path.to_vec(), child));
        hash
    }

    fn store_branch(&mut self, children: [Option<H256>; 16], value: Option<Vec<u8>>) -> H256 {
        let mut items = Vec::with_capacity(17);
        for child in &children {
            match child {
                Some(hash) => items.push(encode_bytes(hash)),
                None => items.push(encode_bytes(&[])),
            }
        }
        match &value {
            Some(value) => items.push(encode_bytes(value)),
            None => items.push(encode_bytes(&[])),
        }

        let encoded = encode_list(&items);
        let hash = keccak256(&encoded);
        self.encoded.insert(hash, encoded);
        self.nodes.insert(hash, BuiltNode::Branch(children, value));
        hash
    }

    /// Get a value by key.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let nibbles = to_nibbles(key);
        let mut remaining = &nibbles[..];
        let mut hash = self.root?;

        loop {
            match self.nodes.get(&hash)? {
                BuiltNode::Leaf(path, value) => {
                    return (remaining == &path[..]).then(|| value.clone());
                }
                BuiltNode::Extension(path, child) => {
                    if !remaining.starts_with(path) {
                        return None;
                    }
                    remaining = &remaining[path.len()..];
                    hash = *child;
                }
                BuiltNode::Branch(children, value) => {
                    if remaining.is_empty() {
                        return value.clone();
                    }
                    hash = children[remaining[0] as usize]?;
                    remaining = &remaining[1..];
                }
            }
        }
    }

    /// Collect the node chain a verifier needs for `key`.
    ///
    /// For a present key the chain runs down to the resolving node. For an
    /// absent key it runs down to the divergence point, which is exactly an
    /// exclusion proof.
    pub fn prove(&self, key: &[u8]) -> Vec<Vec<u8>> {
        let mut chain = Vec::new();
        let Some(mut hash) = self.root else {
            return chain;
        };
        let nibbles = to_nibbles(key);
        let mut remaining = &nibbles[..];

        loop {
            let (Some(node), Some(encoded)) = (self.nodes.get(&hash), self.encoded.get(&hash))
            else {
                return chain;
            };
            chain.push(encoded.clone());

            match node {
                BuiltNode::Leaf(..) => return chain,
                BuiltNode::Extension(path, child) => {
                    if !remaining.starts_with(path) {
                        return chain;
                    }
                    remaining = &remaining[path.len()..];
                    hash = *child;
                }
                BuiltNode::Branch(children, _) => {
                    if remaining.is_empty() {
                        return chain;
                    }
                    let Some(child) = children[remaining[0] as usize] else {
                        return chain;
                    };
                    hash = child;
                    remaining = &remaining[1..];
                }
            }
        }
    }
}

/// Helper function to find common prefix length
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

impl Default for ReferenceTrie {
    fn default() -> Self {
        Self::new()
    }
}
