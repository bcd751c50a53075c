use thiserror::Error;

use crate::types::H256;

/// Malformed input: the bytes do not parse as RLP, hex-prefix, or a trie node.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Decoding was asked for an item but the buffer is empty
    #[error("empty rlp input")]
    EmptyInput,

    /// A declared length runs past the end of the buffer
    #[error("rlp item overruns its buffer")]
    UnexpectedEof,

    /// Bytes left over after the item a buffer was supposed to contain
    #[error("{0} trailing bytes after rlp item")]
    TrailingBytes(usize),

    /// Long form used for a payload the short form covers
    #[error("rlp long form used for a {0}-byte payload")]
    NonCanonicalLength(usize),

    /// Length-of-length bytes with a leading zero
    #[error("rlp length bytes have a leading zero")]
    LeadingZeroLength,

    /// A byte below 0x80 wrapped in a short-scalar header
    #[error("single byte 0x{0:02x} must encode as itself")]
    NonCanonicalSingleByte(u8),

    /// A scalar was required where a list was found
    #[error("expected a scalar, found a list")]
    ExpectedScalar,

    /// A list was required where a scalar was found
    #[error("expected a list, found a scalar")]
    ExpectedList,

    /// Hex-prefix encoding with no flag byte
    #[error("empty hex-prefix encoding")]
    EmptyPath,

    /// Flag nibble outside the four defined values
    #[error("hex-prefix flag nibble 0x{0:x} is out of range")]
    PathFlag(u8),

    /// Even-length flag with content in the padding nibble
    #[error("even-length hex-prefix path has a non-zero padding nibble")]
    PathPadding,

    /// A trie node list with an item count other than 2 or 17
    #[error("trie node has {0} items, expected 2 or 17")]
    NodeArity(usize),

    /// A node reference scalar that is neither empty nor a 32-byte hash
    #[error("node reference is {0} bytes, expected 0 or 32")]
    ChildLength(usize),

    /// An extension node whose child slot is empty
    #[error("extension node points at an empty slot")]
    EmptyExtensionChild,
}

/// Broken proof chain: well-formed nodes that do not hash together, or a
/// chain that ends before the key is resolved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("proof contains no nodes")]
    EmptyProof,

    #[error(
        "root node hashes to {}, trusted root is {}",
        hex::encode(.computed),
        hex::encode(.expected)
    )]
    RootMismatch { expected: H256, computed: H256 },

    #[error(
        "node {index} hashes to {}, parent references {}",
        hex::encode(.computed),
        hex::encode(.expected)
    )]
    HashMismatch {
        index: usize,
        expected: H256,
        computed: H256,
    },

    /// The walk needed a node the proof does not carry
    #[error("proof ends before the path is resolved, node {0} is missing")]
    ProofExhausted(usize),

    #[error("traversal exceeded its fuel budget")]
    FuelExhausted,
}

/// Any reason a proof is rejected. Strictly distinct from a proven absence:
/// a rejected proof demonstrates nothing about the key.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}
