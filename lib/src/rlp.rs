use sha3::{Digest, Keccak256};

use crate::error::FormatError;
use crate::types::H256;

/// Compute Keccak256 hash
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The two RLP item shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    List,
}

/// One decoded RLP item, viewed in place over the backing buffer.
///
/// No bytes are copied: `raw` and `payload` borrow from the buffer handed
/// to [`decode`], so an `Item` can never outlive the data it points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item<'a> {
    kind: Kind,
    /// Full encoding, header included
    raw: &'a [u8],
    /// Payload bytes, header stripped
    payload: &'a [u8],
}

impl<'a> Item<'a> {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_list(&self) -> bool {
        self.kind == Kind::List
    }

    /// The complete encoding of this item, including its header.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Payload of a scalar item; lists are refused.
    pub fn scalar(&self) -> Result<&'a [u8], FormatError> {
        match self.kind {
            Kind::Scalar => Ok(self.payload),
            Kind::List => Err(FormatError::ExpectedScalar),
        }
    }
}

/// Decode a buffer holding exactly one RLP item.
///
/// Trailing bytes and every non-canonical form are rejected; a buffer either
/// is the canonical encoding of one item or it does not decode at all.
pub fn decode(buf: &[u8]) -> Result<Item<'_>, FormatError> {
    let (item, rest) = take_item(buf)?;
    if !rest.is_empty() {
        return Err(FormatError::TrailingBytes(rest.len()));
    }
    Ok(item)
}

/// Split a list item's payload into its child items.
///
/// The payload must partition into whole items with zero leftover bytes.
pub fn decode_list<'a>(item: &Item<'a>) -> Result<Vec<Item<'a>>, FormatError> {
    if item.kind != Kind::List {
        return Err(FormatError::ExpectedList);
    }
    let mut items = Vec::new();
    let mut rest = item.payload;
    while !rest.is_empty() {
        let (child, tail) = take_item(rest)?;
        items.push(child);
        rest = tail;
    }
    Ok(items)
}

/// Split the leading item off a buffer, returning it and the remainder.
fn take_item(buf: &[u8]) -> Result<(Item<'_>, &[u8]), FormatError> {
    let &prefix = buf.first().ok_or(FormatError::EmptyInput)?;

    let (kind, header_len, payload_len) = match prefix {
        // Single byte, itself the payload
        0x00..=0x7f => (Kind::Scalar, 0usize, 1usize),
        // Short scalar
        0x80..=0xb7 => (Kind::Scalar, 1, (prefix - 0x80) as usize),
        // Long scalar
        0xb8..=0xbf => {
            let len_of_len = (prefix - 0xb7) as usize;
            (Kind::Scalar, 1 + len_of_len, read_length(buf, len_of_len)?)
        }
        // Short list
        0xc0..=0xf7 => (Kind::List, 1, (prefix - 0xc0) as usize),
        // Long list
        0xf8..=0xff => {
            let len_of_len = (prefix - 0xf7) as usize;
            (Kind::List, 1 + len_of_len, read_length(buf, len_of_len)?)
        }
    };

    let total = header_len
        .checked_add(payload_len)
        .ok_or(FormatError::UnexpectedEof)?;
    if buf.len() < total {
        return Err(FormatError::UnexpectedEof);
    }
    let payload = &buf[header_len..total];

    // A byte below 0x80 wrapped as 0x81,b re-encodes shorter
    if kind == Kind::Scalar && header_len == 1 && payload_len == 1 && payload[0] < 0x80 {
        return Err(FormatError::NonCanonicalSingleByte(payload[0]));
    }

    Ok((
        Item {
            kind,
            raw: &buf[..total],
            payload,
        },
        &buf[total..],
    ))
}

/// Big-endian payload length for the long scalar and list forms.
fn read_length(buf: &[u8], len_of_len: usize) -> Result<usize, FormatError> {
    if buf.len() < 1 + len_of_len {
        return Err(FormatError::UnexpectedEof);
    }
    let bytes = &buf[1..1 + len_of_len];
    if bytes[0] == 0 {
        return Err(FormatError::LeadingZeroLength);
    }
    let mut len = 0usize;
    for &byte in bytes {
        len = (len << 8) | byte as usize;
    }
    // Lengths up to 55 have a short form, the long form is not canonical
    if len <= 55 {
        return Err(FormatError::NonCanonicalLength(len));
    }
    Ok(len)
}

/// Encode a byte string using RLP
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        // Single byte less than 128: encode as itself
        data.to_vec()
    } else if data.len() < 56 {
        // Short string (0-55 bytes)
        let mut encoded = vec![0x80 + data.len() as u8];
        encoded.extend_from_slice(data);
        encoded
    } else {
        // Long string (56+ bytes)
        let len_bytes = length_to_bytes(data.len());
        let mut encoded = vec![0xb7 + len_bytes.len() as u8];
        encoded.extend_from_slice(&len_bytes);
        encoded.extend_from_slice(data);
        encoded
    }
}

/// Encode a list using RLP
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        payload.extend_from_slice(item);
    }

    if payload.len() < 56 {
        // Short list
        let mut encoded = vec![0xc0 + payload.len() as u8];
        encoded.extend_from_slice(&payload);
        encoded
    } else {
        // Long list
        let len_bytes = length_to_bytes(payload.len());
        let mut encoded = vec![0xf7 + len_bytes.len() as u8];
        encoded.extend_from_slice(&len_bytes);
        encoded.extend_from_slice(&payload);
        encoded
    }
}

/// Convert length to big-endian bytes
fn length_to_bytes(len: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut n = len;
    while n > 0 {
        bytes.push((n & 0xff) as u8);
        n >>= 8;
    }
    bytes.reverse();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_scalar(len: usize) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let encoded = encode_bytes(&data);
        let item = decode(&encoded).unwrap();
        assert_eq!(item.kind(), Kind::Scalar);
        assert_eq!(item.payload(), &data[..]);
        assert_eq!(item.raw(), &encoded[..]);
    }

    #[test]
    fn scalar_roundtrips_across_length_boundaries() {
        for len in [0, 1, 55, 56, 65535] {
            roundtrip_scalar(len);
        }
    }

    #[test]
    fn list_roundtrips_across_arity_boundaries() {
        for arity in [0usize, 1, 16, 17] {
            // 33-byte items push the 17-arity case into the long-list form
            let items: Vec<Vec<u8>> = (0..arity).map(|i| encode_bytes(&[i as u8; 32])).collect();
            let encoded = encode_list(&items);
            let item = decode(&encoded).unwrap();
            let children = decode_list(&item).unwrap();
            assert_eq!(children.len(), arity);
            for (child, original) in children.iter().zip(&items) {
                assert_eq!(child.raw(), &original[..]);
            }
        }
    }

    #[test]
    fn single_byte_decodes_as_itself() {
        let item = decode(&[0x42]).unwrap();
        assert_eq!(item.payload(), &[0x42]);

        // A high byte needs the short-scalar header
        let item = decode(&[0x81, 0xab]).unwrap();
        assert_eq!(item.payload(), &[0xab]);
    }

    #[test]
    fn wrapped_low_byte_is_rejected() {
        assert_eq!(
            decode(&[0x81, 0x05]),
            Err(FormatError::NonCanonicalSingleByte(0x05))
        );
    }

    #[test]
    fn long_form_for_short_payload_is_rejected() {
        assert_eq!(
            decode(&[0xb8, 0x05, 1, 2, 3, 4, 5]),
            Err(FormatError::NonCanonicalLength(5))
        );
    }

    #[test]
    fn leading_zero_length_is_rejected() {
        let mut buf = vec![0xb9, 0x00, 0x38];
        buf.extend_from_slice(&[0u8; 56]);
        assert_eq!(decode(&buf), Err(FormatError::LeadingZeroLength));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert_eq!(decode(&[0x83, b'd', b'o']), Err(FormatError::UnexpectedEof));
        assert_eq!(decode(&[0xb8]), Err(FormatError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert_eq!(decode(&[0x80, 0x00]), Err(FormatError::TrailingBytes(1)));
    }

    #[test]
    fn list_payload_must_partition_exactly() {
        // Payload declares one item that overruns the list
        assert_eq!(
            decode(&[0xc2, 0x82, 0x00]).and_then(|item| decode_list(&item)),
            Err(FormatError::UnexpectedEof)
        );
    }

    #[test]
    fn scalar_is_not_a_list() {
        let encoded = encode_bytes(b"dog");
        let item = decode(&encoded).unwrap();
        assert_eq!(decode_list(&item), Err(FormatError::ExpectedList));
        assert_eq!(item.scalar().unwrap(), b"dog");

        let list = decode(&[0xc0]).unwrap();
        assert_eq!(list.scalar(), Err(FormatError::ExpectedScalar));
    }

    #[test]
    fn encode_matches_known_vectors() {
        assert_eq!(encode_bytes(&[0x42]), vec![0x42]);
        assert_eq!(encode_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(encode_bytes(b""), vec![0x80]);
        let encoded = encode_list(&[encode_bytes(b"cat"), encode_bytes(b"dog")]);
        assert_eq!(encoded[0], 0xc8);
    }

    #[test]
    fn keccak_has_expected_width() {
        assert_eq!(keccak256(b"hello").len(), 32);
    }
}
