//! End-to-end proof verification against tries built by the reference
//! implementation, plus adversarial chains built by hand.

use nonarrival_mpt::{
    encode_bytes, encode_list, encode_path, get, keccak256, verify_inclusion,
    verify_non_inclusion, walk, IntegrityError, Outcome, ReferenceTrie, VerifyError,
};

/// A trie holding one settled transaction, the dispute scenario in
/// miniature: `real-tx` arrived, `missing-tx` never did.
fn settled_trie() -> (ReferenceTrie, [u8; 32], [u8; 32], [u8; 32]) {
    let mut trie = ReferenceTrie::new();
    let key_arrived = keccak256(b"real-tx");
    trie.insert(&key_arrived, b"arrived");
    let root = trie.root().unwrap();
    let key_missing = keccak256(b"missing-tx");
    (trie, root, key_arrived, key_missing)
}

/// A deeper trie so proof chains span several hash hops.
fn populated_trie() -> (ReferenceTrie, [u8; 32]) {
    let mut trie = ReferenceTrie::new();
    for i in 0u8..12 {
        let key = keccak256(&[b"tx-".as_slice(), &[i]].concat());
        trie.insert(&key, format!("receipt-{i}").as_bytes());
    }
    let root = trie.root().unwrap();
    (trie, root)
}

#[test]
fn arrived_transaction_verifies() {
    let (trie, root, key_arrived, _) = settled_trie();
    let proof = trie.prove(&key_arrived);

    assert_eq!(
        verify_inclusion(&proof, &root, &key_arrived, b"arrived"),
        Ok(true)
    );
    assert_eq!(get(&proof, &root, &key_arrived), Ok(b"arrived".to_vec()));
}

#[test]
fn missing_transaction_is_provably_absent() {
    let (trie, root, _, key_missing) = settled_trie();
    let proof = trie.prove(&key_missing);

    assert_eq!(verify_non_inclusion(&proof, &root, &key_missing), Ok(true));
    assert_eq!(get(&proof, &root, &key_missing), Ok(Vec::new()));
}

#[test]
fn present_key_defeats_an_absence_claim() {
    // Submitting the arrived transaction's own proof with a non-arrival
    // claim must resolve to the stored value, not to absence
    let (trie, root, key_arrived, _) = settled_trie();
    let proof = trie.prove(&key_arrived);

    assert_eq!(
        walk(&proof, &root, &key_arrived),
        Ok(Outcome::Found(b"arrived".to_vec()))
    );
    assert_eq!(verify_non_inclusion(&proof, &root, &key_arrived), Ok(false));
}

#[test]
fn wrong_value_does_not_verify() {
    let (trie, root, key_arrived, _) = settled_trie();
    let proof = trie.prove(&key_arrived);

    assert_eq!(
        verify_inclusion(&proof, &root, &key_arrived, b"missing"),
        Ok(false)
    );
    assert_eq!(verify_inclusion(&proof, &root, &key_arrived, b""), Ok(false));
}

#[test]
fn every_key_in_a_populated_trie_verifies() {
    let (trie, root) = populated_trie();
    for i in 0u8..12 {
        let key = keccak256(&[b"tx-".as_slice(), &[i]].concat());
        let proof = trie.prove(&key);
        let value = format!("receipt-{i}");
        assert_eq!(
            verify_inclusion(&proof, &root, &key, value.as_bytes()),
            Ok(true),
            "key {i} failed"
        );
    }
}

#[test]
fn absent_keys_in_a_populated_trie_are_provable() {
    let (trie, root) = populated_trie();
    for i in 0u8..8 {
        let key = keccak256(&[b"ghost-".as_slice(), &[i]].concat());
        let proof = trie.prove(&key);
        assert_eq!(
            verify_non_inclusion(&proof, &root, &key),
            Ok(true),
            "ghost {i} failed"
        );
    }
}

#[test]
fn mutated_node_breaks_the_hash_chain() {
    let (trie, root) = populated_trie();
    let key = keccak256(&[b"tx-".as_slice(), &[3u8]].concat());
    let proof = trie.prove(&key);
    assert!(proof.len() >= 2, "need a multi-node chain");

    for position in 0..proof[1].len() {
        let mut broken = proof.clone();
        broken[1][position] ^= 0x01;
        let result = walk(&broken, &root, &key);
        assert!(
            matches!(
                result,
                Err(VerifyError::Integrity(IntegrityError::HashMismatch { .. }))
            ),
            "flipping byte {position} slipped through: {result:?}"
        );
    }
}

#[test]
fn mutated_root_node_is_rejected() {
    let (trie, root) = populated_trie();
    let key = keccak256(&[b"tx-".as_slice(), &[5u8]].concat());
    let mut proof = trie.prove(&key);
    proof[0][0] ^= 0x01;

    assert!(matches!(
        walk(&proof, &root, &key),
        Err(VerifyError::Integrity(IntegrityError::RootMismatch { .. }))
    ));
}

#[test]
fn truncated_chain_is_rejected_not_absent() {
    let (trie, root) = populated_trie();
    let key = keccak256(&[b"tx-".as_slice(), &[7u8]].concat());
    let mut proof = trie.prove(&key);
    assert!(proof.len() >= 2);
    proof.truncate(1);

    let result = verify_non_inclusion(&proof, &root, &key);
    assert!(matches!(
        result,
        Err(VerifyError::Integrity(IntegrityError::ProofExhausted(1)))
    ));
}

#[test]
fn embedded_node_resolves_in_place() {
    // A branch carrying a leaf inline in slot 1: one proof entry covers the
    // whole walk, with no hash hop into the embedded child
    let leaf = encode_list(&[
        encode_bytes(&encode_path(&[2, 3, 4], true)),
        encode_bytes(b"v"),
    ]);
    let mut slots: Vec<Vec<u8>> = (0..16).map(|_| encode_bytes(&[])).collect();
    slots[1] = leaf;
    slots.push(encode_bytes(&[]));
    let branch = encode_list(&slots);
    let root = keccak256(&branch);

    let key = [0x12, 0x34];
    assert_eq!(
        walk(&[branch.clone()], &root, &key),
        Ok(Outcome::Found(b"v".to_vec()))
    );

    // The sibling path through slot 1 that leaves the leaf unmatched
    let other = [0x12, 0x44];
    assert_eq!(walk(&[branch], &root, &other), Ok(Outcome::NotFound));
}

#[test]
fn runaway_embedded_chain_runs_out_of_fuel() {
    // Extensions with empty shared runs consume no nibbles; nested far
    // enough they must trip the fuel bound instead of spinning
    let mut node = encode_list(&[
        encode_bytes(&encode_path(&[1, 2], true)),
        encode_bytes(b"v"),
    ]);
    for _ in 0..64 {
        node = encode_list(&[encode_bytes(&encode_path(&[], false)), node]);
    }
    let root = keccak256(&node);

    assert_eq!(
        walk(&[node], &root, &[]),
        Err(VerifyError::Integrity(IntegrityError::FuelExhausted))
    );
}

#[test]
fn empty_proof_is_rejected() {
    assert_eq!(
        walk(&[], &[0u8; 32], &keccak256(b"any")),
        Err(VerifyError::Integrity(IntegrityError::EmptyProof))
    );
}

#[test]
fn decoder_agrees_with_the_rlp_crate() {
    let (trie, _) = populated_trie();
    let key = keccak256(&[b"tx-".as_slice(), &[0u8]].concat());

    for node in trie.prove(&key) {
        let oracle = rlp::Rlp::new(&node);
        assert!(oracle.is_list());
        let count = oracle.item_count().unwrap();

        let item = nonarrival_mpt::decode(&node).unwrap();
        let children = nonarrival_mpt::decode_list(&item).unwrap();
        assert_eq!(children.len(), count);

        for (index, child) in children.iter().enumerate() {
            let against = oracle.at(index).unwrap();
            assert_eq!(child.payload(), against.data().unwrap());
        }
    }
}
