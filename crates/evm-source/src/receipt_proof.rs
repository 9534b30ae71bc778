//! Builds a Merkle-Patricia inclusion proof for one receipt within a block's
//! receipts trie. Treated as an external collaborator per `SPEC_FULL.md` §9
//! ("Receipts-proof construction... `BuildReceiptProof(tx_index,
//! receipt_root_hash, receipts_in_block) -> proof_bytes`"), implemented here
//! against `alloy_trie` directly rather than a standalone library.
//!
//! Ported from the `HashBuilder` + `ProofRetainer` pattern used to generate
//! receipt MPT proofs for EVM light-client verification.

use alloy_primitives::B256;
use alloy_trie::{proof::ProofRetainer, HashBuilder, Nibbles};

use crate::errors::EvmSourceError;

pub fn rlp_encode_index(index: usize) -> Vec<u8> {
    alloy_rlp::encode(index)
}

/// Builds the receipts trie over `receipts_rlp` (each entry already encoded
/// per its EIP-2718 receipt envelope) and returns `(computed_root,
/// proof_nodes)` for `target_index`.
pub fn build_receipt_proof(
    receipts_rlp: &[Vec<u8>],
    target_index: usize,
) -> Result<(B256, Vec<Vec<u8>>), EvmSourceError> {
    if target_index >= receipts_rlp.len() {
        return Err(EvmSourceError::ProofConstruction(format!(
            "target index {target_index} out of bounds (len={})",
            receipts_rlp.len()
        )));
    }

    let mut pairs: Vec<(Nibbles, Vec<u8>)> = receipts_rlp
        .iter()
        .enumerate()
        .map(|(i, rlp)| (Nibbles::unpack(rlp_encode_index(i)), rlp.clone()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let target_key = rlp_encode_index(target_index);
    let target_nibbles = Nibbles::unpack(&target_key);
    let retainer = ProofRetainer::new(vec![target_nibbles]);

    let mut builder = HashBuilder::default().with_proof_retainer(retainer);
    for (nibbles, value) in &pairs {
        builder.add_leaf(nibbles.clone(), value);
    }

    let root = builder.root();
    let proof = builder
        .take_proof_nodes()
        .into_nodes_sorted()
        .into_iter()
        .map(|(_, node)| node.to_vec())
        .collect();

    Ok((root, proof))
}

/// Flattens a proof's node list into the single byte buffer the settlement
/// chain's `CreateBTCBStaking` message expects (length-prefixed nodes).
pub fn encode_proof_bytes(proof: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for node in proof {
        out.extend_from_slice(&(node.len() as u32).to_be_bytes());
        out.extend_from_slice(node);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlp_encode_index_matches_known_vectors() {
        assert_eq!(rlp_encode_index(0), vec![0x80]);
        assert_eq!(rlp_encode_index(1), vec![0x01]);
        assert_eq!(rlp_encode_index(127), vec![0x7f]);
        assert_eq!(rlp_encode_index(128), vec![0x81, 0x80]);
    }

    #[test]
    fn single_receipt_proof_contains_the_receipt() {
        let receipts = vec![vec![0x01, 0x02, 0x03]];
        let (root, proof) = build_receipt_proof(&receipts, 0).unwrap();
        assert_ne!(root, B256::ZERO);
        assert!(!proof.is_empty());
    }

    #[test]
    fn out_of_bounds_index_is_rejected() {
        let receipts = vec![vec![0x01]];
        assert!(build_receipt_proof(&receipts, 5).is_err());
    }
}
