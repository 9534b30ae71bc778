use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct BtcStakingParams {
    pub btc_confirmations_depth: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BtcHeaderChainTip {
    pub height: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BnbLatestHeader {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BnbLightClientParams {
    pub stake_plan_hub_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BtcStakingRecord {
    pub txid: String,
}

/// `(index, proof_bytes, block_hash)` parsed from a BTC merkle-block proof,
/// per `SPEC_FULL.md` §4.3 step 4.
#[derive(Debug, Clone)]
pub struct MerkleBlockProof {
    pub index: u32,
    pub proof_bytes: Vec<u8>,
    pub block_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakingTx {
    pub index: u32,
    pub block_hash: String,
    pub proof_bytes: Vec<u8>,
    pub tx_bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBtcStaking {
    pub signer: String,
    pub agent_id: u64,
    pub staking_tx: StakingTx,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBtcbStaking {
    pub signer: String,
    pub number: u64,
    pub receipt_bytes: Vec<u8>,
    pub proof_bytes: Vec<u8>,
}
