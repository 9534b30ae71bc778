use async_trait::async_trait;
use bitcoin::{consensus::Decodable, Block};

use crate::errors::BtcSourceError;

/// One input's resolved prevout address, used by the direct-mode
/// self-transfer filter. `None` when the query endpoint could not resolve an
/// address for that input (e.g. a non-standard scriptSig).
pub type PrevoutAddresses = Vec<Option<String>>;

/// Query capability against an Esplora-compatible BTC REST endpoint. See
/// `SPEC_FULL.md` §6. Adapted from `crates/btcio/src/rpc/traits.rs`'s
/// `L1Client` shape (thin async trait over a handful of block/tx queries),
/// widened with the prevout lookup the direct-mode self-transfer filter
/// needs.
#[async_trait]
pub trait BtcSourceClient: Send + Sync + 'static {
    async fn tip_height(&self) -> Result<u64, BtcSourceError>;

    async fn block_hash_at(&self, height: u64) -> Result<String, BtcSourceError>;

    async fn block_raw(&self, block_hash: &str) -> Result<Block, BtcSourceError>;

    /// Per-input resolved prevout addresses, in input order.
    async fn prevout_addresses(&self, txid: &str) -> Result<PrevoutAddresses, BtcSourceError>;

    /// Canonically-serialized raw transaction bytes, needed by the
    /// submitter to build a `CreateBTCStaking` message (§4.3 step 2).
    async fn tx_raw(&self, txid: &str) -> Result<Vec<u8>, BtcSourceError>;

    /// `(index, proof_bytes, block_hash)` for `txid`'s inclusion in its
    /// containing block, parsed from the query endpoint's merkle-block proof.
    async fn merkle_block_proof(&self, txid: &str) -> Result<MerkleBlockProof, BtcSourceError>;
}

/// `(index, proof_bytes, block_hash)` parsed from a BTC merkle-block proof,
/// mirrored by `relay_settlement::MerkleBlockProof` on the submission side.
#[derive(Debug, Clone)]
pub struct MerkleBlockProof {
    pub index: u32,
    pub proof_bytes: Vec<u8>,
    pub block_hash: String,
}

/// `reqwest`-backed client against an Esplora-style REST endpoint, mirroring
/// `crates/btcio/src/rpc/client.rs`'s pattern of wrapping a single library
/// handle and implementing the narrow trait other components depend on.
pub struct EsploraClient {
    http: reqwest::Client,
    base_url: String,
}

impl EsploraClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl BtcSourceClient for EsploraClient {
    async fn tip_height(&self) -> Result<u64, BtcSourceError> {
        let text = self
            .http
            .get(self.url("/blocks/tip/height"))
            .send()
            .await?
            .text()
            .await?;
        text.trim()
            .parse()
            .map_err(|_| BtcSourceError::Decode(format!("non-numeric tip height: {text}")))
    }

    async fn block_hash_at(&self, height: u64) -> Result<String, BtcSourceError> {
        let text = self
            .http
            .get(self.url(&format!("/block-height/{height}")))
            .send()
            .await?
            .text()
            .await?;
        Ok(text.trim().to_owned())
    }

    async fn block_raw(&self, block_hash: &str) -> Result<Block, BtcSourceError> {
        let bytes = self
            .http
            .get(self.url(&format!("/block/{block_hash}/raw")))
            .send()
            .await?
            .bytes()
            .await?;
        Block::consensus_decode(&mut bytes.as_ref())
            .map_err(|e| BtcSourceError::Decode(format!("block {block_hash}: {e}")))
    }

    async fn prevout_addresses(&self, txid: &str) -> Result<PrevoutAddresses, BtcSourceError> {
        let body: serde_json::Value = self
            .http
            .get(self.url(&format!("/tx/{txid}")))
            .send()
            .await?
            .json()
            .await?;

        let vin = body
            .get("vin")
            .and_then(|v| v.as_array())
            .ok_or_else(|| BtcSourceError::Decode(format!("tx {txid}: missing vin array")))?;

        Ok(vin
            .iter()
            .map(|input| {
                input
                    .get("prevout")
                    .and_then(|p| p.get("scriptpubkey_address"))
                    .and_then(|a| a.as_str())
                    .map(str::to_owned)
            })
            .collect())
    }

    async fn tx_raw(&self, txid: &str) -> Result<Vec<u8>, BtcSourceError> {
        let bytes = self
            .http
            .get(self.url(&format!("/tx/{txid}/raw")))
            .send()
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    async fn merkle_block_proof(&self, txid: &str) -> Result<MerkleBlockProof, BtcSourceError> {
        #[derive(serde::Deserialize)]
        struct Wire {
            index: u32,
            proof: String,
            block_hash: String,
        }

        let wire: Wire = self
            .http
            .get(self.url(&format!("/tx/{txid}/merkleblock-proof")))
            .send()
            .await?
            .json()
            .await?;

        let proof_bytes = hex::decode(&wire.proof)
            .map_err(|e| BtcSourceError::Decode(format!("tx {txid}: proof hex: {e}")))?;

        Ok(MerkleBlockProof {
            index: wire.index,
            proof_bytes,
            block_hash: wire.block_hash,
        })
    }
}
