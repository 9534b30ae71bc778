//! Test-data fixtures shared across the workspace's test suites. Reconstructed
//! from the call-site contract `strata_test_utils::ArbitraryGenerator::new().generate()`
//! seen in `crates/bridge-relay/src/relayer.rs`'s test module — the upstream
//! crate ships no source in this retrieval pack, only a `Cargo.toml`.

use arbitrary::{Arbitrary, Unstructured};
use chrono::Utc;
use rand::{Rng, RngCore};
use relay_primitives::prelude::{AgentRecord, NewDeposit};
use relay_primitives::{chain::Chain, deposit::Payload};

/// Generates arbitrary values of any `T: Arbitrary` by feeding it random
/// bytes, for fixtures where the exact value doesn't matter, only that two
/// generated values are very likely distinct (dedup tests, id generation).
pub struct ArbitraryGenerator {
    rng: rand::rngs::ThreadRng,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    pub fn generate<T: for<'a> Arbitrary<'a>>(&mut self) -> T {
        let mut bytes = vec![0u8; 256];
        self.rng.fill_bytes(&mut bytes);
        let mut unstructured = Unstructured::new(&bytes);
        T::arbitrary(&mut unstructured)
            .expect("arbitrary generation should not fail with 256 random bytes")
    }
}

/// Builds a ready-to-insert BTC deposit fixture at `height`, with a random
/// txid so repeated calls don't collide on `(chain, txid)`.
pub fn btc_deposit_fixture(height: u64, receiver_address: &str, amount: u64) -> NewDeposit {
    let mut rng = rand::thread_rng();
    let txid: String = (0..64)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap())
        .collect();

    NewDeposit {
        chain: Chain::Btc,
        txid,
        height,
        block_hash: "0".repeat(64),
        block_time: Utc::now(),
        agent_id: None,
        receiver_name: "test-receiver".to_owned(),
        receiver_address: receiver_address.to_owned(),
        amount,
        payload: Payload::empty(),
    }
}

/// Builds an EVM deposit fixture with pre-encoded receipt/proof hex, as the
/// EVM scanner would produce at scan time.
pub fn evm_deposit_fixture(height: u64, tx_hash: &str) -> NewDeposit {
    NewDeposit {
        chain: Chain::Bnb,
        txid: tx_hash.to_owned(),
        height,
        block_hash: "0".repeat(64),
        block_time: Utc::now(),
        agent_id: None,
        receiver_name: "test-receiver".to_owned(),
        receiver_address: "0xtestaddr".to_owned(),
        amount: 0,
        payload: Payload::evm("deadbeef".to_owned(), "cafebabe".to_owned()),
    }
}

pub fn agent_fixture(id: u64, btc_receiving_address: &str, eth_addr: &str) -> AgentRecord {
    AgentRecord {
        id,
        name: format!("agent-{id}"),
        btc_receiving_address: btc_receiving_address.to_owned(),
        eth_addr: eth_addr.to_owned(),
        description: String::new(),
        url: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btc_fixture_has_pending_shaped_fields() {
        let dep = btc_deposit_fixture(100, "bc1qreceiver", 1000);
        assert_eq!(dep.height, 100);
        assert_eq!(dep.amount, 1000);
        assert_eq!(dep.txid.len(), 64);
    }

    #[test]
    fn generated_fixtures_have_distinct_txids() {
        let a = btc_deposit_fixture(1, "addr", 1);
        let b = btc_deposit_fixture(1, "addr", 1);
        assert_ne!(a.txid, b.txid);
    }
}
