use chrono::{DateTime, Utc};

use crate::chain::Chain;

/// Terminal/pending state of a [`Deposit`] row.
///
/// Transitions are monotone: `Pending -> {Success, Invalid,
/// ReceiverNotBelongsToAgent}`. The latter three are absorbing; see
/// `SPEC_FULL.md` §3 invariant 2 and §9's "status code for non-belonging
/// receiver" decision for why this is a distinct variant rather than folded
/// into `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositStatus {
    Pending,
    Success,
    Invalid,
    ReceiverNotBelongsToAgent,
}

impl DepositStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DepositStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Success => "success",
            DepositStatus::Invalid => "invalid",
            DepositStatus::ReceiverNotBelongsToAgent => "receiver_not_belongs_to_agent",
        }
    }
}

impl std::str::FromStr for DepositStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DepositStatus::Pending),
            "success" => Ok(DepositStatus::Success),
            "invalid" => Ok(DepositStatus::Invalid),
            "receiver_not_belongs_to_agent" => Ok(DepositStatus::ReceiverNotBelongsToAgent),
            other => Err(format!("unrecognized deposit status: {other}")),
        }
    }
}

/// Chain-specific proof material carried alongside a deposit row.
///
/// Empty for the BTC path at scan time (fetched fresh at submit time from
/// the BTC query endpoint); pre-encoded for the EVM path, where the receipt
/// and its Merkle-Patricia inclusion proof are built once during the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub receipt_hex: Option<String>,
    pub proof_hex: Option<String>,
}

impl Payload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn evm(receipt_hex: String, proof_hex: String) -> Self {
        Self {
            receipt_hex: Some(receipt_hex),
            proof_hex: Some(proof_hex),
        }
    }
}

/// One row per qualifying source-chain event, as produced by the scanner and
/// consumed by the submitter. See `SPEC_FULL.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    pub id: i64,
    pub chain: Chain,
    pub txid: String,
    pub height: u64,
    pub block_hash: String,
    pub block_time: DateTime<Utc>,
    pub agent_id: Option<u64>,
    pub receiver_name: String,
    pub receiver_address: String,
    pub amount: u64,
    pub payload: Payload,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subset of [`Deposit`] fields the scanner produces; the store assigns
/// `id`/`status`/timestamps on insert. A `NewDeposit` is always inserted as
/// `Pending` (invariant 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeposit {
    pub chain: Chain,
    pub txid: String,
    pub height: u64,
    pub block_hash: String,
    pub block_time: DateTime<Utc>,
    pub agent_id: Option<u64>,
    pub receiver_name: String,
    pub receiver_address: String,
    pub amount: u64,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!DepositStatus::Pending.is_terminal());
        assert!(DepositStatus::Success.is_terminal());
        assert!(DepositStatus::Invalid.is_terminal());
        assert!(DepositStatus::ReceiverNotBelongsToAgent.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            DepositStatus::Pending,
            DepositStatus::Success,
            DepositStatus::Invalid,
            DepositStatus::ReceiverNotBelongsToAgent,
        ] {
            let parsed: DepositStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
