use relay_settlement::SettlementError;

/// Result of classifying a settlement submission outcome. See
/// `SPEC_FULL.md` §4.3's classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Mark the row terminal `Success` and advance.
    Success,
    /// Keep the row at the head of the batch and retry after a short sleep.
    Retryable,
    /// Mark the row terminal `Invalid` and advance.
    Terminal,
}

/// Error messages that mean the settlement chain already has this deposit
/// recorded; equivalent to a successful submission.
const SUCCESS_EQUIVALENT_SUBSTRINGS: &[&str] = &["duplicate btc transaction", "duplicate event"];

/// Error messages that mean the call didn't land for a transient reason;
/// the row is retried unchanged.
const RETRYABLE_SUBSTRINGS: &[&str] = &[
    "context deadline exceeded",
    "post failed",
    "account sequence mismatch",
    "not k-deep",
    "btc block header not found",
];

/// Pure classification of a submission result. Takes the substring table as
/// data rather than interleaving string matches with control flow — see
/// `SPEC_FULL.md` §9, "implicit retry loops -> explicit classification".
pub fn classify_outcome(result: &Result<(), SettlementError>) -> Outcome {
    let Err(err) = result else {
        return Outcome::Success;
    };
    let message = err.to_string();
    if SUCCESS_EQUIVALENT_SUBSTRINGS
        .iter()
        .any(|needle| message.contains(needle))
    {
        return Outcome::Success;
    }
    if RETRYABLE_SUBSTRINGS.iter().any(|needle| message.contains(needle)) {
        return Outcome::Retryable;
    }
    Outcome::Terminal
}

#[cfg(test)]
mod tests {
    use relay_settlement::SettlementError;

    use super::*;

    fn submission(msg: &str) -> Result<(), SettlementError> {
        Err(SettlementError::Submission(msg.to_owned()))
    }

    #[test]
    fn ok_is_success() {
        assert_eq!(classify_outcome(&Ok(())), Outcome::Success);
    }

    #[test]
    fn btc_duplicate_is_success() {
        assert_eq!(
            classify_outcome(&submission("duplicate btc transaction: already staked")),
            Outcome::Success
        );
    }

    #[test]
    fn bnb_duplicate_is_success() {
        assert_eq!(
            classify_outcome(&submission("rpc error: duplicate event")),
            Outcome::Success
        );
    }

    #[test]
    fn transient_errors_are_retryable() {
        for msg in [
            "context deadline exceeded",
            "post failed: connection reset",
            "account sequence mismatch, expected 5, got 3",
            "staking tx is not k-deep yet",
            "btc block header not found for hash abcd",
        ] {
            assert_eq!(classify_outcome(&submission(msg)), Outcome::Retryable, "{msg}");
        }
    }

    #[test]
    fn unrecognized_errors_are_terminal() {
        assert_eq!(
            classify_outcome(&submission("invalid signature")),
            Outcome::Terminal
        );
    }
}
