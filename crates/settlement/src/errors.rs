use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("settlement endpoint: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decoding settlement response: {0}")]
    Decode(String),

    /// The raw error string returned by a `CreateBTCStaking`/
    /// `CreateBTCBStaking` submission. `ClassifyOutcome` in `relay-submitter`
    /// pattern-matches this string; see `SPEC_FULL.md` §4.3/§7.
    #[error("{0}")]
    Submission(String),
}
