use std::fmt;

/// A source chain watched by a relay instance.
///
/// Stored as its lowercase string form wherever it crosses a serialization
/// boundary (DB column, config key), matching §3/§6 of the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chain {
    Btc,
    Bnb,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Btc => "btc",
            Chain::Bnb => "bnb",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized chain identifier: {0}")]
pub struct UnknownChain(pub String);

impl std::str::FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "btc" => Ok(Chain::Btc),
            "bnb" => Ok(Chain::Bnb),
            other => Err(UnknownChain(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for chain in [Chain::Btc, Chain::Bnb] {
            let parsed: Chain = chain.as_str().parse().unwrap();
            assert_eq!(parsed, chain);
        }
    }

    #[test]
    fn rejects_unknown_chain() {
        assert!("doge".parse::<Chain>().is_err());
    }
}
