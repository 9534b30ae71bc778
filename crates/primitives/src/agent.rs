/// A governance-registered recipient identity on the settlement chain.
///
/// `eth_addr` empty means the recipient expects an `OP_RETURN` payload
/// binding the deposit to an off-chain identity (OP_RETURN mode); non-empty
/// means the recipient is bound to an EVM address at registration time
/// (direct mode), and sender-origin filtering applies instead. See
/// `SPEC_FULL.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRecord {
    pub id: u64,
    pub name: String,
    pub btc_receiving_address: String,
    pub eth_addr: String,
    pub description: String,
    pub url: String,
}

impl AgentRecord {
    /// `true` when this agent expects an `OP_RETURN` payload (§4.1 mode 1)
    /// rather than operating in direct/self-transfer-filtered mode.
    pub fn is_op_return_mode(&self) -> bool {
        self.eth_addr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(eth_addr: &str) -> AgentRecord {
        AgentRecord {
            id: 1,
            name: "agent".into(),
            btc_receiving_address: "bc1qexample".into(),
            eth_addr: eth_addr.into(),
            description: String::new(),
            url: String::new(),
        }
    }

    #[test]
    fn empty_eth_addr_is_op_return_mode() {
        assert!(agent("").is_op_return_mode());
        assert!(!agent("0xabc").is_op_return_mode());
    }
}
