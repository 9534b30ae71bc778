use async_trait::async_trait;
use relay_primitives::prelude::AgentRecord;
use relay_registry::source::{AgentPage, SettlementAgentSource};

use crate::{
    errors::SettlementError,
    types::{
        BnbLatestHeader, BnbLightClientParams, BtcHeaderChainTip, BtcStakingParams,
        BtcStakingRecord, CreateBtcStaking, CreateBtcbStaking,
    },
};

/// The settlement chain's signing/query client, consumed as an opaque
/// external collaborator per `SPEC_FULL.md` §1/§6. Mirrors
/// `crates/btcio/src/rpc/traits.rs`'s thin-async-trait-over-a-handle shape.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SettlementClient: Send + Sync + 'static {
    async fn query_btc_staking_params(&self) -> Result<BtcStakingParams, SettlementError>;

    async fn agents(&self, key: Option<String>) -> Result<(Vec<AgentRecord>, Option<String>), SettlementError>;

    async fn btc_header_chain_tip(&self) -> Result<BtcHeaderChainTip, SettlementError>;

    async fn bnb_latest_header(&self) -> Result<BnbLatestHeader, SettlementError>;

    async fn bnb_light_client_params(&self) -> Result<BnbLightClientParams, SettlementError>;

    async fn get_btc_staking_record(
        &self,
        txid: &str,
    ) -> Result<Option<BtcStakingRecord>, SettlementError>;

    async fn create_btc_staking(&self, msg: CreateBtcStaking) -> Result<(), SettlementError>;

    async fn create_btcb_staking(&self, msg: CreateBtcbStaking) -> Result<(), SettlementError>;

    async fn must_get_addr(&self) -> Result<String, SettlementError>;
}

/// Bridges [`SettlementClient::agents`] to the [`SettlementAgentSource`]
/// contract `relay-registry` bootstraps from, so the registry doesn't need
/// to know about this crate's concrete client type.
pub struct AgentSourceAdapter<'a>(pub &'a dyn SettlementClient);

#[async_trait]
impl SettlementAgentSource for AgentSourceAdapter<'_> {
    async fn agents_page(
        &self,
        key: Option<&str>,
    ) -> Result<AgentPage, relay_registry::errors::RegistryError> {
        let (agents, next_key) = self
            .0
            .agents(key.map(str::to_owned))
            .await
            .map_err(|e| relay_registry::errors::RegistryError::Source(e.to_string()))?;
        Ok(AgentPage { agents, next_key })
    }
}

/// `reqwest`-backed client against the settlement chain's LCD-style
/// REST/JSON-RPC gateway. Modeled on `crates/btcio/src/rpc/client.rs`'s
/// `BitcoinDClient(Client)` single-handle wrapper.
pub struct RestSettlementClient {
    http: reqwest::Client,
    base_url: String,
    signer: String,
}

impl RestSettlementClient {
    pub fn new(base_url: impl Into<String>, signer: impl Into<String>, timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a plain timeout");
        Self {
            http,
            base_url: base_url.into(),
            signer: signer.into(),
        }
    }

    pub fn from_config(cfg: &relay_config::SettlementConfig) -> Self {
        Self::new(
            cfg.endpoint.clone(),
            cfg.key.clone(),
            std::time::Duration::from_secs(cfg.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SettlementError> {
        self.http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(SettlementError::from)
    }

    async fn post_json<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), SettlementError> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SettlementError::Submission(format!("post failed: {e}")))?;
        if resp.status().is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(SettlementError::Submission(text))
    }
}

#[async_trait]
impl SettlementClient for RestSettlementClient {
    async fn query_btc_staking_params(&self) -> Result<BtcStakingParams, SettlementError> {
        self.get_json("/lorenzo/btcstaking/v1/params").await
    }

    async fn agents(
        &self,
        key: Option<String>,
    ) -> Result<(Vec<AgentRecord>, Option<String>), SettlementError> {
        #[derive(serde::Deserialize)]
        struct AgentsResponse {
            agents: Vec<WireAgent>,
            next_key: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct WireAgent {
            id: u64,
            name: String,
            btc_receiving_address: String,
            eth_addr: String,
            description: String,
            url: String,
        }

        let path = match &key {
            Some(k) => format!("/lorenzo/btcstaking/v1/agents?pagination.key={k}"),
            None => "/lorenzo/btcstaking/v1/agents".to_owned(),
        };
        let resp: AgentsResponse = self.get_json(&path).await?;
        let agents = resp
            .agents
            .into_iter()
            .map(|a| AgentRecord {
                id: a.id,
                name: a.name,
                btc_receiving_address: a.btc_receiving_address,
                eth_addr: a.eth_addr,
                description: a.description,
                url: a.url,
            })
            .collect();
        Ok((agents, resp.next_key))
    }

    async fn btc_header_chain_tip(&self) -> Result<BtcHeaderChainTip, SettlementError> {
        self.get_json("/lorenzo/btclightclient/v1/tip").await
    }

    async fn bnb_latest_header(&self) -> Result<BnbLatestHeader, SettlementError> {
        self.get_json("/lorenzo/bnblightclient/v1/latest_header").await
    }

    async fn bnb_light_client_params(&self) -> Result<BnbLightClientParams, SettlementError> {
        self.get_json("/lorenzo/bnblightclient/v1/params").await
    }

    async fn get_btc_staking_record(
        &self,
        txid: &str,
    ) -> Result<Option<BtcStakingRecord>, SettlementError> {
        let path = format!("/lorenzo/btcstaking/v1/record/{txid}");
        let resp = self.http.get(self.url(&path)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: BtcStakingRecord = resp.error_for_status()?.json().await?;
        Ok(Some(record))
    }

    async fn create_btc_staking(&self, msg: CreateBtcStaking) -> Result<(), SettlementError> {
        self.post_json("/lorenzo/btcstaking/v1/tx/create_btc_staking", &msg)
            .await
    }

    async fn create_btcb_staking(&self, msg: CreateBtcbStaking) -> Result<(), SettlementError> {
        self.post_json("/lorenzo/btcstaking/v1/tx/create_btcb_staking", &msg)
            .await
    }

    async fn must_get_addr(&self) -> Result<String, SettlementError> {
        Ok(self.signer.clone())
    }
}
