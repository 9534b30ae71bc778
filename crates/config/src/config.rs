use bitcoin::Network;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.dbname
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BtcSourceConfig {
    pub confirmation_depth: u32,
    pub network: Network,
    pub api_endpoint: String,
    pub start_block_height: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmSourceConfig {
    pub rpc_url: String,
    pub stake_plan_hub_address: String,
    pub confirmation_depth: u32,
    pub start_block_height: u64,
}

fn default_evm_confirmation_depth() -> u32 {
    15
}

fn default_account_prefix() -> String {
    "lrz".to_owned()
}

fn default_gas_adjustment() -> f64 {
    1.5
}

fn default_gas_prices() -> String {
    "0alrz".to_owned()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_output_format() -> String {
    "json".to_owned()
}

fn default_sign_mode() -> String {
    "direct".to_owned()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    pub endpoint: String,
    pub key: String,
    #[serde(default = "default_account_prefix")]
    pub account_prefix: String,
    #[serde(default = "default_gas_adjustment")]
    pub gas_adjustment: f64,
    #[serde(default = "default_gas_prices")]
    pub gas_prices: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default = "default_sign_mode")]
    pub sign_mode: String,
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub otel_endpoint: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otel_endpoint: None,
        }
    }
}

fn default_balance_refresher_poll_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRefresherConfig {
    pub explorer_url: String,
    #[serde(default = "default_balance_refresher_poll_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub settlement: SettlementConfig,
    pub btc_source: BtcSourceConfig,
    pub evm_source: EvmSourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub balance_refresher: Option<BalanceRefresherConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("btc_source.confirmation_depth must be >= 1")]
    BtcConfirmationDepthTooLow,
    #[error("evm_source.confirmation_depth must be > 0")]
    EvmConfirmationDepthTooLow,
    #[error("evm_source.start_block_height must be > 0")]
    EvmStartHeightZero,
}

impl Config {
    /// Cross-field invariants that `serde` can't express, mirroring
    /// `SPEC_FULL.md` §6's config-key constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.btc_source.confirmation_depth < 1 {
            return Err(ConfigError::BtcConfirmationDepthTooLow);
        }
        if self.evm_source.confirmation_depth == 0 {
            return Err(ConfigError::EvmConfirmationDepthTooLow);
        }
        if self.evm_source.start_block_height == 0 {
            return Err(ConfigError::EvmStartHeightZero);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::Config;

    const MINIMAL_CONFIG: &str = r#"
        [database]
        host = "localhost"
        port = 5432
        username = "relayer"
        password = "relayer"
        dbname = "relayer"

        [settlement]
        endpoint = "http://localhost:1317"
        key = "relayer-key"

        [btc_source]
        confirmation_depth = 6
        network = "testnet"
        api_endpoint = "https://blockstream.info/testnet/api"
        start_block_height = 2000000

        [evm_source]
        rpc_url = "https://bsc-testnet.example.com"
        stake_plan_hub_address = "0x0000000000000000000000000000000000dead"
        confirmation_depth = 15
        start_block_height = 30000000
    "#;

    #[test]
    fn loads_minimal_config() {
        let config = toml::from_str::<Config>(MINIMAL_CONFIG);
        assert!(config.is_ok(), "expected minimal config to parse: {:?}", config.err());
        let config = config.unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.settlement.account_prefix, "lrz");
        assert_eq!(config.settlement.timeout_secs, 20);
        assert!(config.balance_refresher.is_none());
    }

    #[test]
    fn loads_fully_populated_config() {
        let full = format!(
            "{MINIMAL_CONFIG}\n{}",
            r#"
            [logging]
            level = "debug"
            otel_endpoint = "http://localhost:4317"

            [balance_refresher]
            explorer_url = "https://explorer.example.com"
            poll_interval_secs = 15
            "#
        );

        let config = toml::from_str::<Config>(&full).expect("full config should parse");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.balance_refresher.as_ref().unwrap().poll_interval_secs,
            15
        );
    }

    #[test]
    fn rejects_zero_btc_confirmation_depth() {
        let bad = MINIMAL_CONFIG.replace("confirmation_depth = 6", "confirmation_depth = 0");
        let config = toml::from_str::<Config>(&bad).expect("still parses");
        assert!(config.validate().is_err());
    }
}
