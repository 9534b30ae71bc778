//! Top-level `Config` loaded from a TOML file, and its per-component
//! sub-configs. Deserialization only; validation of cross-field invariants
//! (e.g. `confirmation_depth >= 1`) happens in [`Config::validate`].

mod config;

pub use config::{
    BalanceRefresherConfig, BtcSourceConfig, Config, ConfigError, DatabaseConfig, EvmSourceConfig,
    LoggingConfig, SettlementConfig,
};
