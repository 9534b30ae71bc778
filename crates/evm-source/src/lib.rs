pub mod client;
pub mod errors;
pub mod event;
pub mod receipt_proof;
pub mod scan;

pub use client::{stake_event_topic, stake_plan_hub_filter, AlloyEvmSourceClient, EvmSourceClient};
pub use errors::EvmSourceError;
pub use scan::{scan_forever, EvmScannerConfig, EVM_SCAN_BATCH};
