pub mod client;
pub mod errors;
pub mod op_return;
pub mod scan;

pub use client::{BtcSourceClient, EsploraClient, MerkleBlockProof};
pub use errors::BtcSourceError;
pub use scan::{scan_forever, BtcScannerConfig};
