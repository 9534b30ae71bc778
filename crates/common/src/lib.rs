//! Reusable utilities shared by every crate in the workspace: logging setup
//! and the indefinite-retry loop shape used by the scanner and submitter.

pub mod env;
pub mod logging;
pub mod retry;
