//! Shared data types for the relay: the `Deposit`/`ScanCursor`/`AgentRecord`
//! row shapes that every other crate in the workspace passes around.

pub mod agent;
pub mod chain;
pub mod deposit;

pub mod prelude {
    pub use crate::{
        agent::AgentRecord,
        chain::Chain,
        deposit::{Deposit, DepositStatus, NewDeposit},
    };
}
