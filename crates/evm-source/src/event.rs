use alloy_sol_types::sol;

sol! {
    /// The StakePlanHub contract's deposit-intent event; see `SPEC_FULL.md`
    /// §6. Indexed args surface in topics 1-3, the remainder is ABI-decoded
    /// from the log data.
    #[derive(Debug)]
    event StakeBTC2JoinStakePlan(
        uint256 indexed stakeIndex,
        uint256 indexed planId,
        address indexed user,
        address btcContractAddress,
        uint256 stakeAmount,
        uint256 stBTCAmount
    );
}

pub use StakeBTC2JoinStakePlan as StakeEvent;
