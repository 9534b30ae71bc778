//! One-shot balance-refresher subcommand. Pokes a blockscout-style explorer
//! API once per recognized receiver, per `SPEC_FULL.md` §6's
//! `refresh-balances` contract. Ported from `original_source/blockscout/refresher.go`'s
//! `refreshBlockscoutBalance`/`checkOrInsertAccountToBlockscout`, dropping
//! that file's indefinite polling loop over Lorenzo event ranges — this
//! subcommand visits the registry once and exits, as the distilled contract
//! specifies, rather than the original's forever-loop daemon.

use relay_registry::AgentRegistry;
use tracing::{info, warn};

pub async fn refresh_balances(explorer_url: &str, registry: &AgentRegistry) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let mut failures = 0usize;

    for agent in registry.all() {
        let addr = &agent.btc_receiving_address;
        match refresh_one(&http, explorer_url, addr).await {
            Ok(()) => info!(%addr, "balance refreshed"),
            Err(err) => {
                warn!(%addr, %err, "balance refresh failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} receiver(s) failed to refresh");
    }
    Ok(())
}

async fn refresh_one(http: &reqwest::Client, explorer_url: &str, addr: &str) -> anyhow::Result<()> {
    let check_url = format!("{explorer_url}/v2/search/check-redirect?q={addr}");
    let check: serde_json::Value = http
        .get(check_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if check.get("type").and_then(|t| t.as_str()) != Some("address") {
        anyhow::bail!("{addr} is not a recognized explorer address");
    }

    let refresh_url = format!("{explorer_url}/v2/addresses/{addr}/refresh");
    let refreshed: serde_json::Value = http
        .get(refresh_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if refreshed.get("result").and_then(|r| r.as_str()) != Some("executed update") {
        anyhow::bail!("explorer did not report an executed update for {addr}");
    }
    Ok(())
}
