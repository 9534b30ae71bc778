use chrono::{DateTime, Utc};
use relay_primitives::{
    chain::Chain,
    deposit::{Deposit, DepositStatus, NewDeposit, Payload},
};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::errors::StoreError;

/// How many pending rows [`DepositStore::get_unhandled`] returns per call;
/// see `SPEC_FULL.md` §4.2.
pub const UNHANDLED_BATCH_SIZE: i64 = 50;

/// The C2 Durable Queue Store: a Postgres-backed, idempotent, ordered store
/// of deposit rows and per-chain scan cursors.
///
/// Grounded on `crates/db/src/errors.rs`'s error-enum shape (adapted to
/// `sqlx`) and `crates/btcio/src/rpc/client.rs`'s thin-wrapper-around-a-
/// library-handle pattern, here wrapping a [`PgPool`] instead of an RPC
/// client.
#[derive(Clone)]
pub struct DepositStore {
    pool: PgPool,
}

impl DepositStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Exposed for callers that already have a pool (e.g. test fixtures
    /// sharing one pool across several `DepositStore` instances).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Idempotent bulk insert: existing `(chain, txid)` rows are silently
    /// kept, new rows appended as `Pending`. Runs inside a single
    /// transaction. See invariant 1/3 and the "scan at crash boundary" open
    /// question in `SPEC_FULL.md` §9 — this does not also advance the
    /// cursor; callers call [`set_scan_cursor`](Self::set_scan_cursor)
    /// separately once the insert has committed.
    pub async fn insert_deposits(&self, rows: &[NewDeposit]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO deposit
                    (chain, txid, height, block_hash, block_time, agent_id,
                     receiver_name, receiver_address, amount,
                     payload_receipt, payload_proof, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
                ON CONFLICT (chain, txid) DO NOTHING
                "#,
            )
            .bind(row.chain.as_str())
            .bind(&row.txid)
            .bind(row.height as i64)
            .bind(&row.block_hash)
            .bind(row.block_time)
            .bind(row.agent_id.map(|id| id as i64))
            .bind(&row.receiver_name)
            .bind(&row.receiver_address)
            .bind(row.amount as i64)
            .bind(&row.payload.receipt_hex)
            .bind(&row.payload.proof_hex)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Returns up to [`UNHANDLED_BATCH_SIZE`] `Pending` rows for `chain`
    /// whose height is `<= max_eligible_height`, ordered by `height ASC,
    /// txid ASC`. Callers compute `max_eligible_height` from the settlement
    /// tip and (for BTC) the `k`-depth gate before calling this — see
    /// `relay-submitter`'s gating loop.
    pub async fn get_unhandled(
        &self,
        chain: Chain,
        max_eligible_height: u64,
    ) -> Result<Vec<Deposit>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, chain, txid, height, block_hash, block_time, agent_id,
                   receiver_name, receiver_address, amount,
                   payload_receipt, payload_proof, status, created_at, updated_at
            FROM deposit
            WHERE chain = $1 AND status = 'pending' AND height <= $2
            ORDER BY height ASC, txid ASC
            LIMIT $3
            "#,
        )
        .bind(chain.as_str())
        .bind(max_eligible_height as i64)
        .bind(UNHANDLED_BATCH_SIZE)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_deposit).collect()
    }

    /// The lowest pending height for `chain`, used by the submitter to
    /// evaluate the settlement-tip gate (§4.3) before bothering to fetch a
    /// batch.
    pub async fn min_pending_height(&self, chain: Chain) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query(
            "SELECT MIN(height) AS min_height FROM deposit WHERE chain = $1 AND status = 'pending'",
        )
        .bind(chain.as_str())
        .fetch_one(&self.pool)
        .await?;

        let min_height: Option<i64> = row.try_get("min_height")?;
        Ok(min_height.map(|h| h as u64))
    }

    /// Monotone transition to a terminal status. No-op if the row is already
    /// terminal with the same value. Attempting to move an already-terminal
    /// row to a *different* terminal status is a caller bug and returns
    /// [`StoreError::StatusDowngrade`] (invariant 2 in `SPEC_FULL.md` §3).
    pub async fn mark_status(
        &self,
        chain: Chain,
        txid: &str,
        status: DepositStatus,
    ) -> Result<(), StoreError> {
        let current: Option<String> = sqlx::query(
            "SELECT status FROM deposit WHERE chain = $1 AND txid = $2",
        )
        .bind(chain.as_str())
        .bind(txid)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.try_get::<String, _>("status"))
        .transpose()?;

        match current.as_deref() {
            None => return Ok(()),
            Some("pending") => {}
            Some(existing) if existing == status.as_str() => return Ok(()),
            Some(existing) => {
                return Err(StoreError::StatusDowngrade {
                    chain: chain.as_str().to_owned(),
                    txid: txid.to_owned(),
                    from: existing.to_owned(),
                    to: status.as_str().to_owned(),
                })
            }
        }

        sqlx::query(
            "UPDATE deposit SET status = $1, updated_at = now() WHERE chain = $2 AND txid = $3",
        )
        .bind(status.as_str())
        .bind(chain.as_str())
        .bind(txid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns 0 when unset, per `SPEC_FULL.md` §4.2.
    pub async fn get_scan_cursor(&self, chain: Chain) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT last_scanned_height FROM cursor WHERE chain = $1")
            .bind(chain.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let height: i64 = row.try_get("last_scanned_height")?;
                Ok(height as u64)
            }
            None => Ok(0),
        }
    }

    pub async fn set_scan_cursor(&self, chain: Chain, height: u64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cursor (chain, last_scanned_height)
            VALUES ($1, $2)
            ON CONFLICT (chain) DO UPDATE SET last_scanned_height = EXCLUDED.last_scanned_height
            "#,
        )
        .bind(chain.as_str())
        .bind(height as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_deposit(row: sqlx::postgres::PgRow) -> Result<Deposit, StoreError> {
    let chain: String = row.try_get("chain")?;
    let status: String = row.try_get("status")?;
    let height: i64 = row.try_get("height")?;
    let amount: i64 = row.try_get("amount")?;
    let agent_id: Option<i64> = row.try_get("agent_id")?;
    let block_time: DateTime<Utc> = row.try_get("block_time")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Deposit {
        id: row.try_get("id")?,
        chain: chain
            .parse()
            .map_err(|e: relay_primitives::chain::UnknownChain| StoreError::Other(e.to_string()))?,
        txid: row.try_get("txid")?,
        height: height as u64,
        block_hash: row.try_get("block_hash")?,
        block_time,
        agent_id: agent_id.map(|id| id as u64),
        receiver_name: row.try_get("receiver_name")?,
        receiver_address: row.try_get("receiver_address")?,
        amount: amount as u64,
        payload: Payload {
            receipt_hex: row.try_get("payload_receipt")?,
            proof_hex: row.try_get("payload_proof")?,
        },
        status: status
            .parse()
            .map_err(StoreError::Other)?,
        created_at,
        updated_at,
    })
}
