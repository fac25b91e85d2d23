//! # Coin Ledger Repository
//!
//! Durable coin accounting: balances plus a two-phase hold ledger.
//!
//! A paid action never debits-and-hopes. It reserves its price first
//! (atomically, guarded against overdraft), runs, and then settles the hold:
//! commit on success, release (refund) on failure. Every hold is a durable
//! `ledger_entries` row, so a crash between reserve and settle leaves an
//! auditable `reserved` record instead of silently lost coins.

use super::models::{HoldState, LedgerEntry};
use super::DbPool;
use crate::pricing::ToolId;
use sqlx::query_as;
use tracing::warn;

/// Result of a reserve attempt.
#[derive(Debug)]
pub enum ReserveOutcome {
    /// Hold placed; the entry id is the ticket for commit/release.
    Held(LedgerEntry),
    /// Balance below price; nothing was debited.
    InsufficientBalance { available: i64 },
}

/// Result of a settle (commit or release) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled,
    /// The entry was already committed or released; settling is a no-op.
    AlreadySettled,
}

/// Ledger repository for coin account and hold operations.
pub struct LedgerRepository;

impl LedgerRepository {
    /// Create a coin account for a user, crediting an initial grant.
    ///
    /// Idempotent: an existing account is left untouched.
    pub async fn create_account(
        pool: &DbPool,
        user_id: i64,
        initial_grant: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO coin_accounts (user_id, balance) VALUES (?, ?)")
            .bind(user_id)
            .bind(initial_grant)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Current balance for a user. Missing accounts read as zero.
    pub async fn balance(pool: &DbPool, user_id: i64) -> Result<i64, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT balance FROM coin_accounts WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(b,)| b).unwrap_or(0))
    }

    /// Credit coins to a user (purchase or grant). Returns the new balance.
    pub async fn credit(pool: &DbPool, user_id: i64, amount: i64) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO coin_accounts (user_id, balance) VALUES (?, ?)
             ON CONFLICT(user_id) DO UPDATE
             SET balance = balance + excluded.balance, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        let (balance,): (i64,) =
            sqlx::query_as("SELECT balance FROM coin_accounts WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(balance)
    }

    /// Atomically reserve the price of a tool run.
    ///
    /// The debit is guarded with `balance >= price` inside a single UPDATE,
    /// so concurrent reserves can never drive the balance negative. When the
    /// guard refuses, no row is touched and no ledger entry is written.
    pub async fn reserve(
        pool: &DbPool,
        user_id: i64,
        tool: ToolId,
        amount: i64,
    ) -> Result<ReserveOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let debited = sqlx::query(
            "UPDATE coin_accounts
             SET balance = balance - ?, updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ? AND balance >= ?",
        )
        .bind(amount)
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() == 0 {
            let available: i64 =
                sqlx::query_as::<_, (i64,)>("SELECT balance FROM coin_accounts WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .map(|(b,)| b)
                    .unwrap_or(0);
            tx.rollback().await?;
            return Ok(ReserveOutcome::InsufficientBalance { available });
        }

        let inserted = sqlx::query(
            "INSERT INTO ledger_entries (user_id, tool, amount, state) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(tool.to_string())
        .bind(amount)
        .bind(HoldState::Reserved.to_string())
        .execute(&mut *tx)
        .await?;

        let entry = query_as::<_, LedgerEntry>("SELECT * FROM ledger_entries WHERE id = ?")
            .bind(inserted.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ReserveOutcome::Held(entry))
    }

    /// Commit a reserved hold: the paid action counts as performed.
    ///
    /// Idempotent on settled entries.
    pub async fn commit(pool: &DbPool, entry_id: i64) -> Result<SettleOutcome, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE ledger_entries
             SET state = ?, settled_at = CURRENT_TIMESTAMP
             WHERE id = ? AND state = ?",
        )
        .bind(HoldState::Committed.to_string())
        .bind(entry_id)
        .bind(HoldState::Reserved.to_string())
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            warn!(entry_id, "Commit on a hold that is not reserved; ignoring");
            return Ok(SettleOutcome::AlreadySettled);
        }
        Ok(SettleOutcome::Settled)
    }

    /// Release a reserved hold, refunding the held coins.
    ///
    /// Idempotent on settled entries: a second release never refunds twice.
    pub async fn release(pool: &DbPool, entry_id: i64) -> Result<SettleOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let entry: Option<LedgerEntry> =
            query_as::<_, LedgerEntry>("SELECT * FROM ledger_entries WHERE id = ?")
                .bind(entry_id)
                .fetch_optional(&mut *tx)
                .await?;

        let entry = match entry {
            Some(e) if e.state == HoldState::Reserved => e,
            Some(_) => {
                warn!(entry_id, "Release on a hold that is not reserved; ignoring");
                tx.rollback().await?;
                return Ok(SettleOutcome::AlreadySettled);
            }
            None => {
                tx.rollback().await?;
                return Err(sqlx::Error::RowNotFound);
            }
        };

        // Guarded like commit; the read above is not enough on its own if a
        // concurrent settle lands between the SELECT and this UPDATE
        let updated = sqlx::query(
            "UPDATE ledger_entries
             SET state = ?, settled_at = CURRENT_TIMESTAMP
             WHERE id = ? AND state = ?",
        )
        .bind(HoldState::Released.to_string())
        .bind(entry_id)
        .bind(HoldState::Reserved.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            warn!(entry_id, "Release lost the settle race; ignoring");
            tx.rollback().await?;
            return Ok(SettleOutcome::AlreadySettled);
        }

        sqlx::query(
            "UPDATE coin_accounts
             SET balance = balance + ?, updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ?",
        )
        .bind(entry.amount)
        .bind(entry.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(SettleOutcome::Settled)
    }

    /// Fetch a ledger entry by id.
    pub async fn entry(pool: &DbPool, entry_id: i64) -> Result<Option<LedgerEntry>, sqlx::Error> {
        query_as::<_, LedgerEntry>("SELECT * FROM ledger_entries WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(pool)
            .await
    }

    /// Ledger entries for a user, newest first.
    pub async fn entries_for_user(
        pool: &DbPool,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        query_as::<_, LedgerEntry>(
            "SELECT * FROM ledger_entries WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::test_support::setup_test_db;

    #[tokio::test]
    async fn test_create_account_and_balance() {
        let pool = setup_test_db().await;

        LedgerRepository::create_account(&pool, 1, 25).await.unwrap();
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 25);

        // Idempotent: a second create does not re-grant
        LedgerRepository::create_account(&pool, 1, 25).await.unwrap();
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_missing_account_reads_zero() {
        let pool = setup_test_db().await;
        assert_eq!(LedgerRepository::balance(&pool, 42).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_credit() {
        let pool = setup_test_db().await;

        LedgerRepository::create_account(&pool, 1, 0).await.unwrap();
        let balance = LedgerRepository::credit(&pool, 1, 600).await.unwrap();
        assert_eq!(balance, 600);
    }

    #[tokio::test]
    async fn test_reserve_refused_below_price() {
        let pool = setup_test_db().await;
        LedgerRepository::create_account(&pool, 1, 3).await.unwrap();

        let outcome = LedgerRepository::reserve(&pool, 1, ToolId::RemoveBackground, 5)
            .await
            .unwrap();

        match outcome {
            ReserveOutcome::InsufficientBalance { available } => assert_eq!(available, 3),
            ReserveOutcome::Held(_) => panic!("Reserve must refuse when balance < price"),
        }

        // No debit, no ledger entry
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 3);
        assert!(LedgerRepository::entries_for_user(&pool, 1, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_reserve_then_commit() {
        let pool = setup_test_db().await;
        LedgerRepository::create_account(&pool, 1, 10).await.unwrap();

        let entry = match LedgerRepository::reserve(&pool, 1, ToolId::RemoveBackground, 5)
            .await
            .unwrap()
        {
            ReserveOutcome::Held(e) => e,
            other => panic!("Expected hold, got {:?}", other),
        };

        assert_eq!(entry.state, HoldState::Reserved);
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 5);

        let outcome = LedgerRepository::commit(&pool, entry.id).await.unwrap();
        assert_eq!(outcome, SettleOutcome::Settled);

        let settled = LedgerRepository::entry(&pool, entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled.state, HoldState::Committed);
        assert!(settled.settled_at.is_some());
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_release_refunds_exact_amount() {
        let pool = setup_test_db().await;
        LedgerRepository::create_account(&pool, 1, 10).await.unwrap();

        let entry = match LedgerRepository::reserve(&pool, 1, ToolId::MarketAnalysis, 10)
            .await
            .unwrap()
        {
            ReserveOutcome::Held(e) => e,
            other => panic!("Expected hold, got {:?}", other),
        };
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 0);

        let outcome = LedgerRepository::release(&pool, entry.id).await.unwrap();
        assert_eq!(outcome, SettleOutcome::Settled);
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_double_settle_is_noop() {
        let pool = setup_test_db().await;
        LedgerRepository::create_account(&pool, 1, 10).await.unwrap();

        let entry = match LedgerRepository::reserve(&pool, 1, ToolId::Resize, 2)
            .await
            .unwrap()
        {
            ReserveOutcome::Held(e) => e,
            other => panic!("Expected hold, got {:?}", other),
        };

        assert_eq!(
            LedgerRepository::release(&pool, entry.id).await.unwrap(),
            SettleOutcome::Settled
        );
        // Second release must not refund again
        assert_eq!(
            LedgerRepository::release(&pool, entry.id).await.unwrap(),
            SettleOutcome::AlreadySettled
        );
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 10);

        // Commit after release is also a no-op
        assert_eq!(
            LedgerRepository::commit(&pool, entry.id).await.unwrap(),
            SettleOutcome::AlreadySettled
        );
    }

    #[tokio::test]
    async fn test_release_after_commit_refunds_nothing() {
        let pool = setup_test_db().await;
        LedgerRepository::create_account(&pool, 1, 10).await.unwrap();

        let entry = match LedgerRepository::reserve(&pool, 1, ToolId::RemoveBackground, 5)
            .await
            .unwrap()
        {
            ReserveOutcome::Held(e) => e,
            other => panic!("Expected hold, got {:?}", other),
        };

        assert_eq!(
            LedgerRepository::commit(&pool, entry.id).await.unwrap(),
            SettleOutcome::Settled
        );
        assert_eq!(
            LedgerRepository::release(&pool, entry.id).await.unwrap(),
            SettleOutcome::AlreadySettled
        );

        // The committed charge stands
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 5);
        let settled = LedgerRepository::entry(&pool, entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled.state, HoldState::Committed);
    }

    #[tokio::test]
    async fn test_release_unknown_entry_errors() {
        let pool = setup_test_db().await;
        let result = LedgerRepository::release(&pool, 777).await;
        assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_every_tool_refused_when_broke() {
        let pool = setup_test_db().await;
        LedgerRepository::create_account(&pool, 1, 1).await.unwrap();

        for tool in ToolId::ALL {
            let outcome = LedgerRepository::reserve(&pool, 1, tool, tool.price())
                .await
                .unwrap();
            assert!(
                matches!(outcome, ReserveOutcome::InsufficientBalance { .. }),
                "{} must be refused with balance 1",
                tool
            );
        }
        assert_eq!(LedgerRepository::balance(&pool, 1).await.unwrap(), 1);
    }
}
