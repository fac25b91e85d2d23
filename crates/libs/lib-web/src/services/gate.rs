//! # Action Gate
//!
//! Coin gating for paid actions using a two-phase protocol:
//!
//! 1. `reserve` debits the tool price atomically and records a durable hold
//! 2. the caller runs the paid work
//! 3. `commit` finalizes the hold, or `release` refunds it on failure
//!
//! The gate never debits-and-hopes: a failed reservation leaves the balance
//! untouched, and a failed run gets its coins back. Every phase publishes the
//! post-change balance on the [`BalanceFeed`].

use super::balance_feed::BalanceFeed;
use lib_core::dto::BalanceEvent;
use lib_core::model::store::ledger_repository::{LedgerRepository, ReserveOutcome, SettleOutcome};
use lib_core::{AppError, DbPool, ToolId};
use tracing::{info, warn};

/// Ticket for a placed hold, consumed by `commit` or `release`.
#[derive(Debug, Clone, Copy)]
pub struct Hold {
    pub entry_id: i64,
    pub user_id: i64,
    pub amount: i64,
}

/// Gate over the coin ledger for paid actions.
#[derive(Clone)]
pub struct ActionGate {
    db: DbPool,
    feed: BalanceFeed,
}

impl ActionGate {
    pub fn new(db: DbPool, feed: BalanceFeed) -> Self {
        Self { db, feed }
    }

    /// Reserve the price of a tool from a user's balance.
    ///
    /// # Errors
    ///
    /// - `InsufficientBalance` when the balance does not cover the price;
    ///   nothing was debited
    /// - `PaymentFailed` when the ledger itself fails
    pub async fn reserve(&self, user_id: i64, tool: ToolId) -> Result<Hold, AppError> {
        let price = tool.price();

        let outcome = LedgerRepository::reserve(&self.db, user_id, tool, price)
            .await
            .map_err(|e| AppError::PaymentFailed(format!("Reserve failed: {}", e)))?;

        match outcome {
            ReserveOutcome::Held(entry) => {
                info!(
                    user_id,
                    tool = %tool,
                    price,
                    entry_id = entry.id,
                    "[GATE] Hold placed"
                );
                self.publish_balance(user_id).await;
                Ok(Hold {
                    entry_id: entry.id,
                    user_id,
                    amount: price,
                })
            }
            ReserveOutcome::InsufficientBalance { available } => {
                info!(
                    user_id,
                    tool = %tool,
                    price,
                    available,
                    "[GATE] Refused: insufficient balance"
                );
                Err(AppError::InsufficientBalance {
                    needed: price,
                    available,
                })
            }
        }
    }

    /// Finalize a hold after the paid work succeeded.
    ///
    /// Returns the balance after the charge. Settling an already-settled
    /// hold is a no-op.
    pub async fn commit(&self, hold: Hold) -> Result<i64, AppError> {
        let outcome = LedgerRepository::commit(&self.db, hold.entry_id)
            .await
            .map_err(|e| AppError::PaymentFailed(format!("Commit failed: {}", e)))?;

        if outcome == SettleOutcome::AlreadySettled {
            warn!(entry_id = hold.entry_id, "[GATE] Commit on settled hold");
        }

        let balance = self.balance(hold.user_id).await?;
        Ok(balance)
    }

    /// Refund a hold after the paid work failed.
    ///
    /// Returns the balance after the refund.
    pub async fn release(&self, hold: Hold) -> Result<i64, AppError> {
        let outcome = LedgerRepository::release(&self.db, hold.entry_id)
            .await
            .map_err(|e| AppError::PaymentFailed(format!("Release failed: {}", e)))?;

        if outcome == SettleOutcome::AlreadySettled {
            warn!(entry_id = hold.entry_id, "[GATE] Release on settled hold");
        } else {
            info!(
                user_id = hold.user_id,
                entry_id = hold.entry_id,
                amount = hold.amount,
                "[GATE] Hold released, coins refunded"
            );
        }

        self.publish_balance(hold.user_id).await;
        self.balance(hold.user_id).await
    }

    /// Credit purchased coins and publish the new balance.
    pub async fn credit(&self, user_id: i64, amount: i64) -> Result<i64, AppError> {
        let balance = LedgerRepository::credit(&self.db, user_id, amount)
            .await
            .map_err(|e| AppError::PaymentFailed(format!("Credit failed: {}", e)))?;

        info!(user_id, amount, balance, "[GATE] Coins credited");
        self.feed.publish(BalanceEvent { user_id, balance });
        Ok(balance)
    }

    /// Current balance for a user.
    pub async fn balance(&self, user_id: i64) -> Result<i64, AppError> {
        LedgerRepository::balance(&self.db, user_id)
            .await
            .map_err(AppError::from)
    }

    async fn publish_balance(&self, user_id: i64) {
        match LedgerRepository::balance(&self.db, user_id).await {
            Ok(balance) => self.feed.publish(BalanceEvent { user_id, balance }),
            Err(e) => warn!(user_id, "[GATE] Balance read for feed failed: {}", e),
        }
    }
}
