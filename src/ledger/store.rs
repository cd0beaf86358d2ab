//! The storage contracts the ledger engine is written against.

use crate::ledger::Window;
use crate::model::{
    BudgetLimit, BudgetLimitId, Kind, NewBudgetLimit, NewTransaction, OwnerId, Transaction,
    TransactionId,
};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Durable, append-only storage of transactions keyed by owner.
///
/// The store trusts its caller: an unknown owner is not an error, it simply has no transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Stores `transaction` and returns its newly assigned ID.
    async fn insert_transaction(&self, transaction: &NewTransaction) -> Result<TransactionId>;

    /// All of `owner`'s transactions, newest date first.
    async fn transactions(&self, owner: OwnerId) -> Result<Vec<Transaction>>;

    /// The sum of `amount` over `owner`'s transactions of `kind` dated inside `window`. When
    /// `category` is given, only transactions whose category is exactly equal are summed.
    ///
    /// Returns zero when nothing matches.
    async fn sum(
        &self,
        owner: OwnerId,
        window: Window,
        kind: Kind,
        category: Option<&str>,
    ) -> Result<Decimal>;
}

/// Per-owner, per-category, per-month spending limits.
#[async_trait]
pub trait BudgetRegistry: Send + Sync {
    /// Unconditionally stores a new limit. Existing limits for the same key are left alone.
    async fn set_limit(&self, limit: &NewBudgetLimit) -> Result<BudgetLimitId>;

    /// One configured limit for the key, or `None` when no limit is configured. `None` is not the
    /// same as a limit of zero.
    async fn find_limit(
        &self,
        owner: OwnerId,
        category: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<Decimal>>;

    /// All limits configured for `owner` inside `window`.
    async fn limits(&self, owner: OwnerId, window: Window) -> Result<Vec<BudgetLimit>>;
}
