//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::commands::Credentials;
use crate::db::Db;
use crate::ledger::{checked_total, BudgetRegistry, LedgerStore, Window};
use crate::model::{
    BudgetLimit, BudgetLimitId, Kind, NewBudgetLimit, NewTransaction, OwnerId, Transaction,
    TransactionId, DATE_FORMAT,
};
use crate::{Config, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Mutex;
use tempfile::TempDir;

/// Parses a `YYYY-MM-DD` date.
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
}

/// Test environment that sets up a pocket home directory with Config, database and one user.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
    owner: OwnerId,
}

impl TestEnv {
    /// Creates a test environment with Config, an initialized database and a user named "tester".
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("pocket");
        let config = Config::create(&root).await.unwrap();

        // Skips Argon2 so that tests which only need an owner stay fast.
        let owner = config
            .db()
            .insert_user("tester", "unused-hash")
            .await
            .unwrap()
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
            owner,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Returns a handle to the test database.
    pub fn db(&self) -> Db {
        self.config.db().clone()
    }

    /// The owner ID of the "tester" user.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Registers a user with a real password hash and returns their credentials.
    pub async fn register(&self, username: &str, secret: &str) -> Credentials {
        self.config
            .identity()
            .register(username, secret)
            .await
            .unwrap();
        Credentials::new(username, secret)
    }

    /// Returns the owner ID for credentials created with `register`.
    pub async fn login(&self, credentials: &Credentials) -> OwnerId {
        self.config
            .identity()
            .authenticate(credentials.username(), credentials.secret())
            .await
            .unwrap()
            .unwrap()
    }
}

/// An in-memory `LedgerStore` and `BudgetRegistry` for testing the ledger engine without SQLite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
    limits: Mutex<Vec<BudgetLimit>>,
}

impl MemoryStore {
    /// Inserts a transaction from string shorthand, e.g. `add(owner, "12.50", "Food", Kind::Expense,
    /// "2025-08-01")`.
    pub async fn add(&self, owner: OwnerId, amount: &str, category: &str, kind: Kind, day: &str) {
        let amount = Decimal::from_str(amount).unwrap();
        let transaction = NewTransaction::new(owner, amount, category, kind, date(day));
        self.insert_transaction(&transaction).await.unwrap();
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_transaction(&self, transaction: &NewTransaction) -> Result<TransactionId> {
        let mut transactions = self.transactions.lock().unwrap();
        let id = TransactionId::new(transactions.len() as i64 + 1);
        transactions.push(transaction.clone().with_id(id));
        Ok(id)
    }

    async fn transactions(&self, owner: OwnerId) -> Result<Vec<Transaction>> {
        let mut found: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn sum(
        &self,
        owner: OwnerId,
        window: Window,
        kind: Kind,
        category: Option<&str>,
    ) -> Result<Decimal> {
        let amounts: Vec<Decimal> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner == owner && t.kind == kind && window.contains(t.date))
            .filter(|t| category.map_or(true, |c| t.category == c))
            .map(|t| t.amount)
            .collect();
        checked_total(amounts, window)
    }
}

#[async_trait]
impl BudgetRegistry for MemoryStore {
    async fn set_limit(&self, limit: &NewBudgetLimit) -> Result<BudgetLimitId> {
        let mut limits = self.limits.lock().unwrap();
        let id = BudgetLimitId::new(limits.len() as i64 + 1);
        limits.push(limit.clone().with_id(id));
        Ok(id)
    }

    async fn find_limit(
        &self,
        owner: OwnerId,
        category: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<Decimal>> {
        Ok(self
            .limits
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|l| {
                l.owner == owner && l.category == category && l.year == year && l.month == month
            })
            .map(|l| l.limit))
    }

    async fn limits(&self, owner: OwnerId, window: Window) -> Result<Vec<BudgetLimit>> {
        let mut found: Vec<BudgetLimit> = self
            .limits
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.owner == owner && l.year == window.year())
            .filter(|l| window.month().map_or(true, |m| l.month == m))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (a.month, &a.category, a.id).cmp(&(b.month, &b.category, b.id))
        });
        Ok(found)
    }
}
