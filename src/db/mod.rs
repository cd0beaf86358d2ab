//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! `Db` is the persistence handle for the ledger. It is created once by `Config` and handed to
//! whatever needs it. It implements `LedgerStore` and `BudgetRegistry` for the ledger engine, and
//! stores user records for `Identity`.

mod migrations;

use crate::ledger::{checked_total, BudgetRegistry, LedgerStore, Window};
use crate::model::{
    BudgetLimit, BudgetLimitId, Kind, NewBudgetLimit, NewTransaction, OwnerId, Transaction,
    TransactionId, DATE_FORMAT,
};
use crate::Result;
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

type TransactionRow = (i64, i64, String, String, String, String);
type BudgetRow = (i64, i64, String, i32, u32, String);

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that there is a SQLite file at `path`
    /// - Opens a connection pool
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let db = Self::connect(path, false).await?;
        migrations::bootstrap(&db.pool).await?;
        migrations::migrate(&db.pool, migrations::LATEST).await?;
        Ok(db)
    }

    /// Like `load`, but only accepts a file that already carries a pocket schema, so that an empty
    /// or unrelated SQLite file is refused instead of being migrated into an empty ledger. The
    /// pool is closed before an error is returned.
    pub(crate) async fn load_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let db = Self::connect(path, false).await?;
        if let Err(e) = db.require_schema(path).await {
            db.close().await;
            return Err(e);
        }
        Ok(db)
    }

    async fn require_schema(&self, path: &Path) -> Result<()> {
        match migrations::existing_version(&self.pool).await? {
            Some(version) if version >= 1 => {
                migrations::migrate(&self.pool, migrations::LATEST).await
            }
            _ => bail!("'{}' does not contain a pocket ledger", path.display()),
        }
    }

    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let db = Self::connect(path, true).await?;
        migrations::bootstrap(&db.pool).await?;
        migrations::migrate(&db.pool, migrations::LATEST).await?;
        debug!("Created database at {}", path.display());
        Ok(db)
    }

    async fn connect(path: &Path, create: bool) -> Result<Self> {
        // Backups copy the database file alone, so keep no write-ahead log beside it.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;
        Ok(Self { pool })
    }

    /// Closes the connection pool. Every clone of this `Db` is closed with it.
    pub(crate) async fn close(&self) {
        self.pool.close().await
    }

    /// Stores a new user. Returns `None` if the username is already taken.
    pub(crate) async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<OwnerId>> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await;
        match result {
            Ok(done) => Ok(Some(OwnerId::new(done.last_insert_rowid()))),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    /// Returns the owner ID and stored password hash for `username`.
    pub(crate) async fn find_user(&self, username: &str) -> Result<Option<(OwnerId, String)>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to query user")?;
        Ok(row.map(|(id, hash)| (OwnerId::new(id), hash)))
    }

    #[cfg(test)]
    pub(crate) async fn count_transactions(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        Ok(row.0)
    }
}

#[async_trait]
impl LedgerStore for Db {
    async fn insert_transaction(&self, transaction: &NewTransaction) -> Result<TransactionId> {
        let done = sqlx::query(
            "INSERT INTO transactions (owner_id, amount, category, kind, date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(transaction.owner.get())
        .bind(transaction.amount.to_string())
        .bind(&transaction.category)
        .bind(transaction.kind.to_string())
        .bind(transaction.date.format(DATE_FORMAT).to_string())
        .execute(&self.pool)
        .await
        .context("Failed to insert transaction")?;
        Ok(TransactionId::new(done.last_insert_rowid()))
    }

    async fn transactions(&self, owner: OwnerId) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, owner_id, amount, category, kind, date FROM transactions \
             WHERE owner_id = ? ORDER BY date DESC, id DESC",
        )
        .bind(owner.get())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query transactions")?;
        rows.into_iter().map(transaction_from_row).collect()
    }

    async fn sum(
        &self,
        owner: OwnerId,
        window: Window,
        kind: Kind,
        category: Option<&str>,
    ) -> Result<Decimal> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT amount FROM transactions WHERE owner_id = ");
        query.push_bind(owner.get());
        query.push(" AND kind = ").push_bind(kind.to_string());
        query
            .push(" AND strftime('%Y', date) = ")
            .push_bind(format!("{:04}", window.year()));
        if let Some(month) = window.month() {
            query
                .push(" AND strftime('%m', date) = ")
                .push_bind(format!("{month:02}"));
        }
        if let Some(category) = category {
            query.push(" AND category = ").push_bind(category);
        }
        trace!("{}", query.sql());

        let amounts: Vec<String> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query transaction amounts")?;

        // Summed here rather than with SQL SUM() so that no floating point is involved.
        let amounts = amounts
            .iter()
            .map(|amount| parse_decimal(amount))
            .collect::<Result<Vec<_>>>()?;
        checked_total(amounts, window)
    }
}

#[async_trait]
impl BudgetRegistry for Db {
    async fn set_limit(&self, limit: &NewBudgetLimit) -> Result<BudgetLimitId> {
        let done = sqlx::query(
            "INSERT INTO budgets (owner_id, category, year, month, limit_amount) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(limit.owner.get())
        .bind(&limit.category)
        .bind(limit.year)
        .bind(limit.month)
        .bind(limit.limit.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to insert budget limit")?;
        Ok(BudgetLimitId::new(done.last_insert_rowid()))
    }

    async fn find_limit(
        &self,
        owner: OwnerId,
        category: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<Decimal>> {
        // With duplicates, the most recently set limit wins.
        let limit: Option<String> = sqlx::query_scalar(
            "SELECT limit_amount FROM budgets \
             WHERE owner_id = ? AND category = ? AND year = ? AND month = ? \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(owner.get())
        .bind(category)
        .bind(year)
        .bind(month)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query budget limit")?;
        limit.as_deref().map(parse_decimal).transpose()
    }

    async fn limits(&self, owner: OwnerId, window: Window) -> Result<Vec<BudgetLimit>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, owner_id, category, year, month, limit_amount FROM budgets \
             WHERE owner_id = ",
        );
        query.push_bind(owner.get());
        query.push(" AND year = ").push_bind(window.year());
        if let Some(month) = window.month() {
            query.push(" AND month = ").push_bind(month);
        }
        query.push(" ORDER BY month, category, id");

        let rows: Vec<BudgetRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query budget limits")?;
        rows.into_iter()
            .map(|(id, owner, category, year, month, limit)| {
                Ok(BudgetLimit {
                    id: BudgetLimitId::new(id),
                    owner: OwnerId::new(owner),
                    category,
                    year,
                    month,
                    limit: parse_decimal(&limit)?,
                })
            })
            .collect()
    }
}

fn transaction_from_row(row: TransactionRow) -> Result<Transaction> {
    let (id, owner, amount, category, kind, date) = row;
    Ok(Transaction {
        id: TransactionId::new(id),
        owner: OwnerId::new(owner),
        amount: parse_decimal(&amount)?,
        category,
        kind: Kind::from_str(&kind)
            .with_context(|| format!("Invalid kind '{kind}' stored for transaction {id}"))?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{date}' stored for transaction {id}"))?,
    })
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Invalid amount '{s}' stored in the database"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{aggregate, record};
    use crate::test::{date, TestEnv};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let env = TestEnv::new().await;
        let result = Db::init(env.config().sqlite_path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_requires_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Db::load(dir.path().join("missing.sqlite")).await;
        assert!(result.unwrap_err().to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_load_existing_refuses_files_without_a_ledger() {
        let dir = tempfile::TempDir::new().unwrap();
        let empty = dir.path().join("empty.sqlite");
        std::fs::write(&empty, b"").unwrap();
        let err = Db::load_existing(&empty).await.unwrap_err();
        assert!(err.to_string().contains("does not contain a pocket ledger"));

        let env = TestEnv::new().await;
        let db = Db::load_existing(env.config().sqlite_path()).await.unwrap();
        assert!(db.find_user("tester").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let env = TestEnv::new().await;
        let db = env.db();
        let id = db.insert_user("alice", "hash-a").await.unwrap().unwrap();
        assert_ne!(id, env.owner());

        let (found, hash) = db.find_user("alice").await.unwrap().unwrap();
        assert_eq!(found, id);
        assert_eq!(hash, "hash-a");

        assert!(db.find_user("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_is_none() {
        let env = TestEnv::new().await;
        let db = env.db();
        assert!(db.insert_user("bob", "x").await.unwrap().is_some());
        assert!(db.insert_user("bob", "y").await.unwrap().is_none());
        let (_, hash) = db.find_user("bob").await.unwrap().unwrap();
        assert_eq!(hash, "x");
    }

    #[tokio::test]
    async fn test_transactions_newest_first() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        for (day, category) in [
            ("2025-08-10", "Food"),
            ("2025-09-01", "Rent"),
            ("2024-12-31", "Gift"),
            ("2025-09-01", "Fuel"),
        ] {
            let txn = NewTransaction::new(owner, 1, category, Kind::Expense, date(day));
            db.insert_transaction(&txn).await.unwrap();
        }
        let other = NewTransaction::new(OwnerId::new(999), 1, "X", Kind::Expense, date("2030-01-01"));
        db.insert_transaction(&other).await.unwrap();

        let categories: Vec<String> = db
            .transactions(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.category)
            .collect();
        assert_eq!(categories, vec!["Fuel", "Rent", "Food", "Gift"]);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_values() {
        let env = TestEnv::new().await;
        let db = env.db();
        let txn = NewTransaction::new(
            env.owner(),
            dec("-12.345"),
            "Café & Bar",
            Kind::Income,
            date("2025-02-28"),
        );
        let id = db.insert_transaction(&txn).await.unwrap();
        let stored = db.transactions(env.owner()).await.unwrap();
        assert_eq!(stored, vec![txn.with_id(id)]);
    }

    #[tokio::test]
    async fn test_sum_is_exact() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        for _ in 0..10 {
            let txn = NewTransaction::new(owner, dec("0.1"), "Food", Kind::Expense, date("2025-08-01"));
            db.insert_transaction(&txn).await.unwrap();
        }
        let total = db
            .sum(owner, Window::monthly(2025, 8), Kind::Expense, None)
            .await
            .unwrap();
        assert_eq!(total, dec("1.0"));
    }

    #[tokio::test]
    async fn test_sum_filters() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        let rows = [
            ("5", "Food", Kind::Expense, "2025-08-01"),
            ("7", "food", Kind::Expense, "2025-08-02"),
            ("11", "Food", Kind::Income, "2025-08-03"),
            ("13", "Food", Kind::Expense, "2025-09-01"),
            ("17", "Food", Kind::Expense, "2024-08-01"),
        ];
        for (amount, category, kind, day) in rows {
            let txn = NewTransaction::new(owner, dec(amount), category, kind, date(day));
            db.insert_transaction(&txn).await.unwrap();
        }

        let august = Window::monthly(2025, 8);
        let expense = db.sum(owner, august, Kind::Expense, None).await.unwrap();
        assert_eq!(expense, dec("12"));
        let food = db.sum(owner, august, Kind::Expense, Some("Food")).await.unwrap();
        assert_eq!(food, dec("5"));
        let income = db.sum(owner, august, Kind::Income, None).await.unwrap();
        assert_eq!(income, dec("11"));
        let year = Window::yearly(2025);
        let food = db.sum(owner, year, Kind::Expense, Some("Food")).await.unwrap();
        assert_eq!(food, dec("18"));
        let empty = Window::monthly(2023, 1);
        let nothing = db.sum(owner, empty, Kind::Expense, None).await.unwrap();
        assert_eq!(nothing, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sum_overflow_is_an_error() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        for day in ["2025-08-01", "2025-08-02"] {
            let txn = NewTransaction::new(owner, Decimal::MAX, "Food", Kind::Expense, date(day));
            db.insert_transaction(&txn).await.unwrap();
        }

        let august = Window::monthly(2025, 8);
        let err = db.sum(owner, august, Kind::Expense, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Total for 2025-08 overflows");

        // The check behind `add` fails the same way instead of panicking.
        db.set_limit(&NewBudgetLimit::new(owner, "Food", 2025, 8, 10))
            .await
            .unwrap();
        let third = NewTransaction::new(owner, 1, "Food", Kind::Expense, date("2025-08-03"));
        assert!(record(&db, &db, third).await.is_err());

        let income = db.sum(owner, august, Kind::Income, None).await.unwrap();
        assert_eq!(income, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sum_unknown_owner_is_zero() {
        let env = TestEnv::new().await;
        let total = env
            .db()
            .sum(OwnerId::new(424242), Window::yearly(2025), Kind::Income, None)
            .await
            .unwrap();
        assert_eq!(total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_duplicate_limits_are_allowed() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        let first = db
            .set_limit(&NewBudgetLimit::new(owner, "Food", 2025, 8, 400))
            .await
            .unwrap();
        let second = db
            .set_limit(&NewBudgetLimit::new(owner, "Food", 2025, 8, 250))
            .await
            .unwrap();
        assert_ne!(first, second);

        let found = db.find_limit(owner, "Food", 2025, 8).await.unwrap();
        assert_eq!(found, Some(Decimal::from(250)));

        let limits = db.limits(owner, Window::monthly(2025, 8)).await.unwrap();
        assert_eq!(limits.len(), 2);
    }

    #[tokio::test]
    async fn test_find_limit_none_is_not_zero() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        assert_eq!(db.find_limit(owner, "Food", 2025, 8).await.unwrap(), None);

        db.set_limit(&NewBudgetLimit::new(owner, "Food", 2025, 8, 0))
            .await
            .unwrap();
        assert_eq!(
            db.find_limit(owner, "Food", 2025, 8).await.unwrap(),
            Some(Decimal::ZERO)
        );
        assert_eq!(db.find_limit(owner, "food", 2025, 8).await.unwrap(), None);
        assert_eq!(db.find_limit(owner, "Food", 2025, 9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_limits_for_year() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();
        for (category, month) in [("Rent", 3), ("Food", 3), ("Food", 1)] {
            db.set_limit(&NewBudgetLimit::new(owner, category, 2025, month, 10))
                .await
                .unwrap();
        }
        db.set_limit(&NewBudgetLimit::new(owner, "Food", 2026, 1, 10))
            .await
            .unwrap();

        let limits = db.limits(owner, Window::yearly(2025)).await.unwrap();
        let keys: Vec<(u32, &str)> = limits
            .iter()
            .map(|l| (l.month, l.category.as_str()))
            .collect();
        assert_eq!(keys, vec![(1, "Food"), (3, "Food"), (3, "Rent")]);
    }

    #[tokio::test]
    async fn test_budget_scenario_against_sqlite() {
        let env = TestEnv::new().await;
        let db = env.db();
        let owner = env.owner();

        let first = NewTransaction::new(owner, 500, "Food", Kind::Expense, date("2025-08-01"));
        assert!(record(&db, &db, first).await.unwrap().alert.is_none());

        db.set_limit(&NewBudgetLimit::new(owner, "Food", 2025, 8, 400))
            .await
            .unwrap();

        let second = NewTransaction::new(owner, 50, "Food", Kind::Expense, date("2025-08-15"));
        let alert = record(&db, &db, second).await.unwrap().alert.unwrap();
        assert_eq!(alert.total_spent, Decimal::from(550));
        assert_eq!(alert.limit, Decimal::from(400));
        assert_eq!(db.count_transactions().await.unwrap(), 2);

        let totals = aggregate(&db, owner, Window::monthly(2025, 8)).await.unwrap();
        assert_eq!(totals.expense(), Decimal::from(550));
    }
}
