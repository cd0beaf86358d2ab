//! The budgeting and reporting engine.
//!
//! Everything here is re-derived from the current content of the store on every call:
//! - `aggregate` sums income and expense over a `Window`
//! - `BudgetMonitor` compares a category's monthly spend against its limit
//! - `Report` renders monthly and yearly totals
//!
//! The engine is written against the `LedgerStore` and `BudgetRegistry` traits; `Db` implements
//! both for the SQLite database.

mod aggregate;
mod monitor;
mod report;
mod store;
mod window;

pub use aggregate::{aggregate, category_spend, checked_total, Totals};
pub use monitor::{BudgetMonitor, OverBudgetAlert};
pub use report::Report;
pub use store::{BudgetRegistry, LedgerStore};
pub use window::Window;

use crate::model::{NewTransaction, Transaction};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The outcome of recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recorded {
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<OverBudgetAlert>,
}

/// Stores `transaction` and, when it is an expense, runs the budget check for its category and
/// month before returning. The alert, if any, is part of the result and is also logged.
pub async fn record<S, R>(store: &S, registry: &R, transaction: NewTransaction) -> Result<Recorded>
where
    S: LedgerStore + ?Sized,
    R: BudgetRegistry + ?Sized,
{
    let id = store.insert_transaction(&transaction).await?;
    let transaction = transaction.with_id(id);
    debug!(
        "Recorded {} {} in '{}' on {} as {id}",
        transaction.kind, transaction.amount, transaction.category, transaction.date
    );

    let alert = BudgetMonitor::new(store, registry)
        .check(&transaction)
        .await?;
    if let Some(alert) = &alert {
        warn!("ALERT: {alert}");
    }
    Ok(Recorded { transaction, alert })
}
