use crate::ledger::{category_spend, BudgetRegistry, LedgerStore, Window};
use crate::model::{Amount, Transaction};
use crate::Result;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::debug;

/// Raised when spending in a category goes over its monthly limit. The alert is advisory and never
/// blocks or reverses the transaction that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverBudgetAlert {
    pub category: String,
    pub window: Window,
    pub total_spent: Decimal,
    pub limit: Decimal,
}

impl Display for OverBudgetAlert {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut spent = Amount::new(self.total_spent).to_string();
        let mut limit = Amount::new(self.limit).to_string();
        // Two decimal places can hide the difference, show the exact values then.
        if spent == limit {
            spent = self.total_spent.normalize().to_string();
            limit = self.limit.normalize().to_string();
        }
        write!(
            f,
            "You have exceeded your budget for '{}' in {} ({spent} > {limit})",
            self.category, self.window
        )
    }
}

/// Compares category spending against the budget registry after an expense is stored.
///
/// The monitor keeps no memory of earlier alerts, every expense past the limit alerts again.
pub struct BudgetMonitor<'a, S: ?Sized, R: ?Sized> {
    store: &'a S,
    registry: &'a R,
}

impl<'a, S, R> BudgetMonitor<'a, S, R>
where
    S: LedgerStore + ?Sized,
    R: BudgetRegistry + ?Sized,
{
    pub fn new(store: &'a S, registry: &'a R) -> Self {
        Self { store, registry }
    }

    /// Checks the month bucket of `transaction` for its owner and category. Income transactions
    /// and categories without a configured limit never alert.
    pub async fn check(&self, transaction: &Transaction) -> Result<Option<OverBudgetAlert>> {
        if !transaction.kind.is_expense() {
            return Ok(None);
        }
        let window = Window::of(transaction.date);
        let (year, month) = (transaction.date.year(), transaction.date.month());
        let limit = match self
            .registry
            .find_limit(transaction.owner, &transaction.category, year, month)
            .await?
        {
            Some(limit) => limit,
            None => {
                debug!(
                    "No budget for '{}' in {window}, skipping the check",
                    transaction.category
                );
                return Ok(None);
            }
        };

        let total_spent =
            category_spend(self.store, transaction.owner, &transaction.category, window).await?;
        debug!(
            "Spent {total_spent} of {limit} on '{}' in {window}",
            transaction.category
        );

        // Reaching the limit exactly is still within budget.
        if total_spent > limit {
            Ok(Some(OverBudgetAlert {
                category: transaction.category.clone(),
                window,
                total_spent,
                limit,
            }))
        } else {
            Ok(None)
        }
    }
}
