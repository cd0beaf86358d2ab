use crate::ledger::{LedgerStore, Window};
use crate::model::{Kind, OwnerId};
use crate::Result;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Income and expense totals for one window. Derived on demand and never cached.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    income: Decimal,
    expense: Decimal,
}

impl Totals {
    pub fn new(income: Decimal, expense: Decimal) -> Self {
        Self { income, expense }
    }

    pub fn income(&self) -> Decimal {
        self.income
    }

    pub fn expense(&self) -> Decimal {
        self.expense
    }

    /// `income - expense`, which is negative when more was spent than earned.
    pub fn savings(&self) -> Result<Decimal> {
        self.income.checked_sub(self.expense).with_context(|| {
            format!(
                "Savings overflow: income {} minus expenses {}",
                self.income, self.expense
            )
        })
    }
}

/// Adds up `amounts` for `window`, failing rather than overflowing `Decimal`.
pub fn checked_total<I>(amounts: I, window: Window) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount)
            .with_context(|| format!("Total for {window} overflows"))
    })
}

/// Sums `owner`'s income and expenses, across all categories, for `window`.
pub async fn aggregate<S>(store: &S, owner: OwnerId, window: Window) -> Result<Totals>
where
    S: LedgerStore + ?Sized,
{
    let income = store.sum(owner, window, Kind::Income, None).await?;
    let expense = store.sum(owner, window, Kind::Expense, None).await?;
    trace!("Totals for owner {owner} in {window}: income {income}, expense {expense}");
    Ok(Totals::new(income, expense))
}

/// Sums `owner`'s expenses in exactly `category` for `window`.
pub async fn category_spend<S>(
    store: &S,
    owner: OwnerId,
    category: &str,
    window: Window,
) -> Result<Decimal>
where
    S: LedgerStore + ?Sized,
{
    store
        .sum(owner, window, Kind::Expense, Some(category))
        .await
}
