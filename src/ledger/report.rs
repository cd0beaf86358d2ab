use crate::ledger::{aggregate, LedgerStore, Totals, Window};
use crate::model::{Amount, OwnerId};
use crate::Result;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Income, expense and savings for a month or a year, across all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    window: Window,
    income: Decimal,
    expense: Decimal,
    savings: Decimal,
}

impl Report {
    pub async fn monthly<S>(store: &S, owner: OwnerId, year: i32, month: u32) -> Result<Self>
    where
        S: LedgerStore + ?Sized,
    {
        Self::generate(store, owner, Window::monthly(year, month)).await
    }

    pub async fn yearly<S>(store: &S, owner: OwnerId, year: i32) -> Result<Self>
    where
        S: LedgerStore + ?Sized,
    {
        Self::generate(store, owner, Window::yearly(year)).await
    }

    pub async fn generate<S>(store: &S, owner: OwnerId, window: Window) -> Result<Self>
    where
        S: LedgerStore + ?Sized,
    {
        let totals = aggregate(store, owner, window).await?;
        Self::from_totals(window, totals)
    }

    pub fn from_totals(window: Window, totals: Totals) -> Result<Self> {
        Ok(Self {
            window,
            income: totals.income(),
            expense: totals.expense(),
            savings: totals
                .savings()
                .with_context(|| format!("Unable to report on {window}"))?,
        })
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn income(&self) -> Decimal {
        self.income
    }

    pub fn expense(&self) -> Decimal {
        self.expense
    }

    pub fn savings(&self) -> Decimal {
        self.savings
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let title = if self.window.is_monthly() {
            "Monthly"
        } else {
            "Yearly"
        };
        writeln!(f, "{title} Report: {}", self.window)?;
        writeln!(f, "Total Income:   {:>14}", Amount::new(self.income).to_string())?;
        writeln!(f, "Total Expenses: {:>14}", Amount::new(self.expense).to_string())?;
        write!(f, "Savings:        {:>14}", Amount::new(self.savings).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Kind;
    use crate::test::MemoryStore;

    #[tokio::test]
    async fn test_yearly_report() {
        let store = MemoryStore::default();
        let owner = OwnerId::new(3);
        store.add(owner, "1000", "Salary", Kind::Income, "2025-02-01").await;
        store.add(owner, "300", "Rent", Kind::Expense, "2025-11-20").await;

        let report = Report::yearly(&store, owner, 2025).await.unwrap();
        assert_eq!(report.income(), Decimal::from(1000));
        assert_eq!(report.expense(), Decimal::from(300));
        assert_eq!(report.savings(), Decimal::from(700));
        assert_eq!(report.window(), Window::yearly(2025));
    }

    #[tokio::test]
    async fn test_monthly_report_with_no_data() {
        let store = MemoryStore::default();
        let report = Report::monthly(&store, OwnerId::new(3), 2025, 2)
            .await
            .unwrap();
        assert_eq!(report.income(), Decimal::ZERO);
        assert_eq!(report.expense(), Decimal::ZERO);
        assert_eq!(report.savings(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_negative_savings_are_not_clamped() {
        let store = MemoryStore::default();
        let owner = OwnerId::new(3);
        store.add(owner, "100", "Salary", Kind::Income, "2025-02-01").await;
        store.add(owner, "250", "Rent", Kind::Expense, "2025-02-03").await;

        let report = Report::monthly(&store, owner, 2025, 2).await.unwrap();
        assert_eq!(report.savings(), Decimal::from(-150));
    }

    #[test]
    fn test_display() {
        let totals = Totals::new(Decimal::from(1000), Decimal::from(300));
        let report = Report::from_totals(Window::monthly(2025, 8), totals).unwrap();
        let expected = "Monthly Report: 2025-08\n\
                        Total Income:         1,000.00\n\
                        Total Expenses:         300.00\n\
                        Savings:                700.00";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_serialize_includes_savings() {
        let totals = Totals::new(Decimal::from(5), Decimal::from(7));
        let report = Report::from_totals(Window::yearly(2024), totals).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["window"]["year"], 2024);
        assert!(json["window"].get("month").is_none());
        assert_eq!(json["savings"], "-2");
    }

    #[test]
    fn test_unrepresentable_savings_is_an_error() {
        let totals = Totals::new(Decimal::MAX, Decimal::MIN);
        let err = Report::from_totals(Window::yearly(2025), totals).unwrap_err();
        assert_eq!(err.to_string(), "Unable to report on 2025");
    }
}
