use crate::model::{Amount, Kind, OwnerId, TransactionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The format of dates everywhere in the ledger, e.g. `2025-08-10`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub owner: OwnerId,
    pub amount: Decimal,
    pub category: String,
    pub kind: Kind,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn new(
        owner: OwnerId,
        amount: impl Into<Decimal>,
        category: impl Into<String>,
        kind: Kind,
        date: NaiveDate,
    ) -> Self {
        Self {
            owner,
            amount: amount.into(),
            category: category.into(),
            kind,
            date,
        }
    }

    /// Attaches the ID the store assigned to this transaction.
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            owner: self.owner,
            amount: self.amount,
            category: self.category,
            kind: self.kind,
            date: self.date,
        }
    }
}

/// A stored transaction. Transactions are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner: OwnerId,
    pub amount: Decimal,
    pub category: String,
    pub kind: Kind,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn amount(&self) -> Amount {
        Amount::new(self.amount)
    }
}
