use crate::model::{Amount, BudgetLimitId, OwnerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monthly spending limit for one category that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBudgetLimit {
    pub owner: OwnerId,
    pub category: String,
    pub year: i32,
    pub month: u32,
    pub limit: Decimal,
}

impl NewBudgetLimit {
    pub fn new(
        owner: OwnerId,
        category: impl Into<String>,
        year: i32,
        month: u32,
        limit: impl Into<Decimal>,
    ) -> Self {
        Self {
            owner,
            category: category.into(),
            year,
            month,
            limit: limit.into(),
        }
    }

    pub fn with_id(self, id: BudgetLimitId) -> BudgetLimit {
        BudgetLimit {
            id,
            owner: self.owner,
            category: self.category,
            year: self.year,
            month: self.month,
            limit: self.limit,
        }
    }
}

/// A stored monthly spending limit.
///
/// Nothing prevents more than one limit for the same owner, category, year and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLimit {
    pub id: BudgetLimitId,
    pub owner: OwnerId,
    pub category: String,
    pub year: i32,
    pub month: u32,
    pub limit: Decimal,
}

impl BudgetLimit {
    pub fn limit(&self) -> Amount {
        Amount::new(self.limit)
    }
}
