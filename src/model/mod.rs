//! Types that represent the core data model, such as `Transaction` and `BudgetLimit`.
mod amount;
mod budget;
mod ids;
mod kind;
mod transaction;

pub use amount::{Amount, AmountError};
pub use budget::{BudgetLimit, NewBudgetLimit};
pub use ids::{BudgetLimitId, OwnerId, TransactionId};
pub use kind::Kind;
pub use transaction::{NewTransaction, Transaction, DATE_FORMAT};
