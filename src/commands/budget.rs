use crate::args::{ListBudgetArgs, SetBudgetArgs};
use crate::commands::auth::login;
use crate::commands::{Credentials, Out};
use crate::error::{ErrorType, IntoResult};
use crate::ledger::{BudgetRegistry, Window};
use crate::model::{BudgetLimit, NewBudgetLimit};
use crate::{Config, Result};
use anyhow::anyhow;

/// Sets the spending limit for a category in one month.
///
/// A limit that already exists for the same category and month is not removed, the new one is
/// stored alongside it and takes effect for budget checks from now on.
pub async fn set_budget(
    config: &Config,
    credentials: &Credentials,
    args: SetBudgetArgs,
) -> Result<Out<BudgetLimit>> {
    if args.category.trim().is_empty() {
        return Err(anyhow!("A category is required")).pub_result(ErrorType::Validation);
    }
    let owner = login(config, credentials).await?;
    let window = Window::monthly(args.period.year, args.period.month);
    let limit = NewBudgetLimit::new(
        owner,
        args.category,
        args.period.year,
        args.period.month,
        args.limit.value(),
    );
    let id = config
        .db()
        .set_limit(&limit)
        .await
        .pub_result(ErrorType::Database)?;
    let limit = limit.with_id(id);
    Ok(Out::new(
        format!(
            "Budget set for '{}': {} in {window}",
            limit.category,
            limit.limit()
        ),
        limit,
    ))
}

/// Lists the limits configured for a year, or one month of a year, as a table.
pub async fn list_budgets(
    config: &Config,
    credentials: &Credentials,
    args: &ListBudgetArgs,
) -> Result<Out<Vec<BudgetLimit>>> {
    let owner = login(config, credentials).await?;
    let window = match args.month {
        Some(month) => Window::monthly(args.year, month),
        None => Window::yearly(args.year),
    };
    let limits = config
        .db()
        .limits(owner, window)
        .await
        .pub_result(ErrorType::Database)?;
    if limits.is_empty() {
        return Ok(Out::new(format!("No budgets set for {window}."), limits));
    }
    Ok(Out::new(table(&limits), limits))
}

/// `limits` must be sorted by month, category, then ID. A limit followed by another for the same
/// month and category has been replaced.
fn table(limits: &[BudgetLimit]) -> String {
    let width = limits
        .iter()
        .map(|l| l.category.chars().count())
        .max()
        .unwrap_or_default()
        .max("Category".len());
    let amounts: Vec<String> = limits.iter().map(|l| l.limit().to_string()).collect();
    let amount_width = amounts
        .iter()
        .map(String::len)
        .max()
        .unwrap_or_default()
        .max("Limit".len());

    let mut lines = vec![format!(
        "{:<7}  {:<width$}  {:>amount_width$}",
        "Month", "Category", "Limit"
    )];
    for (i, (limit, amount)) in limits.iter().zip(&amounts).enumerate() {
        let replaced = limits.get(i + 1).is_some_and(|next| {
            next.month == limit.month && next.category == limit.category
        });
        let month = format!("{:04}-{:02}", limit.year, limit.month);
        let mut line = format!(
            "{month:<7}  {:<width$}  {amount:>amount_width$}",
            limit.category
        );
        if replaced {
            line.push_str("  (replaced)");
        }
        lines.push(line);
    }
    lines.join("\n")
}
