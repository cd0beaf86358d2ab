use crate::commands::auth::login;
use crate::commands::{Credentials, Out};
use crate::error::{ErrorType, IntoResult};
use crate::ledger::LedgerStore;
use crate::model::{Transaction, DATE_FORMAT};
use crate::{Config, Result};
use std::fmt::Write;

/// Lists every transaction of the logged in user, newest date first, as a table.
pub async fn list(config: &Config, credentials: &Credentials) -> Result<Out<Vec<Transaction>>> {
    let owner = login(config, credentials).await?;
    let transactions = config
        .db()
        .transactions(owner)
        .await
        .pub_result(ErrorType::Database)?;
    if transactions.is_empty() {
        return Ok(Out::new("No transactions found.", transactions));
    }
    Ok(Out::new(table(&transactions), transactions))
}

fn table(transactions: &[Transaction]) -> String {
    const HEADERS: [&str; 4] = ["Amount", "Category", "Type", "Date"];
    let rows: Vec<[String; 4]> = transactions
        .iter()
        .map(|t| {
            [
                t.amount().to_string(),
                t.category.clone(),
                t.kind.to_string(),
                t.date.format(DATE_FORMAT).to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = write!(
        out,
        "{:>w0$}  {:<w1$}  {:<w2$}  {}",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        HEADERS[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    );
    for [amount, category, kind, date] in &rows {
        let _ = write!(
            out,
            "\n{amount:>w0$}  {category:<w1$}  {kind:<w2$}  {date}",
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
    }
    out
}
