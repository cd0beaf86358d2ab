use crate::args::AddArgs;
use crate::commands::auth::login;
use crate::commands::{Credentials, Out};
use crate::error::{ErrorType, IntoResult};
use crate::ledger::{record, Recorded};
use crate::model::{Amount, NewTransaction, DATE_FORMAT};
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate};
use std::str::FromStr;

/// Records a transaction for the logged in user and runs the budget check for it.
///
/// The amount, category and date are validated before anything is written. When `args.date` is
/// `None` the transaction is dated today, in local time. An over-budget alert does not stop the
/// transaction from being stored; it is logged and returned in the structured output.
///
/// # Errors
/// - A `Validation` error for a malformed amount or date, or an empty category.
/// - An `Identity` error if the credentials are wrong.
/// - A `Database` error if the transaction cannot be stored.
pub async fn add(
    config: &Config,
    credentials: &Credentials,
    args: AddArgs,
) -> Result<Out<Recorded>> {
    let amount = Amount::from_str(&args.amount)
        .with_context(|| format!("Invalid amount '{}'", args.amount))
        .pub_result(ErrorType::Validation)?;
    if args.category.trim().is_empty() {
        return Err(anyhow!("A category is required")).pub_result(ErrorType::Validation);
    }
    let date = parse_date(args.date.as_deref()).pub_result(ErrorType::Validation)?;

    let owner = login(config, credentials).await?;
    let transaction = NewTransaction::new(owner, amount.value(), args.category, args.kind, date);
    let db = config.db();
    let recorded = record(db, db, transaction)
        .await
        .pub_result(ErrorType::Database)?;

    let t = &recorded.transaction;
    let message = format!(
        "Added {} of {} in '{}' on {}",
        t.kind,
        t.amount(),
        t.category,
        t.date.format(DATE_FORMAT)
    );
    Ok(Out::new(message, recorded))
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date.map(str::trim) {
        None | Some("") => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD")),
    }
}
