use crate::args::ReportPeriod;
use crate::commands::auth::login;
use crate::commands::{Credentials, Out};
use crate::error::{ErrorType, IntoResult};
use crate::ledger::Report;
use crate::{Config, Result};

/// Produces the monthly or yearly income, expense and savings report for the logged in user.
/// A period with no transactions reports zeros.
pub async fn report(
    config: &Config,
    credentials: &Credentials,
    period: &ReportPeriod,
) -> Result<Out<Report>> {
    let owner = login(config, credentials).await?;
    let db = config.db();
    let report = match period {
        ReportPeriod::Monthly(args) => Report::monthly(db, owner, args.year, args.month).await,
        ReportPeriod::Yearly(args) => Report::yearly(db, owner, args.year).await,
    }
    .pub_result(ErrorType::Database)?;
    Ok(Out::new(report.to_string(), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{MonthArgs, YearArgs};
    use crate::ledger::LedgerStore;
    use crate::model::{Kind, NewTransaction};
    use crate::test::{date, TestEnv};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_monthly_and_yearly() {
        let env = TestEnv::new().await;
        let credentials = env.register("ana", "pw").await;
        let owner = env.login(&credentials).await;
        let db = env.db();
        for (amount, kind, day) in [
            (3000, Kind::Income, "2025-08-01"),
            (1200, Kind::Expense, "2025-08-03"),
            (3000, Kind::Income, "2025-09-01"),
            (4000, Kind::Expense, "2025-09-05"),
        ] {
            let txn = NewTransaction::new(owner, amount, "Misc", kind, date(day));
            db.insert_transaction(&txn).await.unwrap();
        }

        let august = ReportPeriod::Monthly(MonthArgs {
            year: 2025,
            month: 8,
        });
        let out = report(&env.config(), &credentials, &august).await.unwrap();
        assert_eq!(
            out.message(),
            "Monthly Report: 2025-08\n\
             Total Income:         3,000.00\n\
             Total Expenses:       1,200.00\n\
             Savings:              1,800.00"
        );

        let year = ReportPeriod::Yearly(YearArgs { year: 2025 });
        let out = report(&env.config(), &credentials, &year).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.income(), Decimal::from(6000));
        assert_eq!(report.expense(), Decimal::from(5200));
        assert_eq!(report.savings(), Decimal::from(800));
    }

    #[tokio::test]
    async fn test_empty_month_is_zero() {
        let env = TestEnv::new().await;
        let credentials = env.register("ana", "pw").await;
        let period = ReportPeriod::Monthly(MonthArgs {
            year: 1999,
            month: 1,
        });
        let out = report(&env.config(), &credentials, &period).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.income(), Decimal::ZERO);
        assert_eq!(report.expense(), Decimal::ZERO);
        assert_eq!(report.savings(), Decimal::ZERO);
    }
}
