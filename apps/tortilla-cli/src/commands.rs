//! # Command Handlers
//!
//! Each subcommand is a thin layer over [`SalesLedger`] or
//! [`UserRepository`]; business rules live in the library crates.
//!
//! ## Session Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppConfig::load ── flags override ──► data_dir, user                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users.db ── ensure_default_admin ── authenticate(user, password)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Session { user, is_admin }                                             │
//! │       │                                                                 │
//! │       ├── ledger commands ──► SalesLedger (sales_<user>.db)             │
//! │       └── user commands   ──► UserRepository (admin checked here)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs::File;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use tortilla_core::{
    DailySummary, LedgerEntry, Product, SaleDraft, SalesOverview, TextReport, WeeklySummary,
};
use tortilla_db::{Database, DbError, SalesLedger, Schema, UserRepository};

use crate::cli::{
    ConfirmArgs, ImportArgs, ListArgs, OutputArgs, ReportSubcommand, SellArgs, UserSubcommand,
};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult, ErrorCode};

// =============================================================================
// Session
// =============================================================================

/// An authenticated operator.
pub struct Session {
    pub config: AppConfig,
    pub user: String,
    pub is_admin: bool,
    pub json: bool,
    users: UserRepository,
}

impl Session {
    /// Opens the credential store and checks the operator's password.
    ///
    /// When `session.require_login` is off a password is still checked if
    /// one was given.
    pub async fn start(config: AppConfig, password: Option<&str>, json: bool) -> CliResult<Self> {
        let user = config.session.user.trim().to_string();

        let users = Database::new(config.users_db(), Schema::Users)
            .await?
            .users();
        users
            .ensure_default_admin(&config.auth.initial_admin_password)
            .await?;

        match password {
            Some(password) => {
                if !users.authenticate(&user, password).await? {
                    warn!(user = %user, "Login failed");
                    return Err(CliError::unauthorized("invalid username or password"));
                }
            }
            None if config.session.require_login => {
                return Err(CliError::unauthorized(
                    "password required (use --password or TORTILLA_PASSWORD)",
                ));
            }
            None => debug!(user = %user, "Login not required"),
        }

        let is_admin = users.is_admin(&user).await?;
        info!(user = %user, is_admin, "Session started");

        Ok(Session {
            config,
            user,
            is_admin,
            json,
            users,
        })
    }

    pub async fn ledger(&self) -> CliResult<SalesLedger> {
        let ledger = SalesLedger::open(self.config.ledger_db(&self.user), &self.user)
            .await?
            .with_business_name(self.config.store.business_name.clone());
        Ok(ledger)
    }

    fn require_admin(&self) -> CliResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(CliError::unauthorized(format!(
                "'{}' is not an administrator",
                self.user
            )))
        }
    }

    /// Prints `value` as JSON with `--json`, otherwise the text from `text`.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

// =============================================================================
// Ledger Commands
// =============================================================================

/// Builds a draft from the command line.
pub fn build_draft(args: &SellArgs) -> CliResult<SaleDraft> {
    let mut draft = SaleDraft::new();
    draft.set_quantity(Product::Tortilla, args.tortilla)?;
    draft.set_quantity(Product::Totopos, args.totopos)?;
    draft.set_quantity(Product::Cacahuates, args.cacahuates)?;
    draft.set_quantity(Product::Mix, args.mix)?;
    draft.set_quantity(Product::SaltedChips, args.salted_chips)?;
    draft.set_quantity(Product::Special, args.special)?;
    draft.set_special_unit_price(args.special_price)?;
    draft.set_frequent_customer(args.frequent);
    draft.set_supplier_rate(args.supplier);
    let payment = args.payment.unwrap_or_else(|| draft.total());
    draft.set_payment(payment)?;
    Ok(draft)
}

pub async fn sell(session: &Session, args: SellArgs) -> CliResult<()> {
    let draft = build_draft(&args)?;
    let now = now();
    let at = args
        .date
        .unwrap_or(now.date())
        .and_time(args.time.unwrap_or(now.time()));

    let ledger = session.ledger().await?;
    let entry = ledger.commit_sale(&draft, at).await?;
    let receipt = ledger.receipt(entry.index).await?;

    session.emit(&entry, || format!("Sale recorded as #{}\n\n{receipt}", entry.index))
}

pub async fn receipt(session: &Session, index: usize) -> CliResult<()> {
    let ledger = session.ledger().await?;
    let text = ledger.receipt(index).await?;
    session.emit(&text, || text.clone())
}

pub async fn list(session: &Session, args: ListArgs) -> CliResult<()> {
    let ledger = session.ledger().await?;
    let entries = match (args.date, args.from.zip(args.to)) {
        (Some(date), _) => ledger.list_by_date(date).await?,
        (None, Some((from, to))) => ledger.list_by_date_range(from, to).await?,
        (None, None) => ledger.list_all().await?,
    };
    session.emit(&entries, || format_entries(&entries))
}

pub fn format_entries(entries: &[LedgerEntry]) -> String {
    if entries.is_empty() {
        return "No sales found.".to_string();
    }

    let mut out = format!(
        "{:>5}  {:<10}  {:<8}  {:>10}  {}",
        "INDEX", "DATE", "TIME", "TOTAL", "ITEMS"
    );
    for entry in entries {
        let record = &entry.record;
        let mut items: Vec<String> = record
            .quantities
            .non_zero()
            .map(|(product, qty)| format!("{} {}", product.label(), product.format_quantity(qty)))
            .collect();
        if record.frequent_customer {
            items.push("[frequent]".to_string());
        }
        if record.supplier_rate {
            items.push("[supplier]".to_string());
        }
        out.push_str(&format!(
            "\n{:>5}  {}  {}  {:>10}  {}",
            entry.index,
            record.date.format("%Y-%m-%d"),
            record.time.format("%H:%M:%S"),
            record.total.to_string(),
            items.join(", ")
        ));
    }
    out
}

pub async fn delete(session: &Session, index: usize) -> CliResult<()> {
    let ledger = session.ledger().await?;
    ledger.delete_by_index(index).await?;
    session.emit(&index, || format!("Deleted sale #{index}"))
}

pub async fn delete_all(session: &Session, args: ConfirmArgs) -> CliResult<()> {
    if !args.yes {
        return Err(CliError::validation(
            "refusing to delete every sale without --yes",
        ));
    }
    let ledger = session.ledger().await?;
    let deleted = ledger.delete_all().await?;
    session.emit(&deleted, || format!("Deleted {deleted} sales"))
}

pub async fn daily(session: &Session, date: Option<chrono::NaiveDate>) -> CliResult<()> {
    let date = date.unwrap_or(now().date());
    let summary = session.ledger().await?.daily_summary(date).await?;
    session.emit(&summary, || format_daily(&summary))
}

fn format_daily(summary: &DailySummary) -> String {
    let mut lines = vec![format!("Sales for {}", summary.date.format("%Y-%m-%d"))];
    for (product, qty) in summary.quantities.iter() {
        lines.push(format!("  {}: {}", product.label(), product.format_quantity(qty)));
    }
    lines.push(format!(
        "Regular Tortilla: {}",
        summary.regular_tortilla_revenue
    ));
    lines.push(format!(
        "Supplier Tortilla: {}",
        summary.supplier_tortilla_revenue
    ));
    lines.push(format!("Other Products: {}", summary.other_revenue));
    lines.push(format!("Grand Total: {}", summary.grand_total));
    lines.push(format!("Sales: {}", summary.sale_count));
    lines.join("\n")
}

pub async fn weekly(session: &Session, date: Option<chrono::NaiveDate>) -> CliResult<()> {
    let date = date.unwrap_or(now().date());
    let summary = session.ledger().await?.weekly_summary(date).await?;
    session.emit(&summary, || format_weekly(&summary))
}

fn format_weekly(summary: &WeeklySummary) -> String {
    let mut lines = vec![format!(
        "Week {} to {}",
        summary.week_start.format("%Y-%m-%d"),
        summary.week_end.format("%Y-%m-%d")
    )];
    for day in &summary.days {
        lines.push(format!(
            "  {:<10} {:>3} sales  {:>10}",
            day.day_name,
            day.sale_count,
            day.revenue.to_string()
        ));
    }
    lines.push(format!("Total: {}", summary.total_revenue));
    lines.push(format!("Sales: {}", summary.sale_count));
    lines.push(format!("Days with sales: {}/7", summary.days_with_sales));
    lines.join("\n")
}

pub async fn overview(
    session: &Session,
    range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
) -> CliResult<()> {
    let overview = session.ledger().await?.overview(range).await?;
    session.emit(&overview, || format_overview(&overview))
}

fn format_overview(overview: &SalesOverview) -> String {
    let scope = match (overview.start, overview.end) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "all sales".to_string(),
    };
    let mut lines = vec![
        format!("Overview ({scope})"),
        format!("Sales: {}", overview.sale_count),
        format!("Revenue: {}", overview.total_revenue),
        format!("Average sale: {}", overview.average_sale),
        format!("Frequent customer sales: {}", overview.frequent_customer_sales),
        format!("Supplier sales: {}", overview.supplier_sales),
    ];
    for (product, qty) in overview.quantities.non_zero() {
        lines.push(format!("  {}: {}", product.label(), product.format_quantity(qty)));
    }
    lines.join("\n")
}

// =============================================================================
// Documents
// =============================================================================

/// Writes a document into `output.out`, or prints it with `--stdout`.
fn deliver(session: &Session, doc: TextReport, output: &OutputArgs) -> CliResult<()> {
    if output.stdout {
        return session.emit(&doc, || doc.content.clone());
    }

    std::fs::create_dir_all(&output.out).map_err(|e| CliError::io(&output.out, e))?;
    let path = output.out.join(&doc.file_name);
    std::fs::write(&path, doc.as_bytes()).map_err(|e| CliError::io(&path, e))?;
    info!(path = %path.display(), "Document written");

    let shown = path.display().to_string();
    session.emit(&shown, || format!("Saved {shown}"))
}

pub async fn report(session: &Session, command: ReportSubcommand) -> CliResult<()> {
    let ledger = session.ledger().await?;
    let now = now();
    match command {
        ReportSubcommand::Daily { day, output } => {
            let doc = ledger
                .daily_report(day.date.unwrap_or(now.date()), now)
                .await?;
            deliver(session, doc, &output)
        }
        ReportSubcommand::Weekly { day, output } => {
            let doc = ledger
                .weekly_report(day.date.unwrap_or(now.date()), now)
                .await?;
            deliver(session, doc, &output)
        }
    }
}

pub async fn export(session: &Session, output: OutputArgs) -> CliResult<()> {
    let doc = session.ledger().await?.export(now().date()).await?;
    deliver(session, doc, &output)
}

/// Imports every file; one unreadable file does not stop the others.
pub async fn import(session: &Session, args: ImportArgs) -> CliResult<()> {
    let ledger = session.ledger().await?;
    let mut reports = Vec::new();
    let mut failed = 0;

    for path in &args.files {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                let err = CliError::io(path, e);
                warn!(path = %path.display(), error = %err.message, "File not readable");
                eprintln!("{}", err.message);
                failed += 1;
                continue;
            }
        };
        match ledger.import(file, &display_name(path)).await {
            Ok(report) => reports.push(report),
            Err(DbError::Import(e)) => {
                warn!(error = %e, "File not imported");
                eprintln!("{e}");
                failed += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    session.emit(&reports, || {
        let mut lines = Vec::new();
        for report in &reports {
            lines.push(format!(
                "{}: imported {}, skipped {}",
                report.file_name,
                report.imported,
                report.rejected.len()
            ));
            for rejection in &report.rejected {
                lines.push(format!("  {rejection}"));
            }
        }
        lines.join("\n")
    })?;

    if failed > 0 {
        return Err(CliError::new(
            ErrorCode::ImportFormat,
            format!("{failed} of {} files could not be imported", args.files.len()),
        ));
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// User Commands
// =============================================================================

pub async fn user(session: &Session, command: UserSubcommand) -> CliResult<()> {
    let users = &session.users;
    match command {
        UserSubcommand::Add {
            username,
            new_password,
            admin,
        } => {
            session.require_admin()?;
            users.upsert(&username, &new_password, admin).await?;
            session.emit(&username, || format!("Saved user {username}"))
        }
        UserSubcommand::List => {
            session.require_admin()?;
            let accounts = users.list().await?;
            session.emit(&accounts, || {
                accounts
                    .iter()
                    .map(|a| {
                        let role = if a.is_admin { "admin" } else { "user" };
                        format!("{:<20} {:<6} {}", a.username, role, a.created_at.format("%Y-%m-%d"))
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        UserSubcommand::Remove { username } => {
            session.require_admin()?;
            if username.trim() == session.user {
                return Err(CliError::validation("cannot remove the logged-in user"));
            }
            users.delete(&username).await?;
            session.emit(&username, || format!("Removed user {username}"))
        }
        UserSubcommand::Passwd { new_password } => {
            users
                .upsert(&session.user, &new_password, session.is_admin)
                .await?;
            session.emit(&session.user, || {
                format!("Password changed for {}", session.user)
            })
        }
        UserSubcommand::Check => {
            #[derive(Serialize)]
            struct Whoami<'a> {
                user: &'a str,
                is_admin: bool,
            }
            let who = Whoami {
                user: &session.user,
                is_admin: session.is_admin,
            };
            session.emit(&who, || {
                let role = if session.is_admin { "Administrator" } else { "User" };
                format!("{} ({role})", session.user)
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tortilla_core::{Money, Quantity};

    fn sell_args() -> SellArgs {
        SellArgs {
            tortilla: Quantity::from_units(2),
            totopos: Quantity::zero(),
            cacahuates: Quantity::zero(),
            mix: Quantity::zero(),
            salted_chips: Quantity::zero(),
            special: Quantity::zero(),
            special_price: Money::zero(),
            frequent: false,
            supplier: false,
            payment: None,
            date: Some(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()),
            time: None,
        }
    }

    fn test_config(dir: &Path, require_login: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(dir.to_path_buf());
        config.session.require_login = require_login;
        config
    }

    #[test]
    fn test_build_draft_defaults_payment_to_total() {
        let draft = build_draft(&sell_args()).unwrap();
        assert_eq!(draft.total(), Money::from_cents(5000));
        assert_eq!(draft.payment(), Money::from_cents(5000));
        assert_eq!(draft.change(), Money::zero());
    }

    #[test]
    fn test_build_draft_rejects_bad_step() {
        let mut args = sell_args();
        args.tortilla = Quantity::from_milli(300);
        let err = build_draft(&args).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_session_requires_valid_password() {
        let dir = tempfile::tempdir().unwrap();

        let err = Session::start(test_config(dir.path(), true), None, false)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = Session::start(test_config(dir.path(), true), Some("wrong"), false)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let session = Session::start(test_config(dir.path(), true), Some("admin123"), false)
            .await
            .unwrap();
        assert!(session.is_admin);
        assert!(dir.path().join("users.db").exists());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_manage_users() {
        let dir = tempfile::tempdir().unwrap();
        let admin = Session::start(test_config(dir.path(), false), None, false)
            .await
            .unwrap();
        user(
            &admin,
            UserSubcommand::Add {
                username: "maria".to_string(),
                new_password: "tortillas".to_string(),
                admin: false,
            },
        )
        .await
        .unwrap();

        let mut config = test_config(dir.path(), true);
        config.session.user = "maria".to_string();
        let maria = Session::start(config, Some("tortillas"), false)
            .await
            .unwrap();
        assert!(!maria.is_admin);

        let err = user(&maria, UserSubcommand::List).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_sell_lands_in_the_operators_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::start(test_config(dir.path(), false), None, false)
            .await
            .unwrap();

        sell(&session, sell_args()).await.unwrap();

        let ledger = session.ledger().await.unwrap();
        let all = ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record.recorded_by, "admin");
        assert!(dir.path().join("sales_admin.db").exists());

        assert!(format_entries(&all).contains("Tortillas 2.0 kg"));
    }

    #[tokio::test]
    async fn test_delete_all_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::start(test_config(dir.path(), false), None, false)
            .await
            .unwrap();
        sell(&session, sell_args()).await.unwrap();

        let err = delete_all(&session, ConfirmArgs { yes: false })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(session.ledger().await.unwrap().count().await.unwrap(), 1);

        delete_all(&session, ConfirmArgs { yes: true }).await.unwrap();
        assert_eq!(session.ledger().await.unwrap().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_continues_past_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::start(test_config(dir.path(), false), None, false)
            .await
            .unwrap();
        sell(&session, sell_args()).await.unwrap();

        let ledger = session.ledger().await.unwrap();
        let exported = dir.path().join("sales.csv");
        ledger
            .export_to(std::fs::File::create(&exported).unwrap())
            .await
            .unwrap();
        ledger.delete_all().await.unwrap();

        let err = import(
            &session,
            ImportArgs {
                files: vec![dir.path().join("missing.csv"), exported],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportFormat);
        assert_eq!(err.message, "1 of 2 files could not be imported");
        assert_eq!(ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_report_written_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::start(test_config(dir.path(), false), None, false)
            .await
            .unwrap();
        sell(&session, sell_args()).await.unwrap();

        let out = dir.path().join("reports");
        report(
            &session,
            ReportSubcommand::Daily {
                day: crate::cli::DayArgs {
                    date: Some(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()),
                },
                output: OutputArgs {
                    out: out.clone(),
                    stdout: false,
                },
            },
        )
        .await
        .unwrap();

        let text = std::fs::read_to_string(out.join("daily_report_2024-06-10.txt")).unwrap();
        assert!(text.contains("GRAND TOTAL: $50.00"));
    }
}
