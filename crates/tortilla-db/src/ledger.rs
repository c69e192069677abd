//! # Sales Ledger Service
//!
//! One user's view of the shop: commit sales, query, summarize, render
//! reports, exchange spreadsheets.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleDraft (caller owned)                                               │
//! │       │                                                                 │
//! │       │  commit_sale(&draft, now)                                       │
//! │       ▼                                                                 │
//! │  draft.commit(user, date, time)  ← price, check payment, validate       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerRepository::append        ← single INSERT, all-or-nothing        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerEntry { index, record }   ← draft is untouched; caller clears    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service never reads the clock; every timestamp comes from the caller.

use std::io::{Read, Write};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use tortilla_core::calendar::{week_end, week_start};
use tortilla_core::report::{self, export_file_name, render_receipt};
use tortilla_core::validation::validate_required;
use tortilla_core::{
    DailySummary, LedgerEntry, SaleDraft, SaleRecord, SalesOverview, TextReport, WeeklySummary,
    DEFAULT_BUSINESS_NAME,
};

use crate::error::{DbError, DbResult};
use crate::exchange::{self, ImportReport};
use crate::migrations::Schema;
use crate::pool::{Database, DbConfig};
use crate::repository::sale::LedgerRepository;

/// A user-scoped sales ledger.
#[derive(Debug, Clone)]
pub struct SalesLedger {
    db: Database,
    user: String,
    business_name: String,
}

impl SalesLedger {
    /// Opens the ledger database described by `config` for `user`.
    ///
    /// Use [`DbConfig::user_ledger`] to get the per-user file.
    pub async fn open(config: DbConfig, user: &str) -> DbResult<Self> {
        let user = user.trim();
        validate_required("username", user)?;
        let db = Database::new(config, Schema::Ledger).await?;
        Ok(Self::new(db, user))
    }

    /// Wraps an already opened ledger database.
    pub fn new(db: Database, user: &str) -> Self {
        SalesLedger {
            db,
            user: user.trim().to_string(),
            business_name: DEFAULT_BUSINESS_NAME.to_string(),
        }
    }

    /// Sets the name printed on reports and receipts.
    pub fn with_business_name(mut self, name: impl Into<String>) -> Self {
        self.business_name = name.into();
        self
    }

    fn sales(&self) -> LedgerRepository {
        self.db.sales()
    }

    // =========================================================================
    // Store
    // =========================================================================

    /// Turns a draft into a stored record stamped with this ledger's user.
    ///
    /// ## Errors
    /// - `Validation` (`EmptySale`, `InsufficientPayment`, ...) with the
    ///   ledger unchanged
    /// - persistence variants when the write fails
    pub async fn commit_sale(&self, draft: &SaleDraft, at: NaiveDateTime) -> DbResult<LedgerEntry> {
        let record = draft.commit(&self.user, at.date(), at.time())?;
        let index = self.sales().append(&record).await?;

        info!(
            user = %self.user,
            index,
            total = %record.total,
            change = %record.change,
            supplier = record.supplier_rate,
            "Sale committed"
        );
        Ok(LedgerEntry { index, record })
    }

    pub async fn count(&self) -> DbResult<usize> {
        self.sales().count().await
    }

    pub async fn list_all(&self) -> DbResult<Vec<LedgerEntry>> {
        self.sales().list_all().await
    }

    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<LedgerEntry>> {
        self.sales().list_by_date(date).await
    }

    pub async fn list_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<LedgerEntry>> {
        self.sales().list_by_date_range(start, end).await
    }

    pub async fn get(&self, index: usize) -> DbResult<LedgerEntry> {
        self.sales().get_by_index(index).await
    }

    pub async fn delete_by_index(&self, index: usize) -> DbResult<()> {
        self.sales().delete_by_index(index).await
    }

    /// Empties this user's ledger. Returns the number of deleted records.
    pub async fn delete_all(&self) -> DbResult<u64> {
        warn!(user = %self.user, "Deleting all sales");
        self.sales().delete_all().await
    }

    // =========================================================================
    // Summaries
    // =========================================================================

    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let records = records_of(self.list_by_date(date).await?);
        Ok(DailySummary::from_records(date, &records))
    }

    /// Summary of the Monday..Sunday week containing `any_date_in_week`.
    pub async fn weekly_summary(&self, any_date_in_week: NaiveDate) -> DbResult<WeeklySummary> {
        let entries = self
            .list_by_date_range(week_start(any_date_in_week), week_end(any_date_in_week))
            .await?;
        Ok(WeeklySummary::from_records(
            any_date_in_week,
            entries.iter().map(|e| &e.record),
        ))
    }

    /// Overview over an inclusive date range, or every record when `None`.
    pub async fn overview(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> DbResult<SalesOverview> {
        let entries = match range {
            Some((start, end)) => self.list_by_date_range(start, end).await?,
            None => self.list_all().await?,
        };
        Ok(SalesOverview::from_records(
            range,
            entries.iter().map(|e| &e.record),
        ))
    }

    // =========================================================================
    // Documents
    // =========================================================================

    pub async fn daily_report(
        &self,
        date: NaiveDate,
        generated_at: NaiveDateTime,
    ) -> DbResult<TextReport> {
        debug!(%date, "Rendering daily report");
        let records = records_of(self.list_by_date(date).await?);
        let summary = DailySummary::from_records(date, &records);
        Ok(report::daily_report(
            &self.business_name,
            &summary,
            &records,
            generated_at,
        ))
    }

    pub async fn weekly_report(
        &self,
        any_date_in_week: NaiveDate,
        generated_at: NaiveDateTime,
    ) -> DbResult<TextReport> {
        debug!(%any_date_in_week, "Rendering weekly report");
        let summary = self.weekly_summary(any_date_in_week).await?;
        Ok(report::weekly_report(
            &self.business_name,
            &summary,
            generated_at,
        ))
    }

    /// Receipt text for the record at a storage position.
    pub async fn receipt(&self, index: usize) -> DbResult<String> {
        let entry = self.get(index).await?;
        Ok(render_receipt(&self.business_name, &entry.record))
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Writes every record, in storage order, as CSV.
    pub async fn export_to<W: Write>(&self, writer: W) -> DbResult<usize> {
        let records = records_of(self.sales().list_storage_order().await?);
        let written = exchange::export_records(&records, writer)?;
        info!(user = %self.user, records = written, "Sales exported");
        Ok(written)
    }

    /// CSV export as a document named after `today`.
    pub async fn export(&self, today: NaiveDate) -> DbResult<TextReport> {
        let mut buf = Vec::new();
        self.export_to(&mut buf).await?;
        let content =
            String::from_utf8(buf).map_err(|e| DbError::Internal(format!("CSV is not UTF-8: {e}")))?;
        Ok(TextReport {
            file_name: export_file_name(today),
            content,
        })
    }

    /// Imports a CSV file.
    ///
    /// Bad rows are skipped and listed in the report; every accepted row is
    /// appended in one transaction.
    ///
    /// ## Errors
    /// - `Import` when the file as a whole cannot be read (nothing appended)
    pub async fn import<R: Read>(&self, reader: R, file_name: &str) -> DbResult<ImportReport> {
        let batch = exchange::parse_records(reader, file_name)?;

        for rejection in &batch.rejected {
            warn!(file = file_name, %rejection, "Skipping import row");
        }

        let imported = self.sales().append_many(&batch.records).await?;
        info!(
            user = %self.user,
            file = file_name,
            imported,
            rejected = batch.rejected.len(),
            "Import finished"
        );

        Ok(ImportReport {
            file_name: file_name.to_string(),
            imported,
            rejected: batch.rejected,
        })
    }
}

fn records_of(entries: Vec<LedgerEntry>) -> Vec<SaleRecord> {
    entries.into_iter().map(|e| e.record).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
