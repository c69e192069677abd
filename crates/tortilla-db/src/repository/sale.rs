//! # Ledger Repository
//!
//! Append/list/delete over one user's Sale Records.
//!
//! ## Positions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seq (AUTOINCREMENT)   1     2     4     7                              │
//! │  position (rank)       0     1     2     3                              │
//! │                                                                         │
//! │  delete_by_index(1) ── removes seq 2                                    │
//! │                                                                         │
//! │  seq                   1     4     7                                    │
//! │  position              0     1     2     ← compact, order kept          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Listings are ordered for display (date desc, time desc, then insertion
//! order) and every row carries its position, so the caller can delete the
//! row it shows.
//!
//! ## Scaling
//! Listings read the full matching set into memory and positions are computed
//! with a window over the whole table. Fine for a shop's daily volume; a very
//! large ledger would want paging.

use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use tortilla_core::validation::validate_record;
use tortilla_core::{LedgerEntry, Money, ProductQuantities, Quantity, SaleRecord};

use crate::error::{DbError, DbResult};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Every stored row with its 0-based position in storage order.
const SELECT_ENTRIES: &str = r#"
    SELECT
        position, seq, date, time, username,
        tortilla_qty, totopos_qty, cacahuates_qty, mix_qty, salted_chips_qty, special_qty,
        special_price, frequent_customer, supplier, total, payment, change
    FROM (
        SELECT
            ROW_NUMBER() OVER (ORDER BY seq) - 1 AS position,
            seq, date, time, username,
            tortilla_qty, totopos_qty, cacahuates_qty, mix_qty, salted_chips_qty, special_qty,
            special_price, frequent_customer, supplier, total, payment, change
        FROM sales
    )
"#;

const DISPLAY_ORDER: &str = "ORDER BY date DESC, time DESC, seq ASC";

// =============================================================================
// Row Mapping
// =============================================================================

/// A `sales` row as stored.
#[derive(Debug, Clone, FromRow)]
struct SaleRow {
    position: i64,
    seq: i64,
    date: String,
    time: String,
    username: String,
    tortilla_qty: i64,
    totopos_qty: i64,
    cacahuates_qty: i64,
    mix_qty: i64,
    salted_chips_qty: i64,
    special_qty: i64,
    special_price: i64,
    frequent_customer: bool,
    supplier: bool,
    total: i64,
    payment: i64,
    change: i64,
}

impl TryFrom<SaleRow> for LedgerEntry {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .map_err(|e| DbError::corrupt(row.seq, format!("date '{}': {e}", row.date)))?;
        let time = NaiveTime::parse_from_str(&row.time, TIME_FORMAT)
            .map_err(|e| DbError::corrupt(row.seq, format!("time '{}': {e}", row.time)))?;

        let record = SaleRecord {
            date,
            time,
            recorded_by: row.username,
            quantities: ProductQuantities {
                tortilla: Quantity::from_milli(row.tortilla_qty),
                totopos: Quantity::from_milli(row.totopos_qty),
                cacahuates: Quantity::from_milli(row.cacahuates_qty),
                mix: Quantity::from_milli(row.mix_qty),
                salted_chips: Quantity::from_milli(row.salted_chips_qty),
                special: Quantity::from_milli(row.special_qty),
            },
            special_unit_price: Money::from_cents(row.special_price),
            frequent_customer: row.frequent_customer,
            supplier_rate: row.supplier,
            total: Money::from_cents(row.total),
            payment: Money::from_cents(row.payment),
            change: Money::from_cents(row.change),
        };
        validate_record(&record).map_err(|e| DbError::corrupt(row.seq, e.to_string()))?;

        Ok(LedgerEntry {
            index: row.position as usize,
            record,
        })
    }
}

fn into_entries(rows: Vec<SaleRow>) -> DbResult<Vec<LedgerEntry>> {
    rows.into_iter().map(LedgerEntry::try_from).collect()
}

fn transaction_failed(err: sqlx::Error) -> DbError {
    DbError::TransactionFailed(err.to_string())
}

async fn insert_record(conn: &mut SqliteConnection, record: &SaleRecord) -> DbResult<()> {
    let q = &record.quantities;
    sqlx::query(
        r#"
        INSERT INTO sales (
            date, time, username,
            tortilla_qty, totopos_qty, cacahuates_qty, mix_qty, salted_chips_qty, special_qty,
            special_price, frequent_customer, supplier, total, payment, change
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14, ?15
        )
        "#,
    )
    .bind(record.date.format(DATE_FORMAT).to_string())
    .bind(record.time.format(TIME_FORMAT).to_string())
    .bind(&record.recorded_by)
    .bind(q.tortilla.milli())
    .bind(q.totopos.milli())
    .bind(q.cacahuates.milli())
    .bind(q.mix.milli())
    .bind(q.salted_chips.milli())
    .bind(q.special.milli())
    .bind(record.special_unit_price.cents())
    .bind(record.frequent_customer)
    .bind(record.supplier_rate)
    .bind(record.total.cents())
    .bind(record.payment.cents())
    .bind(record.change.cents())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn count_rows(conn: &mut SqliteConnection) -> DbResult<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count as usize)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for one user's sales ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Validates and appends a record.
    ///
    /// ## Returns
    /// The record's position (always the last one).
    ///
    /// ## Errors
    /// - `Validation` when the record breaks an invariant (nothing written)
    /// - persistence variants when the write fails (nothing written)
    pub async fn append(&self, record: &SaleRecord) -> DbResult<usize> {
        validate_record(record)?;
        debug!(date = %record.date, time = %record.time, total = %record.total, "Appending sale");

        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;
        insert_record(&mut tx, record).await?;
        let count = count_rows(&mut tx).await?;
        tx.commit().await.map_err(transaction_failed)?;

        Ok(count - 1)
    }

    /// Validates every record, then appends them all in one transaction.
    ///
    /// Either every record is stored or none is.
    ///
    /// ## Returns
    /// Number of records appended.
    pub async fn append_many(&self, records: &[SaleRecord]) -> DbResult<usize> {
        for record in records {
            validate_record(record)?;
        }
        debug!(count = records.len(), "Appending sales batch");

        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;
        for record in records {
            insert_record(&mut tx, record).await?;
        }
        tx.commit().await.map_err(transaction_failed)?;

        Ok(records.len())
    }

    /// Number of stored records.
    pub async fn count(&self) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Every record, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<LedgerEntry>> {
        debug!("Listing all sales");
        let sql = format!("{SELECT_ENTRIES} {DISPLAY_ORDER}");
        let rows: Vec<SaleRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_entries(rows)
    }

    /// Records on one date, newest first.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<LedgerEntry>> {
        debug!(%date, "Listing sales by date");
        let sql = format!("{SELECT_ENTRIES} WHERE date = ?1 {DISPLAY_ORDER}");
        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await?;
        into_entries(rows)
    }

    /// Records with `start <= date <= end`, newest first.
    ///
    /// An inverted range yields nothing.
    pub async fn list_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<LedgerEntry>> {
        debug!(%start, %end, "Listing sales by date range");
        let sql = format!("{SELECT_ENTRIES} WHERE date >= ?1 AND date <= ?2 {DISPLAY_ORDER}");
        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(start.format(DATE_FORMAT).to_string())
            .bind(end.format(DATE_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await?;
        into_entries(rows)
    }

    /// Every record in storage order (oldest insertion first).
    pub async fn list_storage_order(&self) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!("{SELECT_ENTRIES} ORDER BY seq ASC");
        let rows: Vec<SaleRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_entries(rows)
    }

    /// The record at a storage position.
    pub async fn get_by_index(&self, index: usize) -> DbResult<LedgerEntry> {
        let Ok(position) = i64::try_from(index) else {
            return Err(DbError::IndexOutOfRange {
                index,
                count: self.count().await?,
            });
        };

        let sql = format!("{SELECT_ENTRIES} WHERE position = ?1");
        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(position)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => LedgerEntry::try_from(row),
            None => Err(DbError::IndexOutOfRange {
                index,
                count: self.count().await?,
            }),
        }
    }

    /// Deletes the record at a storage position.
    ///
    /// Resolving the position and deleting happen in one transaction.
    ///
    /// ## Errors
    /// - `IndexOutOfRange` when `index >= count` (nothing deleted)
    pub async fn delete_by_index(&self, index: usize) -> DbResult<()> {
        // SQLite reads a negative OFFSET as 0
        let Ok(offset) = i64::try_from(index) else {
            return Err(DbError::IndexOutOfRange {
                index,
                count: self.count().await?,
            });
        };

        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;

        let seq: Option<i64> =
            sqlx::query_scalar("SELECT seq FROM sales ORDER BY seq LIMIT 1 OFFSET ?1")
                .bind(offset)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(seq) = seq else {
            let count = count_rows(&mut tx).await?;
            return Err(DbError::IndexOutOfRange { index, count });
        };

        sqlx::query("DELETE FROM sales WHERE seq = ?1")
            .bind(seq)
            .execute(&mut *tx)
            .await?;
        tx.commit().await.map_err(transaction_failed)?;

        info!(index, seq, "Sale deleted");
        Ok(())
    }

    /// Deletes every record; the schema stays.
    ///
    /// ## Returns
    /// Number of records deleted.
    pub async fn delete_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sales")
            .execute(&self.pool)
            .await?;
        info!(deleted = result.rows_affected(), "All sales deleted");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Schema;
    use crate::pool::{Database, DbConfig};
    use tortilla_core::{Product, SaleDraft, ValidationError};

    async fn repo() -> LedgerRepository {
        Database::new(DbConfig::in_memory(), Schema::Ledger)
            .await
            .unwrap()
            .sales()
    }

    fn record(date: &str, time: &str, tortilla_kg: i64) -> SaleRecord {
        let mut draft = SaleDraft::new();
        draft
            .set_quantity(Product::Tortilla, Quantity::from_units(tortilla_kg))
            .unwrap();
        draft.set_payment(draft.total()).unwrap();
        draft
            .commit(
                "maria",
                date.parse().unwrap(),
                NaiveTime::parse_from_str(time, TIME_FORMAT).unwrap(),
            )
            .unwrap()
    }

    fn kilos(entries: &[LedgerEntry]) -> Vec<i64> {
        entries
            .iter()
            .map(|e| e.record.quantities.tortilla.milli() / 1000)
            .collect()
    }

    #[tokio::test]
    async fn test_append_then_list() {
        let repo = repo().await;
        let r = record("2024-06-10", "09:00:00", 2);

        assert_eq!(repo.append(&r).await.unwrap(), 0);
        assert_eq!(repo.append(&record("2024-06-10", "10:00:00", 1)).await.unwrap(), 1);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|e| e.record == r && e.index == 0));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_display_order_date_time_desc_ties_by_insertion() {
        let repo = repo().await;
        repo.append(&record("2024-06-10", "09:00:00", 1)).await.unwrap();
        repo.append(&record("2024-06-11", "08:00:00", 2)).await.unwrap();
        repo.append(&record("2024-06-10", "12:00:00", 3)).await.unwrap();
        repo.append(&record("2024-06-10", "12:00:00", 4)).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(kilos(&all), vec![2, 3, 4, 1]);
        let indexes: Vec<usize> = all.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 0]);

        let storage = repo.list_storage_order().await.unwrap();
        assert_eq!(kilos(&storage), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_list_by_date_and_range() {
        let repo = repo().await;
        repo.append(&record("2024-06-09", "09:00:00", 1)).await.unwrap();
        repo.append(&record("2024-06-10", "09:00:00", 2)).await.unwrap();
        repo.append(&record("2024-06-12", "09:00:00", 3)).await.unwrap();
        repo.append(&record("2024-06-13", "09:00:00", 4)).await.unwrap();

        let day = repo.list_by_date("2024-06-10".parse().unwrap()).await.unwrap();
        assert_eq!(kilos(&day), vec![2]);
        assert_eq!(day[0].index, 1);

        let empty = repo.list_by_date("2024-06-11".parse().unwrap()).await.unwrap();
        assert!(empty.is_empty());

        let range = repo
            .list_by_date_range("2024-06-10".parse().unwrap(), "2024-06-12".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(kilos(&range), vec![3, 2]);

        let inverted = repo
            .list_by_date_range("2024-06-12".parse().unwrap(), "2024-06-10".parse().unwrap())
            .await
            .unwrap();
        assert!(inverted.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_index_compacts_positions() {
        let repo = repo().await;
        for kg in 1..=4 {
            repo.append(&record("2024-06-10", "09:00:00", kg)).await.unwrap();
        }

        repo.delete_by_index(1).await.unwrap();

        let storage = repo.list_storage_order().await.unwrap();
        assert_eq!(kilos(&storage), vec![1, 3, 4]);
        let indexes: Vec<usize> = storage.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(repo.count().await.unwrap(), 3);

        // Position 1 now names what used to be position 2
        assert_eq!(repo.get_by_index(1).await.unwrap().record.quantities.tortilla, Quantity::from_units(3));
    }

    #[tokio::test]
    async fn test_delete_by_index_out_of_range_changes_nothing() {
        let repo = repo().await;
        repo.append(&record("2024-06-10", "09:00:00", 1)).await.unwrap();

        let err = repo.delete_by_index(1).await.unwrap_err();
        assert!(matches!(err, DbError::IndexOutOfRange { index: 1, count: 1 }));
        assert_eq!(repo.count().await.unwrap(), 1);

        let err = repo.get_by_index(7).await.unwrap_err();
        assert!(matches!(err, DbError::IndexOutOfRange { index: 7, count: 1 }));
    }

    #[tokio::test]
    async fn test_index_past_i64_range_is_out_of_range() {
        let repo = repo().await;
        for kg in 1..=3 {
            repo.append(&record("2024-06-10", "09:00:00", kg)).await.unwrap();
        }

        let err = repo.delete_by_index(usize::MAX).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::IndexOutOfRange { index: usize::MAX, count: 3 }
        ));
        assert_eq!(kilos(&repo.list_storage_order().await.unwrap()), vec![1, 2, 3]);

        let err = repo.get_by_index(usize::MAX).await.unwrap_err();
        assert!(matches!(err, DbError::IndexOutOfRange { count: 3, .. }));
    }

    #[tokio::test]
    async fn test_failed_write_is_persistence_error_and_keeps_records() {
        let db = Database::new(DbConfig::in_memory(), Schema::Ledger)
            .await
            .unwrap();
        let repo = db.sales();
        repo.append(&record("2024-06-10", "09:00:00", 1)).await.unwrap();
        repo.append(&record("2024-06-10", "10:00:00", 2)).await.unwrap();
        let before = repo.list_all().await.unwrap();

        for trigger in [
            "CREATE TRIGGER full_on_insert BEFORE INSERT ON sales
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
            "CREATE TRIGGER full_on_delete BEFORE DELETE ON sales
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        ] {
            sqlx::query(trigger).execute(db.pool()).await.unwrap();
        }

        let err = repo
            .append(&record("2024-06-11", "09:00:00", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(ref msg) if msg.contains("disk full")));
        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);

        let batch = [
            record("2024-06-11", "09:00:00", 3),
            record("2024-06-11", "10:00:00", 4),
        ];
        let err = repo.append_many(&batch).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);

        let err = repo.delete_by_index(0).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);

        assert_eq!(repo.list_all().await.unwrap(), before);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_then_append() {
        let repo = repo().await;
        for kg in 1..=3 {
            repo.append(&record("2024-06-10", "09:00:00", kg)).await.unwrap();
        }

        assert_eq!(repo.delete_all().await.unwrap(), 3);
        assert!(repo.list_all().await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);

        assert_eq!(repo.append(&record("2024-06-11", "09:00:00", 1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_record_is_not_written() {
        let repo = repo().await;
        let mut bad = record("2024-06-10", "09:00:00", 2);
        bad.total = Money::from_cents(1);

        let err = repo.append(&bad).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::TotalMismatch { .. })
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_many_is_all_or_nothing() {
        let repo = repo().await;
        let good = record("2024-06-10", "09:00:00", 1);
        let mut bad = record("2024-06-10", "10:00:00", 1);
        bad.recorded_by = String::new();

        assert!(repo.append_many(&[good.clone(), bad]).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);

        assert_eq!(repo.append_many(&[good.clone(), good]).await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_persistence_error() {
        let db = Database::new(DbConfig::in_memory(), Schema::Ledger)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO sales (date, time, username, tortilla_qty, total, payment, change)
             VALUES ('10/06/2024', '09:00:00', 'maria', 2000, 5000, 5000, 0)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.sales().list_all().await.unwrap_err();
        assert!(matches!(err, DbError::CorruptRecord { seq: 1, .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);
    }

    #[tokio::test]
    async fn test_ledgers_are_isolated_per_user_and_persist() {
        let dir = tempfile::tempdir().unwrap();

        let maria = Database::new(DbConfig::user_ledger(dir.path(), "maria"), Schema::Ledger)
            .await
            .unwrap();
        let jose = Database::new(DbConfig::user_ledger(dir.path(), "jose"), Schema::Ledger)
            .await
            .unwrap();

        maria.sales().append(&record("2024-06-10", "09:00:00", 2)).await.unwrap();
        assert_eq!(maria.sales().count().await.unwrap(), 1);
        assert_eq!(jose.sales().count().await.unwrap(), 0);
        maria.close().await;

        let reopened = Database::new(DbConfig::user_ledger(dir.path(), "maria"), Schema::Ledger)
            .await
            .unwrap();
        let all = reopened.sales().list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record.total, Money::from_cents(5000));
    }
}
