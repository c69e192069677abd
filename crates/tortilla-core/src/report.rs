//! # Report Formatter
//!
//! Deterministic plain-text rendering of summaries, day listings and
//! receipts. Nothing here reads the clock: the caller passes the
//! "generated at" timestamp, so the same inputs always render the same bytes.
//!
//! ## Documents
//! ```text
//! ┌────────────────┬──────────────────────────────────────────────────┐
//! │ Document       │ File name                                        │
//! ├────────────────┼──────────────────────────────────────────────────┤
//! │ Daily report   │ daily_report_2024-06-10.txt                      │
//! │ Weekly report  │ weekly_report_2024-06-10_to_2024-06-16.txt       │
//! │ Data export    │ sales_data_export_2024-06-10.csv                 │
//! └────────────────┴──────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::aggregate::{DailySummary, WeeklySummary};
use crate::pricing::{unit_price, Product};
use crate::types::{ProductQuantities, SaleRecord};

const REPORT_WIDTH: usize = 50;
const SECTION_WIDTH: usize = 30;
const RECEIPT_WIDTH: usize = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Text Report
// =============================================================================

/// A rendered document plus the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextReport {
    pub file_name: String,
    pub content: String,
}

impl TextReport {
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_bytes()
    }
}

pub fn daily_report_file_name(date: NaiveDate) -> String {
    format!("daily_report_{}.txt", date.format(DATE_FORMAT))
}

pub fn weekly_report_file_name(week_start: NaiveDate, week_end: NaiveDate) -> String {
    format!(
        "weekly_report_{}_to_{}.txt",
        week_start.format(DATE_FORMAT),
        week_end.format(DATE_FORMAT)
    )
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("sales_data_export_{}.csv", date.format(DATE_FORMAT))
}

// =============================================================================
// Line Builder
// =============================================================================

#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    fn rule(&mut self, ch: char, width: usize) {
        self.0.push(ch.to_string().repeat(width));
    }

    fn blank(&mut self) {
        self.0.push(String::new());
    }

    fn section(&mut self, title: &str) {
        self.push(title);
        self.rule('-', SECTION_WIDTH);
    }

    fn finish(self) -> String {
        self.0.join("\n")
    }
}

fn product_summary(lines: &mut Lines, quantities: &ProductQuantities) {
    lines.section("PRODUCT SUMMARY:");
    for (product, qty) in quantities.iter() {
        lines.push(format!("{}: {}", product.label(), product.format_quantity(qty)));
    }
}

// =============================================================================
// Daily Report
// =============================================================================

/// Renders the daily report.
///
/// `records` are the day's sales in display order; "Sale N" numbers them
/// from 1 in that order.
pub fn render_daily_report(
    business_name: &str,
    summary: &DailySummary,
    records: &[SaleRecord],
    generated_at: NaiveDateTime,
) -> String {
    let mut lines = Lines::default();
    lines.rule('=', REPORT_WIDTH);
    lines.push(format!("{business_name} - DAILY SALES REPORT"));
    lines.rule('=', REPORT_WIDTH);
    lines.push(format!("Date: {}", summary.date.format(DATE_FORMAT)));
    lines.push(format!("Generated: {}", generated_at.format(TIMESTAMP_FORMAT)));
    lines.rule('=', REPORT_WIDTH);

    if summary.is_empty() {
        lines.push("No sales recorded for this date.");
    } else {
        product_summary(&mut lines, &summary.quantities);

        lines.blank();
        lines.section("FINANCIAL SUMMARY:");
        lines.push(format!(
            "Regular Tortilla Subtotal: {}",
            summary.regular_tortilla_revenue
        ));
        lines.push(format!(
            "Supplier Tortilla Subtotal: {}",
            summary.supplier_tortilla_revenue
        ));
        lines.push(format!("Other Products Subtotal: {}", summary.other_revenue));
        lines.push(format!("GRAND TOTAL: {}", summary.grand_total));
        lines.push(format!("Total Sales Count: {}", summary.sale_count));

        lines.blank();
        lines.section("INDIVIDUAL SALES:");
        for (n, record) in records.iter().enumerate() {
            lines.push(format!(
                "Sale {} - {} - {}",
                n + 1,
                record.time.format(TIME_FORMAT),
                record.total
            ));
            for (product, qty) in record.quantities.non_zero() {
                let mut line = format!("  {}: {}", product.label(), product.format_quantity(qty));
                if product == Product::Special {
                    line.push_str(&format!(" @ {}", record.special_unit_price));
                }
                lines.push(line);
            }
            if record.frequent_customer {
                lines.push("  * Frequent Customer");
            }
            if record.supplier_rate {
                lines.push("  * Supplier Discount");
            }
            lines.blank();
        }
    }

    lines.rule('=', REPORT_WIDTH);
    lines.finish()
}

/// Daily report with its file name.
pub fn daily_report(
    business_name: &str,
    summary: &DailySummary,
    records: &[SaleRecord],
    generated_at: NaiveDateTime,
) -> TextReport {
    TextReport {
        file_name: daily_report_file_name(summary.date),
        content: render_daily_report(business_name, summary, records, generated_at),
    }
}

// =============================================================================
// Weekly Report
// =============================================================================

pub fn render_weekly_report(
    business_name: &str,
    summary: &WeeklySummary,
    generated_at: NaiveDateTime,
) -> String {
    let mut lines = Lines::default();
    lines.rule('=', REPORT_WIDTH);
    lines.push(format!("{business_name} - WEEKLY SALES REPORT"));
    lines.rule('=', REPORT_WIDTH);
    lines.push(format!(
        "Week: {} to {}",
        summary.week_start.format(DATE_FORMAT),
        summary.week_end.format(DATE_FORMAT)
    ));
    lines.push(format!("Generated: {}", generated_at.format(TIMESTAMP_FORMAT)));
    lines.rule('=', REPORT_WIDTH);

    product_summary(&mut lines, &summary.quantities);

    lines.blank();
    lines.section("DAILY BREAKDOWN:");
    for day in &summary.days {
        lines.push(format!(
            "{:<10} {:<12} {:>3} sales  ${:>8}",
            day.day_name,
            day.date.format(DATE_FORMAT).to_string(),
            day.sale_count,
            day.revenue.to_decimal_string()
        ));
    }

    lines.blank();
    lines.section("FINANCIAL SUMMARY:");
    lines.push(format!("TOTAL WEEKLY EARNINGS: {}", summary.total_revenue));
    lines.push(format!("Total Sales Count: {}", summary.sale_count));
    lines.push(format!("Days with Sales: {}/7", summary.days_with_sales));

    lines.rule('=', REPORT_WIDTH);
    lines.finish()
}

pub fn weekly_report(
    business_name: &str,
    summary: &WeeklySummary,
    generated_at: NaiveDateTime,
) -> TextReport {
    TextReport {
        file_name: weekly_report_file_name(summary.week_start, summary.week_end),
        content: render_weekly_report(business_name, summary, generated_at),
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Renders a customer receipt for one sale.
pub fn render_receipt(business_name: &str, record: &SaleRecord) -> String {
    let ctx = record.pricing_context();
    let mut lines = Lines::default();
    lines.rule('=', RECEIPT_WIDTH);
    lines.push(format!("{business_name} RECEIPT"));
    lines.rule('=', RECEIPT_WIDTH);
    lines.push(format!("Date: {}", record.date.format(DATE_FORMAT)));
    lines.push(format!("Time: {}", record.time.format(TIME_FORMAT)));
    lines.push(format!("Cashier: {}", record.recorded_by));
    lines.rule('-', RECEIPT_WIDTH);

    for (product, qty) in record.quantities.non_zero() {
        lines.push(format!(
            "{}: {} @ {} = {}",
            product.label(),
            product.format_quantity(qty),
            unit_price(product, &ctx),
            record.line_amount(product)
        ));
    }

    lines.rule('-', RECEIPT_WIDTH);
    lines.push(format!("TOTAL: {}", record.total));
    lines.push(format!("PAYMENT: {}", record.payment));
    lines.push(format!("CHANGE: {}", record.change));
    if record.frequent_customer {
        lines.push("* Frequent Customer");
    }
    if record.supplier_rate {
        lines.push("* Supplier Discount Applied");
    }
    lines.rule('=', RECEIPT_WIDTH);
    lines.push("Thank you for your business!");
    lines.rule('=', RECEIPT_WIDTH);
    lines.finish()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::quantity::Quantity;
    use crate::types::SaleDraft;
    use chrono::NaiveTime;

    const SHOP: &str = "TORTILLA BUSINESS";

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn generated() -> NaiveDateTime {
        d(10).and_hms_opt(18, 0, 0).unwrap()
    }

    fn tortilla_sale(kg: i64, supplier: bool, hour: u32) -> SaleRecord {
        let mut draft = SaleDraft::new();
        draft
            .set_quantity(Product::Tortilla, Quantity::from_units(kg))
            .unwrap();
        draft.set_supplier_rate(supplier);
        draft.set_payment(Money::from_cents(6000)).unwrap();
        draft
            .commit("maria", d(10), NaiveTime::from_hms_opt(hour, 15, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(daily_report_file_name(d(10)), "daily_report_2024-06-10.txt");
        assert_eq!(
            weekly_report_file_name(d(10), d(16)),
            "weekly_report_2024-06-10_to_2024-06-16.txt"
        );
        assert_eq!(export_file_name(d(10)), "sales_data_export_2024-06-10.csv");
    }

    #[test]
    fn test_daily_report_empty_day() {
        let summary = DailySummary::empty(d(10));
        let text = render_daily_report(SHOP, &summary, &[], generated());
        let expected = [
            "=".repeat(50),
            "TORTILLA BUSINESS - DAILY SALES REPORT".to_string(),
            "=".repeat(50),
            "Date: 2024-06-10".to_string(),
            "Generated: 2024-06-10 18:00:00".to_string(),
            "=".repeat(50),
            "No sales recorded for this date.".to_string(),
            "=".repeat(50),
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_daily_report_sections() {
        let mut special = SaleDraft::new();
        special
            .set_quantity(Product::Special, Quantity::from_units(3))
            .unwrap();
        special
            .set_special_unit_price(Money::from_cents(1250))
            .unwrap();
        special.set_frequent_customer(true);
        special.set_payment(Money::from_cents(4000)).unwrap();
        let special = special
            .commit("maria", d(10), NaiveTime::from_hms_opt(12, 0, 0).unwrap())
            .unwrap();

        let records = vec![tortilla_sale(1, true, 13), special, tortilla_sale(2, false, 9)];
        let summary = DailySummary::from_records(d(10), &records);
        let report = daily_report(SHOP, &summary, &records, generated());

        assert_eq!(report.file_name, "daily_report_2024-06-10.txt");
        let text = &report.content;
        assert!(text.contains("PRODUCT SUMMARY:\n------------------------------\nTortillas: 3.0 kg\nTotopos: 0 units"));
        assert!(text.contains("Special: 3 units\n\nFINANCIAL SUMMARY:"));
        assert!(text.contains("Regular Tortilla Subtotal: $50.00"));
        assert!(text.contains("Supplier Tortilla Subtotal: $22.00"));
        assert!(text.contains("Other Products Subtotal: $37.50"));
        assert!(text.contains("GRAND TOTAL: $109.50"));
        assert!(text.contains("Total Sales Count: 3"));
        assert!(text.contains("Sale 1 - 13:15:00 - $22.00\n  Tortillas: 1.0 kg\n  * Supplier Discount\n"));
        assert!(text.contains("Sale 2 - 12:00:00 - $37.50\n  Special: 3 units @ $12.50\n  * Frequent Customer\n"));
        assert!(text.contains("Sale 3 - 09:15:00 - $50.00"));
        assert!(text.ends_with(&format!("\n\n{}", "=".repeat(50))));
    }

    #[test]
    fn test_weekly_report_layout() {
        let records = vec![tortilla_sale(2, false, 9), tortilla_sale(1, true, 10)];
        let summary = WeeklySummary::from_records(d(12), &records);
        let report = weekly_report(SHOP, &summary, generated());

        assert_eq!(report.file_name, "weekly_report_2024-06-10_to_2024-06-16.txt");
        let text = &report.content;
        assert!(text.contains("TORTILLA BUSINESS - WEEKLY SALES REPORT"));
        assert!(text.contains("Week: 2024-06-10 to 2024-06-16"));
        assert!(text.contains("DAILY BREAKDOWN:\n------------------------------\n"));
        assert!(text.contains("Monday     2024-06-10     2 sales  $   72.00"));
        assert!(text.contains("Wednesday  2024-06-12     0 sales  $    0.00"));
        assert!(text.contains("Sunday     2024-06-16     0 sales  $    0.00"));
        assert!(text.contains("TOTAL WEEKLY EARNINGS: $72.00"));
        assert!(text.contains("Total Sales Count: 2"));
        assert!(text.contains("Days with Sales: 1/7"));
    }

    #[test]
    fn test_receipt() {
        let record = tortilla_sale(2, false, 9);
        let text = render_receipt(SHOP, &record);
        let expected = [
            "=".repeat(30),
            "TORTILLA BUSINESS RECEIPT".to_string(),
            "=".repeat(30),
            "Date: 2024-06-10".to_string(),
            "Time: 09:15:00".to_string(),
            "Cashier: maria".to_string(),
            "-".repeat(30),
            "Tortillas: 2.0 kg @ $25.00 = $50.00".to_string(),
            "-".repeat(30),
            "TOTAL: $50.00".to_string(),
            "PAYMENT: $60.00".to_string(),
            "CHANGE: $10.00".to_string(),
            "=".repeat(30),
            "Thank you for your business!".to_string(),
            "=".repeat(30),
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_receipt_supplier_flag() {
        let record = tortilla_sale(2, true, 9);
        let text = render_receipt(SHOP, &record);
        assert!(text.contains("Tortillas: 2.0 kg @ $22.00 = $44.00"));
        assert!(text.contains("CHANGE: $16.00\n* Supplier Discount Applied"));
    }

    #[test]
    fn test_report_bytes() {
        let report = TextReport {
            file_name: "x.txt".to_string(),
            content: "abc".to_string(),
        };
        assert_eq!(report.as_bytes(), b"abc");
        assert_eq!(report.into_bytes(), b"abc".to_vec());
    }
}
