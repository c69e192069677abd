//! # Aggregator
//!
//! Per-day, per-week and overall summaries over Sale Records.
//!
//! ## Revenue Buckets (daily)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each record on the day:                                            │
//! │                                                                         │
//! │    tortilla line ──┬── supplier_rate = false ──► regular_tortilla       │
//! │                    └── supplier_rate = true  ──► supplier_tortilla      │
//! │                                                                         │
//! │    every other line (Special at the record's own price) ──► other      │
//! │                                                                         │
//! │  grand_total = regular_tortilla + supplier_tortilla + other            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Daily buckets are re-priced through the pricing policy. Weekly revenue
//! and the overview sum each record's stored `total`. For validated records
//! the two agree.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{day_name, week_dates};
use crate::money::Money;
use crate::pricing::Product;
use crate::types::{ProductQuantities, SaleRecord};

// =============================================================================
// Daily Summary
// =============================================================================

/// Totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub quantities: ProductQuantities,
    pub regular_tortilla_revenue: Money,
    pub supplier_tortilla_revenue: Money,
    pub other_revenue: Money,
    pub grand_total: Money,
    pub sale_count: usize,
}

impl DailySummary {
    /// All-zero summary for a day without sales.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            quantities: ProductQuantities::default(),
            regular_tortilla_revenue: Money::zero(),
            supplier_tortilla_revenue: Money::zero(),
            other_revenue: Money::zero(),
            grand_total: Money::zero(),
            sale_count: 0,
        }
    }

    /// Summarizes the records dated `date`; records on other days are ignored.
    pub fn from_records<'a, I>(date: NaiveDate, records: I) -> Self
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let mut summary = Self::empty(date);

        for record in records.into_iter().filter(|r| r.date == date) {
            summary.sale_count += 1;
            summary.quantities.accumulate(&record.quantities);

            let tortilla = record.line_amount(Product::Tortilla);
            if record.supplier_rate {
                summary.supplier_tortilla_revenue += tortilla;
            } else {
                summary.regular_tortilla_revenue += tortilla;
            }

            summary.other_revenue += Product::ALL
                .iter()
                .filter(|p| **p != Product::Tortilla)
                .map(|p| record.line_amount(*p))
                .sum::<Money>();
        }

        summary.grand_total = summary.regular_tortilla_revenue
            + summary.supplier_tortilla_revenue
            + summary.other_revenue;
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.sale_count == 0
    }
}

// =============================================================================
// Weekly Summary
// =============================================================================

/// One row of the weekly breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySales {
    pub day_name: &'static str,
    pub date: NaiveDate,
    pub sale_count: usize,
    pub revenue: Money,
}

/// Monday..Sunday totals for the week containing a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Exactly seven rows, Monday first.
    pub days: Vec<DaySales>,
    pub quantities: ProductQuantities,
    pub total_revenue: Money,
    pub sale_count: usize,
    pub days_with_sales: usize,
}

impl WeeklySummary {
    /// Summarizes the week containing `any_date_in_week`.
    ///
    /// Records outside the Monday..Sunday window are ignored, so callers may
    /// pass a wider set.
    pub fn from_records<'a, I>(any_date_in_week: NaiveDate, records: I) -> Self
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let dates = week_dates(any_date_in_week);
        let mut days: Vec<DaySales> = dates
            .iter()
            .map(|date| DaySales {
                day_name: day_name(*date),
                date: *date,
                sale_count: 0,
                revenue: Money::zero(),
            })
            .collect();
        let mut quantities = ProductQuantities::default();

        for record in records {
            let Some(day) = days.iter_mut().find(|d| d.date == record.date) else {
                continue;
            };
            day.sale_count += 1;
            day.revenue += record.total;
            quantities.accumulate(&record.quantities);
        }

        let total_revenue: Money = days.iter().map(|d| d.revenue).sum();
        let sale_count: usize = days.iter().map(|d| d.sale_count).sum();
        let days_with_sales = days.iter().filter(|d| d.sale_count > 0).count();

        Self {
            week_start: dates[0],
            week_end: dates[6],
            days,
            quantities,
            total_revenue,
            sale_count,
            days_with_sales,
        }
    }
}

// =============================================================================
// Sales Overview
// =============================================================================

/// Headline numbers over all records or an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesOverview {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sale_count: usize,
    pub total_revenue: Money,
    pub average_sale: Money,
    pub quantities: ProductQuantities,
    pub frequent_customer_sales: usize,
    pub supplier_sales: usize,
}

impl SalesOverview {
    /// Builds the overview; `range` is inclusive on both ends.
    pub fn from_records<'a, I>(range: Option<(NaiveDate, NaiveDate)>, records: I) -> Self
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let mut overview = Self {
            start: range.map(|(s, _)| s),
            end: range.map(|(_, e)| e),
            sale_count: 0,
            total_revenue: Money::zero(),
            average_sale: Money::zero(),
            quantities: ProductQuantities::default(),
            frequent_customer_sales: 0,
            supplier_sales: 0,
        };

        let in_range = |r: &&SaleRecord| match range {
            Some((start, end)) => r.date >= start && r.date <= end,
            None => true,
        };

        for record in records.into_iter().filter(in_range) {
            overview.sale_count += 1;
            overview.total_revenue += record.total;
            overview.quantities.accumulate(&record.quantities);
            if record.frequent_customer {
                overview.frequent_customer_sales += 1;
            }
            if record.supplier_rate {
                overview.supplier_sales += 1;
            }
        }

        overview.average_sale = overview
            .total_revenue
            .average_over(overview.sale_count as u64);
        overview
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
