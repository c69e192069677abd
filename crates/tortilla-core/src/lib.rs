//! # tortilla-core: Pure Business Logic for the Tortilla Ledger
//!
//! This crate is the **heart** of the ledger. It holds the pricing policy,
//! the sale types, validation, aggregation and report rendering as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tortilla Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tortilla-cli (clap)                          │   │
//! │  │    sell, list, delete, daily, weekly, report, import, export    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tortilla-db (SalesLedger service)                 │   │
//! │  │       SQLite ledger per user, credentials, CSV exchange         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tortilla-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │ pricing │ │  types  │ │validation│ │aggregate │ │ report │ │   │
//! │  │   │ Product │ │  Draft  │ │  rules   │ │  Daily   │ │  text  │ │   │
//! │  │   │ prices  │ │ Record  │ │          │ │  Weekly  │ │  docs  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] / [`quantity`] - Fixed-point integer amounts
//! - [`pricing`] - Product catalogue and the pricing policy
//! - [`types`] - SaleDraft, SaleRecord, LedgerEntry
//! - [`validation`] - Sale invariants
//! - [`calendar`] - Monday-based week windows
//! - [`aggregate`] - Daily, weekly and overview summaries
//! - [`report`] - Daily/weekly reports and receipts
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{NaiveDate, NaiveTime};
//! use tortilla_core::{Money, Product, Quantity, SaleDraft};
//!
//! let mut draft = SaleDraft::new();
//! draft.set_quantity(Product::Tortilla, Quantity::from_units(2)).unwrap();
//! draft.set_payment(Money::from_cents(6000)).unwrap();
//!
//! let record = draft
//!     .commit(
//!         "maria",
//!         NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
//!         NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
//!     )
//!     .unwrap();
//! assert_eq!(record.total.to_string(), "$50.00");
//! assert_eq!(record.change.to_string(), "$10.00");
//! ```

pub mod aggregate;
pub mod calendar;
pub mod error;
mod fixed;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod report;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use aggregate::{DailySummary, DaySales, SalesOverview, WeeklySummary};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PricingContext, Product};
pub use quantity::Quantity;
pub use report::TextReport;
pub use types::{LedgerEntry, ProductQuantities, SaleDraft, SaleRecord};
pub use validation::ValidationResult;

// =============================================================================
// Business Constants
// =============================================================================

/// Business name printed on reports when none is configured.
pub const DEFAULT_BUSINESS_NAME: &str = "TORTILLA BUSINESS";

/// Persisted column order shared by storage, export and import.
pub const RECORD_COLUMNS: [&str; 15] = [
    "date",
    "time",
    "username",
    "tortilla_qty",
    "totopos_qty",
    "cacahuates_qty",
    "mix_qty",
    "salted_chips_qty",
    "special_qty",
    "special_price",
    "frequent_customer",
    "supplier",
    "total",
    "payment",
    "change",
];
