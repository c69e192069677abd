//! # tortilla-db: Storage Layer for the Tortilla Ledger
//!
//! Per-user sales ledgers and the shared credential store, both on SQLite
//! through sqlx, plus CSV import/export.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tortilla Ledger Data Flow                          │
//! │                                                                         │
//! │  tortilla-cli (sell, daily, import ...)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tortilla-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │  SalesLedger  │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │  (ledger.rs)  │───►│ LedgerRepo    │    │  ledger/     │   │   │
//! │  │   │               │    │ UserRepo      │    │  users/      │   │   │
//! │  │   │  exchange.rs  │    │               │    │  (embedded)  │   │   │
//! │  │   │  CSV in/out   │    │  pool.rs      │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  data_dir/users.db   data_dir/sales_maria.db   sales_jose.db   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations for both schemas
//! - [`error`] - Storage and import error types
//! - [`repository`] - Ledger and credential repositories
//! - [`exchange`] - CSV export/import
//! - [`ledger`] - The user-scoped [`SalesLedger`] service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tortilla_db::{DbConfig, SalesLedger};
//!
//! let ledger = SalesLedger::open(DbConfig::user_ledger("./data", "maria"), "maria").await?;
//! let entry = ledger.commit_sale(&draft, now).await?;
//! let report = ledger.daily_report(now.date(), now).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod exchange;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorKind, ImportFormatError};
pub use exchange::{ImportReport, RowRejection};
pub use ledger::SalesLedger;
pub use migrations::Schema;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::sale::LedgerRepository;
pub use repository::user::{UserAccount, UserRepository};
