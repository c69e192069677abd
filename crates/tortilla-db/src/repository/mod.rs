//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesLedger / CLI                                                     │
//! │       │                                                                 │
//! │       │  db.sales().list_by_date(date)                                 │
//! │       ▼                                                                 │
//! │  LedgerRepository                    UserRepository                    │
//! │  ├── append / append_many            ├── upsert                        │
//! │  ├── list_all / list_by_date(_range) ├── authenticate / is_admin       │
//! │  ├── get_by_index                    ├── list                          │
//! │  └── delete_by_index / delete_all    └── delete                        │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  sales_<user>.db                        users.db                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All SQL lives in these files.

pub mod sale;
pub mod user;
