//! # Database Migrations
//!
//! Embedded SQL migrations for the two database kinds.
//!
//! ## Schemas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Files                                     │
//! │                                                                         │
//! │  data_dir/                                                             │
//! │  ├── users.db           ← Schema::Users  (migrations/users/)           │
//! │  ├── sales_maria.db     ← Schema::Ledger (migrations/ledger/)          │
//! │  └── sales_admin.db     ← Schema::Ledger                               │
//! │                                                                         │
//! │  Each file tracks its own applied migrations in _sqlx_migrations       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/<schema>/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g., `002_add_notes.sql`)
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Sales ledger migrations, embedded at compile time.
static LEDGER_MIGRATOR: Migrator = sqlx::migrate!("./migrations/ledger");

/// Credential store migrations, embedded at compile time.
static USERS_MIGRATOR: Migrator = sqlx::migrate!("./migrations/users");

/// Which schema a database file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// One user's sales.
    Ledger,
    /// Shared credential store.
    Users,
}

impl Schema {
    fn migrator(self) -> &'static Migrator {
        match self {
            Schema::Ledger => &LEDGER_MIGRATOR,
            Schema::Users => &USERS_MIGRATOR,
        }
    }
}

/// Runs all pending migrations for `schema`.
///
/// Idempotent: safe to run on every open.
pub async fn run_migrations(pool: &SqlitePool, schema: Schema) -> DbResult<()> {
    info!(?schema, "Checking for pending migrations");

    schema.migrator().run(pool).await?;

    info!(?schema, "All migrations applied successfully");
    Ok(())
}
