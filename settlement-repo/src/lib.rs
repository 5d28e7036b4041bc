//! # Settlement Repository
//!
//! Concrete storage adapter for the order-settlement core. One SQLite pool
//! backs every storage port: `CartStore` and `VendorDirectory` (read-only
//! views onto data owned by other services), `OrderRepository`,
//! `PaymentLedger`, and `PayoutRepository`.

pub mod sqlite;
mod types;


pub use sqlite::SqliteRepo;

/// Build and initialize a repository from a database URL.
///
/// Connects, runs the embedded migrations, and returns a ready-to-use repo.
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://settlement.db?mode=rwc").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<SqliteRepo> {
    SqliteRepo::new(database_url).await
}
