//! SQLite repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use settlement_types::{
    CartItem, CartStore, CartVendor, CartVendorId, OrderId, OrderItem, OrderPayment,
    OrderRepository, OrderVendor, PaymentAttemptStatus, PaymentLedger, Payout,
    PayoutRepository, RepoError, UserId, VendorDirectory, VendorId, VendorPayoutProfile,
};

use crate::types::{
    DbCartItem, DbCartVendor, DbCurrency, DbOrderItem, DbOrderPayment, DbOrderVendor, DbPayout,
    DbVendorAccount, parse_currency,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation backing every storage port.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database exists per connection, so the pool must stay
        // at exactly one connection and never recycle it.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        for ddl in [
            include_str!("../migrations/0001_create_cart_tables.sql"),
            include_str!("../migrations/0002_create_order_tables.sql"),
            include_str!("../migrations/0003_create_payouts.sql"),
        ] {
            sqlx::raw_sql(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn order_currency(&self, order_id: OrderId) -> Result<Option<DbCurrency>, RepoError> {
        sqlx::query_as(r#"SELECT currency FROM order_vendors WHERE id = ?"#)
            .bind(order_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

/// Maps a UNIQUE constraint violation to Conflict, everything else to a plain
/// database error.
fn map_insert_err(e: sqlx::Error, conflict_msg: &str) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.message().contains("UNIQUE constraint failed") {
            return RepoError::Conflict(conflict_msg.to_string());
        }
    }
    RepoError::Database(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// CartStore (read-only)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CartStore for SqliteRepo {
    async fn get_cart_vendor(
        &self,
        user_id: UserId,
        cart_vendor_id: CartVendorId,
    ) -> Result<Option<CartVendor>, RepoError> {
        let row: Option<DbCartVendor> = sqlx::query_as(
            r#"SELECT cv.id, cv.session_id, cv.vendor_id, cv.subtotal, cv.delivery_charge,
                      cv.vendor_service_charge, cv.vat, cv.discount, cv.currency, cv.created_at
               FROM cart_vendors cv
               JOIN cart_sessions cs ON cs.id = cv.session_id
               WHERE cv.id = ? AND cs.user_id = ? AND cs.is_active = 1"#,
        )
        .bind(cart_vendor_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCartVendor::into_domain).transpose()
    }

    async fn list_cart_items(
        &self,
        cart_vendor_id: CartVendorId,
    ) -> Result<Vec<CartItem>, RepoError> {
        let currency: Option<DbCurrency> =
            sqlx::query_as(r#"SELECT currency FROM cart_vendors WHERE id = ?"#)
                .bind(cart_vendor_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        let currency = parse_currency(&currency.ok_or(RepoError::NotFound)?.currency)?;

        let rows: Vec<DbCartItem> = sqlx::query_as(
            r#"SELECT id, cart_vendor_id, item_id, quantity, unit_price, discount,
                      instructions, created_at
               FROM cart_items WHERE cart_vendor_id = ?
               ORDER BY created_at ASC"#,
        )
        .bind(cart_vendor_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.into_domain(currency)).collect()
    }
}

#[async_trait]
impl VendorDirectory for SqliteRepo {
    async fn get_payout_profile(
        &self,
        vendor_id: VendorId,
    ) -> Result<Option<VendorPayoutProfile>, RepoError> {
        let row: Option<DbVendorAccount> = sqlx::query_as(
            r#"SELECT vendor_id, vendor_user_id, connected_account_id, payout_account_id
               FROM vendor_accounts WHERE vendor_id = ?"#,
        )
        .bind(vendor_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbVendorAccount::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OrderRepository
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(
        &self,
        order: &OrderVendor,
        items: &[OrderItem],
    ) -> Result<(), RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO order_vendors
               (id, cart_vendor_id, session_id, user_id, vendor_id, delivery_address_id,
                instructions, expected_delivery_time, subtotal, delivery_charge,
                vendor_service_charge, vat, discount, currency, status, payment_status,
                created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(order.id.to_string())
        .bind(order.cart_vendor_id.to_string())
        .bind(order.session_id.to_string())
        .bind(order.user_id.to_string())
        .bind(order.vendor_id.to_string())
        .bind(order.delivery_address_id.to_string())
        .bind(&order.instructions)
        .bind(order.expected_delivery_time.to_rfc3339())
        .bind(order.subtotal.minor_units())
        .bind(order.delivery_charge.minor_units())
        .bind(order.vendor_service_charge.minor_units())
        .bind(order.vat.minor_units())
        .bind(order.discount.minor_units())
        .bind(order.subtotal.currency().to_string())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| map_insert_err(e, "Cart-vendor already checked out"))?;

        for item in items {
            sqlx::query(
                r#"INSERT INTO order_items
                   (id, order_vendor_id, item_id, quantity, unit_price, discount, subtotal,
                    instructions, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(item.id.to_string())
            .bind(item.order_id.to_string())
            .bind(item.item_id.to_string())
            .bind(item.quantity)
            .bind(item.unit_price.minor_units())
            .bind(item.discount.minor_units())
            .bind(item.subtotal.minor_units())
            .bind(&item.instructions)
            .bind(item.created_at.to_rfc3339())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderVendor>, RepoError> {
        let row: Option<DbOrderVendor> = sqlx::query_as(
            r#"SELECT id, cart_vendor_id, session_id, user_id, vendor_id, delivery_address_id,
                      instructions, expected_delivery_time, subtotal, delivery_charge,
                      vendor_service_charge, vat, discount, currency, status, payment_status,
                      created_at
               FROM order_vendors WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbOrderVendor::into_domain).transpose()
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepoError> {
        let currency = self
            .order_currency(order_id)
            .await?
            .ok_or(RepoError::NotFound)?;
        let currency = parse_currency(&currency.currency)?;

        let rows: Vec<DbOrderItem> = sqlx::query_as(
            r#"SELECT id, order_vendor_id, item_id, quantity, unit_price, discount, subtotal,
                      instructions, created_at
               FROM order_items WHERE order_vendor_id = ?
               ORDER BY created_at ASC"#,
        )
        .bind(order_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.into_domain(currency)).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PaymentLedger
// ─────────────────────────────────────────────────────────────────────────────

const SELECT_PAYMENT: &str = r#"SELECT id, order_vendor_id, txn_id, amount, currency, status,
                                       paid_at, created_at
                                FROM order_payments"#;

#[async_trait]
impl PaymentLedger for SqliteRepo {
    async fn insert_attempt(&self, payment: &OrderPayment) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO order_payments
               (id, order_vendor_id, txn_id, amount, currency, status, paid_at, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(payment.id.to_string())
        .bind(payment.order_id.to_string())
        .bind(&payment.txn_id)
        .bind(payment.amount.minor_units())
        .bind(payment.amount.currency().to_string())
        .bind(payment.status.as_str())
        .bind(payment.paid_at.map(|dt| dt.to_rfc3339()))
        .bind(payment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "Payment attempt already recorded for this txn"))?;

        Ok(())
    }

    async fn find_success_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderPayment>, RepoError> {
        let row: Option<DbOrderPayment> = sqlx::query_as(&format!(
            "{SELECT_PAYMENT} WHERE order_vendor_id = ? AND status = 'success'"
        ))
        .bind(order_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbOrderPayment::into_domain).transpose()
    }

    async fn find_by_txn(&self, txn_id: &str) -> Result<Option<OrderPayment>, RepoError> {
        let row: Option<DbOrderPayment> =
            sqlx::query_as(&format!("{SELECT_PAYMENT} WHERE txn_id = ?"))
                .bind(txn_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbOrderPayment::into_domain).transpose()
    }

    async fn record_success(
        &self,
        txn_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<OrderPayment, RepoError> {
        // Ledger row and order row move together or not at all.
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let row: Option<DbOrderPayment> =
            sqlx::query_as(&format!("{SELECT_PAYMENT} WHERE txn_id = ?"))
                .bind(txn_id)
                .fetch_optional(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        let payment = row.ok_or(RepoError::NotFound)?.into_domain()?;

        sqlx::query(
            r#"UPDATE order_payments SET status = 'success', paid_at = ? WHERE txn_id = ?"#,
        )
        .bind(paid_at.to_rfc3339())
        .bind(txn_id)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| map_insert_err(e, "Order already has a successful payment"))?;

        sqlx::query(r#"UPDATE order_vendors SET payment_status = 'paid' WHERE id = ?"#)
            .bind(payment.order_id.to_string())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(OrderPayment {
            status: PaymentAttemptStatus::Success,
            paid_at: Some(paid_at),
            ..payment
        })
    }

    async fn record_status(
        &self,
        txn_id: &str,
        status: &PaymentAttemptStatus,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE order_payments SET status = ? WHERE txn_id = ?"#)
            .bind(status.as_str())
            .bind(txn_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PayoutRepository
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PayoutRepository for SqliteRepo {
    async fn insert_payout(&self, payout: &Payout) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payouts
               (id, order_vendor_id, vendor_user_id, payout_account_id, connected_account_id,
                amount, currency, status, transfer_ref, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(payout.id.to_string())
        .bind(payout.order_id.to_string())
        .bind(payout.vendor_user_id.to_string())
        .bind(&payout.payout_account_id)
        .bind(&payout.connected_account_id)
        .bind(payout.amount.minor_units())
        .bind(payout.amount.currency().to_string())
        .bind(payout.status.as_str())
        .bind(&payout.transfer_ref)
        .bind(payout.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "Order already settled"))?;

        Ok(())
    }

    async fn find_payout_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payout>, RepoError> {
        let row: Option<DbPayout> = sqlx::query_as(
            r#"SELECT id, order_vendor_id, vendor_user_id, payout_account_id,
                      connected_account_id, amount, currency, status, transfer_ref, created_at
               FROM payouts WHERE order_vendor_id = ?"#,
        )
        .bind(order_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayout::into_domain).transpose()
    }
}
