//! PostgreSQL storage implementation.
//!
//! Balance safety rests on three database primitives: `SELECT ... FOR
//! UPDATE` row locks for debit checks, `balance = balance + $n` atomic
//! deltas for credits, and the `ON CONFLICT` upsert for holdings. The
//! `balance >= 0` CHECK constraint backs the application-level sufficiency
//! check.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use perk_core::{Employee, EmployeeId, Holding, Merch, MerchId, TransferEntry};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::{Store, StoreTx};

/// Connection pool size. Transfers hold a row lock for one round-trip, so a
/// modest pool is enough.
const MAX_CONNECTIONS: u32 = 16;

/// PostgreSQL-backed storage implementation.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: i64,
    username: String,
    password_hash: String,
    balance: i64,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: EmployeeId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            balance: row.balance,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MerchRow {
    id: i64,
    name: String,
    price: i64,
}

#[derive(sqlx::FromRow)]
struct HoldingRow {
    merch_id: i64,
    merch_name: String,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct TransferEntryRow {
    #[allow(dead_code)]
    id: i64,
    is_sender: bool,
    counterparty_id: i64,
    counterparty_username: String,
    amount: i64,
}

impl PgStore {
    /// Connect to the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!(max_connections = MAX_CONNECTIONS, "Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema and seed the merch catalog.
    ///
    /// Every statement is idempotent, so this is safe to run on every start.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub async fn apply_schema(&self) -> Result<()> {
        sqlx::raw_sql(schema::DDL).execute(&self.pool).await?;
        sqlx::raw_sql(&schema::catalog_seed_sql())
            .execute(&self.pool)
            .await?;

        tracing::info!("Database schema applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn employee_by_username(&self, username: &str) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, username, password_hash, balance FROM employee WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, username, password_hash, balance FROM employee WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn create_employee(
        &self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> Result<Employee> {
        let id: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO employee (username, password_hash, balance) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING \
             RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(balance)
        .fetch_optional(&self.pool)
        .await?;

        // No row back means the unique index already had the username.
        let (id,) = id.ok_or(StoreError::AlreadyExists)?;

        tracing::debug!(employee_id = id, username, "Employee created");

        Ok(Employee {
            id: EmployeeId::new(id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance,
        })
    }

    async fn merch_by_name(&self, name: &str) -> Result<Option<Merch>> {
        let row =
            sqlx::query_as::<_, MerchRow>("SELECT id, name, price FROM merch WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| Merch {
            id: MerchId::new(row.id),
            name: row.name,
            price: row.price,
        }))
    }

    async fn holdings_by_employee(&self, id: EmployeeId) -> Result<Vec<Holding>> {
        let rows = sqlx::query_as::<_, HoldingRow>(
            "SELECT h.merch_id, m.name AS merch_name, h.quantity \
             FROM holding h \
             INNER JOIN merch m ON m.id = h.merch_id \
             WHERE h.employee_id = $1 \
             ORDER BY h.merch_id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Holding {
                merch_id: MerchId::new(row.merch_id),
                merch_name: row.merch_name,
                quantity: row.quantity,
            })
            .collect())
    }

    async fn transfers_by_employee(&self, id: EmployeeId) -> Result<Vec<TransferEntry>> {
        // One physical record serves both parties; each side of the UNION
        // derives the viewer-relative direction and counterparty.
        let rows = sqlx::query_as::<_, TransferEntryRow>(
            "SELECT t.id, true AS is_sender, t.receiver_id AS counterparty_id, \
                    e.username AS counterparty_username, t.amount \
             FROM transfer t \
             INNER JOIN employee e ON e.id = t.receiver_id \
             WHERE t.sender_id = $1 \
             UNION ALL \
             SELECT t.id, false AS is_sender, t.sender_id AS counterparty_id, \
                    e.username AS counterparty_username, t.amount \
             FROM transfer t \
             INNER JOIN employee e ON e.id = t.sender_id \
             WHERE t.receiver_id = $1 \
             ORDER BY id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TransferEntry {
                is_sender: row.is_sender,
                counterparty_id: EmployeeId::new(row.counterparty_id),
                counterparty_username: row.counterparty_username,
                amount: row.amount,
            })
            .collect())
    }
}

/// One open PostgreSQL transaction. Dropped without commit, sqlx rolls the
/// transaction back when the connection returns to the pool.
struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn employee_for_update(&mut self, id: EmployeeId) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, username, password_hash, balance FROM employee WHERE id = $1 FOR UPDATE",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn adjust_balance(&mut self, id: EmployeeId, delta: i64) -> Result<()> {
        let result = sqlx::query("UPDATE employee SET balance = balance + $2 WHERE id = $1")
            .bind(id.get())
            .bind(delta)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn record_transfer(
        &mut self,
        sender: EmployeeId,
        receiver: EmployeeId,
        amount: i64,
    ) -> Result<()> {
        sqlx::query("INSERT INTO transfer (sender_id, receiver_id, amount) VALUES ($1, $2, $3)")
            .bind(sender.get())
            .bind(receiver.get())
            .bind(amount)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn add_holding(&mut self, employee: EmployeeId, merch: MerchId) -> Result<()> {
        sqlx::query(
            "INSERT INTO holding (employee_id, merch_id, quantity) \
             VALUES ($1, $2, 1) \
             ON CONFLICT (employee_id, merch_id) \
             DO UPDATE SET quantity = holding.quantity + 1",
        )
        .bind(employee.get())
        .bind(merch.get())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
