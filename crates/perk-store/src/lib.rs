//! Storage layer for the perk points ledger.
//!
//! This crate provides persistent storage for employees, the merch catalog,
//! holdings and transfer history against a transactional relational store.
//!
//! # Architecture
//!
//! The [`Store`] trait covers pool-level lookups and the atomic
//! create-if-absent used by provisioning. Multi-row mutations go through an
//! explicit transaction boundary: [`Store::begin`] hands out a [`StoreTx`]
//! whose operations are atomic as a group: either the transaction commits
//! and all of them are visible, or it is dropped and none are.
//!
//! Two implementations are provided:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, using `SELECT ... FOR UPDATE` row
//!   locks, `balance = balance + $n` atomic deltas and `ON CONFLICT` upserts.
//! - [`MemoryStore`]: an in-memory store for tests and local development
//!   whose per-row async locks reproduce the blocking behavior of row-level
//!   locking, so lock-ordering mistakes show up as real deadlocks in tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use perk_core::{Employee, EmployeeId, Holding, Merch, MerchId, TransferEntry};

/// Pool-level store operations.
///
/// Lookups return `Ok(None)` on a miss so callers can tell "not found" apart
/// from infrastructure failure. Handles are shared via `Arc<dyn Store>` and
/// passed into each component explicitly.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be acquired.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;

    /// Look up an employee by unique username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn employee_by_username(&self, username: &str) -> Result<Option<Employee>>;

    /// Look up an employee by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>>;

    /// Atomically create an employee if the username is free.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the username is taken,
    /// including when a concurrent request created it between the caller's
    /// lookup and this insert.
    async fn create_employee(
        &self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> Result<Employee>;

    /// Look up a catalog item by unique name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn merch_by_name(&self, name: &str) -> Result<Option<Merch>>;

    /// List an employee's holdings with item names resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn holdings_by_employee(&self, id: EmployeeId) -> Result<Vec<Holding>>;

    /// List all transfers touching an employee, viewer-relative, in
    /// creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn transfers_by_employee(&self, id: EmployeeId) -> Result<Vec<TransferEntry>>;
}

/// One open transaction.
///
/// All mutations are atomic as a group. Dropping the transaction without
/// calling [`StoreTx::commit`] rolls everything back.
///
/// Row write locks, taken either explicitly by
/// [`StoreTx::employee_for_update`] or implicitly by
/// [`StoreTx::adjust_balance`], are held until commit or rollback. Any code
/// path that touches more than one employee row inside a transaction must
/// touch the lower [`EmployeeId`] first.
#[async_trait]
pub trait StoreTx: Send {
    /// Read an employee row under an exclusive lock
    /// (`SELECT ... FOR UPDATE`-equivalent). Blocks while another
    /// transaction holds the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn employee_for_update(&mut self, id: EmployeeId) -> Result<Option<Employee>>;

    /// Apply a commutative balance delta (`balance = balance + delta`).
    /// Does not require a prior [`StoreTx::employee_for_update`]; the row
    /// write lock it takes is held until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the employee does not exist.
    async fn adjust_balance(&mut self, id: EmployeeId, delta: i64) -> Result<()>;

    /// Append a transfer record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn record_transfer(
        &mut self,
        sender: EmployeeId,
        receiver: EmployeeId,
        amount: i64,
    ) -> Result<()>;

    /// Increment the holding for `(employee, merch)` by one, creating it at
    /// quantity 1 if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn add_holding(&mut self, employee: EmployeeId, merch: MerchId) -> Result<()>;

    /// Commit the transaction, making all mutations visible atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; no mutation persists.
    async fn commit(self: Box<Self>) -> Result<()>;
}
