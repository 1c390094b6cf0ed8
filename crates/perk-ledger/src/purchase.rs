//! Merch purchases.

use std::sync::Arc;

use perk_core::{EmployeeId, LedgerError, Result};
use perk_store::Store;

/// Debits an account for a catalog item and increments its holding.
pub struct PurchaseEngine {
    store: Arc<dyn Store>,
}

impl PurchaseEngine {
    /// Create the purchase engine.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Purchase one unit of `merch_name` for `employee`.
    ///
    /// The price is read before the transaction opens; catalog rows are
    /// immutable reference data, so it needs no re-validation after the
    /// account row is locked. Purchases do not create transfer records.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::MerchNotFound`] if the item does not exist; no
    ///   transaction is opened.
    /// - [`LedgerError::EmployeeNotFound`] if the account does not exist.
    /// - [`LedgerError::InsufficientBalance`] if the balance cannot cover
    ///   the price; nothing is mutated.
    /// - [`LedgerError::Storage`] on infrastructure failure.
    pub async fn purchase(&self, employee: EmployeeId, merch_name: &str) -> Result<()> {
        let merch = self
            .store
            .merch_by_name(merch_name)
            .await
            .map_err(|e| LedgerError::storage("merch_by_name", e))?
            .ok_or(LedgerError::MerchNotFound)?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| LedgerError::storage("begin", e))?;

        let row = tx
            .employee_for_update(employee)
            .await
            .map_err(|e| LedgerError::storage("employee_for_update", e))?
            .ok_or(LedgerError::EmployeeNotFound)?;

        if row.balance < merch.price {
            return Err(LedgerError::InsufficientBalance {
                balance: row.balance,
                required: merch.price,
            });
        }

        tx.adjust_balance(employee, -merch.price)
            .await
            .map_err(|e| LedgerError::storage("adjust_balance", e))?;

        tx.add_holding(employee, merch.id)
            .await
            .map_err(|e| LedgerError::storage("add_holding", e))?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::storage("commit", e))?;

        tracing::info!(
            employee = %employee,
            merch = %merch.name,
            price = merch.price,
            "Purchase committed"
        );

        Ok(())
    }
}
