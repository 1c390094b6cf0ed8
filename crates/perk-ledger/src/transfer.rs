//! Two-party point transfers.

use std::sync::Arc;

use perk_core::{EmployeeId, LedgerError, Result};
use perk_store::Store;

/// Moves points between two accounts atomically.
pub struct TransferEngine {
    store: Arc<dyn Store>,
}

impl TransferEngine {
    /// Create the transfer engine.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Transfer `amount` points from `source` to the account named
    /// `target_username`.
    ///
    /// Concurrent transfers between the same two accounts in opposite
    /// directions must not deadlock. The exclusive lock is therefore
    /// always requested on the lower account id before anything touches
    /// the higher one: when the target id is lower, its credit (an
    /// order-independent atomic delta that needs no prior read) is applied
    /// first; otherwise the source lock comes first. Every code path that
    /// writes more than one account row inside a transaction must keep
    /// this order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is not positive.
    /// - [`LedgerError::EmployeeNotFound`] if the target does not exist.
    /// - [`LedgerError::SelfTransferNotAllowed`] if source and target are
    ///   the same account; checked before any transaction opens.
    /// - [`LedgerError::InsufficientBalance`] if the source cannot cover
    ///   the amount; nothing is mutated.
    /// - [`LedgerError::Storage`] on infrastructure failure.
    pub async fn transfer(
        &self,
        source: EmployeeId,
        target_username: &str,
        amount: i64,
    ) -> Result<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let target = self
            .store
            .employee_by_username(target_username)
            .await
            .map_err(|e| LedgerError::storage("employee_by_username", e))?
            .ok_or(LedgerError::EmployeeNotFound)?;

        if target.id == source {
            return Err(LedgerError::SelfTransferNotAllowed);
        }

        let credit_target_first = target.id < source;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| LedgerError::storage("begin", e))?;

        // Lock order: lower id first, via either the credit delta or the
        // FOR UPDATE read.
        if credit_target_first {
            tx.adjust_balance(target.id, amount)
                .await
                .map_err(|e| LedgerError::storage("adjust_balance", e))?;
        }

        let source_row = tx
            .employee_for_update(source)
            .await
            .map_err(|e| LedgerError::storage("employee_for_update", e))?
            .ok_or(LedgerError::EmployeeNotFound)?;

        if source_row.balance < amount {
            // Dropping the transaction rolls back any credit applied above.
            return Err(LedgerError::InsufficientBalance {
                balance: source_row.balance,
                required: amount,
            });
        }

        tx.adjust_balance(source, -amount)
            .await
            .map_err(|e| LedgerError::storage("adjust_balance", e))?;

        if !credit_target_first {
            tx.adjust_balance(target.id, amount)
                .await
                .map_err(|e| LedgerError::storage("adjust_balance", e))?;
        }

        tx.record_transfer(source, target.id, amount)
            .await
            .map_err(|e| LedgerError::storage("record_transfer", e))?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::storage("commit", e))?;

        tracing::info!(
            source = %source,
            target = %target.id,
            amount,
            "Transfer committed"
        );

        Ok(())
    }
}
