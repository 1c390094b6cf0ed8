//! Profile aggregation: fan-out read of balance, holdings and history.

use std::sync::Arc;

use perk_core::{EmployeeId, LedgerError, Profile, Result};
use perk_store::Store;

/// Builds the aggregated profile view for one account.
pub struct ProfileAggregator {
    store: Arc<dyn Store>,
}

impl ProfileAggregator {
    /// Create the profile aggregator.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Collect balance, holdings and partitioned transfer history for
    /// `employee`.
    ///
    /// The three reads start concurrently in one cancellation scope; the
    /// first failure drops the sibling reads and is returned wrapped with
    /// the failing operation's name. No partial snapshot is ever returned.
    /// Empty result sets come back as empty vectors.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EmployeeNotFound`] for an unknown account,
    /// or [`LedgerError::Storage`] if any read fails.
    pub async fn collect(&self, employee: EmployeeId) -> Result<Profile> {
        let store = &self.store;

        let (employee_row, holdings, history) = tokio::try_join!(
            async move {
                store
                    .employee_by_id(employee)
                    .await
                    .map_err(|e| LedgerError::storage("employee_by_id", e))?
                    .ok_or(LedgerError::EmployeeNotFound)
            },
            async move {
                store
                    .holdings_by_employee(employee)
                    .await
                    .map_err(|e| LedgerError::storage("holdings_by_employee", e))
            },
            async move {
                store
                    .transfers_by_employee(employee)
                    .await
                    .map_err(|e| LedgerError::storage("transfers_by_employee", e))
            },
        )?;

        Ok(Profile::partition(employee_row.balance, holdings, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perk_store::MemoryStore;

    #[tokio::test]
    async fn fresh_account_yields_empty_collections() {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_employee("alice", "h", 1000).await.unwrap();
        let aggregator = ProfileAggregator::new(Arc::clone(&store) as Arc<dyn Store>);

        let profile = aggregator.collect(alice.id).await.unwrap();
        assert_eq!(profile.balance, 1000);
        assert!(profile.holdings.is_empty());
        assert!(profile.sent.is_empty());
        assert!(profile.received.is_empty());
    }

    #[tokio::test]
    async fn history_is_partitioned_by_direction() {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_employee("alice", "h", 1000).await.unwrap();
        let bob = store.create_employee("bob", "h", 1000).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(alice.id, -100).await.unwrap();
        tx.adjust_balance(bob.id, 100).await.unwrap();
        tx.record_transfer(alice.id, bob.id, 100).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(bob.id, -40).await.unwrap();
        tx.adjust_balance(alice.id, 40).await.unwrap();
        tx.record_transfer(bob.id, alice.id, 40).await.unwrap();
        tx.commit().await.unwrap();

        let aggregator = ProfileAggregator::new(Arc::clone(&store) as Arc<dyn Store>);
        let profile = aggregator.collect(alice.id).await.unwrap();

        assert_eq!(profile.balance, 940);
        assert_eq!(profile.sent.len(), 1);
        assert_eq!(profile.sent[0].counterparty_username, "bob");
        assert_eq!(profile.sent[0].amount, 100);
        assert_eq!(profile.received.len(), 1);
        assert_eq!(profile.received[0].amount, 40);
    }

    #[tokio::test]
    async fn unknown_employee_fails_with_no_partial_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = ProfileAggregator::new(store as Arc<dyn Store>);

        let err = aggregator.collect(EmployeeId::new(99)).await.unwrap_err();
        assert!(matches!(err, LedgerError::EmployeeNotFound));
    }
}
