//! Account provisioning: get-or-create on first authentication.

use std::sync::Arc;

use perk_core::{Employee, LedgerError, Result, STARTING_BALANCE};
use perk_store::{Store, StoreError};

use crate::hasher::PasswordHasher;

/// Authenticates employees, creating the account on first use.
pub struct Provisioning {
    store: Arc<dyn Store>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Provisioning {
    /// Create the provisioning component.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Authenticate `username`, creating the account with the starting
    /// balance if it does not exist yet.
    ///
    /// Two requests for a brand-new username can race between the lookup
    /// and the insert; the loser's insert fails on the unique username and
    /// the lookup-and-verify path is re-run exactly once. Never loops.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidCredential`] on a password mismatch
    /// and [`LedgerError::Storage`] on infrastructure failure.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Employee> {
        match self.get_or_create(username, password).await {
            Err(LedgerError::AlreadyExists) => {
                // Lost the creation race to a concurrent request; the row
                // exists now, so one more lookup-and-verify pass settles it.
                self.get_or_create(username, password).await
            }
            result => result,
        }
    }

    async fn get_or_create(&self, username: &str, password: &str) -> Result<Employee> {
        let found = self
            .store
            .employee_by_username(username)
            .await
            .map_err(|e| LedgerError::storage("employee_by_username", e))?;

        if let Some(employee) = found {
            if !self.hasher.verify(password, &employee.password_hash)? {
                return Err(LedgerError::InvalidCredential);
            }
            return Ok(employee);
        }

        let hash = self.hasher.hash(password)?;
        match self
            .store
            .create_employee(username, &hash, STARTING_BALANCE)
            .await
        {
            Ok(employee) => {
                tracing::info!(
                    employee_id = %employee.id,
                    username,
                    balance = STARTING_BALANCE,
                    "Employee provisioned"
                );
                Ok(employee)
            }
            Err(StoreError::AlreadyExists) => Err(LedgerError::AlreadyExists),
            Err(e) => Err(LedgerError::storage("create_employee", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    use perk_core::{EmployeeId, Holding, Merch, TransferEntry};
    use perk_store::{MemoryStore, StoreTx};

    /// Deterministic stand-in for the bcrypt verifier.
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool> {
            Ok(hash == format!("plain:{password}"))
        }
    }

    fn provisioning(store: Arc<dyn Store>) -> Provisioning {
        Provisioning::new(store, Arc::new(PlainHasher))
    }

    #[tokio::test]
    async fn first_use_creates_account_with_starting_balance() {
        let prov = provisioning(Arc::new(MemoryStore::new()));

        let employee = prov.authenticate("alice", "pw").await.unwrap();
        assert_eq!(employee.username, "alice");
        assert_eq!(employee.balance, STARTING_BALANCE);
    }

    #[tokio::test]
    async fn repeat_use_returns_same_account() {
        let prov = provisioning(Arc::new(MemoryStore::new()));

        let first = prov.authenticate("alice", "pw").await.unwrap();
        let second = prov.authenticate("alice", "pw").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credential() {
        let prov = provisioning(Arc::new(MemoryStore::new()));
        prov.authenticate("alice", "pw").await.unwrap();

        let err = prov.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCredential));
    }

    /// Store wrapper that makes the first `create_employee` lose a
    /// simulated race: the "winner's" row is inserted, then the call
    /// reports the conflict.
    struct RacingStore {
        inner: MemoryStore,
        raced: AtomicBool,
    }

    #[async_trait]
    impl Store for RacingStore {
        async fn begin(&self) -> perk_store::Result<Box<dyn StoreTx>> {
            self.inner.begin().await
        }

        async fn employee_by_username(
            &self,
            username: &str,
        ) -> perk_store::Result<Option<Employee>> {
            self.inner.employee_by_username(username).await
        }

        async fn employee_by_id(&self, id: EmployeeId) -> perk_store::Result<Option<Employee>> {
            self.inner.employee_by_id(id).await
        }

        async fn create_employee(
            &self,
            username: &str,
            password_hash: &str,
            balance: i64,
        ) -> perk_store::Result<Employee> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner
                    .create_employee(username, password_hash, balance)
                    .await?;
                return Err(StoreError::AlreadyExists);
            }
            self.inner
                .create_employee(username, password_hash, balance)
                .await
        }

        async fn merch_by_name(&self, name: &str) -> perk_store::Result<Option<Merch>> {
            self.inner.merch_by_name(name).await
        }

        async fn holdings_by_employee(
            &self,
            id: EmployeeId,
        ) -> perk_store::Result<Vec<Holding>> {
            self.inner.holdings_by_employee(id).await
        }

        async fn transfers_by_employee(
            &self,
            id: EmployeeId,
        ) -> perk_store::Result<Vec<TransferEntry>> {
            self.inner.transfers_by_employee(id).await
        }
    }

    #[tokio::test]
    async fn lost_creation_race_retries_once_and_succeeds() {
        let store = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            raced: AtomicBool::new(false),
        });
        let prov = provisioning(Arc::clone(&store) as Arc<dyn Store>);

        let employee = prov.authenticate("alice", "pw").await.unwrap();

        // The retry resolved to the row the concurrent winner created.
        let stored = store
            .inner
            .employee_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(employee.id, stored.id);
    }

    #[tokio::test]
    async fn concurrent_first_authenticates_resolve_to_one_account() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let prov = Arc::new(provisioning(Arc::clone(&store)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let prov = Arc::clone(&prov);
            handles.push(tokio::spawn(async move {
                prov.authenticate("newcomer", "pw").await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "duplicate accounts created under race");
    }
}
