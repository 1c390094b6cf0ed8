//! In-memory storage implementation for tests and local development.
//!
//! Concurrency semantics mirror the PostgreSQL backend closely enough for
//! the locking protocol to be testable: every row a transaction writes
//! (via [`StoreTx::employee_for_update`] or [`StoreTx::adjust_balance`]) is
//! guarded by a per-row async mutex held until commit or rollback, and all
//! mutations are buffered and applied atomically at commit. A transaction
//! that acquires rows in the wrong order therefore deadlocks here exactly
//! as it would against the real database.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use perk_core::{Employee, EmployeeId, Holding, Merch, MerchId, Transfer, TransferEntry};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::{Store, StoreTx};

/// Committed state, behind one async mutex. Only ever locked for short,
/// non-blocking sections; row-level waiting happens on the per-row locks.
struct State {
    next_employee_id: i64,
    next_transfer_id: i64,
    employees: BTreeMap<i64, Employee>,
    username_index: HashMap<String, i64>,
    merch: BTreeMap<i64, Merch>,
    holdings: BTreeMap<(i64, i64), i64>,
    transfers: Vec<Transfer>,
}

/// In-memory storage implementation.
///
/// Created with the default merch catalog seeded, matching what
/// [`crate::PgStore::apply_schema`] seeds into a fresh database.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    row_locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl MemoryStore {
    /// Create an empty store with the default catalog.
    #[must_use]
    pub fn new() -> Self {
        let mut merch = BTreeMap::new();
        let mut next_id = 1_i64;
        for (name, price) in schema::CATALOG {
            merch.insert(
                next_id,
                Merch {
                    id: MerchId::new(next_id),
                    name: (*name).to_string(),
                    price: *price,
                },
            );
            next_id += 1;
        }

        Self {
            state: Arc::new(Mutex::new(State {
                next_employee_id: 1,
                next_transfer_id: 1,
                employees: BTreeMap::new(),
                username_index: HashMap::new(),
                merch,
                holdings: BTreeMap::new(),
                transfers: Vec::new(),
            })),
            row_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        Ok(Box::new(MemoryStoreTx {
            state: Arc::clone(&self.state),
            row_locks: Arc::clone(&self.row_locks),
            held: HashMap::new(),
            pending: Vec::new(),
        }))
    }

    async fn employee_by_username(&self, username: &str) -> Result<Option<Employee>> {
        let state = self.state.lock().await;
        Ok(state
            .username_index
            .get(username)
            .and_then(|id| state.employees.get(id))
            .cloned())
    }

    async fn employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>> {
        let state = self.state.lock().await;
        Ok(state.employees.get(&id.get()).cloned())
    }

    async fn create_employee(
        &self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> Result<Employee> {
        let mut state = self.state.lock().await;
        if state.username_index.contains_key(username) {
            return Err(StoreError::AlreadyExists);
        }

        let id = state.next_employee_id;
        state.next_employee_id += 1;

        let employee = Employee {
            id: EmployeeId::new(id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance,
        };
        state.employees.insert(id, employee.clone());
        state.username_index.insert(username.to_string(), id);

        Ok(employee)
    }

    async fn merch_by_name(&self, name: &str) -> Result<Option<Merch>> {
        let state = self.state.lock().await;
        Ok(state.merch.values().find(|m| m.name == name).cloned())
    }

    async fn holdings_by_employee(&self, id: EmployeeId) -> Result<Vec<Holding>> {
        let state = self.state.lock().await;
        Ok(state
            .holdings
            .iter()
            .filter(|((employee, _), _)| *employee == id.get())
            .map(|((_, merch_id), quantity)| Holding {
                merch_id: MerchId::new(*merch_id),
                merch_name: state
                    .merch
                    .get(merch_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn transfers_by_employee(&self, id: EmployeeId) -> Result<Vec<TransferEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .transfers
            .iter()
            .filter(|t| t.sender_id == id || t.receiver_id == id)
            .map(|t| {
                let is_sender = t.sender_id == id;
                let counterparty_id = if is_sender { t.receiver_id } else { t.sender_id };
                TransferEntry {
                    is_sender,
                    counterparty_id,
                    counterparty_username: state
                        .employees
                        .get(&counterparty_id.get())
                        .map(|e| e.username.clone())
                        .unwrap_or_default(),
                    amount: t.amount,
                }
            })
            .collect())
    }
}

enum Mutation {
    AdjustBalance { employee: i64, delta: i64 },
    RecordTransfer { sender: i64, receiver: i64, amount: i64 },
    AddHolding { employee: i64, merch: i64 },
}

/// One open in-memory transaction: held row guards plus buffered mutations.
/// Dropping it releases the guards and discards the buffer.
struct MemoryStoreTx {
    state: Arc<Mutex<State>>,
    row_locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
    held: HashMap<i64, OwnedMutexGuard<()>>,
    pending: Vec<Mutation>,
}

impl MemoryStoreTx {
    /// Take the row lock for `id`, waiting if another transaction holds it.
    /// Re-entrant within one transaction.
    async fn lock_row(&mut self, id: i64) {
        if self.held.contains_key(&id) {
            return;
        }
        let lock = {
            let mut locks = self.row_locks.lock().await;
            Arc::clone(locks.entry(id).or_default())
        };
        let guard = lock.lock_owned().await;
        self.held.insert(id, guard);
    }

    async fn employee_exists(&self, id: i64) -> bool {
        self.state.lock().await.employees.contains_key(&id)
    }

    /// Net balance delta this transaction has buffered for `id`.
    fn pending_delta(&self, id: i64) -> i64 {
        self.pending
            .iter()
            .filter_map(|m| match m {
                Mutation::AdjustBalance { employee, delta } if *employee == id => Some(*delta),
                _ => None,
            })
            .sum()
    }
}

#[async_trait]
impl StoreTx for MemoryStoreTx {
    async fn employee_for_update(&mut self, id: EmployeeId) -> Result<Option<Employee>> {
        // Locking a missing row is a no-op, as with FOR UPDATE.
        if !self.employee_exists(id.get()).await {
            return Ok(None);
        }
        self.lock_row(id.get()).await;

        let committed = {
            let state = self.state.lock().await;
            state.employees.get(&id.get()).cloned()
        };

        Ok(committed.map(|mut employee| {
            employee.balance += self.pending_delta(id.get());
            employee
        }))
    }

    async fn adjust_balance(&mut self, id: EmployeeId, delta: i64) -> Result<()> {
        if !self.employee_exists(id.get()).await {
            return Err(StoreError::NotFound);
        }
        // The write lock is held until the transaction ends, as a row
        // UPDATE would hold it in the real database.
        self.lock_row(id.get()).await;
        self.pending.push(Mutation::AdjustBalance {
            employee: id.get(),
            delta,
        });
        Ok(())
    }

    async fn record_transfer(
        &mut self,
        sender: EmployeeId,
        receiver: EmployeeId,
        amount: i64,
    ) -> Result<()> {
        self.pending.push(Mutation::RecordTransfer {
            sender: sender.get(),
            receiver: receiver.get(),
            amount,
        });
        Ok(())
    }

    async fn add_holding(&mut self, employee: EmployeeId, merch: MerchId) -> Result<()> {
        self.pending.push(Mutation::AddHolding {
            employee: employee.get(),
            merch: merch.get(),
        });
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().await;

        // Validate the balance constraint before applying anything, so a
        // failed commit leaves no partial state.
        let mut net: HashMap<i64, i64> = HashMap::new();
        for mutation in &self.pending {
            if let Mutation::AdjustBalance { employee, delta } = mutation {
                *net.entry(*employee).or_insert(0) += delta;
            }
        }
        for (employee, delta) in &net {
            let row = state.employees.get(employee).ok_or(StoreError::NotFound)?;
            if row.balance + delta < 0 {
                return Err(StoreError::Database(
                    "balance check constraint violated".into(),
                ));
            }
        }

        for mutation in self.pending.drain(..) {
            match mutation {
                Mutation::AdjustBalance { employee, delta } => {
                    if let Some(row) = state.employees.get_mut(&employee) {
                        row.balance += delta;
                    }
                }
                Mutation::RecordTransfer {
                    sender,
                    receiver,
                    amount,
                } => {
                    let id = state.next_transfer_id;
                    state.next_transfer_id += 1;
                    state.transfers.push(Transfer {
                        id,
                        sender_id: EmployeeId::new(sender),
                        receiver_id: EmployeeId::new(receiver),
                        amount,
                        created_at: Utc::now(),
                    });
                }
                Mutation::AddHolding { employee, merch } => {
                    *state.holdings.entry((employee, merch)).or_insert(0) += 1;
                }
            }
        }

        drop(state);
        self.held.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn create_employee_rejects_taken_username() {
        let store = MemoryStore::new();
        store.create_employee("alice", "h1", 1000).await.unwrap();

        let err = store.create_employee("alice", "h2", 1000).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));
    }

    #[tokio::test]
    async fn catalog_is_seeded() {
        let store = MemoryStore::new();
        let cup = store.merch_by_name("cup").await.unwrap().unwrap();
        assert_eq!(cup.price, 20);
        assert!(store.merch_by_name("yacht").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();
        let alice = store.create_employee("alice", "h", 100).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(alice.id, -40).await.unwrap();
        drop(tx);

        let reread = store.employee_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(reread.balance, 100);
    }

    #[tokio::test]
    async fn committed_mutations_apply_atomically() {
        let store = MemoryStore::new();
        let alice = store.create_employee("alice", "h", 100).await.unwrap();
        let bob = store.create_employee("bob", "h", 0).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(alice.id, -30).await.unwrap();
        tx.adjust_balance(bob.id, 30).await.unwrap();
        tx.record_transfer(alice.id, bob.id, 30).await.unwrap();
        tx.commit().await.unwrap();

        let alice = store.employee_by_id(alice.id).await.unwrap().unwrap();
        let bob = store.employee_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!((alice.balance, bob.balance), (70, 30));

        let history = store.transfers_by_employee(alice.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_sender);
        assert_eq!(history[0].counterparty_username, "bob");
    }

    #[tokio::test]
    async fn for_update_sees_own_pending_deltas() {
        let store = MemoryStore::new();
        let alice = store.create_employee("alice", "h", 100).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(alice.id, -60).await.unwrap();
        let row = tx.employee_for_update(alice.id).await.unwrap().unwrap();
        assert_eq!(row.balance, 40);
    }

    #[tokio::test]
    async fn holding_upsert_increments() {
        let store = MemoryStore::new();
        let alice = store.create_employee("alice", "h", 1000).await.unwrap();
        let cup = store.merch_by_name("cup").await.unwrap().unwrap();

        for _ in 0..2 {
            let mut tx = store.begin().await.unwrap();
            tx.add_holding(alice.id, cup.id).await.unwrap();
            tx.commit().await.unwrap();
        }

        let holdings = store.holdings_by_employee(alice.id).await.unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].quantity, 2);
        assert_eq!(holdings[0].merch_name, "cup");
    }

    #[tokio::test]
    async fn row_lock_blocks_second_writer_until_commit() {
        let store = MemoryStore::new();
        let alice = store.create_employee("alice", "h", 100).await.unwrap();

        let mut tx1 = store.begin().await.unwrap();
        tx1.employee_for_update(alice.id).await.unwrap();

        let contender = store.clone();
        let id = alice.id;
        let mut handle = tokio::spawn(async move {
            let mut tx2 = contender.begin().await.unwrap();
            tx2.employee_for_update(id).await.unwrap();
            tx2.commit().await.unwrap();
        });

        let blocked = tokio::time::timeout(Duration::from_millis(50), &mut handle).await;
        assert!(blocked.is_err(), "second locker ran while row was held");

        tx1.commit().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("second locker should proceed after commit")
            .unwrap();
    }

    #[tokio::test]
    async fn commit_rejects_negative_balance() {
        let store = MemoryStore::new();
        let alice = store.create_employee("alice", "h", 10).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(alice.id, -50).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));

        let reread = store.employee_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(reread.balance, 10);
    }
}
