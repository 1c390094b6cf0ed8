//! Employee account type.

use serde::{Deserialize, Serialize};

use crate::EmployeeId;

/// Points granted once when an account is created.
pub const STARTING_BALANCE: i64 = 1000;

/// An employee account in the points ledger.
///
/// Accounts are created on first authentication and never deleted. The
/// balance is only mutated inside a store transaction that either holds an
/// exclusive lock on the row (debits) or applies a commutative delta
/// (credits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// The employee id assigned by the store.
    pub id: EmployeeId,

    /// Unique display name used to log in and to address transfers.
    pub username: String,

    /// One-way credential verifier. Opaque to the ledger; only the
    /// password hasher can interpret it.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Current point balance. Never negative after a committed operation.
    pub balance: i64,
}

impl Employee {
    /// Check whether the account can cover a debit of `amount` points.
    #[must_use]
    pub const fn has_sufficient_balance(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(balance: i64) -> Employee {
        Employee {
            id: EmployeeId::new(1),
            username: "alice".into(),
            password_hash: "$2b$12$hash".into(),
            balance,
        }
    }

    #[test]
    fn sufficient_balance_boundaries() {
        let emp = employee(1000);
        assert!(emp.has_sufficient_balance(500));
        assert!(emp.has_sufficient_balance(1000));
        assert!(!emp.has_sufficient_balance(1001));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let json = serde_json::to_value(employee(10)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["balance"], 10);
    }
}
