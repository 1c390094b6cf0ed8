//! Transfer history, holdings and the aggregated profile view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EmployeeId, MerchId};

/// An append-only transfer record.
///
/// This is the authoritative history of point movement. One physical record
/// serves both parties' histories: the sender sees it as "sent", the
/// receiver as "received".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Record id; assignment order is creation order.
    pub id: i64,

    /// The account debited.
    pub sender_id: EmployeeId,

    /// The account credited.
    pub receiver_id: EmployeeId,

    /// Amount moved, in points. Always positive.
    pub amount: i64,

    /// When the transfer committed.
    pub created_at: DateTime<Utc>,
}

/// A transfer record as seen from one account's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEntry {
    /// `true` when the viewing account is the sender.
    pub is_sender: bool,

    /// The other party's account id.
    pub counterparty_id: EmployeeId,

    /// The other party's display name.
    pub counterparty_username: String,

    /// Amount moved, in points.
    pub amount: i64,
}

/// Owned quantity of one catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// The catalog item.
    pub merch_id: MerchId,

    /// The item's name, resolved for display.
    pub merch_name: String,

    /// Owned quantity. At least 1; holdings are never decremented.
    pub quantity: i64,
}

/// Aggregated read-model for one account: balance, holdings and partitioned
/// transfer history.
///
/// Ephemeral: rebuilt on every request, never persisted. Empty result sets
/// are empty vectors, never absent values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Current point balance.
    pub balance: i64,

    /// All holdings, with item names resolved.
    pub holdings: Vec<Holding>,

    /// Transfers where this account is the sender, in creation order.
    pub sent: Vec<TransferEntry>,

    /// Transfers where this account is the receiver, in creation order.
    pub received: Vec<TransferEntry>,
}

impl Profile {
    /// Build a profile by partitioning a viewer-relative history into sent
    /// and received sub-lists, preserving the input order within each.
    #[must_use]
    pub fn partition(balance: i64, holdings: Vec<Holding>, history: Vec<TransferEntry>) -> Self {
        let mut sent = Vec::new();
        let mut received = Vec::new();
        for entry in history {
            if entry.is_sender {
                sent.push(entry);
            } else {
                received.push(entry);
            }
        }

        Self {
            balance,
            holdings,
            sent,
            received,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(is_sender: bool, amount: i64) -> TransferEntry {
        TransferEntry {
            is_sender,
            counterparty_id: EmployeeId::new(9),
            counterparty_username: "bob".into(),
            amount,
        }
    }

    #[test]
    fn partition_preserves_order_within_each_side() {
        let history = vec![entry(true, 1), entry(false, 2), entry(true, 3)];
        let profile = Profile::partition(100, Vec::new(), history);

        assert_eq!(profile.balance, 100);
        let sent: Vec<i64> = profile.sent.iter().map(|e| e.amount).collect();
        let received: Vec<i64> = profile.received.iter().map(|e| e.amount).collect();
        assert_eq!(sent, vec![1, 3]);
        assert_eq!(received, vec![2]);
    }

    #[test]
    fn partition_of_empty_history_is_empty_vectors() {
        let profile = Profile::partition(0, Vec::new(), Vec::new());
        assert!(profile.holdings.is_empty());
        assert!(profile.sent.is_empty());
        assert!(profile.received.is_empty());
    }
}
