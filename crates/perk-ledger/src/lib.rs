//! Ledger consistency engine for the perk points platform.
//!
//! The four components here keep balances, holdings and transfer history
//! correct under concurrent access using nothing but the store's row-level
//! locking; there is no application-level serialization point:
//!
//! - [`Provisioning`]: get-or-create-on-first-use with race tolerance
//!   (bounded single retry on a lost creation race).
//! - [`TransferEngine`]: two-party atomic balance movement. Locks are
//!   always acquired in ascending account-id order, which is the sole
//!   mechanism preventing opposite-direction transfers from deadlocking.
//! - [`PurchaseEngine`]: one-party atomic debit plus holdings increment.
//! - [`ProfileAggregator`]: concurrent fan-out read of balance, holdings
//!   and transfer history with first-error cancellation.
//!
//! Each component receives its store handle explicitly so the transaction
//! and locking contracts can be exercised in isolation against the
//! in-memory backend.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod hasher;
pub mod profile;
pub mod provision;
pub mod purchase;
pub mod transfer;

pub use hasher::{BcryptHasher, PasswordHasher};
pub use profile::ProfileAggregator;
pub use provision::Provisioning;
pub use purchase::PurchaseEngine;
pub use transfer::TransferEngine;
