//! Core types and utilities for the perk points ledger.
//!
//! This crate provides the foundational types used throughout the perk
//! platform:
//!
//! - **Identifiers**: `EmployeeId`, `MerchId`
//! - **Accounts**: `Employee`
//! - **Catalog**: `Merch`
//! - **History**: `Transfer`, `TransferEntry`, `Holding`, `Profile`
//!
//! # Point Unit
//!
//! Balances, prices and transfer amounts are whole points stored as `i64`.
//! There are no fractional points; an employee balance is never negative
//! after a committed operation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod employee;
pub mod error;
pub mod history;
pub mod ids;
pub mod merch;

pub use employee::{Employee, STARTING_BALANCE};
pub use error::{LedgerError, Result};
pub use history::{Holding, Profile, Transfer, TransferEntry};
pub use ids::{EmployeeId, MerchId};
pub use merch::Merch;
