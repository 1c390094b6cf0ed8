//! Perk HTTP API Service.
//!
//! This crate provides the HTTP API for the perk points ledger, including:
//!
//! - Authentication with on-first-use account provisioning
//! - Merch purchases
//! - Point transfers between employees
//! - The aggregated account info view
//!
//! # Authentication
//!
//! `POST /api/auth` exchanges a username/password pair for an HS256 JWT;
//! every other `/api` route requires it as a bearer token.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthEmployee, TokenProvider};
pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
