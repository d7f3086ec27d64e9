//! Yemeni Market Core - Shared domain types.
//!
//! This crate provides common types used across all Yemeni Market components:
//! - `storefront` - JSON API backing the storefront SPA and the back-office
//! - `cli` - Command-line tools for migrations, seeding and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Checkout arithmetic lives here so the payment
//! intent and the order transaction always agree on totals.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money and checkout totals, statuses, slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
