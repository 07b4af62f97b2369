//! Storefront
//!
//! Self-hosted shopping cart and sales reporting backend.
//!
//! ## Features
//! - Per-user shopping carts with stock-checked, transactional mutations
//! - Sales, inventory, and category reporting
//! - Admin dashboard statistics and weekly popularity analytics
//! - Product-view tracking

pub mod admin;
pub mod auth;
pub mod cart;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod reporting;
pub mod store;

pub use error::{Error, Result};
