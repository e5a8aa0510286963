//! # Blossom Common Library
//!
//! Shared code for the Blossom services:
//! - Database schema, models and queries
//! - Rank (gamma tier) calculation
//! - Markdown and link escaping helpers
//! - API key and password handling
//! - Configuration loading

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod formatting;
pub mod rank;
pub mod time;

pub use error::{Error, Result};
pub use rank::Rank;

/// Version string reported by every Blossom service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
