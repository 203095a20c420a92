//! # Chirp Common Library
//!
//! Shared code for the Chirp bird sound analysis service:
//! - Configuration resolution (CLI/ENV → TOML → compiled defaults)
//! - Common error type
//! - API request/response types

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
