//! Shared types, errors, and configuration for the village budget portal.
//!
//! This crate provides common types used across all other crates:
//! - Typed string IDs for sectors and sub-items
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
