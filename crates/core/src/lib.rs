//! Core budget logic for the village portal.
//!
//! This crate contains pure business logic with ZERO web or storage dependencies.
//! All domain types, percentage rules, and allocation calculations live here.
//!
//! # Modules
//!
//! - `budget` - Annual budget tree, allocation engine, editor and view-models
//! - `privilege` - The boolean admin gate consulted by every editing entry point

pub mod budget;
pub mod privilege;

pub use privilege::PrivilegeGate;
