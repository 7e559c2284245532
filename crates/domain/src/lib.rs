//! # Planora Domain
//!
//! Business domain types for the Planora schedule client.
//!
//! This crate contains:
//! - The uniform [`Slot`] record and its addressing key
//! - Half-open [`TimeWindow`]s and the wire timestamp format
//! - Mutation request/response records for the schedule service
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Planora crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
