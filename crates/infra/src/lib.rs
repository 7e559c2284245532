//! # Planora Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The HTTP client and the schedule service API client
//! - Bearer-token providers
//! - Configuration loading from environment and files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `planora-core`
//! - Contains all "impure" code (network, files, process environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    AccessTokenProvider, ApiError, ApiErrorCategory, ScheduleApiClient, SessionTokenProvider,
    StaticTokenProvider,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
