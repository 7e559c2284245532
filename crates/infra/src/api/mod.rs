//! Schedule service API client
//!
//! HTTPS client for the remote schedule service. It reads schedule windows
//! and submits create/update/delete/reschedule requests, authenticated with
//! a bearer token from an [`AccessTokenProvider`].
//!
//! # Architecture
//!
//! - Uses the shared [`crate::http::HttpClient`] (no direct reqwest)
//! - Every request, read or mutation, is sent exactly once; no retries
//! - A missing token fails before any request is built

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::{AccessTokenProvider, SessionTokenProvider, StaticTokenProvider};
pub use client::ScheduleApiClient;
pub use errors::{ApiError, ApiErrorCategory};
