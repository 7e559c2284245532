//! Observability infrastructure
//!
//! Process-wide tracing subscriber setup. Libraries in this workspace only
//! emit `tracing` events; the embedding application calls [`init_tracing`]
//! once at startup.

pub mod logging;

pub use logging::{build_filter, init_tracing};
