//! Schedule cache and slot aggregation

pub mod metrics;
pub mod mutations;
pub mod normalizer;
pub mod ports;
pub mod projections;
pub mod range_cache;
pub mod session;
