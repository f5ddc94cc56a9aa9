//! Writegate - Sliding-Window Rate Limiting for Public Write Endpoints
//!
//! This crate caps how many write attempts a client may make within a
//! rolling time window. One limiter per call site, each with its own
//! limit; two interchangeable backends cover both deployment shapes: an
//! in-process window for a single long-lived process, and a shared
//! SQLite-backed window for horizontally-scaled stateless instances.
//! Backend faults fail open: this is a best-effort guard, not a quota
//! ledger.

pub mod config;
pub mod error;
pub mod identity;
pub mod ratelimit;
pub mod store;
