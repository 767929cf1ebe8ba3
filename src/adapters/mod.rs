//! Adapters for external systems
//!
//! - [`tracker`] - read access to the tracker web API
//!
//! Adapters translate between external formats and domain types and keep
//! third-party client types out of the rest of the crate.

pub mod tracker;

pub use tracker::{TrackerApi, TrackerClient};
