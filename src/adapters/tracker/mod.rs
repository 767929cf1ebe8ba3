//! Tracker web API adapter
//!
//! This module provides the `TrackerApi` trait the export pipeline reads
//! through, the reqwest-backed [`TrackerClient`], an in-memory stand-in for
//! tests, and the response models.

pub mod api;
pub mod client;
pub mod memory;
pub mod models;

pub use api::{EntityEndpoint, EntityQuery, EventQuery, OuMode, TrackerApi};
pub use client::TrackerClient;
pub use memory::{InMemoryTracker, RecordedCall};
pub use models::{clean_record, ListPage, Pager};
