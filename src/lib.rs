//! # Ferry - tracker event export with dependency backfill
//!
//! Ferry exports events from a tracker server's web API together with the
//! tracked entity instances and enrollments they refer to, and can bundle
//! the result into a nested zip archive.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fanning out** event queries over every org unit × program combination
//! - **Resolving** the entities referenced by the exported events
//! - **Backfilling** those entities with one request per identifier
//! - **Archiving** the result as a zip of `events.zip`,
//!   `trackedEntityInstances.zip` and `enrollments.zip`
//!
//! ## Architecture
//!
//! Ferry follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (export pipeline, archives)
//! - [`adapters`] - External integrations (tracker web API)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferry::adapters::tracker::TrackerClient;
//! use ferry::config::load_config;
//! use ferry::core::export::EventExporter;
//! use ferry::domain::OrgUnitId;
//! use ferry::domain::window::parse_date;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ferry.toml")?;
//!     let exporter = EventExporter::new(Arc::new(TrackerClient::new(config.server)?));
//!
//!     let archive = exporter
//!         .export_events_with_dependencies_zip(
//!             parse_date("2024-01-01")?,
//!             parse_date("2024-03-31")?,
//!             &[OrgUnitId::new("ImspTQPwCqd")?],
//!             &[],
//!         )
//!         .await?;
//!
//!     std::fs::write("export.zip", archive)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], whose error is
//! [`domain::FerryError`]. A failed query or fetch anywhere in an export
//! fails the whole export; no partial bundle is returned.
//!
//! ## Logging
//!
//! Ferry logs with the `tracing` crate; install a subscriber with
//! [`logging::init_logging`] or your own.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
