//! Core business logic for Ferry.
//!
//! # Modules
//!
//! - [`export`] - Fan-out, dependency resolution, backfill and the export operations
//! - [`archive`] - Nested zip encoding of export results
//!
//! # Export Workflow
//!
//! 1. **Fan out**: one query per org unit × program combination, all concurrent
//! 2. **Merge**: concatenate the partial results in combination order
//! 3. **Resolve**: collect the tracked entity instance and enrollment ids the
//!    events refer to (all of them, or only those not fetched yet)
//! 4. **Backfill**: fetch those entities one request per id
//! 5. **Archive** (optional): write the bundle as a zip of three zips
//!
//! # Example
//!
//! ```rust,no_run
//! use ferry::adapters::tracker::TrackerClient;
//! use ferry::config::load_config;
//! use ferry::core::export::EventExporter;
//! use ferry::domain::OrgUnitId;
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ferry.toml")?;
//! let client = TrackerClient::new(config.server.clone())?;
//! let exporter = EventExporter::new(Arc::new(client));
//!
//! let archive = exporter
//!     .export_events_from_last_with_dependencies_zip(
//!         Utc::now() - chrono::Duration::days(1),
//!         &[OrgUnitId::new("ImspTQPwCqd")?],
//!         &[],
//!     )
//!     .await?;
//! std::fs::write("export.zip", archive)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod export;
