//! Export orchestration
//!
//! This module provides the export pipeline for Ferry:
//! - Fan-out of queries over org unit × program combinations
//! - Dependency resolution from event foreign keys
//! - Backfill fetching of tracked entity instances and enrollments
//! - The public [`EventExporter`] operations and their summary

pub mod exporter;
pub mod fanout;
pub mod fetcher;
pub mod resolver;
pub mod summary;

pub use exporter::EventExporter;
pub use fanout::{org_unit_program_combos, OrgUnitProgramCombo};
pub use resolver::{extract_missing, extract_related, Dependencies};
pub use summary::ExportSummary;
