//! Export summary and reporting
//!
//! This module defines the per-run counts an export reports once it has
//! assembled its bundle.

use crate::domain::{ResultBundle, TimeWindow};
use std::time::Duration;

/// Summary of an export operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Time filter the export ran with
    pub window: TimeWindow,

    /// Number of org unit × program combinations queried
    pub combinations: usize,

    /// Events in the bundle
    pub events: usize,

    /// Tracked entity instances in the bundle, backfilled ones included
    pub tracked_entity_instances: usize,

    /// Enrollments in the bundle, backfilled ones included
    pub enrollments: usize,

    /// Tracked entity instances fetched one by one
    pub backfilled_tracked_entity_instances: usize,

    /// Enrollments fetched one by one
    pub backfilled_enrollments: usize,

    /// Duration of the export
    pub duration: Duration,
}

impl ExportSummary {
    /// Create a summary of `bundle`; backfill counts start at zero
    pub fn new(window: TimeWindow, combinations: usize, bundle: &ResultBundle) -> Self {
        Self {
            window,
            combinations,
            events: bundle.events.len(),
            tracked_entity_instances: bundle.tracked_entity_instances.len(),
            enrollments: bundle.enrollments.len(),
            backfilled_tracked_entity_instances: 0,
            backfilled_enrollments: 0,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the backfill counts
    pub fn with_backfill(mut self, tracked_entity_instances: usize, enrollments: usize) -> Self {
        self.backfilled_tracked_entity_instances = tracked_entity_instances;
        self.backfilled_enrollments = enrollments;
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Total records across the three collections
    pub fn total_records(&self) -> usize {
        self.events + self.tracked_entity_instances + self.enrollments
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            window = %self.window,
            combinations = self.combinations,
            events = self.events,
            tracked_entity_instances = self.tracked_entity_instances,
            enrollments = self.enrollments,
            backfilled_tracked_entity_instances = self.backfilled_tracked_entity_instances,
            backfilled_enrollments = self.backfilled_enrollments,
            duration_ms = self.duration.as_millis() as u64,
            "Export summary"
        );

        if self.events == 0 {
            tracing::warn!(window = %self.window, "Export matched no events");
        }
    }
}
