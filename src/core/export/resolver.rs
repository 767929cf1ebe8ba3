//! Dependency resolution
//!
//! Works out which tracked entity instances and enrollments an export still
//! has to fetch, from the foreign keys carried by its events.

use crate::domain::{Event, ForeignKey, ResultBundle, Uid};
use std::collections::HashSet;

/// Distinct values of `key` across `events`, in first-seen order
///
/// Events where the field is missing, null or not a string are skipped.
/// Identifiers are not validated otherwise.
///
/// # Example
///
/// ```
/// use ferry::core::export::resolver::extract_related;
/// use ferry::domain::{Event, ForeignKey};
/// use serde_json::json;
///
/// let events: Vec<Event> = serde_json::from_value(json!([
///     {"trackedEntityInstance": "t1"},
///     {"trackedEntityInstance": "t1"},
///     {"trackedEntityInstance": null}
/// ]))
/// .unwrap();
///
/// let ids = extract_related(&events, ForeignKey::TrackedEntityInstance);
/// assert_eq!(ids.len(), 1);
/// assert_eq!(ids[0].as_str(), "t1");
/// ```
pub fn extract_related(events: &[Event], key: ForeignKey) -> Vec<Uid> {
    let mut seen: HashSet<&str> = HashSet::new();
    events
        .iter()
        .filter_map(|event| event.foreign_key(key))
        .filter(|id| seen.insert(*id))
        .map(Uid::from)
        .collect()
}

/// Values of `key` across `events` that are not in `present`
///
/// Same ordering and skipping rules as [`extract_related`]. Matching is exact
/// string equality.
pub fn extract_missing(events: &[Event], key: ForeignKey, present: &HashSet<Uid>) -> Vec<Uid> {
    extract_related(events, key)
        .into_iter()
        .filter(|id| !present.contains(id))
        .collect()
}

/// Entities to backfill for one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    /// Tracked entity instances to fetch
    pub tracked_entity_instances: Vec<Uid>,

    /// Enrollments to fetch
    pub enrollments: Vec<Uid>,
}

impl Dependencies {
    /// True when nothing needs fetching
    pub fn is_empty(&self) -> bool {
        self.tracked_entity_instances.is_empty() && self.enrollments.is_empty()
    }
}

/// Every entity the events refer to, for a bundle that starts out empty
pub fn related_dependencies(events: &[Event]) -> Dependencies {
    Dependencies {
        tracked_entity_instances: extract_related(events, ForeignKey::TrackedEntityInstance),
        enrollments: extract_related(events, ForeignKey::Enrollment),
    }
}

/// Entities the bundle's events refer to but the bundle doesn't hold yet
pub fn missing_dependencies(bundle: &ResultBundle) -> Dependencies {
    Dependencies {
        tracked_entity_instances: extract_missing(
            &bundle.events,
            ForeignKey::TrackedEntityInstance,
            &bundle.tracked_entity_instance_ids(),
        ),
        enrollments: extract_missing(
            &bundle.events,
            ForeignKey::Enrollment,
            &bundle.enrollment_ids(),
        ),
    }
}
