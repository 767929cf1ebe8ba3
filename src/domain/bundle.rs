//! Result bundle
//!
//! The accumulator one export call fills with events and their dependencies.
//! Collections only ever grow; deduplication is the resolver's job.

use super::ids::Uid;
use super::records::{Enrollment, Event, KeyedRecord, TrackedEntityInstance};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Events, tracked entity instances and enrollments gathered by one export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBundle {
    /// Exported events
    #[serde(default)]
    pub events: Vec<Event>,

    /// Tracked entity instances, either fetched directly or backfilled
    #[serde(default)]
    pub tracked_entity_instances: Vec<TrackedEntityInstance>,

    /// Enrollments, either fetched directly or backfilled
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl ResultBundle {
    /// Creates an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends events
    pub fn append_events(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Appends tracked entity instances
    pub fn append_tracked_entity_instances(
        &mut self,
        teis: impl IntoIterator<Item = TrackedEntityInstance>,
    ) {
        self.tracked_entity_instances.extend(teis);
    }

    /// Appends enrollments
    pub fn append_enrollments(&mut self, enrollments: impl IntoIterator<Item = Enrollment>) {
        self.enrollments.extend(enrollments);
    }

    /// Identifiers of the tracked entity instances already held
    pub fn tracked_entity_instance_ids(&self) -> HashSet<Uid> {
        collect_ids(&self.tracked_entity_instances)
    }

    /// Identifiers of the enrollments already held
    pub fn enrollment_ids(&self) -> HashSet<Uid> {
        collect_ids(&self.enrollments)
    }

    /// True when all three collections are empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.tracked_entity_instances.is_empty()
            && self.enrollments.is_empty()
    }
}

fn collect_ids<R: KeyedRecord>(records: &[R]) -> HashSet<Uid> {
    records.iter().filter_map(KeyedRecord::uid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tei(uid: &str) -> TrackedEntityInstance {
        serde_json::from_value(json!({ "trackedEntityInstance": uid })).unwrap()
    }

    #[test]
    fn test_new_bundle_is_empty() {
        let bundle = ResultBundle::new();
        assert!(bundle.is_empty());
        assert!(bundle.tracked_entity_instance_ids().is_empty());
    }

    #[test]
    fn test_append_grows_without_dedup() {
        let mut bundle = ResultBundle::new();
        bundle.append_tracked_entity_instances(vec![tei("t1"), tei("t2")]);
        bundle.append_tracked_entity_instances(vec![tei("t1")]);

        assert_eq!(bundle.tracked_entity_instances.len(), 3);
        assert_eq!(bundle.tracked_entity_instance_ids().len(), 2);
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_enrollment_ids_skip_records_without_key() {
        let mut bundle = ResultBundle::new();
        bundle.append_enrollments(vec![
            serde_json::from_value(json!({"enrollment": "en1"})).unwrap(),
            serde_json::from_value(json!({"status": "COMPLETED"})).unwrap(),
        ]);
        let ids = bundle.enrollment_ids();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&Uid::from("en1")));
    }

    #[test]
    fn test_bundle_serializes_with_wire_names() {
        let mut bundle = ResultBundle::new();
        bundle.append_tracked_entity_instances(vec![tei("t1")]);
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            value,
            json!({
                "events": [],
                "trackedEntityInstances": [{"trackedEntityInstance": "t1"}],
                "enrollments": []
            })
        );
    }
}
