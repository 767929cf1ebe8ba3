//! In-memory tracker API
//!
//! Serves canned responses keyed by org unit and program, and records every
//! call it receives. Used to exercise the export pipeline without a server.
//! It is public so integration tests and downstream crates can drive
//! [`crate::core::export::EventExporter`] the same way.

use super::api::{EntityQuery, EventQuery, TrackerApi};
use crate::domain::{
    Enrollment, Event, KeyedRecord, OrgUnitId, ProgramId, Result, TrackedEntityInstance, Uid,
    UpstreamError,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

type ComboKey = (String, Option<String>);

/// A call received by [`InMemoryTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `query_events`
    Events(EventQuery),
    /// `query_tracked_entity_instances`
    TrackedEntityInstances(EntityQuery),
    /// `query_enrollments`
    Enrollments(EntityQuery),
    /// `get_tracked_entity_instance`
    TrackedEntityInstance(Uid),
    /// `get_enrollment`
    Enrollment(Uid),
}

/// Tracker API backed by in-memory fixtures
///
/// List queries answer with the records registered for the query's exact
/// (org unit, program) pair, or nothing. Single-record lookups answer with
/// the record registered under that identifier, or a 404 status error.
///
/// # Example
///
/// ```
/// use ferry::adapters::tracker::memory::InMemoryTracker;
/// use ferry::domain::{Event, OrgUnitId};
/// use serde_json::json;
///
/// let ou = OrgUnitId::new("A").unwrap();
/// let event: Event = serde_json::from_value(json!({"event": "e1"})).unwrap();
/// let tracker = InMemoryTracker::new().with_events(&ou, None, vec![event]);
/// assert!(tracker.calls().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    events: HashMap<ComboKey, Vec<Event>>,
    tracked_entity_instances: HashMap<ComboKey, Vec<TrackedEntityInstance>>,
    enrollments: HashMap<ComboKey, Vec<Enrollment>>,
    tei_records: HashMap<Uid, TrackedEntityInstance>,
    enrollment_records: HashMap<Uid, Enrollment>,
    failing_org_units: HashSet<String>,
    failing_uids: HashSet<Uid>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn combo_key(org_unit: &OrgUnitId, program: Option<&ProgramId>) -> ComboKey {
    (
        org_unit.as_str().to_string(),
        program.map(|p| p.as_str().to_string()),
    )
}

impl InMemoryTracker {
    /// Creates a tracker with no data
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the events returned for one (org unit, program) query
    pub fn with_events(
        mut self,
        org_unit: &OrgUnitId,
        program: Option<&ProgramId>,
        events: Vec<Event>,
    ) -> Self {
        self.events
            .entry(combo_key(org_unit, program))
            .or_default()
            .extend(events);
        self
    }

    /// Registers the tracked entity instances returned for one list query
    pub fn with_tracked_entity_instances(
        mut self,
        org_unit: &OrgUnitId,
        program: Option<&ProgramId>,
        teis: Vec<TrackedEntityInstance>,
    ) -> Self {
        self.tracked_entity_instances
            .entry(combo_key(org_unit, program))
            .or_default()
            .extend(teis);
        self
    }

    /// Registers the enrollments returned for one list query
    pub fn with_enrollments(
        mut self,
        org_unit: &OrgUnitId,
        program: Option<&ProgramId>,
        enrollments: Vec<Enrollment>,
    ) -> Self {
        self.enrollments
            .entry(combo_key(org_unit, program))
            .or_default()
            .extend(enrollments);
        self
    }

    /// Registers a tracked entity instance for lookup by its identifier
    ///
    /// Records without a `trackedEntityInstance` field are ignored.
    pub fn with_tracked_entity_instance_record(mut self, tei: TrackedEntityInstance) -> Self {
        if let Some(uid) = tei.uid() {
            self.tei_records.insert(uid, tei);
        }
        self
    }

    /// Registers an enrollment for lookup by its identifier
    ///
    /// Records without an `enrollment` field are ignored.
    pub fn with_enrollment_record(mut self, enrollment: Enrollment) -> Self {
        if let Some(uid) = enrollment.uid() {
            self.enrollment_records.insert(uid, enrollment);
        }
        self
    }

    /// Makes every list query for `org_unit` fail
    pub fn failing_org_unit(mut self, org_unit: &OrgUnitId) -> Self {
        self.failing_org_units.insert(org_unit.as_str().to_string());
        self
    }

    /// Makes the lookup of `uid` fail
    pub fn failing_uid(mut self, uid: impl Into<Uid>) -> Self {
        self.failing_uids.insert(uid.into());
        self
    }

    /// Delays every list query for `org_unit`
    pub fn delayed_org_unit(mut self, org_unit: &OrgUnitId, delay: Duration) -> Self {
        self.delays.insert(org_unit.as_str().to_string(), delay);
        self
    }

    /// Calls received so far, in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    /// Event queries received so far
    pub fn event_queries(&self) -> Vec<EventQuery> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Events(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Identifiers looked up one by one so far
    pub fn fetched_uids(&self) -> Vec<Uid> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::TrackedEntityInstance(uid) | RecordedCall::Enrollment(uid) => {
                    Some(uid.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: RecordedCall) {
        self.lock_calls().push(call);
    }

    async fn list<R: Clone>(
        &self,
        store: &HashMap<ComboKey, Vec<R>>,
        org_unit: &OrgUnitId,
        program: Option<&ProgramId>,
    ) -> Result<Vec<R>> {
        if let Some(delay) = self.delays.get(org_unit.as_str()) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_org_units.contains(org_unit.as_str()) {
            return Err(UpstreamError::ConnectionFailed(format!(
                "org unit {org_unit} unreachable"
            ))
            .into());
        }
        Ok(store
            .get(&combo_key(org_unit, program))
            .cloned()
            .unwrap_or_default())
    }

    fn lookup<R: Clone>(&self, store: &HashMap<Uid, R>, path: &str, uid: &Uid) -> Result<R> {
        if self.failing_uids.contains(uid) {
            return Err(UpstreamError::ConnectionFailed(format!("{path}/{uid} unreachable")).into());
        }
        store.get(uid).cloned().ok_or_else(|| {
            UpstreamError::Status {
                status: 404,
                url: format!("memory:/api/{path}/{uid}.json"),
                body: String::new(),
            }
            .into()
        })
    }
}

#[async_trait]
impl TrackerApi for InMemoryTracker {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        self.record(RecordedCall::Events(query.clone()));
        self.list(&self.events, &query.org_unit, query.program.as_ref())
            .await
    }

    async fn query_tracked_entity_instances(
        &self,
        query: &EntityQuery,
    ) -> Result<Vec<TrackedEntityInstance>> {
        self.record(RecordedCall::TrackedEntityInstances(query.clone()));
        self.list(
            &self.tracked_entity_instances,
            &query.org_unit,
            query.program.as_ref(),
        )
        .await
    }

    async fn query_enrollments(&self, query: &EntityQuery) -> Result<Vec<Enrollment>> {
        self.record(RecordedCall::Enrollments(query.clone()));
        self.list(&self.enrollments, &query.org_unit, query.program.as_ref())
            .await
    }

    async fn get_tracked_entity_instance(&self, uid: &Uid) -> Result<TrackedEntityInstance> {
        self.record(RecordedCall::TrackedEntityInstance(uid.clone()));
        self.lookup(&self.tei_records, "trackedEntityInstances", uid)
    }

    async fn get_enrollment(&self, uid: &Uid) -> Result<Enrollment> {
        self.record(RecordedCall::Enrollment(uid.clone()));
        self.lookup(&self.enrollment_records, "enrollments", uid)
    }

    fn base_url(&self) -> &str {
        "memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FerryError;
    use serde_json::json;

    fn tei(uid: &str) -> TrackedEntityInstance {
        serde_json::from_value(json!({"trackedEntityInstance": uid})).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_registered_and_unknown_records() {
        let tracker = InMemoryTracker::new().with_tracked_entity_instance_record(tei("t1"));

        let found = tracker
            .get_tracked_entity_instance(&Uid::from("t1"))
            .await
            .unwrap();
        assert_eq!(found, tei("t1"));

        let err = tracker
            .get_tracked_entity_instance(&Uid::from("t2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FerryError::Upstream(UpstreamError::Status { status: 404, .. })
        ));
        assert_eq!(tracker.fetched_uids(), vec![Uid::from("t1"), Uid::from("t2")]);
    }
}
