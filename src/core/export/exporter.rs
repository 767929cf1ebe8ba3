//! Event exporter - the public export operations
//!
//! Composes fan-out, dependency resolution and entity fetching into one
//! bundle per call, and optionally hands the bundle to the [`Archiver`].

use crate::adapters::tracker::TrackerApi;
use crate::core::archive::Archiver;
use crate::core::export::fanout::{
    fan_out_enrollments, fan_out_events, fan_out_tracked_entity_instances,
    org_unit_program_combos, OrgUnitProgramCombo,
};
use crate::core::export::fetcher::{fetch_enrollments, fetch_tracked_entity_instances};
use crate::core::export::resolver::{missing_dependencies, related_dependencies};
use crate::core::export::summary::ExportSummary;
use crate::domain::{OrgUnitId, ProgramId, Result, ResultBundle, TimeWindow};
use crate::{log_export_complete, log_export_start};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Exports events together with the entities they refer to
///
/// # Example
///
/// ```no_run
/// use ferry::adapters::tracker::TrackerClient;
/// use ferry::config::ServerConfig;
/// use ferry::core::export::EventExporter;
/// use ferry::domain::OrgUnitId;
/// use ferry::domain::window::parse_date;
/// use std::sync::Arc;
///
/// # async fn example() -> ferry::domain::Result<()> {
/// let client = TrackerClient::new(ServerConfig::default())?;
/// let exporter = EventExporter::new(Arc::new(client));
///
/// let bundle = exporter
///     .export_events_with_dependencies(
///         parse_date("2024-01-01").unwrap(),
///         parse_date("2024-01-31").unwrap(),
///         &[OrgUnitId::new("ImspTQPwCqd").unwrap()],
///         &[],
///     )
///     .await?;
/// println!("{} events", bundle.events.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventExporter {
    api: Arc<dyn TrackerApi>,
    archiver: Archiver,
}

/// Bundle plus the number of records fetched one by one
struct Collected {
    bundle: ResultBundle,
    backfilled_tracked_entity_instances: usize,
    backfilled_enrollments: usize,
}

impl EventExporter {
    /// Create an exporter reading through `api`
    pub fn new(api: Arc<dyn TrackerApi>) -> Self {
        Self {
            api,
            archiver: Archiver::new(),
        }
    }

    /// Replace the archiver used by the `_zip` operations
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = archiver;
        self
    }

    /// Events dated within `start..=end`, with every tracked entity instance
    /// and enrollment they refer to
    ///
    /// # Errors
    ///
    /// Fails with the first upstream error of any query or fetch.
    pub async fn export_events_with_dependencies(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        org_units: &[OrgUnitId],
        programs: &[ProgramId],
    ) -> Result<ResultBundle> {
        let (bundle, _) = self
            .export(TimeWindow::period(start, end), org_units, programs)
            .await?;
        Ok(bundle)
    }

    /// Events, tracked entity instances and enrollments changed since
    /// `last_updated`, plus any entity the events refer to that the
    /// incremental queries didn't return
    ///
    /// # Errors
    ///
    /// Fails with the first upstream error of any query or fetch.
    pub async fn export_events_from_last_with_dependencies(
        &self,
        last_updated: DateTime<Utc>,
        org_units: &[OrgUnitId],
        programs: &[ProgramId],
    ) -> Result<ResultBundle> {
        let (bundle, _) = self
            .export(TimeWindow::last_updated(last_updated), org_units, programs)
            .await?;
        Ok(bundle)
    }

    /// [`Self::export_events_with_dependencies`], archived
    pub async fn export_events_with_dependencies_zip(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        org_units: &[OrgUnitId],
        programs: &[ProgramId],
    ) -> Result<Vec<u8>> {
        let bundle = self
            .export_events_with_dependencies(start, end, org_units, programs)
            .await?;
        self.archiver.write(&bundle)
    }

    /// [`Self::export_events_from_last_with_dependencies`], archived
    pub async fn export_events_from_last_with_dependencies_zip(
        &self,
        last_updated: DateTime<Utc>,
        org_units: &[OrgUnitId],
        programs: &[ProgramId],
    ) -> Result<Vec<u8>> {
        let bundle = self
            .export_events_from_last_with_dependencies(last_updated, org_units, programs)
            .await?;
        self.archiver.write(&bundle)
    }

    /// Run an export for either kind of window and report what it gathered
    pub async fn export(
        &self,
        window: TimeWindow,
        org_units: &[OrgUnitId],
        programs: &[ProgramId],
    ) -> Result<(ResultBundle, ExportSummary)> {
        let start_time = Instant::now();
        let combos = org_unit_program_combos(org_units, programs);
        log_export_start!(window, combos.len());

        let collected = match window {
            TimeWindow::Period { .. } => self.collect_period(window, &combos).await?,
            TimeWindow::LastUpdated(cutoff) => self.collect_last_updated(cutoff, &combos).await?,
        };

        let duration = start_time.elapsed();
        let summary = ExportSummary::new(window, combos.len(), &collected.bundle)
            .with_backfill(
                collected.backfilled_tracked_entity_instances,
                collected.backfilled_enrollments,
            )
            .with_duration(duration);

        log_export_complete!(summary.total_records(), duration);
        Ok((collected.bundle, summary))
    }

    /// Archive a bundle with this exporter's archiver
    pub fn archive(&self, bundle: &ResultBundle) -> Result<Vec<u8>> {
        self.archiver.write(bundle)
    }

    async fn collect_period(
        &self,
        window: TimeWindow,
        combos: &[OrgUnitProgramCombo],
    ) -> Result<Collected> {
        let api = self.api.as_ref();

        let events = fan_out_events(api, window, combos).await?;
        let dependencies = related_dependencies(&events);
        tracing::debug!(
            tracked_entity_instances = dependencies.tracked_entity_instances.len(),
            enrollments = dependencies.enrollments.len(),
            "Resolved related entities"
        );

        let (teis, enrollments) = tokio::try_join!(
            fetch_tracked_entity_instances(api, &dependencies.tracked_entity_instances),
            fetch_enrollments(api, &dependencies.enrollments),
        )?;

        let mut bundle = ResultBundle::new();
        let backfilled_tracked_entity_instances = teis.len();
        let backfilled_enrollments = enrollments.len();
        bundle.append_events(events);
        bundle.append_tracked_entity_instances(teis);
        bundle.append_enrollments(enrollments);

        Ok(Collected {
            bundle,
            backfilled_tracked_entity_instances,
            backfilled_enrollments,
        })
    }

    async fn collect_last_updated(
        &self,
        cutoff: DateTime<Utc>,
        combos: &[OrgUnitProgramCombo],
    ) -> Result<Collected> {
        let api = self.api.as_ref();

        let (events, teis, enrollments) = tokio::try_join!(
            fan_out_events(api, TimeWindow::last_updated(cutoff), combos),
            fan_out_tracked_entity_instances(api, cutoff, combos),
            fan_out_enrollments(api, cutoff, combos),
        )?;

        let mut bundle = ResultBundle::new();
        bundle.append_events(events);
        bundle.append_tracked_entity_instances(teis);
        bundle.append_enrollments(enrollments);

        let missing = missing_dependencies(&bundle);
        tracing::debug!(
            tracked_entity_instances = missing.tracked_entity_instances.len(),
            enrollments = missing.enrollments.len(),
            "Resolved missing entities"
        );

        let (missing_teis, missing_enrollments) = tokio::try_join!(
            fetch_tracked_entity_instances(api, &missing.tracked_entity_instances),
            fetch_enrollments(api, &missing.enrollments),
        )?;

        let backfilled_tracked_entity_instances = missing_teis.len();
        let backfilled_enrollments = missing_enrollments.len();
        bundle.append_tracked_entity_instances(missing_teis);
        bundle.append_enrollments(missing_enrollments);

        Ok(Collected {
            bundle,
            backfilled_tracked_entity_instances,
            backfilled_enrollments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tracker::{InMemoryTracker, RecordedCall};
    use crate::domain::window::{parse_date, parse_timestamp};
    use crate::domain::{Enrollment, Event, FerryError, TrackedEntityInstance, Uid};
    use serde_json::json;

    fn ou(id: &str) -> OrgUnitId {
        OrgUnitId::new(id).unwrap()
    }

    fn event(value: serde_json::Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    fn tei(uid: &str) -> TrackedEntityInstance {
        serde_json::from_value(json!({"trackedEntityInstance": uid})).unwrap()
    }

    fn enrollment(uid: &str) -> Enrollment {
        serde_json::from_value(json!({"enrollment": uid})).unwrap()
    }

    #[tokio::test]
    async fn test_period_export_backfills_related_entities() {
        let a = ou("A");
        let tracker = Arc::new(
            InMemoryTracker::new()
                .with_events(
                    &a,
                    None,
                    vec![
                        event(json!({"event": "e1", "trackedEntityInstance": "t1", "enrollment": "en1"})),
                        event(json!({"event": "e2", "trackedEntityInstance": "t1"})),
                        event(json!({"event": "e3", "trackedEntityInstance": null})),
                    ],
                )
                .with_tracked_entity_instance_record(tei("t1"))
                .with_enrollment_record(enrollment("en1")),
        );
        let exporter = EventExporter::new(tracker.clone());

        let bundle = exporter
            .export_events_with_dependencies(
                parse_date("2024-01-01").unwrap(),
                parse_date("2024-01-31").unwrap(),
                &[a],
                &[],
            )
            .await
            .unwrap();

        assert_eq!(bundle.events.len(), 3);
        assert_eq!(bundle.tracked_entity_instances, vec![tei("t1")]);
        assert_eq!(bundle.enrollments, vec![enrollment("en1")]);

        // t1 is looked up once even though two events carry it
        let lookups = tracker
            .calls()
            .into_iter()
            .filter(|call| matches!(call, RecordedCall::TrackedEntityInstance(_)))
            .count();
        assert_eq!(lookups, 1);
    }

    #[tokio::test]
    async fn test_last_updated_export_fetches_only_missing() {
        let a = ou("A");
        let tracker = Arc::new(
            InMemoryTracker::new()
                .with_events(
                    &a,
                    None,
                    vec![
                        event(json!({"event": "e1", "trackedEntityInstance": "t1", "enrollment": "en1"})),
                        event(json!({"event": "e2", "trackedEntityInstance": "t2", "enrollment": "en1"})),
                    ],
                )
                .with_tracked_entity_instances(&a, None, vec![tei("t1")])
                .with_enrollments(&a, None, vec![enrollment("en1")])
                .with_tracked_entity_instance_record(tei("t2")),
        );
        let exporter = EventExporter::new(tracker.clone());

        let (bundle, summary) = exporter
            .export(
                TimeWindow::last_updated(parse_timestamp("2024-05-01").unwrap()),
                &[a],
                &[],
            )
            .await
            .unwrap();

        assert_eq!(bundle.tracked_entity_instances, vec![tei("t1"), tei("t2")]);
        assert_eq!(bundle.enrollments, vec![enrollment("en1")]);
        assert_eq!(tracker.fetched_uids(), vec![Uid::from("t2")]);
        assert_eq!(summary.backfilled_tracked_entity_instances, 1);
        assert_eq!(summary.backfilled_enrollments, 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_fails_export() {
        let a = ou("A");
        let tracker = InMemoryTracker::new()
            .with_events(
                &a,
                None,
                vec![
                    event(json!({"event": "e1", "enrollment": "en1"})),
                    event(json!({"event": "e2", "enrollment": "en2"})),
                ],
            )
            .with_enrollment_record(enrollment("en1"))
            .failing_uid("en2");
        let exporter = EventExporter::new(Arc::new(tracker));

        let result = exporter
            .export_events_with_dependencies_zip(
                parse_date("2024-01-01").unwrap(),
                parse_date("2024-01-31").unwrap(),
                &[a],
                &[],
            )
            .await;

        assert!(matches!(result, Err(FerryError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_empty_org_units_export_nothing() {
        let tracker = Arc::new(InMemoryTracker::new());
        let exporter = EventExporter::new(tracker.clone());

        let bundle = exporter
            .export_events_from_last_with_dependencies(Utc::now(), &[], &[])
            .await
            .unwrap();

        assert!(bundle.is_empty());
        assert!(tracker.calls().is_empty());
    }
}
