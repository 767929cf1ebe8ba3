//! Query fan-out over org unit × program combinations
//!
//! One query is issued per combination, all of them concurrently on the
//! calling task. The join is fail-fast and the per-combination results are
//! concatenated in combination order, whatever order the responses arrive in.

use crate::adapters::tracker::{EntityQuery, EventQuery, OuMode, TrackerApi};
use crate::domain::{
    Enrollment, Event, FerryError, OrgUnitId, ProgramId, Result, TimeWindow,
    TrackedEntityInstance,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::future::Future;

/// One (org unit, program) pair to query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrgUnitProgramCombo {
    /// Org unit, queried with its descendants
    pub org_unit: OrgUnitId,
    /// Program restriction, `None` when no programs were requested
    pub program: Option<ProgramId>,
}

impl OrgUnitProgramCombo {
    /// Event query for this combination
    pub fn event_query(&self, window: TimeWindow) -> EventQuery {
        EventQuery {
            org_unit: self.org_unit.clone(),
            ou_mode: OuMode::Descendants,
            program: self.program.clone(),
            window,
        }
    }

    /// Tracked entity instance / enrollment query for this combination
    pub fn entity_query(&self, last_updated: DateTime<Utc>) -> EntityQuery {
        EntityQuery {
            org_unit: self.org_unit.clone(),
            ou_mode: OuMode::Descendants,
            program: self.program.clone(),
            last_updated,
        }
    }
}

/// Cross product of org units and programs
///
/// Org unit major, program minor, both in input order. With no programs
/// every org unit appears once with `program: None`.
///
/// # Example
///
/// ```
/// use ferry::core::export::fanout::org_unit_program_combos;
/// use ferry::domain::{OrgUnitId, ProgramId};
///
/// let ous = vec![OrgUnitId::new("A").unwrap()];
/// let programs = vec![ProgramId::new("P1").unwrap(), ProgramId::new("P2").unwrap()];
/// let combos = org_unit_program_combos(&ous, &programs);
/// assert_eq!(combos.len(), 2);
/// ```
pub fn org_unit_program_combos(
    org_units: &[OrgUnitId],
    programs: &[ProgramId],
) -> Vec<OrgUnitProgramCombo> {
    if programs.is_empty() {
        return org_units
            .iter()
            .map(|org_unit| OrgUnitProgramCombo {
                org_unit: org_unit.clone(),
                program: None,
            })
            .collect();
    }

    org_units
        .iter()
        .flat_map(|org_unit| {
            programs.iter().map(move |program| OrgUnitProgramCombo {
                org_unit: org_unit.clone(),
                program: Some(program.clone()),
            })
        })
        .collect()
}

/// Runs `query` once per combination and concatenates the results
///
/// Completes when every query has resolved; the first failure is returned
/// and the remaining in-flight queries are dropped.
pub async fn fan_out<'a, T, F, Fut>(combos: &'a [OrgUnitProgramCombo], query: F) -> Result<Vec<T>>
where
    F: Fn(&'a OrgUnitProgramCombo) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let per_combo = try_join_all(combos.iter().map(query)).await?;
    Ok(per_combo.into_iter().flatten().collect())
}

/// Fans out event queries with the given time window
pub async fn fan_out_events(
    api: &dyn TrackerApi,
    window: TimeWindow,
    combos: &[OrgUnitProgramCombo],
) -> Result<Vec<Event>> {
    let events = fan_out(combos, |combo| {
        let query = combo.event_query(window);
        async move {
            let events = api.query_events(&query).await?;
            tracing::debug!(
                org_unit = %query.org_unit,
                program = ?query.program.as_ref().map(ProgramId::as_str),
                count = events.len(),
                "Fetched events"
            );
            Ok::<_, FerryError>(events)
        }
    })
    .await?;

    tracing::info!(
        combos = combos.len(),
        count = events.len(),
        window = %window,
        "Event fan-out completed"
    );
    Ok(events)
}

/// Fans out tracked entity instance queries changed since `last_updated`
pub async fn fan_out_tracked_entity_instances(
    api: &dyn TrackerApi,
    last_updated: DateTime<Utc>,
    combos: &[OrgUnitProgramCombo],
) -> Result<Vec<TrackedEntityInstance>> {
    let teis = fan_out(combos, |combo| {
        let query = combo.entity_query(last_updated);
        async move { api.query_tracked_entity_instances(&query).await }
    })
    .await?;

    tracing::info!(
        combos = combos.len(),
        count = teis.len(),
        "Tracked entity instance fan-out completed"
    );
    Ok(teis)
}

/// Fans out enrollment queries changed since `last_updated`
pub async fn fan_out_enrollments(
    api: &dyn TrackerApi,
    last_updated: DateTime<Utc>,
    combos: &[OrgUnitProgramCombo],
) -> Result<Vec<Enrollment>> {
    let enrollments = fan_out(combos, |combo| {
        let query = combo.entity_query(last_updated);
        async move { api.query_enrollments(&query).await }
    })
    .await?;

    tracing::info!(
        combos = combos.len(),
        count = enrollments.len(),
        "Enrollment fan-out completed"
    );
    Ok(enrollments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UpstreamError;
    use std::time::Duration;
    use test_case::test_case;

    fn ous(ids: &[&str]) -> Vec<OrgUnitId> {
        ids.iter().map(|id| OrgUnitId::new(*id).unwrap()).collect()
    }

    fn programs(ids: &[&str]) -> Vec<ProgramId> {
        ids.iter().map(|id| ProgramId::new(*id).unwrap()).collect()
    }

    #[test_case(&["A", "B"], &[], 2 ; "org units only")]
    #[test_case(&["A"], &["P1", "P2"], 2 ; "one org unit two programs")]
    #[test_case(&["A", "B", "C"], &["P1", "P2"], 6 ; "full cross product")]
    #[test_case(&[], &["P1"], 0 ; "no org units")]
    fn test_combo_count(org_units: &[&str], program_ids: &[&str], expected: usize) {
        let combos = org_unit_program_combos(&ous(org_units), &programs(program_ids));
        assert_eq!(combos.len(), expected);
    }

    #[test]
    fn test_combo_order_is_org_unit_major() {
        let combos = org_unit_program_combos(&ous(&["A", "B"]), &programs(&["P1", "P2"]));
        let pairs: Vec<(&str, Option<&str>)> = combos
            .iter()
            .map(|c| (c.org_unit.as_str(), c.program.as_ref().map(ProgramId::as_str)))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("A", Some("P1")),
                ("A", Some("P2")),
                ("B", Some("P1")),
                ("B", Some("P2")),
            ]
        );
    }

    #[test]
    fn test_combos_without_programs_have_no_program() {
        let combos = org_unit_program_combos(&ous(&["A", "B"]), &[]);
        assert!(combos.iter().all(|c| c.program.is_none()));
    }

    #[test]
    fn test_combo_queries_use_descendants() {
        let combo = &org_unit_program_combos(&ous(&["A"]), &[])[0];
        let window = TimeWindow::last_updated(Utc::now());
        assert_eq!(combo.event_query(window).ou_mode, OuMode::Descendants);
        assert_eq!(combo.entity_query(Utc::now()).ou_mode, OuMode::Descendants);
    }

    #[tokio::test]
    async fn test_fan_out_keeps_combination_order() {
        let combos = org_unit_program_combos(&ous(&["slow", "fast"]), &[]);

        let results = fan_out(&combos, |combo| async move {
            // The first combination answers last
            if combo.org_unit.as_str() == "slow" {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            Ok::<_, FerryError>(vec![
                combo.org_unit.to_string(),
                format!("{}-2", combo.org_unit),
            ])
        })
        .await
        .unwrap();

        assert_eq!(results, vec!["slow", "slow-2", "fast", "fast-2"]);
    }

    #[tokio::test]
    async fn test_fan_out_empty_combos() {
        let results: Vec<u8> = fan_out(&[], |_| async {
            Err::<Vec<u8>, _>(FerryError::Validation("no query expected".to_string()))
        })
        .await
        .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_fails_on_any_branch() {
        let combos = org_unit_program_combos(&ous(&["A", "B", "C"]), &[]);

        let result: Result<Vec<String>> = fan_out(&combos, |combo| async move {
            if combo.org_unit.as_str() == "B" {
                Err(FerryError::from(UpstreamError::ConnectionFailed(
                    "B unreachable".to_string(),
                )))
            } else {
                Ok(vec![combo.org_unit.to_string()])
            }
        })
        .await;

        assert!(matches!(result, Err(FerryError::Upstream(_))));
    }
}
