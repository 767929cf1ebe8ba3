//! Tracker API trait definition
//!
//! This module defines the `TrackerApi` trait, the seam between the export
//! pipeline and the server it reads from. The HTTP implementation lives in
//! [`super::client`]; tests plug in-memory fakes into the same seam.

use crate::domain::ids::{OrgUnitId, ProgramId, Uid};
use crate::domain::window::{format_date, format_timestamp};
use crate::domain::{Enrollment, Event, Result, TimeWindow, TrackedEntityInstance};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// How the org unit filter of a query treats the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OuMode {
    /// Only the given org unit
    Selected,
    /// The org unit and its immediate children
    Children,
    /// The org unit and everything below it
    #[default]
    Descendants,
}

impl OuMode {
    /// Query parameter value
    pub fn as_str(self) -> &'static str {
        match self {
            OuMode::Selected => "SELECTED",
            OuMode::Children => "CHILDREN",
            OuMode::Descendants => "DESCENDANTS",
        }
    }
}

impl fmt::Display for OuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter for one event list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Root org unit
    pub org_unit: OrgUnitId,
    /// Hierarchy mode for `org_unit`
    pub ou_mode: OuMode,
    /// Optional program restriction
    pub program: Option<ProgramId>,
    /// Event date period or last-updated cutoff
    pub window: TimeWindow,
}

impl EventQuery {
    /// Query parameters for the events endpoint
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("orgUnit", self.org_unit.to_string()),
            ("ouMode", self.ou_mode.to_string()),
        ];
        if let Some(program) = &self.program {
            params.push(("program", program.to_string()));
        }
        match &self.window {
            TimeWindow::Period { start, end } => {
                params.push(("startDate", format_date(start)));
                params.push(("endDate", format_date(end)));
            }
            TimeWindow::LastUpdated(cutoff) => {
                params.push(("lastUpdatedStartDate", format_timestamp(cutoff)));
            }
        }
        params
    }
}

/// Filter for one tracked entity instance or enrollment list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    /// Root org unit
    pub org_unit: OrgUnitId,
    /// Hierarchy mode for `org_unit`
    pub ou_mode: OuMode,
    /// Optional program restriction
    pub program: Option<ProgramId>,
    /// Only records changed at or after this instant
    pub last_updated: DateTime<Utc>,
}

/// Entity list endpoint an [`EntityQuery`] is sent to
///
/// The two endpoints name their last-updated filter differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEndpoint {
    /// `/api/trackedEntityInstances.json`
    TrackedEntityInstances,
    /// `/api/enrollments.json`
    Enrollments,
}

impl EntityEndpoint {
    /// Name of the endpoint's last-updated filter parameter
    pub fn last_updated_param(self) -> &'static str {
        match self {
            EntityEndpoint::TrackedEntityInstances => "lastUpdatedStartDate",
            EntityEndpoint::Enrollments => "lastUpdated",
        }
    }
}

impl EntityQuery {
    /// Query parameters for the given entity endpoint
    pub fn to_params(&self, endpoint: EntityEndpoint) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ou", self.org_unit.to_string()),
            ("ouMode", self.ou_mode.to_string()),
        ];
        if let Some(program) = &self.program {
            params.push(("program", program.to_string()));
        }
        params.push((
            endpoint.last_updated_param(),
            format_timestamp(&self.last_updated),
        ));
        params
    }
}

/// Read access to the tracker web API
///
/// Every method maps to exactly one logical query. Implementations report
/// failures as [`crate::domain::FerryError::Upstream`] and never retry.
///
/// # Example
///
/// ```no_run
/// use ferry::adapters::tracker::{EventQuery, OuMode, TrackerApi, TrackerClient};
/// use ferry::config::ServerConfig;
/// use ferry::domain::{OrgUnitId, TimeWindow};
/// use ferry::domain::window::parse_date;
///
/// # async fn example() -> ferry::domain::Result<()> {
/// let client = TrackerClient::new(ServerConfig::default())?;
/// let query = EventQuery {
///     org_unit: OrgUnitId::new("ImspTQPwCqd").unwrap(),
///     ou_mode: OuMode::Descendants,
///     program: None,
///     window: TimeWindow::period(
///         parse_date("2024-01-01").unwrap(),
///         parse_date("2024-01-31").unwrap(),
///     ),
/// };
/// let events = client.query_events(&query).await?;
/// println!("Found {} events", events.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// List events matching the query
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<Event>>;

    /// List tracked entity instances matching the query
    async fn query_tracked_entity_instances(
        &self,
        query: &EntityQuery,
    ) -> Result<Vec<TrackedEntityInstance>>;

    /// List enrollments matching the query
    async fn query_enrollments(&self, query: &EntityQuery) -> Result<Vec<Enrollment>>;

    /// Fetch one tracked entity instance by identifier
    async fn get_tracked_entity_instance(&self, uid: &Uid) -> Result<TrackedEntityInstance>;

    /// Fetch one enrollment by identifier
    async fn get_enrollment(&self, uid: &Uid) -> Result<Enrollment>;

    /// Base URL of the server behind this client
    fn base_url(&self) -> &str;
}
