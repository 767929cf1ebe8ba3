//! Archive member naming

use crate::adapters::tracker::models::{
    ENROLLMENTS_KEY, EVENTS_KEY, TRACKED_ENTITY_INSTANCES_KEY,
};
use std::fmt;

/// The three collections an archive carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveMember {
    /// `events`
    Events,
    /// `trackedEntityInstances`
    TrackedEntityInstances,
    /// `enrollments`
    Enrollments,
}

impl ArchiveMember {
    /// Every member, in archive order
    pub const ALL: [ArchiveMember; 3] = [
        ArchiveMember::Events,
        ArchiveMember::TrackedEntityInstances,
        ArchiveMember::Enrollments,
    ];

    /// Top-level key of the member's JSON document
    pub fn collection_key(self) -> &'static str {
        match self {
            ArchiveMember::Events => EVENTS_KEY,
            ArchiveMember::TrackedEntityInstances => TRACKED_ENTITY_INSTANCES_KEY,
            ArchiveMember::Enrollments => ENROLLMENTS_KEY,
        }
    }
}

impl fmt::Display for ArchiveMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_key())
    }
}

/// Names the files inside an export archive
///
/// Each member becomes an inner zip (`member_name`) in the outer archive,
/// holding a single JSON document (`entry_name`).
pub trait ArchiveNaming: Send + Sync {
    /// Name of the inner zip inside the outer archive
    fn member_name(&self, member: ArchiveMember) -> String;

    /// Name of the JSON document inside the inner zip
    fn entry_name(&self, member: ArchiveMember) -> String;
}

/// `events.zip` / `events.json` and so on
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNaming;

impl ArchiveNaming for StandardNaming {
    fn member_name(&self, member: ArchiveMember) -> String {
        format!("{}.zip", member.collection_key())
    }

    fn entry_name(&self, member: ArchiveMember) -> String {
        format!("{}.json", member.collection_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ArchiveMember::Events, "events.zip", "events.json")]
    #[test_case(
        ArchiveMember::TrackedEntityInstances,
        "trackedEntityInstances.zip",
        "trackedEntityInstances.json"
    )]
    #[test_case(ArchiveMember::Enrollments, "enrollments.zip", "enrollments.json")]
    fn test_standard_naming(member: ArchiveMember, zip_name: &str, json_name: &str) {
        assert_eq!(StandardNaming.member_name(member), zip_name);
        assert_eq!(StandardNaming.entry_name(member), json_name);
    }
}
