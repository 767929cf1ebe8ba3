//! Domain identifier types
//!
//! Newtype wrappers for the identifiers the export pipeline passes around.
//! Org-unit and program ids come from the caller and are checked for
//! emptiness; entity ids are lifted out of server records as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Organisation unit identifier
///
/// # Examples
///
/// ```
/// use ferry::domain::ids::OrgUnitId;
/// use std::str::FromStr;
///
/// let ou = OrgUnitId::from_str("ImspTQPwCqd").unwrap();
/// assert_eq!(ou.as_str(), "ImspTQPwCqd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgUnitId(String);

impl OrgUnitId {
    /// Creates a new OrgUnitId
    ///
    /// Returns `Err` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Org unit ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the org unit ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrgUnitId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for OrgUnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Program identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramId(String);

impl ProgramId {
    /// Creates a new ProgramId
    ///
    /// Returns `Err` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Program ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the program ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProgramId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProgramId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Entity identifier as found in a server record
///
/// Values are taken verbatim from the `trackedEntityInstance` and
/// `enrollment` fields, so no format check is applied here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parses a comma-separated list of ids, skipping blank entries
///
/// # Examples
///
/// ```
/// use ferry::domain::ids::{parse_id_list, OrgUnitId};
///
/// let ids: Vec<OrgUnitId> = parse_id_list("a, b,,c").unwrap();
/// assert_eq!(ids.len(), 3);
/// ```
pub fn parse_id_list<T>(input: &str) -> Result<Vec<T>, String>
where
    T: FromStr<Err = String>,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_unit_id_valid() {
        let ou = OrgUnitId::new("DiszpKrYNg8").unwrap();
        assert_eq!(ou.as_str(), "DiszpKrYNg8");
        assert_eq!(ou.to_string(), "DiszpKrYNg8");
    }

    #[test]
    fn test_org_unit_id_empty() {
        assert!(OrgUnitId::new("").is_err());
        assert!(OrgUnitId::new("   ").is_err());
    }

    #[test]
    fn test_program_id_from_str() {
        let program = ProgramId::from_str("IpHINAT79UW").unwrap();
        assert_eq!(program.as_ref(), "IpHINAT79UW");
        assert!(ProgramId::from_str("").is_err());
    }

    #[test]
    fn test_uid_is_unvalidated() {
        let uid = Uid::from("");
        assert_eq!(uid.as_str(), "");
        let uid = Uid::from("not a real uid".to_string());
        assert_eq!(uid.into_inner(), "not a real uid");
    }

    #[test]
    fn test_uid_serializes_as_plain_string() {
        let uid = Uid::from("t1");
        assert_eq!(serde_json::to_string(&uid).unwrap(), "\"t1\"");
    }

    #[test]
    fn test_parse_id_list() {
        let ids: Vec<ProgramId> = parse_id_list("p1,p2 , p3").unwrap();
        let ids: Vec<&str> = ids.iter().map(ProgramId::as_str).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);

        let empty: Vec<ProgramId> = parse_id_list("").unwrap();
        assert!(empty.is_empty());
    }
}
