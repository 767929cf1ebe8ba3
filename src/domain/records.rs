//! Tracker records
//!
//! Events, tracked entity instances and enrollments are kept as opaque JSON
//! objects. Ferry only ever reads the handful of identifier fields it needs
//! for dependency resolution; every other field passes through untouched.

use super::ids::Uid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field holding a tracked entity instance identifier
pub const TRACKED_ENTITY_INSTANCE_FIELD: &str = "trackedEntityInstance";

/// Field holding an enrollment identifier
pub const ENROLLMENT_FIELD: &str = "enrollment";

/// Foreign keys an event may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKey {
    /// `trackedEntityInstance`
    TrackedEntityInstance,
    /// `enrollment`
    Enrollment,
}

impl ForeignKey {
    /// JSON field name of this key
    pub fn field_name(self) -> &'static str {
        match self {
            ForeignKey::TrackedEntityInstance => TRACKED_ENTITY_INSTANCE_FIELD,
            ForeignKey::Enrollment => ENROLLMENT_FIELD,
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Common access to the JSON object behind a record
pub trait TrackerRecord {
    /// The underlying JSON object
    fn fields(&self) -> &Map<String, Value>;

    /// Reads a string field; missing, null and non-string values yield `None`
    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields().get(name).and_then(Value::as_str)
    }
}

/// A record that is addressed by one of its own fields
pub trait KeyedRecord: TrackerRecord {
    /// Field carrying this record's identifier
    const KEY_FIELD: &'static str;

    /// Identifier of this record, if present
    fn uid(&self) -> Option<Uid> {
        self.str_field(Self::KEY_FIELD).map(Uid::from)
    }
}

macro_rules! tracker_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Map<String, Value>);

        impl $name {
            /// Wraps an existing JSON object
            pub fn new(fields: Map<String, Value>) -> Self {
                Self(fields)
            }

            /// Consumes the record and returns its JSON object
            pub fn into_inner(self) -> Map<String, Value> {
                self.0
            }
        }

        impl TrackerRecord for $name {
            fn fields(&self) -> &Map<String, Value> {
                &self.0
            }
        }

        impl From<Map<String, Value>> for $name {
            fn from(fields: Map<String, Value>) -> Self {
                Self(fields)
            }
        }
    };
}

tracker_record!(
    /// A single event
    Event
);

tracker_record!(
    /// A tracked entity instance, the subject events and enrollments refer to
    TrackedEntityInstance
);

tracker_record!(
    /// A subject's enrollment into a program
    Enrollment
);

impl Event {
    /// Value of the given foreign key on this event
    pub fn foreign_key(&self, key: ForeignKey) -> Option<&str> {
        self.str_field(key.field_name())
    }
}

impl KeyedRecord for TrackedEntityInstance {
    const KEY_FIELD: &'static str = TRACKED_ENTITY_INSTANCE_FIELD;
}

impl KeyedRecord for Enrollment {
    const KEY_FIELD: &'static str = ENROLLMENT_FIELD;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_event_foreign_keys() {
        let e = event(json!({
            "event": "e1",
            "trackedEntityInstance": "t1",
            "enrollment": "en1"
        }));
        assert_eq!(e.foreign_key(ForeignKey::TrackedEntityInstance), Some("t1"));
        assert_eq!(e.foreign_key(ForeignKey::Enrollment), Some("en1"));
    }

    #[test]
    fn test_event_missing_or_null_foreign_key() {
        let e = event(json!({"event": "e1", "trackedEntityInstance": null}));
        assert_eq!(e.foreign_key(ForeignKey::TrackedEntityInstance), None);
        assert_eq!(e.foreign_key(ForeignKey::Enrollment), None);
    }

    #[test]
    fn test_non_string_foreign_key_is_ignored() {
        let e = event(json!({"enrollment": 42}));
        assert_eq!(e.foreign_key(ForeignKey::Enrollment), None);
    }

    #[test]
    fn test_keyed_record_uid() {
        let tei: TrackedEntityInstance =
            serde_json::from_value(json!({"trackedEntityInstance": "t9", "orgUnit": "ou"}))
                .unwrap();
        assert_eq!(tei.uid(), Some(Uid::from("t9")));

        let enrollment: Enrollment = serde_json::from_value(json!({"status": "ACTIVE"})).unwrap();
        assert_eq!(enrollment.uid(), None);
    }

    #[test]
    fn test_record_passthrough_serialization() {
        let original = json!({
            "event": "e1",
            "dataValues": [{"dataElement": "de", "value": "3"}],
            "coordinate": {"latitude": 1.5, "longitude": 2.5}
        });
        let e = event(original.clone());
        assert_eq!(serde_json::to_value(&e).unwrap(), original);
    }

    #[test]
    fn test_foreign_key_field_names() {
        assert_eq!(
            ForeignKey::TrackedEntityInstance.field_name(),
            "trackedEntityInstance"
        );
        assert_eq!(ForeignKey::Enrollment.to_string(), "enrollment");
    }
}
