//! Integration tests for the nested zip archive layout

use ferry::core::archive::{read_archive, write_archive};
use ferry::domain::{Enrollment, Event, ResultBundle, TrackedEntityInstance};
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive};

fn sample_bundle() -> ResultBundle {
    let mut bundle = ResultBundle::new();
    bundle.append_events(vec![
        serde_json::from_value::<Event>(json!({
            "event": "e1",
            "trackedEntityInstance": "t1",
            "enrollment": "en1",
            "dataValues": [{"dataElement": "d1", "value": "12"}]
        }))
        .unwrap(),
        serde_json::from_value::<Event>(json!({"event": "e2"})).unwrap(),
    ]);
    bundle.append_tracked_entity_instances(vec![serde_json::from_value::<TrackedEntityInstance>(
        json!({"trackedEntityInstance": "t1", "attributes": []}),
    )
    .unwrap()]);
    bundle.append_enrollments(vec![serde_json::from_value::<Enrollment>(
        json!({"enrollment": "en1", "program": "P1"}),
    )
    .unwrap()]);
    bundle
}

fn entry_bytes<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Vec<u8> {
    let mut file = archive.by_name(name).unwrap();
    assert_eq!(file.compression(), CompressionMethod::Deflated);
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    bytes
}

#[test]
fn test_outer_archive_holds_three_inner_zips() {
    let bytes = write_archive(&sample_bundle()).unwrap();
    let mut outer = ZipArchive::new(Cursor::new(bytes)).unwrap();

    let mut names: Vec<&str> = outer.file_names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["enrollments.zip", "events.zip", "trackedEntityInstances.zip"]
    );

    for (member, entry, key, count) in [
        ("events.zip", "events.json", "events", 2),
        (
            "trackedEntityInstances.zip",
            "trackedEntityInstances.json",
            "trackedEntityInstances",
            1,
        ),
        ("enrollments.zip", "enrollments.json", "enrollments", 1),
    ] {
        let inner_bytes = entry_bytes(&mut outer, member);
        let mut inner = ZipArchive::new(Cursor::new(inner_bytes)).unwrap();
        assert_eq!(inner.len(), 1, "{member} should hold exactly one entry");

        let document: Value = serde_json::from_slice(&entry_bytes(&mut inner, entry)).unwrap();
        let object = document.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object[key].as_array().unwrap().len(), count);
    }
}

#[test]
fn test_archive_survives_a_trip_through_disk() {
    let bundle = sample_bundle();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.zip");

    std::fs::write(&path, write_archive(&bundle).unwrap()).unwrap();
    let decoded = read_archive(&std::fs::read(&path).unwrap()).unwrap();

    assert_eq!(decoded, bundle);
    assert_eq!(
        decoded.events[0].clone().into_inner()["dataValues"],
        json!([{"dataElement": "d1", "value": "12"}])
    );
}

#[test]
fn test_empty_bundle_still_writes_every_member() {
    let bytes = write_archive(&ResultBundle::new()).unwrap();
    let mut outer = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(outer.len(), 3);

    let inner_bytes = entry_bytes(&mut outer, "enrollments.zip");
    let mut inner = ZipArchive::new(Cursor::new(inner_bytes)).unwrap();
    let document: Value =
        serde_json::from_slice(&entry_bytes(&mut inner, "enrollments.json")).unwrap();
    assert_eq!(document, json!({"enrollments": []}));
}
