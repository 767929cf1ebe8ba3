//! Nested zip encoding of a result bundle
//!
//! The outer archive holds one inner zip per collection; each inner zip holds
//! one JSON document `{"<collection>": [...]}`. Every entry is deflated.

use super::naming::{ArchiveMember, ArchiveNaming, StandardNaming};
use crate::domain::{FerryError, Result, ResultBundle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Encodes bundles as nested zip archives and decodes them back
///
/// # Example
///
/// ```
/// use ferry::core::archive::Archiver;
/// use ferry::domain::ResultBundle;
///
/// let archiver = Archiver::new();
/// let bytes = archiver.write(&ResultBundle::new()).unwrap();
/// let decoded = archiver.read(&bytes).unwrap();
/// assert!(decoded.is_empty());
/// ```
#[derive(Clone)]
pub struct Archiver {
    naming: Arc<dyn ArchiveNaming>,
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Archiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver").finish_non_exhaustive()
    }
}

impl Archiver {
    /// Archiver with [`StandardNaming`]
    pub fn new() -> Self {
        Self::with_naming(Arc::new(StandardNaming))
    }

    /// Archiver with custom member names
    pub fn with_naming(naming: Arc<dyn ArchiveNaming>) -> Self {
        Self { naming }
    }

    /// Serializes, compresses each collection, then compresses the three
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Serialization`] or [`FerryError::Archive`].
    pub fn write(&self, bundle: &ResultBundle) -> Result<Vec<u8>> {
        let mut members = Vec::with_capacity(ArchiveMember::ALL.len());
        for member in ArchiveMember::ALL {
            let document = match member {
                ArchiveMember::Events => collection_document(member, &bundle.events)?,
                ArchiveMember::TrackedEntityInstances => {
                    collection_document(member, &bundle.tracked_entity_instances)?
                }
                ArchiveMember::Enrollments => collection_document(member, &bundle.enrollments)?,
            };
            let inner = zip_entries(vec![(self.naming.entry_name(member), document)])?;
            members.push((self.naming.member_name(member), inner));
        }

        let archive = zip_entries(members)?;
        tracing::debug!(
            events = bundle.events.len(),
            tracked_entity_instances = bundle.tracked_entity_instances.len(),
            enrollments = bundle.enrollments.len(),
            bytes = archive.len(),
            "Archive written"
        );
        Ok(archive)
    }

    /// Decodes an archive produced by [`Archiver::write`]
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Archive`] when a member or entry is missing or
    /// a document lacks its collection array.
    pub fn read(&self, bytes: &[u8]) -> Result<ResultBundle> {
        let mut outer = ZipArchive::new(Cursor::new(bytes))?;
        let mut bundle = ResultBundle::new();

        for member in ArchiveMember::ALL {
            let inner_bytes = read_entry(&mut outer, &self.naming.member_name(member))?;
            let mut inner = ZipArchive::new(Cursor::new(inner_bytes))?;
            let document = read_entry(&mut inner, &self.naming.entry_name(member))?;

            match member {
                ArchiveMember::Events => {
                    bundle.append_events(decode_collection(member, &document)?)
                }
                ArchiveMember::TrackedEntityInstances => bundle
                    .append_tracked_entity_instances(decode_collection(member, &document)?),
                ArchiveMember::Enrollments => {
                    bundle.append_enrollments(decode_collection(member, &document)?)
                }
            }
        }

        Ok(bundle)
    }
}

/// Writes `bundle` with [`StandardNaming`]
pub fn write_archive(bundle: &ResultBundle) -> Result<Vec<u8>> {
    Archiver::new().write(bundle)
}

/// Reads an archive written with [`StandardNaming`]
pub fn read_archive(bytes: &[u8]) -> Result<ResultBundle> {
    Archiver::new().read(bytes)
}

fn collection_document<T: Serialize>(member: ArchiveMember, records: &[T]) -> Result<Vec<u8>> {
    let document = BTreeMap::from([(member.collection_key(), records)]);
    Ok(serde_json::to_vec(&document)?)
}

fn decode_collection<T: DeserializeOwned>(member: ArchiveMember, document: &[u8]) -> Result<Vec<T>> {
    let key = member.collection_key();
    let mut value: serde_json::Map<String, Value> = serde_json::from_slice(document)?;
    match value.remove(key) {
        Some(records @ Value::Array(_)) => Ok(serde_json::from_value(records)?),
        _ => Err(FerryError::Archive(format!(
            "{member} document has no '{key}' array"
        ))),
    }
}

fn zip_entries(entries: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(&bytes)
            .map_err(|e| FerryError::Archive(format!("Failed to write {name}: {e}")))?;
    }

    Ok(writer.finish()?.into_inner())
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| FerryError::Archive(format!("Missing archive entry {name}: {e}")))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| FerryError::Archive(format!("Failed to read {name}: {e}")))?;
    Ok(bytes)
}
