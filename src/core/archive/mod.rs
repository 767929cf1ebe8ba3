//! Export archives
//!
//! An archive is a zip of three zips, one per collection:
//!
//! ```text
//! export.zip
//! ├── events.zip                  -> events.json                 {"events": [...]}
//! ├── trackedEntityInstances.zip  -> trackedEntityInstances.json {"trackedEntityInstances": [...]}
//! └── enrollments.zip             -> enrollments.json            {"enrollments": [...]}
//! ```
//!
//! Names come from an [`ArchiveNaming`] implementation; [`StandardNaming`]
//! produces the layout above.

pub mod naming;
pub mod writer;

pub use naming::{ArchiveMember, ArchiveNaming, StandardNaming};
pub use writer::{read_archive, write_archive, Archiver};
