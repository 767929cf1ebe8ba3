//! Domain models and types for Ferry.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`OrgUnitId`], [`ProgramId`], [`Uid`])
//! - **Opaque tracker records** ([`Event`], [`TrackedEntityInstance`], [`Enrollment`])
//! - **The export accumulator** ([`ResultBundle`])
//! - **Time filters** ([`TimeWindow`])
//! - **Error types** ([`FerryError`], [`UpstreamError`]) and the [`Result`] alias
//!
//! # Type Safety
//!
//! Org-unit and program ids are distinct types so a caller can't swap them
//! when building a query:
//!
//! ```rust
//! use ferry::domain::{OrgUnitId, ProgramId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ou = OrgUnitId::new("ImspTQPwCqd")?;
//! let program = ProgramId::new("IpHINAT79UW")?;
//!
//! // let wrong: OrgUnitId = program;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod errors;
pub mod ids;
pub mod records;
pub mod result;
pub mod window;

pub use bundle::ResultBundle;
pub use errors::{FerryError, UpstreamError};
pub use ids::{OrgUnitId, ProgramId, Uid};
pub use records::{
    Enrollment, Event, ForeignKey, KeyedRecord, TrackedEntityInstance, TrackerRecord,
};
pub use result::Result;
pub use window::TimeWindow;
