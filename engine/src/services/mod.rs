//! Service implementations
//!
//! Real implementations of the engine's I/O traits: reference data, member
//! directory, batch persistence and the external affordability service.

pub mod affordability;
pub mod batch_store;
pub mod member_directory;
pub mod reference_store;

#[cfg(test)]
pub(crate) mod tests;

pub use affordability::{ConfiguredProvider, DisabledAffordabilityProvider, HttpAffordabilityProvider};
pub use batch_store::{FileBatchStore, InMemoryBatchStore};
pub use member_directory::{DirectoryData, GroupRecord, RealMemberDirectory};
pub use reference_store::{RealReferenceStore, ReferenceData};
