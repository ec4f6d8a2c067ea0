//! Recording catalog adapters

mod fs_catalog;
mod json_index;

pub use fs_catalog::{CatalogEntry, FsCatalog};
pub use json_index::JsonRecordingIndex;
