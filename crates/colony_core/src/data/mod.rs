//! Data structures for building and research definitions.
//!
//! This module contains pure data structures that describe what buildings
//! and technologies do. All structs are designed to be deserialized from
//! RON files.
//!
//! **Note:** definitions are read-only once loaded. Mutable per-game state
//! lives in [`crate::buildings`], [`crate::research`] and
//! [`crate::production`].

mod building_data;
mod catalog;
mod research_data;

pub use building_data::{BuildLimit, BuildingType, Upgrade};
pub use catalog::{Catalog, CatalogData};
pub use research_data::{LabRequirements, ResearchType};
