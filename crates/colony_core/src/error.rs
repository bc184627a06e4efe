//! Error types for the colony economy.

use thiserror::Error;

use crate::buildings::BuildingId;
use crate::economy::PlayerId;
use crate::planet::PlanetId;

/// Result type alias using [`EconomyError`].
pub type Result<T> = std::result::Result<T, EconomyError>;

/// Top-level error type for economy operations.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// Unknown building type identifier.
    #[error("Unknown building type: {0}")]
    UnknownBuildingType(String),

    /// Unknown research type identifier.
    #[error("Unknown research type: {0}")]
    UnknownResearchType(String),

    /// Unknown planet identifier.
    #[error("Planet not found: {0}")]
    PlanetNotFound(PlanetId),

    /// Unknown player identifier.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The planet has no owner.
    #[error("Planet {0} is not colonized")]
    PlanetNotColonized(PlanetId),

    /// Unknown building on a planet.
    #[error("Building {building} not found on planet {planet}")]
    BuildingNotFound {
        /// Planet that was searched.
        planet: PlanetId,
        /// Building identifier.
        building: BuildingId,
    },

    /// The planet does not allow another building of this type.
    #[error("Build limit reached for '{0}'")]
    BuildLimitReached(String),

    /// Insufficient money.
    #[error("Insufficient money: need {required}, have {available}")]
    InsufficientMoney {
        /// Amount required.
        required: i64,
        /// Amount available.
        available: i64,
    },

    /// Upgrade level outside of the type's upgrade list.
    #[error("Upgrade level {level} exceeds maximum {max} for '{building_type}'")]
    InvalidUpgradeLevel {
        /// Building type id.
        building_type: String,
        /// Requested level.
        level: u32,
        /// Highest valid level.
        max: u32,
    },

    /// The research is not yet available for production.
    #[error("Technology not available: {0}")]
    TechnologyNotAvailable(String),

    /// The research type has no production category.
    #[error("Research type '{0}' cannot be produced")]
    NotProducible(String),

    /// Data file parsing error.
    #[error("Failed to parse data '{path}': {message}")]
    DataParseError {
        /// Path or label of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Engine configuration with unusable rules.
    #[error("Invalid engine configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// Allocation failure.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Persistence failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failure of an allocation task for one planet.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AllocationError {
    /// A work unit carried values the strategies cannot interpret.
    #[error("Invalid work unit for building {building}: {reason}")]
    InvalidWorkUnit {
        /// Building the unit belongs to.
        building: BuildingId,
        /// What was wrong.
        reason: String,
    },

    /// The task panicked while running the strategy.
    #[error("Allocation task for planet {planet} panicked: {message}")]
    TaskPanicked {
        /// Planet whose task failed.
        planet: PlanetId,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The worker pool could not be created.
    #[error("Failed to build allocation worker pool: {0}")]
    PoolUnavailable(String),
}

/// Save/load failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary encoding failure.
    #[error("Binary encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    /// RON encoding failure.
    #[error("RON encoding failed: {0}")]
    RonEncode(#[from] ron::Error),

    /// RON parse failure.
    #[error("RON parse failed: {0}")]
    RonDecode(#[from] ron::error::SpannedError),

    /// Save written by an incompatible version.
    #[error("Save version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// A saved record refers to a type missing from the catalog.
    #[error("Save refers to unknown {kind} type '{id}'")]
    UnknownType {
        /// "building" or "research".
        kind: &'static str,
        /// Missing identifier.
        id: String,
    },
}
