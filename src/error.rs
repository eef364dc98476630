//! Error types for zone resolution and stack analysis

use thiserror::Error;

/// Errors raised while resolving zone membership
///
/// These are configuration bugs, not expected outcomes. An absent stack or an
/// empty zone set is not an error: `analyzer::process` returns `Ok(None)` for
/// those.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// A zone was reached a second time while resolving one identifier
    #[error("Closed loop dependency found for zone: {zone}")]
    Cycle { zone: String },

    /// A zone definition referenced a zone name that does not exist
    #[error("Zone '{zone}' references unknown zone '{reference}'")]
    UnknownReference { zone: String, reference: String },

    /// Two zone definitions share a name
    #[error("Duplicate zone name '{0}'")]
    DuplicateName(String),
}

/// Result type alias for zone operations
pub type Result<T> = std::result::Result<T, ZoneError>;
