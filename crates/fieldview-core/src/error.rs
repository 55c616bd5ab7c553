use thiserror::Error;

/// Failures surfaced by the overlay pipeline.
///
/// Per-record ingestion problems are not errors: malformed records are skipped
/// and counted in [`crate::ingest::IngestReport`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    /// The field-data document as a whole could not be used.
    #[error("{0}")]
    InvalidFieldData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The viewport collaborator failed to convert a coordinate.
    #[error("projection failed: {0}")]
    Projection(String),

    #[error("tessellation failed: {0}")]
    Tessellation(String),

    /// The mapping widget never came up (missing credentials, script load failure, …).
    #[error("{0}")]
    MapUnavailable(String),

    #[error("drawing surface unavailable: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
