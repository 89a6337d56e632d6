//! Load-time errors
//!
//! The simulation itself never fails; only reading map and tuning data can.

/// Errors from reading or writing map and tuning documents
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entity {index} ({description}): polygon needs at least 3 vertices, got {count}")]
    TooFewVertices {
        index: usize,
        description: String,
        count: usize,
    },

    #[error("Entity {index} ({description}): size must be positive")]
    NonPositiveSize { index: usize, description: String },

    #[error("Entity {index} ({description}): needs either vertices, a circle or a rect")]
    MissingShape { index: usize, description: String },

    #[error("Map contains no roads")]
    NoRoads,
}
