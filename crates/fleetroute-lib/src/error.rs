use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the fleetroute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Only structural faults live here. "No route" and "route too long" are
/// ordinary planning outcomes and are returned as values
/// ([`crate::PathOutcome`], [`crate::Feasibility`]).
#[derive(Debug, Error)]
pub enum Error {
    /// The terrain graph document is unusable (missing ids, dangling edges,
    /// missing or invalid costs, unparseable content).
    #[error("malformed graph: {message}")]
    MalformedGraph { message: String },

    /// A node identifier was not present in the graph or view being queried.
    #[error("unknown node: {id}{}", format_suggestions(.suggestions))]
    UnknownNode {
        id: String,
        suggestions: Vec<String>,
    },

    /// The unit roster failed validation.
    #[error("invalid unit roster: {message}")]
    InvalidRoster { message: String },

    /// The target list failed validation.
    #[error("invalid target list: {message}")]
    InvalidTargets { message: String },

    /// The hazard list failed validation.
    #[error("invalid hazard list: {message}")]
    InvalidHazards { message: String },

    /// A required mission input file does not exist.
    #[error("mission file not found at {path}")]
    MissionFileMissing { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve a default data directory for mission files")]
    DataDirUnavailable,

    /// Raised when a route record lacks any nodes.
    #[error("route was empty")]
    EmptyRoute,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors outside graph parsing.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV roster parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether the error is an input-structure fault rather than an IO failure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::MalformedGraph { .. }
                | Error::UnknownNode { .. }
                | Error::InvalidRoster { .. }
                | Error::InvalidTargets { .. }
                | Error::InvalidHazards { .. }
        )
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedGraph {
            message: message.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
