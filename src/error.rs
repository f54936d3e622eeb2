//! Error taxonomy for a generation run.
//!
//! Loader, naming and expansion failures abort the whole run before anything is
//! written. Write failures are reported per artifact by
//! [`GenerationReport`](crate::generator::GenerationReport).

use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

/// Everything that can go wrong while turning a description into model sources
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The API description path does not resolve
    #[error("API description not found at {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The description is structurally invalid (not a mapping, missing keys, wrong value types)
    #[error("malformed API description at {location}: {message}")]
    MalformedDescription {
        /// Dotted location inside the description (e.g. `components.schemas.Order`)
        location: String,
        /// What is wrong at that location
        message: String,
    },

    /// Sanitizing a name left nothing usable
    #[error("cannot derive a {role} identifier from {raw:?}")]
    InvalidIdentifier {
        /// The name as written in the description
        raw: String,
        /// Which kind of identifier was requested
        role: &'static str,
    },

    /// Expanding a schema re-entered a schema that is still being expanded
    #[error("cyclic schema reference: {}", chain.join(" -> "))]
    CyclicSchema {
        /// The in-progress stack, ending with the name that was revisited
        chain: Vec<String>,
    },

    /// The artifact or its parent directory is not writable
    #[error("permission denied writing {}", path.display())]
    PermissionDenied {
        /// Target that could not be written
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact was withheld because a model it references was not written
    #[error("withheld model {model}: it references {dependency}, which was not written")]
    DependencyNotWritten {
        /// Model whose artifact was withheld
        model: String,
        /// Referenced model that failed or was withheld itself
        dependency: String,
    },

    /// A model template failed to render
    #[error("failed to render model {model}: {source}")]
    Render {
        /// Name of the model being rendered
        model: String,
        #[source]
        source: askama::Error,
    },
}

impl GenerateError {
    /// Shorthand for [`GenerateError::MalformedDescription`]
    pub fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        GenerateError::MalformedDescription {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Classify an I/O failure on `path`, splitting out permission problems
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem => {
                GenerateError::PermissionDenied { path, source }
            }
            _ => GenerateError::Io { path, source },
        }
    }
}
