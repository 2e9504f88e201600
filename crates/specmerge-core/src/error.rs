use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("conflicting delta operations for requirement '{name}': appears in {kinds}")]
    ConflictingOperations { name: String, kinds: String },

    #[error("renamed requirement '{0}' has a FROM line with no matching TO")]
    UnpairedRename(String),

    #[error("delta for '{0}' declares no ADDED, MODIFIED, REMOVED or RENAMED operations")]
    EmptyDelta(String),

    #[error("change not found: {0}")]
    ChangeNotFound(String),

    #[error("archive target already exists: {0}")]
    ArchiveExists(String),

    #[error("invalid name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SpecError>;
