use std::path::PathBuf;

/// Errors surfaced by the library.
///
/// Most degraded inputs (bad numbers, missing documents, malformed config)
/// are reported as warnings instead; these variants cover the cases where an
/// operation genuinely cannot continue.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("project root does not exist: {0}")]
    ProjectRoot(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record table: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid selection: {0}")]
    Selection(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
