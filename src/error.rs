use thiserror::Error;

#[derive(Error, Debug)]
pub enum PykegError {
    #[error(
        "formula {formula} declares more than one python: {}",
        .wanted.join(", ")
    )]
    AmbiguousPython { formula: String, wanted: Vec<String> },

    #[error("failed to create virtualenv with {interpreter}: {reason}")]
    EnvironmentCreation { interpreter: String, reason: String },

    #[error("failed to pin pip below the broken release: {reason}")]
    PipPin { reason: String },

    #[error("failed to install resource {name}: {source}")]
    ResourceInstall {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("failed to link entry points: {0}")]
    Link(#[source] anyhow::Error),

    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PykegError>;
