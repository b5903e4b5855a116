use thiserror::Error;

/// Pacing-engine error type
#[derive(Error, Debug)]
pub enum PacerError {
    #[error("Vsync source initialization failed: {0}")]
    VsyncInit(String),

    #[error("Pacer is already initialized")]
    AlreadyInitialized,

    #[error("Failed to spawn {thread} thread: {source}")]
    ThreadSpawn {
        thread: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pacing operations
pub type Result<T> = std::result::Result<T, PacerError>;
