use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scan error: {0}")]
    Scan(#[from] linkrot_scanner::ScanError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
