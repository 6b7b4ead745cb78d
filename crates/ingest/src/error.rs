use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Sections error: {0}")]
    SectionsError(#[from] context_sections::SectionsError),

    #[error("Unable to determine file type for: {}", .0.display())]
    MissingExtension(PathBuf),

    #[error("Unsupported file type: .{0}. Supported types: .md, .txt, .csv")]
    UnsupportedFileType(String),

    #[error("Metadata provider failed for {}: {source}", path.display())]
    ProviderError {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid config {}: {message}", path.display())]
    ConfigError { path: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}
