use crate::error::{IngestError, Result};
use context_sections::{AnnotatedSection, Metadata};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// File types the ingester understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedFileType {
    Md,
    Txt,
    Csv,
}

impl SupportedFileType {
    pub const ALL: [Self; 3] = [Self::Md, Self::Txt, Self::Csv];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Md => "md",
            Self::Txt => "txt",
            Self::Csv => "csv",
        }
    }

    /// Detect the type from the (case-insensitive) extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| IngestError::MissingExtension(path.to_path_buf()))?
            .to_lowercase();

        Self::ALL
            .into_iter()
            .find(|ty| ty.extension() == ext)
            .ok_or(IngestError::UnsupportedFileType(ext))
    }
}

impl fmt::Display for SupportedFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One ingested file, shaped by its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// Plain text
    Document {
        id: String,
        metadata: Metadata,
        content: String,
    },

    /// Tabular rows, one rendered string per row
    List {
        id: String,
        metadata: Metadata,
        content: Vec<String>,
    },

    /// Markdown with its annotated section tree
    ComplexDocument {
        id: String,
        metadata: Metadata,
        sections: Vec<AnnotatedSection>,
        content: String,
    },
}

impl Source {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Document { id, .. } | Self::List { id, .. } | Self::ComplexDocument { id, .. } => {
                id
            }
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        match self {
            Self::Document { metadata, .. }
            | Self::List { metadata, .. }
            | Self::ComplexDocument { metadata, .. } => metadata,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::List { .. } => "list",
            Self::ComplexDocument { .. } => "complex_document",
        }
    }
}

/// Stable id for a file: hex SHA-256 over path and content, truncated to 16 bytes
#[must_use]
pub fn source_id(path: &Path, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest[..16].iter().map(|byte| format!("{byte:02x}")).collect()
}
