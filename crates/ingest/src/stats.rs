use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statistics about one ingest run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Files ingested successfully
    pub files: usize,

    /// Sections annotated across all markdown files
    pub sections: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Ingested files per source kind
    pub kinds: HashMap<String, usize>,

    /// Files skipped with their error
    pub errors: Vec<String>,
}

impl IngestStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, kind: &str, sections: usize) {
        self.files += 1;
        self.sections += sections;
        *self.kinds.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
