use crate::error::{Result, SectionsError};
use serde::{Deserialize, Serialize};

/// Configuration for one metadata engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// How metadata flows through the tree
    pub mode: TraversalMode,

    /// Leaves whose content exceeds this many characters are chunked
    /// (`None` = unbounded, chunking disabled)
    pub max_leaf_size: Option<usize>,

    /// Maximum number of provider calls in flight at once
    /// (`None` = unbounded, no gating)
    pub max_concurrency: Option<usize>,
}

impl EngineConfig {
    /// Aggregation mode with no bounds
    #[must_use]
    pub fn aggregate() -> Self {
        Self::default()
    }

    /// Independent mode with no bounds
    #[must_use]
    pub fn independent() -> Self {
        Self {
            mode: TraversalMode::Independent,
            ..Default::default()
        }
    }

    /// Builder: chunk leaves larger than `size` characters
    #[must_use]
    pub const fn with_max_leaf_size(mut self, size: usize) -> Self {
        self.max_leaf_size = Some(size);
        self
    }

    /// Builder: bound concurrent provider calls
    #[must_use]
    pub const fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == Some(0) {
            return Err(SectionsError::invalid_config(
                "max_concurrency must be > 0 (omit it for unbounded)",
            ));
        }

        if self.max_leaf_size == Some(0) {
            return Err(SectionsError::invalid_config(
                "max_leaf_size must be > 0 (omit it for unbounded)",
            ));
        }

        if self.mode == TraversalMode::Independent && self.max_leaf_size.is_some() {
            log::debug!("max_leaf_size has no effect in independent mode");
        }

        Ok(())
    }
}

/// Strategy for deriving metadata across the section tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Bottom-up: leaves are generated (chunked when oversized),
    /// parents aggregate their children's metadata
    #[default]
    Aggregate,

    /// Every section is generated from its own heading and content only
    Independent,
}

impl TraversalMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Independent => "independent",
        }
    }
}

impl std::str::FromStr for TraversalMode {
    type Err = SectionsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggregate" | "map-reduce" => Ok(Self::Aggregate),
            "independent" | "flat" => Ok(Self::Independent),
            other => Err(SectionsError::invalid_config(format!(
                "unknown traversal mode '{other}' (expected aggregate|independent)"
            ))),
        }
    }
}
