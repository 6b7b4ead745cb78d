use serde::{Deserialize, Serialize};

/// Metadata produced by a [`MetadataProvider`](crate::MetadataProvider) for one section or chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    /// Concise, searchable title
    pub title: String,

    /// Compressed summary of the content
    pub description: String,

    /// Atomic facts usable as relevance hooks
    #[serde(default)]
    pub keypoints: Vec<String>,
}

impl Metadata {
    /// Metadata carrying only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A section of a parsed document, before metadata is attached
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSection {
    /// Heading text without markers (empty for the preamble)
    pub heading: String,

    /// Heading depth: 1-6 for headings, 0 for text preceding the first heading
    pub depth: usize,

    /// Text between this heading and the next heading of any depth, trimmed
    pub content: String,

    /// Nested subsections, in document order
    #[serde(default)]
    pub children: Vec<RawSection>,
}

impl RawSection {
    /// Create a section without children
    pub fn new(heading: impl Into<String>, depth: usize, content: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            depth,
            content: content.into(),
            children: Vec::new(),
        }
    }

    /// Builder: append a child section
    #[must_use]
    pub fn with_child(mut self, child: RawSection) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of sections in this subtree, including `self`
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + count_nodes(&self.children)
    }
}

/// Count every section in a forest
#[must_use]
pub fn count_nodes(sections: &[RawSection]) -> usize {
    sections.iter().map(RawSection::node_count).sum()
}

/// A section with metadata attached; mirrors the [`RawSection`] it was built from
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatedSection {
    pub heading: String,
    pub depth: usize,
    pub content: String,

    /// Metadata generated for this section or rolled up from its children
    pub metadata: Metadata,

    #[serde(default)]
    pub children: Vec<AnnotatedSection>,
}

impl AnnotatedSection {
    pub(crate) fn from_raw(
        raw: &RawSection,
        metadata: Metadata,
        children: Vec<AnnotatedSection>,
    ) -> Self {
        Self {
            heading: raw.heading.clone(),
            depth: raw.depth,
            content: raw.content.clone(),
            metadata,
            children,
        }
    }

    /// Number of sections in this subtree, including `self`
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(AnnotatedSection::node_count)
            .sum::<usize>()
    }
}
