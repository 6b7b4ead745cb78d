//! Offline metadata provider.
//!
//! Builds metadata from the text itself: headings become titles, leading sentences become the
//! description and distinct lines become keypoints. Aggregation rolls child keypoints up instead
//! of re-reading raw content, so it behaves like a model-backed provider in the engine.

use crate::provider::MetadataProvider;
use crate::types::Metadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const UNTITLED: &str = "Untitled";

/// Limits for [`ExtractiveProvider`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractiveConfig {
    /// Content beyond this many characters is ignored
    pub max_input_chars: usize,

    /// Upper bound for generated descriptions
    pub max_description_chars: usize,

    /// Upper bound for keypoints per section
    pub max_keypoints: usize,
}

impl Default for ExtractiveConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 4000,
            max_description_chars: 400,
            max_keypoints: 10,
        }
    }
}

/// Deterministic [`MetadataProvider`] that needs no model
#[derive(Debug, Clone, Default)]
pub struct ExtractiveProvider {
    config: ExtractiveConfig,
}

impl ExtractiveProvider {
    #[must_use]
    pub const fn new(config: ExtractiveConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ExtractiveConfig {
        &self.config
    }

    fn describe(&self, content: &str) -> String {
        let mut description = String::new();
        for sentence in sentences(content) {
            let extra = usize::from(!description.is_empty());
            if description.chars().count() + extra + sentence.chars().count()
                > self.config.max_description_chars
            {
                break;
            }
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(sentence);
        }

        if description.is_empty() {
            // First sentence alone is longer than the limit.
            description = truncate_chars(content.trim(), self.config.max_description_chars);
        }
        description
    }

    fn keypoints<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .map(str::trim)
            .filter(|point| !point.is_empty())
            .filter(|point| seen.insert(point.to_lowercase()))
            .take(self.config.max_keypoints)
            .map(ToString::to_string)
            .collect()
    }
}

#[async_trait]
impl MetadataProvider for ExtractiveProvider {
    async fn generate(&self, heading: &str, content: &str) -> anyhow::Result<Metadata> {
        let content = truncate_chars(content, self.config.max_input_chars);
        let lines: Vec<&str> = content
            .lines()
            .map(strip_list_marker)
            .filter(|line| !line.is_empty() && !line.starts_with("```"))
            .collect();

        let title = match heading.trim() {
            "" => lines.first().map_or(UNTITLED, |line| line.trim_start_matches('#').trim()),
            heading => heading,
        };

        Ok(Metadata {
            title: title.to_string(),
            description: self.describe(&lines.join(" ")),
            keypoints: self.keypoints(lines.iter().flat_map(|line| sentences(line))),
        })
    }

    async fn aggregate(
        &self,
        heading: &str,
        own_content: &str,
        children: &[Metadata],
    ) -> anyhow::Result<Metadata> {
        let title = match heading.trim() {
            "" => children
                .iter()
                .map(|child| child.title.as_str())
                .find(|title| !title.is_empty())
                .unwrap_or(UNTITLED),
            heading => heading,
        };

        let lead = self.describe(&truncate_chars(own_content, self.config.max_input_chars));
        let child_titles: Vec<&str> = children
            .iter()
            .map(|child| child.title.as_str())
            .filter(|title| !title.is_empty() && *title != heading.trim())
            .collect();
        let summary = if child_titles.is_empty() {
            lead
        } else if lead.is_empty() {
            format!("Covers: {}.", child_titles.join("; "))
        } else {
            format!("{lead} Covers: {}.", child_titles.join("; "))
        };

        Ok(Metadata {
            title: title.to_string(),
            description: truncate_chars(&summary, self.config.max_description_chars),
            keypoints: self.keypoints(
                children
                    .iter()
                    .flat_map(|child| child.keypoints.iter().map(String::as_str)),
            ),
        })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let stripped = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
        .or_else(|| line.strip_prefix("> "));
    if let Some(rest) = stripped {
        return rest.trim();
    }

    // Ordered list items: "1. text" / "1) text"
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim();
        }
    }
    line
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
}
