//! # Context Sections
//!
//! Hierarchical section metadata for AI context assembly.
//!
//! A document is parsed into a tree of sections by heading depth, then every section receives
//! metadata from a caller-supplied [`MetadataProvider`]. Leaves are generated directly (or in
//! paragraph-aligned chunks when oversized) and parents aggregate their children's metadata, all
//! under one concurrency bound per invocation.
//!
//! ## Architecture
//!
//! ```text
//! Markdown
//!     │
//!     ├──> Section Parser (tree-sitter-md)
//!     │      └─> RawSection[] (heading, depth, own content, children)
//!     │
//!     └──> Metadata Engine
//!            ├─> Limiter: bounds in-flight generate/aggregate calls
//!            ├─> Leaf ≤ max_leaf_size: generate
//!            ├─> Leaf > max_leaf_size: chunk → generate each → aggregate
//!            └─> Parent: children first → aggregate
//!                   └─> AnnotatedSection[] (same shape + metadata)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_sections::{EngineConfig, ExtractiveProvider, MetadataEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::aggregate()
//!         .with_max_leaf_size(2000)
//!         .with_max_concurrency(4);
//!     let engine = MetadataEngine::new(ExtractiveProvider::default(), config)?;
//!
//!     let sections = engine
//!         .annotate_document("# Guide\nintro\n## Install\nRun the installer.")
//!         .await?;
//!     println!("{}", sections[0].metadata.description);
//!     Ok(())
//! }
//! ```

mod chunker;
mod config;
mod engine;
mod error;
mod extractive;
mod limiter;
mod parser;
mod provider;
mod types;

pub use chunker::{chunk_content, content_size};
pub use config::{EngineConfig, TraversalMode};
pub use engine::{chunk_heading, MetadataEngine};
pub use error::{Result, SectionsError};
pub use extractive::{ExtractiveConfig, ExtractiveProvider};
pub use limiter::{Limiter, LimiterPermit, LimiterSnapshot};
pub use parser::{parse_markdown_sections, SectionParser};
pub use provider::MetadataProvider;
pub use types::{count_nodes, AnnotatedSection, Metadata, RawSection};
