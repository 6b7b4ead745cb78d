//! # Context Ingest
//!
//! File ingestion on top of the section metadata engine.
//!
//! ## Pipeline
//!
//! ```text
//! Files (.md, .txt, .csv)
//!     │
//!     ├──> Type detection (extension)
//!     │
//!     ├──> .md  → Section Parser → Metadata Engine → ComplexDocument
//!     ├──> .txt → parse_text → generate             → Document
//!     └──> .csv → parse_csv  → generate             → List
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_ingest::{IngestConfig, Ingester};
//! use context_sections::ExtractiveProvider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load(None)?;
//!     let provider = ExtractiveProvider::new(config.provider.clone());
//!     let mut ingester = Ingester::new(provider, &config)?;
//!
//!     ingester.file("README.md")?.file("people.csv")?;
//!     for source in ingester.run().await {
//!         println!("{} {}", source.id(), source.metadata().title);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod ingester;
mod parsers;
mod source;
mod stats;

pub use config::{IngestConfig, DEFAULT_CONFIG_FILE};
pub use error::{IngestError, Result};
pub use ingester::Ingester;
pub use parsers::{parse_csv, parse_markdown, parse_text};
pub use source::{source_id, Source, SupportedFileType};
pub use stats::IngestStats;
