use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::parsers::{parse_csv, parse_markdown, parse_text};
use crate::source::{source_id, Source, SupportedFileType};
use crate::stats::IngestStats;
use context_sections::{
    AnnotatedSection, EngineConfig, Limiter, Metadata, MetadataEngine, MetadataProvider,
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Turns files into [`Source`]s using one metadata provider.
///
/// Files are queued with [`Ingester::file`] and processed by [`Ingester::run`]. The engine
/// behind markdown files is shared, so every file gets the same traversal settings.
pub struct Ingester<P: MetadataProvider> {
    engine: MetadataEngine<P>,
    max_parallel_files: usize,
    queue: Vec<(PathBuf, SupportedFileType)>,
    last_stats: IngestStats,
}

impl<P: MetadataProvider> Ingester<P> {
    /// Create an ingester; fails when the engine config is invalid
    pub fn new(provider: P, config: &IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: MetadataEngine::new(provider, config.engine.clone())?,
            max_parallel_files: config.max_parallel_files,
            queue: Vec::new(),
            last_stats: IngestStats::new(),
        })
    }

    /// Shorthand for an ingester with default settings apart from the engine
    pub fn with_engine(provider: P, engine: EngineConfig) -> Result<Self> {
        let config = IngestConfig {
            engine,
            ..IngestConfig::default()
        };
        Self::new(provider, &config)
    }

    /// Queue a file. The type is checked now, the content is read by `run`.
    pub fn file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let file_type = SupportedFileType::from_path(path)?;
        self.queue.push((path.to_path_buf(), file_type));
        Ok(self)
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Statistics of the most recent `run`
    #[must_use]
    pub const fn last_stats(&self) -> &IngestStats {
        &self.last_stats
    }

    /// Ingest every queued file.
    ///
    /// Files are processed concurrently, at most `max_parallel_files` at a time. A file that
    /// fails is logged and skipped. The queue is cleared and sources come back in queue order.
    pub async fn run(&mut self) -> Vec<Source> {
        let started = Instant::now();
        let queue = std::mem::take(&mut self.queue);
        let limiter = Limiter::new(Some(self.max_parallel_files));
        log::info!(
            "Ingesting {} files (parallel: {}, {} mode)",
            queue.len(),
            self.max_parallel_files,
            self.engine.config().mode.as_str()
        );

        let engine = &self.engine;
        let results = join_all(queue.iter().map(|(path, file_type)| {
            let limiter = &limiter;
            async move {
                let _permit = limiter.acquire().await;
                ingest_typed(engine, path, *file_type).await
            }
        }))
        .await;

        let mut stats = IngestStats::new();
        let mut sources = Vec::with_capacity(results.len());
        for ((path, _), result) in queue.iter().zip(results) {
            match result {
                Ok(source) => {
                    stats.add_source(source.kind(), section_count(&source));
                    sources.push(source);
                }
                Err(err) => {
                    log::warn!("Skipping {}: {err}", path.display());
                    stats.add_error(format!("{}: {err}", path.display()));
                }
            }
        }

        stats.time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Ingested {} files ({} sections, {} skipped) in {} ms",
            stats.files,
            stats.sections,
            stats.errors.len(),
            stats.time_ms
        );
        self.last_stats = stats;
        sources
    }

    /// Ingest one file right away, propagating any failure
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<Source> {
        let path = path.as_ref();
        let file_type = SupportedFileType::from_path(path)?;
        ingest_typed(&self.engine, path, file_type).await
    }
}

async fn ingest_typed<P: MetadataProvider>(
    engine: &MetadataEngine<P>,
    path: &Path,
    file_type: SupportedFileType,
) -> Result<Source> {
    let raw = tokio::fs::read_to_string(path).await?;
    let id = source_id(path, &raw);
    let name = file_name(path);
    log::debug!("Ingesting {} as .{file_type}", path.display());

    match file_type {
        SupportedFileType::Md => {
            let content = parse_markdown(&raw);
            let sections = engine.annotate_document(&content).await?;
            let metadata = if sections.is_empty() {
                generate(engine, path, &name, &content).await?
            } else {
                let roots: Vec<Metadata> =
                    sections.iter().map(|section| section.metadata.clone()).collect();
                engine
                    .provider()
                    .aggregate(&name, "", &roots)
                    .await
                    .map_err(|source| provider_error(path, source))?
            };
            Ok(Source::ComplexDocument {
                id,
                metadata,
                sections,
                content,
            })
        }
        SupportedFileType::Txt => {
            let content = parse_text(&raw);
            let metadata = generate(engine, path, &name, &content).await?;
            Ok(Source::Document {
                id,
                metadata,
                content,
            })
        }
        SupportedFileType::Csv => {
            let rows = parse_csv(&raw);
            let metadata = generate(engine, path, &name, &rows.join("\n")).await?;
            Ok(Source::List {
                id,
                metadata,
                content: rows,
            })
        }
    }
}

async fn generate<P: MetadataProvider>(
    engine: &MetadataEngine<P>,
    path: &Path,
    name: &str,
    content: &str,
) -> Result<Metadata> {
    engine
        .provider()
        .generate(name, content)
        .await
        .map_err(|source| provider_error(path, source))
}

fn provider_error(path: &Path, source: anyhow::Error) -> IngestError {
    IngestError::ProviderError {
        path: path.to_path_buf(),
        source,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn section_count(source: &Source) -> usize {
    match source {
        Source::ComplexDocument { sections, .. } => {
            sections.iter().map(AnnotatedSection::node_count).sum()
        }
        _ => 0,
    }
}
