use crate::chunker::{chunk_content, content_size};
use crate::config::{EngineConfig, TraversalMode};
use crate::error::{Result, SectionsError};
use crate::limiter::Limiter;
use crate::parser::parse_markdown_sections;
use crate::provider::MetadataProvider;
use crate::types::{count_nodes, AnnotatedSection, Metadata, RawSection};
use futures::future::{try_join_all, BoxFuture, FutureExt};

/// Heading passed to `generate` for the `ordinal`-th (1-based) chunk of an oversized section
#[must_use]
pub fn chunk_heading(heading: &str, ordinal: usize) -> String {
    format!("{heading} [chunk {ordinal}]")
}

/// Walks a section tree and attaches metadata to every section.
///
/// Each `generate`/`aggregate` call holds its own slot in a per-invocation [`Limiter`], so a
/// bound of one serialises calls without ever deadlocking a parent against its children.
pub struct MetadataEngine<P> {
    provider: P,
    config: EngineConfig,
}

impl<P: MetadataProvider> MetadataEngine<P> {
    /// Create an engine, rejecting invalid configuration before any provider call
    pub fn new(provider: P, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Parse markdown and annotate the resulting sections
    pub async fn annotate_document(&self, markdown: &str) -> Result<Vec<AnnotatedSection>> {
        let sections = parse_markdown_sections(markdown)?;
        self.annotate(&sections).await
    }

    /// Annotate a section tree.
    ///
    /// The output has the same shape as `sections`. The first provider failure aborts the whole
    /// call; no partial tree is returned.
    pub async fn annotate(&self, sections: &[RawSection]) -> Result<Vec<AnnotatedSection>> {
        if sections.is_empty() {
            return Ok(Vec::new());
        }

        let limiter = Limiter::new(self.config.max_concurrency);
        log::debug!(
            "annotating {} sections ({} mode, max_leaf_size={:?}, max_concurrency={:?})",
            count_nodes(sections),
            self.config.mode.as_str(),
            self.config.max_leaf_size,
            limiter.limit(),
        );

        let annotated = match self.config.mode {
            TraversalMode::Aggregate => self.walk(sections, &limiter).await,
            TraversalMode::Independent => self.annotate_independent(sections, &limiter).await,
        };

        let snapshot = limiter.snapshot();
        match &annotated {
            Ok(_) => log::debug!("annotation finished, peak in-flight calls: {}", snapshot.peak_in_flight),
            Err(e) => log::debug!("annotation aborted: {e}"),
        }
        annotated
    }

    fn walk<'a>(
        &'a self,
        sections: &'a [RawSection],
        limiter: &'a Limiter,
    ) -> BoxFuture<'a, Result<Vec<AnnotatedSection>>> {
        async move { try_join_all(sections.iter().map(|s| self.resolve(s, limiter))).await }.boxed()
    }

    async fn resolve(&self, section: &RawSection, limiter: &Limiter) -> Result<AnnotatedSection> {
        // Children are fully resolved before this section's own call starts.
        let children = self.walk(&section.children, limiter).await?;

        let metadata = if section.is_leaf() {
            self.resolve_leaf(section, limiter).await?
        } else {
            let child_metadata: Vec<Metadata> =
                children.iter().map(|c| c.metadata.clone()).collect();
            self.aggregate(&section.heading, &section.content, &child_metadata, limiter)
                .await?
        };

        Ok(AnnotatedSection::from_raw(section, metadata, children))
    }

    async fn resolve_leaf(&self, section: &RawSection, limiter: &Limiter) -> Result<Metadata> {
        let oversized = self
            .config
            .max_leaf_size
            .filter(|&max| content_size(&section.content) > max);

        let Some(max) = oversized else {
            return self.generate(&section.heading, &section.content, limiter).await;
        };

        let chunks = chunk_content(&section.content, max);
        if chunks.is_empty() {
            // Whitespace-only content has no paragraphs to split.
            return self.generate(&section.heading, &section.content, limiter).await;
        }
        log::debug!(
            "section '{}' exceeds {max} chars, split into {} chunks",
            section.heading,
            chunks.len()
        );

        let chunk_metadata = try_join_all(chunks.iter().enumerate().map(|(i, chunk)| {
            let heading = chunk_heading(&section.heading, i + 1);
            async move { self.generate(&heading, chunk, limiter).await }
        }))
        .await?;

        self.aggregate(&section.heading, &section.content, &chunk_metadata, limiter)
            .await
    }

    async fn annotate_independent(
        &self,
        sections: &[RawSection],
        limiter: &Limiter,
    ) -> Result<Vec<AnnotatedSection>> {
        let mut work = Vec::with_capacity(count_nodes(sections));
        flatten(sections, &mut work);

        let gated = limiter.limit().is_some_and(|limit| limit < work.len());
        log::debug!(
            "independent worklist of {} sections ({})",
            work.len(),
            if gated { "gated" } else { "ungated" }
        );

        let metadata = try_join_all(work.iter().map(|section| async move {
            if gated {
                self.generate(&section.heading, &section.content, limiter)
                    .await
            } else {
                self.provider
                    .generate(&section.heading, &section.content)
                    .await
                    .map_err(SectionsError::Callback)
            }
        }))
        .await?;

        let mut metadata = metadata.into_iter();
        Ok(rebuild(sections, &mut metadata))
    }

    async fn generate(&self, heading: &str, content: &str, limiter: &Limiter) -> Result<Metadata> {
        let _permit = limiter.acquire().await;
        self.provider
            .generate(heading, content)
            .await
            .map_err(SectionsError::Callback)
    }

    async fn aggregate(
        &self,
        heading: &str,
        own_content: &str,
        children: &[Metadata],
        limiter: &Limiter,
    ) -> Result<Metadata> {
        let _permit = limiter.acquire().await;
        self.provider
            .aggregate(heading, own_content, children)
            .await
            .map_err(SectionsError::Callback)
    }
}

/// Pre-order flattening; `rebuild` consumes results in the same order
fn flatten<'a>(sections: &'a [RawSection], out: &mut Vec<&'a RawSection>) {
    for section in sections {
        out.push(section);
        flatten(&section.children, out);
    }
}

fn rebuild(
    sections: &[RawSection],
    metadata: &mut impl Iterator<Item = Metadata>,
) -> Vec<AnnotatedSection> {
    sections
        .iter()
        .map(|section| {
            let own = metadata
                .next()
                .expect("one metadata result per flattened section");
            let children = rebuild(&section.children, metadata);
            AnnotatedSection::from_raw(section, own, children)
        })
        .collect()
}
