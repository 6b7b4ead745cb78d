use crate::types::Metadata;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of section metadata, invoked by the engine as an opaque callback.
///
/// Implementations may call a model, a heuristic or a cache, and may suspend. The engine passes
/// exactly the heading and content a call describes and never retries a failed call.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Metadata for one section (or one chunk of an oversized section)
    async fn generate(&self, heading: &str, content: &str) -> anyhow::Result<Metadata>;

    /// Metadata rolled up from `children` (child sections or chunks, in document order)
    async fn aggregate(
        &self,
        heading: &str,
        own_content: &str,
        children: &[Metadata],
    ) -> anyhow::Result<Metadata>;
}

#[async_trait]
impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    async fn generate(&self, heading: &str, content: &str) -> anyhow::Result<Metadata> {
        (**self).generate(heading, content).await
    }

    async fn aggregate(
        &self,
        heading: &str,
        own_content: &str,
        children: &[Metadata],
    ) -> anyhow::Result<Metadata> {
        (**self).aggregate(heading, own_content, children).await
    }
}
