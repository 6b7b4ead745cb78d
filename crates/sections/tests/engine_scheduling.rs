use async_trait::async_trait;
use context_sections::{
    AnnotatedSection, EngineConfig, Metadata, MetadataEngine, MetadataProvider, RawSection,
    SectionsError,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start(String),
    End(String),
}

/// Provider that records call order and the number of calls in flight
#[derive(Default)]
struct Tracking {
    delay_ms: u64,
    fail_on: Option<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    generates: Mutex<Vec<(String, String)>>,
    aggregates: Mutex<Vec<(String, Vec<Metadata>)>>,
    events: Mutex<Vec<Event>>,
}

impl Tracking {
    fn slow(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Default::default()
        }
    }

    fn failing_on(heading: &str) -> Self {
        Self {
            delay_ms: 2,
            fail_on: Some(heading.to_string()),
            ..Default::default()
        }
    }

    async fn enter(&self, label: String) -> anyhow::Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Start(label.clone()));
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.events.lock().unwrap().push(Event::End(label.clone()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_on.as_deref() == Some(label.as_str()) {
            return Err(BoomError(label).into());
        }
        Ok(())
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn generate_headings(&self) -> Vec<String> {
        self.generates
            .lock()
            .unwrap()
            .iter()
            .map(|(h, _)| h.clone())
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("provider failed on {0}")]
struct BoomError(String);

#[async_trait]
impl MetadataProvider for Tracking {
    async fn generate(&self, heading: &str, content: &str) -> anyhow::Result<Metadata> {
        self.generates
            .lock()
            .unwrap()
            .push((heading.to_string(), content.to_string()));
        self.enter(heading.to_string()).await?;
        Ok(Metadata {
            title: heading.to_string(),
            description: content.chars().take(40).collect(),
            keypoints: vec![heading.to_string()],
        })
    }

    async fn aggregate(
        &self,
        heading: &str,
        _own_content: &str,
        children: &[Metadata],
    ) -> anyhow::Result<Metadata> {
        self.aggregates
            .lock()
            .unwrap()
            .push((heading.to_string(), children.to_vec()));
        self.enter(heading.to_string()).await?;
        Ok(Metadata {
            title: heading.to_string(),
            description: format!("Rolled up {} children", children.len()),
            keypoints: children.iter().flat_map(|m| m.keypoints.clone()).collect(),
        })
    }
}

fn leaf(heading: &str, depth: usize) -> RawSection {
    RawSection::new(heading, depth, format!("{heading} content"))
}

/// Three levels, unique headings, mixed fan-out
fn sample_tree() -> Vec<RawSection> {
    vec![
        RawSection::new("Root", 1, "root intro")
            .with_child(
                RawSection::new("A", 2, "a intro")
                    .with_child(leaf("A1", 3))
                    .with_child(leaf("A2", 3))
                    .with_child(leaf("A3", 3)),
            )
            .with_child(leaf("B", 2))
            .with_child(RawSection::new("C", 2, "").with_child(leaf("C1", 4))),
        leaf("Other", 1),
        RawSection::new("Wide", 1, "")
            .with_child(leaf("W1", 2))
            .with_child(leaf("W2", 2))
            .with_child(leaf("W3", 2))
            .with_child(leaf("W4", 2)),
    ]
}

fn strip(sections: &[AnnotatedSection]) -> Vec<RawSection> {
    sections
        .iter()
        .map(|s| RawSection {
            heading: s.heading.clone(),
            depth: s.depth,
            content: s.content.clone(),
            children: strip(&s.children),
        })
        .collect()
}

fn descendants(section: &RawSection, out: &mut Vec<String>) {
    for child in &section.children {
        out.push(child.heading.clone());
        descendants(child, out);
    }
}

fn internal_nodes<'a>(sections: &'a [RawSection], out: &mut Vec<&'a RawSection>) {
    for section in sections {
        if !section.children.is_empty() {
            out.push(section);
        }
        internal_nodes(&section.children, out);
    }
}

#[tokio::test]
async fn scenario_flat_roots_are_generated() {
    let sections = vec![
        RawSection::new("A", 1, "Alpha content"),
        RawSection::new("B", 1, "Beta content"),
    ];
    let engine = MetadataEngine::new(Tracking::default(), EngineConfig::aggregate()).unwrap();

    let out = engine.annotate(&sections).await.unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].metadata.title, "A");
    assert_eq!(out[1].metadata.title, "B");
    assert!(out.iter().all(|s| s.children.is_empty()));
    assert!(engine.provider().aggregates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scenario_parent_rolls_up_children() {
    let sections = vec![RawSection::new("Parent", 1, "Intro")
        .with_child(RawSection::new("Child1", 2, "C1"))
        .with_child(RawSection::new("Child2", 2, "C2"))];
    let engine = MetadataEngine::new(Tracking::default(), EngineConfig::aggregate()).unwrap();

    let out = engine.annotate(&sections).await.unwrap();
    assert_eq!(out[0].metadata.description, "Rolled up 2 children");
    assert_eq!(out[0].children[0].metadata.title, "Child1");
    assert_eq!(out[0].children[1].metadata.title, "Child2");
}

#[tokio::test]
async fn scenario_oversized_leaf_is_chunked_then_aggregated() {
    let content = (0..5)
        .map(|i| format!("Paragraph {i}: {}", "x".repeat(45)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let sections = vec![RawSection::new("Big", 1, content.clone())];
    let config = EngineConfig::aggregate().with_max_leaf_size(100);
    let engine = MetadataEngine::new(Tracking::default(), config).unwrap();

    let out = engine.annotate(&sections).await.unwrap();
    let provider = engine.provider();

    let generated = provider.generate_headings();
    assert!(generated.len() > 1, "expected several chunk calls: {generated:?}");
    assert!(generated.iter().all(|h| h.starts_with("Big [chunk ")));

    let aggregates = provider.aggregates.lock().unwrap().clone();
    assert_eq!(aggregates.len(), 1);
    let (heading, chunk_meta) = &aggregates[0];
    assert_eq!(heading, "Big");
    let expected_titles: Vec<String> = (1..=generated.len())
        .map(|n| format!("Big [chunk {n}]"))
        .collect();
    let titles: Vec<String> = chunk_meta.iter().map(|m| m.title.clone()).collect();
    assert_eq!(titles, expected_titles);

    // Chunks are paragraph-aligned pieces of the original content, in order.
    let mut chunks: Vec<(String, String)> = provider.generates.lock().unwrap().clone();
    chunks.sort_by(|a, b| a.0.cmp(&b.0));
    let rejoined = chunks
        .iter()
        .map(|(_, c)| c.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    assert_eq!(rejoined, content);

    assert_eq!(
        out[0].metadata.description,
        format!("Rolled up {} children", generated.len())
    );
    assert_eq!(out[0].content, content);
}

#[tokio::test]
async fn leaf_within_limit_is_generated_once() {
    let sections = vec![RawSection::new("Small", 1, "tiny")];
    let config = EngineConfig::aggregate().with_max_leaf_size(100);
    let engine = MetadataEngine::new(Tracking::default(), config).unwrap();

    engine.annotate(&sections).await.unwrap();
    assert_eq!(engine.provider().generate_headings(), vec!["Small"]);
    assert!(engine.provider().aggregates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn single_oversized_paragraph_is_one_chunk() {
    let sections = vec![RawSection::new("Wall", 1, "w".repeat(250))];
    let config = EngineConfig::aggregate().with_max_leaf_size(100);
    let engine = MetadataEngine::new(Tracking::default(), config).unwrap();

    engine.annotate(&sections).await.unwrap();
    assert_eq!(engine.provider().generate_headings(), vec!["Wall [chunk 1]"]);
    assert_eq!(engine.provider().aggregates.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn every_internal_node_aggregates_once_after_its_subtree() {
    let sections = sample_tree();
    let engine = MetadataEngine::new(Tracking::slow(3), EngineConfig::aggregate()).unwrap();
    engine.annotate(&sections).await.unwrap();

    let provider = engine.provider();
    let events = provider.events.lock().unwrap().clone();
    let position = |event: &Event| events.iter().position(|e| e == event).unwrap();

    let mut internal = Vec::new();
    internal_nodes(&sections, &mut internal);

    let aggregates = provider.aggregates.lock().unwrap().clone();
    let mut per_heading: HashMap<String, usize> = HashMap::new();
    for (heading, _) in &aggregates {
        *per_heading.entry(heading.clone()).or_default() += 1;
    }
    assert_eq!(per_heading.len(), internal.len());
    assert!(per_heading.values().all(|&n| n == 1));

    for node in internal {
        let start = position(&Event::Start(node.heading.clone()));
        let mut below = Vec::new();
        descendants(node, &mut below);
        for descendant in below {
            let end = position(&Event::End(descendant.clone()));
            assert!(
                end < start,
                "{descendant} finished after {} started aggregating",
                node.heading
            );
        }
    }
}

#[tokio::test]
async fn concurrency_bound_is_never_exceeded() {
    for limit in [1, 2, 3] {
        let config = EngineConfig::aggregate()
            .with_max_concurrency(limit)
            .with_max_leaf_size(20);
        let mut sections = sample_tree();
        sections.push(RawSection::new(
            "Chunky",
            1,
            "first paragraph\n\nsecond paragraph\n\nthird paragraph",
        ));
        let engine = MetadataEngine::new(Tracking::slow(2), config).unwrap();

        let out = engine.annotate(&sections).await.unwrap();
        assert_eq!(strip(&out), sections);
        assert!(
            engine.provider().peak() <= limit,
            "peak {} exceeded limit {limit}",
            engine.provider().peak()
        );
    }
}

#[tokio::test]
async fn unbounded_runs_siblings_concurrently() {
    let sections: Vec<RawSection> = (0..6).map(|i| leaf(&format!("S{i}"), 1)).collect();
    let engine = MetadataEngine::new(Tracking::slow(10), EngineConfig::aggregate()).unwrap();

    engine.annotate(&sections).await.unwrap();
    assert_eq!(engine.provider().peak(), 6);
}

#[tokio::test]
async fn independent_mode_respects_bound_and_never_aggregates() {
    let sections = sample_tree();
    let config = EngineConfig::independent().with_max_concurrency(2);
    let engine = MetadataEngine::new(Tracking::slow(2), config).unwrap();

    let out = engine.annotate(&sections).await.unwrap();
    let provider = engine.provider();
    assert!(provider.peak() <= 2);
    assert!(provider.aggregates.lock().unwrap().is_empty());
    assert_eq!(
        provider.generate_headings().len(),
        context_sections::count_nodes(&sections)
    );
    assert_eq!(strip(&out), sections);
    assert_eq!(out[0].metadata.title, "Root");
    assert_eq!(out[0].children[0].children[2].metadata.title, "A3");
}

#[tokio::test]
async fn independent_mode_ignores_leaf_size() {
    let sections = vec![RawSection::new("Big", 1, "one\n\ntwo\n\nthree")];
    let config = EngineConfig::independent().with_max_leaf_size(3);
    let engine = MetadataEngine::new(Tracking::default(), config).unwrap();

    engine.annotate(&sections).await.unwrap();
    assert_eq!(engine.provider().generate_headings(), vec!["Big"]);
}

#[tokio::test]
async fn provider_failure_aborts_with_original_error() {
    for config in [
        EngineConfig::aggregate().with_max_concurrency(1),
        EngineConfig::aggregate(),
        EngineConfig::independent().with_max_concurrency(1),
    ] {
        let engine = MetadataEngine::new(Tracking::failing_on("A2"), config).unwrap();
        let err = engine.annotate(&sample_tree()).await.unwrap_err();
        assert_eq!(err.to_string(), "provider failed on A2");

        let source = err.into_callback_error().expect("callback error");
        let boom = source.downcast_ref::<BoomError>().expect("original error type");
        assert_eq!(boom.0, "A2");

        // The failing subtree's parent never aggregates.
        let aggregates = engine.provider().aggregates.lock().unwrap().clone();
        assert!(aggregates.iter().all(|(h, _)| h != "A" && h != "Root"));
    }
}

#[tokio::test]
async fn document_scenarios_parse_and_annotate() {
    let engine = MetadataEngine::new(Tracking::default(), EngineConfig::aggregate()).unwrap();

    let out = engine
        .annotate_document("# Top\ntop text\n### Skipped\nskipped text")
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].heading, "Top");
    assert_eq!(out[0].depth, 1);
    assert_eq!(out[0].content, "top text");
    assert_eq!(out[0].children.len(), 1);
    assert_eq!(out[0].children[0].heading, "Skipped");
    assert_eq!(out[0].children[0].depth, 3);

    let out = engine
        .annotate_document("# Code\nbefore\n\n```sh\n# not a heading\necho hi\n```\nafter")
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].children.is_empty());
    assert!(out[0].content.contains("```sh\n# not a heading\necho hi\n```"));
}

#[test]
fn invalid_configuration_fails_before_any_call() {
    let result = MetadataEngine::new(
        Tracking::default(),
        EngineConfig::independent().with_max_concurrency(0),
    );
    assert!(matches!(result, Err(SectionsError::InvalidConfig(_))));
}

fn arb_tree() -> impl Strategy<Value = RawSection> {
    let leaf = ("[a-z]{1,6}", "[a-z ]{0,30}").prop_map(|(h, c)| RawSection::new(h, 3, c));
    leaf.prop_recursive(3, 24, 4, |inner| {
        ("[a-z]{1,6}", "[a-z ]{0,30}", prop::collection::vec(inner, 1..4)).prop_map(
            |(heading, content, children)| RawSection {
                heading,
                depth: 1,
                content,
                children,
            },
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn output_tree_is_isomorphic(
        trees in prop::collection::vec(arb_tree(), 0..4),
        limit in prop::option::of(1usize..4),
        independent in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let mut config = if independent {
            EngineConfig::independent()
        } else {
            EngineConfig::aggregate()
        };
        config.max_concurrency = limit;

        let engine = MetadataEngine::new(Tracking::default(), config).unwrap();
        let out = runtime.block_on(engine.annotate(&trees)).unwrap();
        prop_assert_eq!(strip(&out), trees.clone());

        let total = context_sections::count_nodes(&trees);
        let generated = engine.provider().generate_headings().len();
        let aggregated = engine.provider().aggregates.lock().unwrap().len();
        if independent {
            prop_assert_eq!(generated, total);
            prop_assert_eq!(aggregated, 0);
        } else {
            let mut internal = Vec::new();
            internal_nodes(&trees, &mut internal);
            prop_assert_eq!(aggregated, internal.len());
            prop_assert_eq!(generated, total - internal.len());
        }
    }
}
