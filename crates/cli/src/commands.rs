use crate::{AnnotateArgs, EngineArgs, IngestArgs, ParseArgs};
use anyhow::{Context, Result};
use context_ingest::{parse_markdown, IngestConfig, Ingester};
use context_sections::{ExtractiveProvider, MetadataEngine, SectionParser};
use serde::Serialize;
use std::fs;
use std::path::Path;

fn read_markdown(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_markdown(&raw))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Apply command-line engine overrides on top of the loaded config
fn apply_engine_args(config: &mut IngestConfig, args: &EngineArgs) {
    if let Some(mode) = args.mode {
        config.engine.mode = mode.as_domain();
    }
    if let Some(size) = args.max_leaf_size {
        config.engine.max_leaf_size = Some(size);
    }
    if let Some(limit) = args.concurrency {
        config.engine.max_concurrency = Some(limit);
    }
}

pub(crate) fn run_parse(args: &ParseArgs) -> Result<()> {
    let content = read_markdown(&args.file)?;
    let sections = SectionParser::new()?.parse(&content)?;
    log::debug!(
        "Parsed {} top-level sections from {}",
        sections.len(),
        args.file.display()
    );
    print_json(&sections)
}

pub(crate) async fn run_annotate(args: AnnotateArgs, mut config: IngestConfig) -> Result<()> {
    apply_engine_args(&mut config, &args.engine);
    let content = read_markdown(&args.file)?;

    let provider = ExtractiveProvider::new(config.provider.clone());
    let engine = MetadataEngine::new(provider, config.engine)?;
    let sections = engine.annotate_document(&content).await?;
    print_json(&sections)
}

pub(crate) async fn run_ingest(args: IngestArgs, mut config: IngestConfig) -> Result<()> {
    apply_engine_args(&mut config, &args.engine);
    if let Some(parallel) = args.parallel {
        config.max_parallel_files = parallel;
    }

    let provider = ExtractiveProvider::new(config.provider.clone());
    let mut ingester = Ingester::new(provider, &config)?;
    for file in &args.files {
        ingester.file(file)?;
    }

    let sources = ingester.run().await;

    let output_dir = match (args.output_dir, args.write) {
        (Some(dir), _) => Some(dir),
        (None, true) => Some(config.output_dir.clone()),
        (None, false) => None,
    };
    if let Some(dir) = output_dir {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for source in &sources {
            let path = dir.join(format!("{}.json", source.id()));
            fs::write(&path, serde_json::to_string_pretty(source)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        log::info!("Wrote {} sources to {}", sources.len(), dir.display());
    }

    print_json(&sources)
}
