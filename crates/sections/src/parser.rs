//! Markdown section parsing.
//!
//! Heading detection runs on the tree-sitter-md block grammar rather than on raw lines, so
//! heading-like text inside fenced code, HTML blocks, block quotes or list items never opens a
//! section. Nesting is rebuilt from heading depths alone: the grammar's own `section` nodes are
//! only used to reach document-level headings.

use crate::error::{Result, SectionsError};
use crate::types::RawSection;
use tree_sitter::{Node, Parser};

/// A document-level heading located in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadingSpan {
    depth: usize,
    text: String,
    start_byte: usize,
    end_byte: usize,
}

/// Markdown parser producing a [`RawSection`] tree
pub struct SectionParser {
    parser: Parser,
}

impl SectionParser {
    pub fn new() -> Result<Self> {
        let language: tree_sitter::Language = tree_sitter_md::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| SectionsError::parse(format!("Failed to set markdown language: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse markdown into sections.
    ///
    /// Empty or whitespace-only input yields no sections. Text before the first heading becomes
    /// a depth-0 section with an empty heading. A heading deeper than its nearest open ancestor
    /// by more than one level nests directly under that ancestor.
    pub fn parse(&mut self, markdown: &str) -> Result<Vec<RawSection>> {
        if markdown.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tree = self
            .parser
            .parse(markdown, None)
            .ok_or_else(|| SectionsError::parse("Failed to parse markdown"))?;

        let mut headings = Vec::new();
        collect_headings(tree.root_node(), markdown, &mut headings);
        log::debug!("found {} document-level headings", headings.len());

        Ok(build_tree(markdown, &headings))
    }
}

/// Parse markdown into sections with a fresh [`SectionParser`]
pub fn parse_markdown_sections(markdown: &str) -> Result<Vec<RawSection>> {
    SectionParser::new()?.parse(markdown)
}

fn collect_headings(node: Node, source: &str, out: &mut Vec<HeadingSpan>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "section" => collect_headings(child, source, out),
            "atx_heading" | "setext_heading" => {
                if let Some(depth) = heading_depth(child) {
                    out.push(HeadingSpan {
                        depth,
                        text: heading_text(child, source),
                        start_byte: child.start_byte(),
                        end_byte: child.end_byte(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn heading_depth(node: Node) -> Option<usize> {
    let mut cursor = node.walk();
    let depth = node.children(&mut cursor).find_map(|child| match child.kind() {
        "atx_h1_marker" | "setext_h1_underline" => Some(1),
        "atx_h2_marker" | "setext_h2_underline" => Some(2),
        "atx_h3_marker" => Some(3),
        "atx_h4_marker" => Some(4),
        "atx_h5_marker" => Some(5),
        "atx_h6_marker" => Some(6),
        _ => None,
    });
    depth
}

fn heading_text(node: Node, source: &str) -> String {
    let text = node
        .child_by_field_name("heading_content")
        .map(|content| slice(source, content.start_byte(), content.end_byte()))
        .unwrap_or_default()
        .trim();
    if node.kind() == "atx_heading" {
        strip_closing_sequence(text).to_string()
    } else {
        text.to_string()
    }
}

/// Drop an ATX closing run of `#`; it only counts when preceded by whitespace or alone
fn strip_closing_sequence(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.len() == text.len() {
        return text;
    }
    if without.is_empty() {
        return without;
    }
    if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        text
    }
}

fn slice(source: &str, start: usize, end: usize) -> &str {
    source.get(start..end.min(source.len())).unwrap_or_default()
}

fn build_tree(markdown: &str, headings: &[HeadingSpan]) -> Vec<RawSection> {
    let mut roots = Vec::new();

    let first_start = headings.first().map_or(markdown.len(), |h| h.start_byte);
    let preamble = slice(markdown, 0, first_start).trim();
    if !preamble.is_empty() {
        roots.push(RawSection::new("", 0, preamble));
    }

    // Open sections, shallowest first. A section is attached to its parent when it closes,
    // which keeps siblings in document order.
    let mut stack: Vec<RawSection> = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        let next_start = headings
            .get(i + 1)
            .map_or(markdown.len(), |next| next.start_byte);
        let content = slice(markdown, heading.end_byte, next_start).trim();

        while stack.last().is_some_and(|open| open.depth >= heading.depth) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(RawSection::new(heading.text.clone(), heading.depth, content));
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

fn close_top(stack: &mut Vec<RawSection>, roots: &mut Vec<RawSection>) {
    if let Some(section) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(section),
            None => roots.push(section),
        }
    }
}
