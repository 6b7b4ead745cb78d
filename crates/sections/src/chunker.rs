use regex::Regex;
use std::sync::OnceLock;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\n[ \t\r]*\n(?:[ \t\r]*\n)*").expect("paragraph break regex is valid")
    })
}

/// Size of a piece of content as seen by the leaf-size threshold and the chunker
#[must_use]
pub fn content_size(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into paragraph-aligned chunks of at most `max_size` characters.
///
/// Paragraphs are packed greedily and re-joined with a blank line, whose two characters count
/// toward the size. A paragraph that alone exceeds `max_size` becomes its own chunk; paragraphs
/// are never split internally.
#[must_use]
pub fn chunk_content(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_size = 0;

    for paragraph in paragraph_break().split(text) {
        if paragraph.is_empty() {
            continue;
        }
        let size = content_size(paragraph);

        if current.is_empty() {
            current.push_str(paragraph);
            current_size = size;
            continue;
        }

        let joined = current_size + PARAGRAPH_SEPARATOR.len() + size;
        if joined <= max_size {
            current.push_str(PARAGRAPH_SEPARATOR);
            current.push_str(paragraph);
            current_size = joined;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(paragraph);
            current_size = size;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
