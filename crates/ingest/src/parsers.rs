/// Normalize plain text: trim and convert CRLF line endings
#[must_use]
pub fn parse_text(content: &str) -> String {
    content.trim().replace("\r\n", "\n")
}

/// Markdown keeps its markup; structure comes from the section parser
#[must_use]
pub fn parse_markdown(content: &str) -> String {
    parse_text(content)
}

/// Render CSV rows as `header: value` pairs.
///
/// The first line is the header. Missing trailing values render empty and quoted fields may
/// contain commas. Input with fewer than two lines has no rows.
#[must_use]
pub fn parse_csv(content: &str) -> Vec<String> {
    let normalized = parse_text(content);
    let lines: Vec<&str> = normalized.split('\n').collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers = parse_line(lines[0]);
    lines[1..]
        .iter()
        .map(|line| {
            let values = parse_line(line);
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    format!("{header}: {}", values.get(i).map_or("", String::as_str))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect()
}

fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    fields
}
