use serde::de::DeserializeOwned;

/// Result of decoding a generative-text response against a target schema.
/// Never an error: when no extraction strategy yields the schema, the raw
/// text is handed back so the caller can degrade to a literal fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    Unparsed(String),
}

impl<T> Decoded<T> {
    pub fn into_parsed(self) -> Option<T> {
        match self {
            Decoded::Parsed(value) => Some(value),
            Decoded::Unparsed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Decoded::Parsed(_))
    }
}

/// Decodes model output that may wrap JSON in prose or code fences.
/// Strategies, in order: direct parse, ```json fence, generic fence,
/// balanced-brace scan, balanced-bracket scan.
pub fn structured<T: DeserializeOwned>(raw: &str) -> Decoded<T> {
    for candidate in candidates(raw) {
        if let Ok(value) = serde_json::from_str::<T>(&candidate) {
            return Decoded::Parsed(value);
        }
    }
    Decoded::Unparsed(raw.to_string())
}

fn candidates(raw: &str) -> Vec<String> {
    let mut found = Vec::new();

    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        found.push(trimmed.to_string());
    }

    if let Some(fenced) = fenced_block(raw, "```json") {
        found.push(fenced);
    }
    if let Some(fenced) = fenced_block(raw, "```") {
        if fenced.starts_with('{') || fenced.starts_with('[') {
            found.push(fenced);
        }
    }

    if let Some(scanned) = scan_balanced(raw, '{', '}') {
        found.push(scanned.to_string());
    }
    if let Some(scanned) = scan_balanced(raw, '[', ']') {
        found.push(scanned.to_string());
    }

    found
}

fn fenced_block(raw: &str, opening: &str) -> Option<String> {
    let start = raw.find(opening)? + opening.len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    let body = rest[..end].trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

/// Extracts the first balanced `open..close` region, tracking string
/// literals and escapes so braces inside values do not confuse the depth
/// count.
fn scan_balanced(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
