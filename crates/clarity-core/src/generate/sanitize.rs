//! Reply sanitization for the checklist generator.
//!
//! Inference replies are supposed to be a bare JSON array of strings, but in
//! practice arrive wrapped in markdown code fences, annotated with `//` line
//! comments, or carrying trailing commas. The cleanup passes run in a fixed
//! order: fences, then comments, then trailing commas, then a strict JSON
//! parse. The comment and comma passes track JSON string state so a `//` or
//! `,` inside a quoted task is left alone.

use super::GenerationError;

/// Sanitize a raw inference reply and parse it into task strings.
///
/// Blank entries are dropped after trimming; an empty result maps to
/// [`GenerationError::Empty`], a non-array or non-string element to their
/// respective parse errors.
pub fn parse_reply(raw: &str) -> Result<Vec<String>, GenerationError> {
    let cleaned = strip_trailing_commas(&strip_line_comments(&strip_fences(raw)));

    let value: serde_json::Value = serde_json::from_str(cleaned.trim())
        .map_err(|e| GenerationError::Parse(e.to_string()))?;

    let serde_json::Value::Array(elements) = value else {
        return Err(GenerationError::Empty);
    };

    let mut tasks = Vec::with_capacity(elements.len());
    for element in elements {
        let serde_json::Value::String(text) = element else {
            return Err(GenerationError::Parse(format!(
                "expected a string element, got: {element}"
            )));
        };
        let text = text.trim();
        if !text.is_empty() {
            tasks.push(text.to_string());
        }
    }

    if tasks.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(tasks)
}

/// Remove markdown code-fence markers (```json and bare ```).
fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Remove `//` line comments outside of JSON strings.
fn strip_line_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        let mut in_string = false;
        let mut escaped = false;
        let mut cut = line.len();
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
            } else if b == b'"' {
                in_string = true;
            } else if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
                cut = i;
                break;
            }
            i += 1;
        }
        out.push_str(&line[..cut]);
        out.push('\n');
    }
    out
}

/// Remove commas that directly precede (modulo whitespace) a closing `]` or
/// `}`, outside of JSON strings.
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = input.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
