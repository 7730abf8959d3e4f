//! Lenient parsing of categorization responses
//!
//! Completion text is rarely clean JSON. Parsing goes through three stages:
//! - strip a surrounding code fence, if any
//! - cut the text at the point where the first top-level object closes
//! - parse; on failure, fall back to a pattern match on the fence-stripped text
//!
//! Individual entries are then read field by field so that one malformed link
//! or category never invalidates its siblings.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_IMPORTANCE: u8 = 3;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("response has no categories")]
    NoCategories,
}

/// A category as proposed by the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryEntry {
    /// Missing names are filled in by the tree builder
    pub name: Option<String>,
    pub description: Option<String>,
    pub links: Vec<LinkEntry>,
    pub subcategories: Vec<CategoryEntry>,
}

/// A link as proposed by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub url: String,
    pub text: String,
    pub importance: u8,
}

/// Removes a ```json (or bare ```) fence around the payload
pub fn strip_code_fences(text: &str) -> &str {
    let inner = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text.trim();
    };

    match inner.split_once("```") {
        Some((body, _)) => body.trim(),
        None => inner.trim(),
    }
}

/// Truncates text just after the first top-level `{...}` closes
///
/// Braces inside string literals are ignored. Text with no balanced object is
/// returned from the first `{` onward; text with no `{` is returned unchanged.
pub fn truncate_to_balanced_object(text: &str) -> &str {
    let Some(start) = text.find('{') else {
        return text;
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return &text[start..end];
                }
            }
            _ => {}
        }
    }

    &text[start..]
}

/// Parses a completion into categories
pub fn parse_categorization(text: &str) -> Result<Vec<CategoryEntry>, ResponseError> {
    let stripped = strip_code_fences(text);
    let value = parse_json_object(stripped)?;

    let categories = value
        .get("categories")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(category_from_value)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if categories.is_empty() {
        return Err(ResponseError::NoCategories);
    }

    Ok(categories)
}

fn parse_json_object(stripped: &str) -> Result<Value, ResponseError> {
    let truncated = truncate_to_balanced_object(stripped);
    match serde_json::from_str::<Value>(truncated) {
        Ok(value) if value.is_object() => Ok(value),
        first_attempt => {
            tracing::debug!("Direct JSON parse failed, trying pattern extraction");
            let pattern = Regex::new(r#"(?s)(\{.*"categories"\s*:\s*\[.*?\]\s*\})"#)?;
            let Some(found) = pattern.captures(stripped).and_then(|c| c.get(1)) else {
                return match first_attempt {
                    Err(e) => Err(ResponseError::Json(e)),
                    Ok(_) => Err(ResponseError::NoJson),
                };
            };
            let value: Value = serde_json::from_str(found.as_str())?;
            if value.is_object() {
                Ok(value)
            } else {
                Err(ResponseError::NoJson)
            }
        }
    }
}

fn category_from_value(value: &Value) -> Option<CategoryEntry> {
    let object = value.as_object()?;
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let links = object
        .get("links")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(link_from_value).collect())
        .unwrap_or_default();

    let subcategories = object
        .get("subcategories")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(category_from_value).collect())
        .unwrap_or_default();

    Some(CategoryEntry {
        name,
        description,
        links,
        subcategories,
    })
}

fn link_from_value(value: &Value) -> Option<LinkEntry> {
    let object = value.as_object()?;
    let url = object
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())?
        .to_string();

    let text = object
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Some(LinkEntry {
        url,
        text,
        importance: importance_from_value(object.get("importance")),
    })
}

/// Reads an importance score, clamping to 1..=5 and defaulting to 3
pub fn importance_from_value(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(score) if score.is_finite() => score.round().clamp(1.0, 5.0) as u8,
        _ => DEFAULT_IMPORTANCE,
    }
}
