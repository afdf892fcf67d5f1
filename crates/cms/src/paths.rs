//! Dot-delimited nested-path edits over the configuration document.
//!
//! The CMS editing surface mutates arbitrarily nested fields (currency
//! rates, testimonial entries, custom-section content, FAQ items) without a
//! hand-written setter per field. Paths walk objects by field name and
//! arrays by numeric index: `"testimonials.0.name"`,
//! `"currencies.NGN.rate"`, `"customSections.heritage.imageUrl"`.
//!
//! [`set_at_path`] is a pure transform - it returns a new document and never
//! touches the input, so an outstanding reference to the previous document
//! (one still being rendered, say) can never observe the edit. Missing
//! intermediate structure is an error, not an invitation to create it:
//! silently materializing containers would mask CMS authoring bugs.

use serde_json::Value;
use thiserror::Error;

/// A path segment did not resolve against the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path {path:?}: {reason}")]
pub struct InvalidPathError {
    /// The full dot-delimited path as given.
    pub path: String,
    /// What went wrong at which segment.
    pub reason: String,
}

impl InvalidPathError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Return a copy of `document` with `value` written at `path`.
///
/// Every intermediate segment must resolve to an existing container. The
/// final segment may name a new field on an existing object (matching a
/// plain last-step assignment), but an array index must be in bounds.
///
/// # Errors
///
/// [`InvalidPathError`] if the path is empty or contains an empty segment
/// (leading, trailing, or doubled dot), an intermediate segment is missing
/// or lands on a scalar, or an array segment is not a valid index.
pub fn set_at_path(document: &Value, path: &str, value: Value) -> Result<Value, InvalidPathError> {
    let segments: Vec<&str> = path.split('.').collect();
    // An empty segment would write an empty-string key, which the document
    // schema silently drops on the next deserialize.
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(InvalidPathError::new(path, "empty path segment"));
    }
    // split('.') yields at least one segment, and the emptiness check above
    // already rejected the empty path; the fallback never materializes.
    let (last, intermediate) = segments.split_last().unwrap_or((&"", &[]));

    let mut next = document.clone();
    let mut cursor = &mut next;
    for segment in intermediate {
        cursor = descend_mut(cursor, segment, path)?;
    }

    match cursor {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
        }
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            let slot = items.get_mut(index).ok_or_else(|| {
                InvalidPathError::new(path, format!("index {index} out of bounds"))
            })?;
            *slot = value;
        }
        _ => {
            return Err(InvalidPathError::new(
                path,
                format!("segment before {last:?} is not a container"),
            ));
        }
    }

    Ok(next)
}

/// Read the value at `path`, if the whole path resolves.
#[must_use]
pub fn value_at_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cursor = document;
    for segment in path.split('.') {
        cursor = match cursor {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cursor)
}

fn descend_mut<'a>(
    cursor: &'a mut Value,
    segment: &str,
    path: &str,
) -> Result<&'a mut Value, InvalidPathError> {
    match cursor {
        Value::Object(map) => map
            .get_mut(segment)
            .ok_or_else(|| InvalidPathError::new(path, format!("missing key {segment:?}"))),
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            items
                .get_mut(index)
                .ok_or_else(|| InvalidPathError::new(path, format!("index {index} out of bounds")))
        }
        _ => Err(InvalidPathError::new(
            path,
            format!("segment {segment:?} applied to a non-container"),
        )),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize, InvalidPathError> {
    segment.parse::<usize>().map_err(|_| {
        InvalidPathError::new(path, format!("segment {segment:?} is not an array index"))
    })
}
