//! Response normalization
//!
//! The dashboard API is not uniform across resources. Accepted shapes:
//!
//! ```text
//! { "success": true, "data": [..], "pagination": { "hasMore", "currentPage", "total", "offset" } }
//! { "items": [..], "hasMore": true, "nextCursor": ".." }
//! { "data": { "items": [..], "pagination": {..} } }
//! [ .. ]
//! ```
//!
//! `{ "success": false, "message": ".." }` is an API error even under a 2xx
//! status. Any other shape is malformed; it is never read as an empty page.

use super::types::PageFetchResult;
use crate::error::{Error, Result};
use crate::types::{JsonObject, Record};
use serde_json::Value;

/// Keys that may hold the items list, in lookup order
const ITEM_KEYS: [&str; 3] = ["data", "items", "results"];

/// Keys that may hold the next-page cursor, in lookup order
const CURSOR_KEYS: [&str; 4] = ["nextCursor", "next_cursor", "cursor", "offset"];

/// Normalize a decoded response body into a page result
///
/// `limit` is the requested page size. It is used only when the body carries
/// a total and a current page but no `hasMore`. Without either signal there
/// is no next page; a bare array is always the last page.
pub fn normalize_page(body: Value, limit: u32) -> Result<PageFetchResult<Record>> {
    match body {
        Value::Array(items) => Ok(PageFetchResult::new(items, false)),
        Value::Object(obj) => normalize_envelope(obj, limit),
        other => Err(Error::malformed(format!(
            "expected an object or array, got {}",
            value_kind(&other)
        ))),
    }
}

fn normalize_envelope(mut obj: JsonObject, limit: u32) -> Result<PageFetchResult<Record>> {
    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request was not successful");
        return Err(Error::api(200, message));
    }

    let top_pagination = obj.remove("pagination");

    let (items, nested_pagination) = take_items(&mut obj)?;

    let pagination = nested_pagination
        .or(top_pagination)
        .and_then(|p| match p {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    let total_count = pagination
        .get("total")
        .or_else(|| obj.get("total"))
        .and_then(Value::as_u64);
    let reported_page = pagination
        .get("currentPage")
        .or_else(|| pagination.get("page"))
        .and_then(Value::as_u64)
        .and_then(|p| u32::try_from(p).ok());

    let explicit_has_more = pagination
        .get("hasMore")
        .or_else(|| obj.get("hasMore"))
        .and_then(Value::as_bool);

    let has_more = match (explicit_has_more, total_count, reported_page) {
        (Some(has_more), _, _) => has_more,
        (None, Some(total), Some(page)) if limit > 0 => u64::from(page) * u64::from(limit) < total,
        _ => false,
    };

    let next_cursor = CURSOR_KEYS
        .iter()
        .find_map(|key| pagination.get(*key).or_else(|| obj.get(*key)))
        .and_then(cursor_string);

    Ok(PageFetchResult {
        items,
        has_more,
        next_cursor,
        total_count,
        reported_page,
    })
}

/// Pull the items list out of an envelope
///
/// Returns the items and, for `{ data: { items, pagination } }`, the nested
/// pagination object.
fn take_items(obj: &mut JsonObject) -> Result<(Vec<Record>, Option<Value>)> {
    for key in ITEM_KEYS {
        match obj.remove(key) {
            Some(Value::Array(items)) => return Ok((items, None)),
            Some(Value::Object(mut inner)) => {
                let nested_pagination = inner.remove("pagination");
                if let Some(Value::Array(items)) = ITEM_KEYS.iter().find_map(|k| inner.remove(*k)) {
                    return Ok((items, nested_pagination));
                }
                return Err(Error::malformed(format!(
                    "'{key}' is an object without an items list"
                )));
            }
            Some(Value::Null) | None => continue,
            Some(other) => {
                return Err(Error::malformed(format!(
                    "'{key}' should be an array, got {}",
                    value_kind(&other)
                )))
            }
        }
    }

    Err(Error::malformed(
        "response has no 'data', 'items' or 'results' list",
    ))
}

/// Cursors are opaque; numeric offsets are carried as their decimal text
fn cursor_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
