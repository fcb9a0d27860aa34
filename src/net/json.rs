//! Dot-path helpers for reading Pinterest resource responses.
//!
//! Every resource endpoint wraps its payload in the same envelope:
//!
//! ```json
//! { "resource_response": { "status": "success", "data": ..., "bookmark": "..." } }
//! ```
//!
//! Any level may be missing or `null`, so the helpers return `Option` or an
//! empty default instead of failing.
//!
//! # Examples
//!
//! ```rust
//! use pinfetch::net::json;
//! use serde_json::json;
//!
//! let body = json!({
//!     "resource_response": {
//!         "data": { "id": "5551", "name": "Garden" },
//!         "bookmark": "Y2JV"
//!     }
//! });
//!
//! assert_eq!(json::extract_str(&body, "resource_response.data.name"), Some("Garden".to_string()));
//! assert_eq!(json::extract_str(&body, "resource_response.bookmark"), Some("Y2JV".to_string()));
//! ```

use serde_json::Value;

/// Extracts a value from nested JSON using dot notation.
///
/// Returns `None` if any segment of the path is missing.
///
/// ```rust
/// use pinfetch::net::json;
/// use serde_json::json;
///
/// let data = json!({ "a": { "b": 1 } });
/// assert_eq!(json::extract_path(&data, "a.b"), Some(&json!(1)));
/// assert_eq!(json::extract_path(&data, "a.c"), None);
/// ```
pub fn extract_path<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;

    for key in path.split('.') {
        current = current.get(key)?;
    }

    Some(current)
}

/// Extracts a non-empty scalar at `path` as text.
///
/// Strings are returned as-is, numbers are rendered, and `null`, `false`,
/// empty strings, objects and arrays all count as absent.
pub fn extract_str(json: &Value, path: &str) -> Option<String> {
    match extract_path(json, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts an array at `path`, or an empty vector if there is none.
pub fn extract_array(json: &Value, path: &str) -> Vec<Value> {
    extract_path(json, path)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
}
