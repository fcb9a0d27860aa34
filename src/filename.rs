//! Deriving filesystem-safe names for downloaded pins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Pin;

/// Longest name produced, in characters.
pub const MAX_FILENAME_CHARS: usize = 250;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[^\s#]+").expect("valid hashtag regex"));

static ILLEGAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("valid illegal-char regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Cleans free text into something usable as a file name.
///
/// Hashtags are dropped, characters illegal in file names removed,
/// whitespace runs collapsed and the result trimmed, then cut to
/// [`MAX_FILENAME_CHARS`] characters. Returns `None` if nothing is left.
///
/// Truncation counts Unicode scalar values, not grapheme clusters, so a
/// combining sequence may be split at the limit.
///
/// ```rust
/// use pinfetch::filename::sanitize_filename;
///
/// assert_eq!(
///     sanitize_filename("  Cozy  reading nook: ideas #home #decor ").as_deref(),
///     Some("Cozy reading nook ideas")
/// );
/// assert_eq!(sanitize_filename("#only #tags"), None);
/// ```
pub fn sanitize_filename(text: &str) -> Option<String> {
    let name = HASHTAG.replace_all(text, "");
    let name = ILLEGAL.replace_all(&name, "");
    let name = WHITESPACE.replace_all(&name, " ");
    let name = name.trim();

    if name.is_empty() {
        return None;
    }

    let truncated = match name.char_indices().nth(MAX_FILENAME_CHARS) {
        Some((cut, _)) => name[..cut].trim_end(),
        None => name,
    };
    Some(truncated.to_string())
}

/// Produces the display name for a pin.
///
/// The description is used when it has any non-whitespace content, then the
/// auto-generated alt text, then `fallback`. The fallback is also returned if
/// the chosen text sanitizes down to nothing.
///
/// ```rust
/// use pinfetch::filename::filename_from_pin;
/// use pinfetch::types::Pin;
///
/// let pin: Pin = serde_json::from_value(serde_json::json!({
///     "description": "   ",
///     "auto_alt_text": "a white cat on a sofa"
/// })).unwrap();
///
/// assert_eq!(filename_from_pin(&pin, "pin-1"), "a white cat on a sofa");
/// assert_eq!(filename_from_pin(&Pin::default(), "pin-1"), "pin-1");
/// ```
pub fn filename_from_pin(pin: &Pin, fallback: &str) -> String {
    let source = [&pin.description, &pin.auto_alt_text]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty());

    source
        .and_then(|text| sanitize_filename(text))
        .unwrap_or_else(|| fallback.to_string())
}
