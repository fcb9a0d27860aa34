//! Picking the downloadable still image out of a pin.
//!
//! A pin declares several resolutions of the same picture. The selector
//! prefers the largest one whose format is a plain still image.

use crate::types::{ImageVariant, Pin};

/// Extensions accepted for download, lowercase with the leading dot.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// The variant chosen for a pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub url: String,
    /// One of [`ALLOWED_EXTENSIONS`]
    pub ext: &'static str,
}

/// Extracts the file extension from a URL, ignoring query and fragment.
///
/// The result is lowercased and includes the leading dot.
///
/// ```rust
/// use pinfetch::select::extract_extension;
///
/// assert_eq!(extract_extension("https://i.pinimg.com/originals/a/b.JPG"), Some(".jpg".to_string()));
/// assert_eq!(extract_extension("https://i.pinimg.com/a.png?v=1#x"), Some(".png".to_string()));
/// assert_eq!(extract_extension("https://i.pinimg.com/noext"), None);
/// ```
pub fn extract_extension(url: &str) -> Option<String> {
    let clean_url = url.split('?').next()?.split('#').next()?;
    let file = clean_url.rsplit('/').next()?;

    let dot_pos = file.rfind('.')?;
    let ext = &file[dot_pos..];
    if ext.len() > 1 && ext.len() <= 11 {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

/// Chooses the image to download for a pin.
///
/// Videos never yield an image. Otherwise variants carrying a URL are sorted
/// by pixel area, largest first, and the first one with an allowed extension
/// wins. Equal areas keep the variant-name order of the pin (stable sort),
/// so repeated calls on the same pin always agree.
///
/// Returns `None` when nothing acceptable is declared; callers skip such pins.
///
/// # Examples
///
/// ```rust
/// use pinfetch::select::select_downloadable_image;
/// use pinfetch::types::Pin;
///
/// let pin: Pin = serde_json::from_value(serde_json::json!({
///     "images": {
///         "orig": { "url": "https://i.pinimg.com/originals/a.gif", "width": 1200, "height": 900 },
///         "736x": { "url": "https://i.pinimg.com/736x/a.jpg", "width": 736, "height": 552 }
///     }
/// })).unwrap();
///
/// let selected = select_downloadable_image(&pin).unwrap();
/// assert_eq!(selected.url, "https://i.pinimg.com/736x/a.jpg");
/// assert_eq!(selected.ext, ".jpg");
/// ```
pub fn select_downloadable_image(pin: &Pin) -> Option<SelectedImage> {
    if pin.is_video() {
        return None;
    }

    let images = pin.images.as_ref()?;

    let mut variants: Vec<(&str, &ImageVariant)> = images
        .values()
        .flatten()
        .filter_map(|variant| variant.url.as_deref().map(|url| (url, variant)))
        .collect();
    variants.sort_by(|(_, a), (_, b)| b.area().total_cmp(&a.area()));

    variants.into_iter().find_map(|(url, _)| {
        let ext = extract_extension(url)?;
        ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == ext)
            .map(|allowed| SelectedImage {
                url: url.to_string(),
                ext: *allowed,
            })
    })
}
