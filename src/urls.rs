//! Image URL construction. Pure string formatting, no I/O.

use crate::{Error, Result};
use reqwest::Url;

/// Normalize an image type to a dotted extension. `.JPG` and `.PNG` are
/// lower-cased; every other extension passes through unchanged.
pub fn normalize_image_type(image_type: &str) -> String {
    if image_type.is_empty() {
        return String::new();
    }

    let dotted = if image_type.starts_with('.') {
        image_type.to_string()
    } else {
        format!(".{}", image_type)
    };

    match dotted.as_str() {
        ".JPG" => ".jpg".to_string(),
        ".PNG" => ".png".to_string(),
        _ => dotted,
    }
}

/// Rewrite the uppercase dimension separator, `100X100` -> `100x100`.
pub fn normalize_scale(scale: &str) -> String {
    if scale.contains('X') {
        scale.replace('X', "x")
    } else {
        scale.to_string()
    }
}

/// `{id}[_{scale}]{ext}`, the last path segment of an image; the scale is
/// left out when empty.
pub fn image_file_name(image_id: &str, image_type: &str, scale: Option<&str>) -> String {
    let ext = normalize_image_type(image_type);
    match scale.filter(|s| !s.is_empty()) {
        Some(scale) => format!("{}_{}{}", image_id, normalize_scale(scale), ext),
        None => format!("{}{}", image_id, ext),
    }
}

/// `{base}/image/{id}[_{scale}]{ext}` as a plain string, id left as given.
pub fn image_path(base: &str, image_id: &str, image_type: &str, scale: Option<&str>) -> String {
    format!(
        "{}/image/{}",
        base,
        image_file_name(image_id, image_type, scale)
    )
}

/// Request URL for downloading an image. The file name is pushed as a single
/// percent-encoded path segment, so ids containing `#`, `?`, `/` or `%` reach
/// the server intact.
pub fn download_url(
    base: &str,
    image_id: &str,
    image_type: &str,
    scale: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| Error::Unavailable(format!("invalid image service url {}: {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| Error::Unavailable(format!("image service url {} cannot be a base", base)))?
        .pop_if_empty()
        .push("image")
        .push(&image_file_name(image_id, image_type, scale));

    Ok(url)
}

pub fn upload_url(base: &str) -> String {
    format!("{}/uploadImage", base)
}

pub fn delete_url(base: &str) -> String {
    format!("{}/deleteImage", base)
}
