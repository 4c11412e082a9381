//! Content sniffing to recover a downloaded body's true extension.
//!
//! Comic CDNs routinely serve JPEG data from URLs ending in `.png`, or from
//! URLs with no extension at all. The extension is therefore decided from the
//! body's leading bytes, using a cascade where the first match wins:
//!
//! 1. markup signature (`<html`, `<head`, `<body`, `<!`) → `html`
//! 2. XML declaration → `xml`
//! 3. image signature → defer to step 4 (a bare "image" is not an extension)
//! 4. image decoder format detection → that decoder's canonical extension
//! 5. extension of the source URL's path (may be empty)
//!
//! # Example
//!
//! ```
//! use grabbag_core::content::{Strategy, classify};
//!
//! let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
//! let result = classify(png, "/chapter/1/page.bin");
//! assert_eq!(result.extension, "png");
//! assert_eq!(result.strategy, Strategy::ImageDecoder);
//! ```

use image::ImageFormat;
use tracing::debug;

/// Coarse category from a body's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    /// HTML document.
    Markup,
    /// XML document.
    Xml,
    /// Some raster image format.
    Image,
    /// Recognised signature that is neither markup nor image.
    Other,
    /// No known signature.
    Unknown,
}

/// Which cascade step produced the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Markup signature.
    Markup,
    /// XML declaration.
    Xml,
    /// An image decoder recognised the data.
    ImageDecoder,
    /// Extension taken from the URL path.
    UrlPath,
}

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Extension without leading dot; empty when nothing matched.
    pub extension: String,
    /// Step that decided the extension.
    pub strategy: Strategy,
}

/// Guesses a MIME type from leading bytes.
///
/// Recognises the same signatures a JDK `URLConnection` would, plus WebP.
/// Leading ASCII whitespace is skipped before markup checks.
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

    if bytes.starts_with(&[0xCA, 0xFE, 0xBA, 0xBE]) {
        return Some("application/java-vm");
    }
    if bytes.starts_with(&[0xAC, 0xED]) {
        return Some("application/x-java-serialized-object");
    }

    let text = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = trim_ascii_start(text);
    if text.starts_with(b"<") {
        if is_markup(text) {
            return Some("text/html");
        }
        if text.starts_with(b"<?xml") {
            return Some("application/xml");
        }
    }
    if is_utf16_xml(bytes) {
        return Some("application/xml");
    }

    if bytes.starts_with(b"GIF8") {
        return Some("image/gif");
    }
    if bytes.starts_with(b"#def") {
        return Some("image/x-bitmap");
    }
    if bytes.starts_with(b"! XPM2") {
        return Some("image/x-pixmap");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        match bytes.get(3) {
            Some(0xE0 | 0xEE | 0xDB) => return Some("image/jpeg"),
            Some(0xE1) if bytes.get(6..11) == Some(&b"Exif\0"[..]) => return Some("image/jpeg"),
            _ => {}
        }
    }
    if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("image/tiff");
    }
    if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]) {
        return Some("image/webp");
    }
    if bytes.starts_with(b".snd") || bytes.starts_with(b"dns.") {
        return Some("audio/basic");
    }
    if bytes.starts_with(b"RIFF") {
        return Some("audio/x-wav");
    }
    None
}

/// Maps leading bytes onto a [`Sniffed`] category.
#[must_use]
pub fn sniff(bytes: &[u8]) -> Sniffed {
    match sniff_mime(bytes) {
        Some("text/html") => Sniffed::Markup,
        Some("application/xml") => Sniffed::Xml,
        Some(mime) if mime.starts_with("image") => Sniffed::Image,
        Some(_) => Sniffed::Other,
        None => Sniffed::Unknown,
    }
}

/// Runs the full cascade on in-memory bytes.
///
/// `url_path` is only consulted when neither a signature nor an image decoder
/// decides.
#[must_use]
pub fn classify(first_bytes: &[u8], url_path: &str) -> Classification {
    decide(sniff(first_bytes), || image_extension(first_bytes), url_path)
}

/// Combines a sniff result with image format detection and the URL fallback.
///
/// `detect_image` only runs for [`Sniffed::Image`].
pub fn decide<F>(sniffed: Sniffed, detect_image: F, url_path: &str) -> Classification
where
    F: FnOnce() -> Option<&'static str>,
{
    let decided = match sniffed {
        Sniffed::Markup => Some(("html".to_string(), Strategy::Markup)),
        Sniffed::Xml => Some(("xml".to_string(), Strategy::Xml)),
        Sniffed::Image => detect_image().map(|ext| (ext.to_string(), Strategy::ImageDecoder)),
        Sniffed::Other | Sniffed::Unknown => None,
    };
    let (extension, strategy) =
        decided.unwrap_or_else(|| (extension_from_url_path(url_path), Strategy::UrlPath));
    debug!(?sniffed, extension = %extension, ?strategy, "classified content");
    Classification {
        extension,
        strategy,
    }
}

/// Asks the image decoders whether they recognise `bytes`.
#[must_use]
pub fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().and_then(canonical_extension)
}

/// Canonical extension of a format whose decoder is compiled in.
fn canonical_extension(format: ImageFormat) -> Option<&'static str> {
    if !format.reading_enabled() {
        return None;
    }
    format.extensions_str().first().copied()
}

/// Extension of the last path segment, case preserved; empty when there is none.
#[must_use]
pub fn extension_from_url_path(path: &str) -> String {
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rfind('.') {
        Some(dot) => last_segment[dot + 1..].to_string(),
        None => String::new(),
    }
}

fn is_markup(text: &[u8]) -> bool {
    const TAGS: [&[u8]; 3] = [b"<html", b"<head", b"<body"];
    if text.starts_with(b"<!") {
        return true;
    }
    TAGS.iter().any(|tag| {
        text.len() >= tag.len() && text[..tag.len()].eq_ignore_ascii_case(tag)
    })
}

fn is_utf16_xml(bytes: &[u8]) -> bool {
    const BE: &[u8] = &[0xFE, 0xFF, 0x00, b'<', 0x00, b'?', 0x00, b'x'];
    const LE: &[u8] = &[0xFF, 0xFE, b'<', 0x00, b'?', 0x00, b'x', 0x00];
    bytes.starts_with(BE) || bytes.starts_with(LE)
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";
    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0\x01\x01\0\0\x01\0\x01\0\0";
    const GIF: &[u8] = b"GIF89a\x01\0\x01\0\x80\0\0";
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 \x18\0\0\0";

    // ==================== Sniffing Tests ====================

    #[test]
    fn test_sniff_html_variants() {
        assert_eq!(sniff(b"<html><body>"), Sniffed::Markup);
        assert_eq!(sniff(b"<HTML>"), Sniffed::Markup);
        assert_eq!(sniff(b"<!DOCTYPE html>"), Sniffed::Markup);
        assert_eq!(sniff(b"\n  <head><title>"), Sniffed::Markup);
        assert_eq!(sniff(b"\xEF\xBB\xBF<body>"), Sniffed::Markup);
    }

    #[test]
    fn test_sniff_xml_declaration() {
        assert_eq!(sniff(b"<?xml version=\"1.0\"?><rss>"), Sniffed::Xml);
        assert_eq!(sniff(b"\xFE\xFF\0<\0?\0x\0m\0l"), Sniffed::Xml);
    }

    #[test]
    fn test_sniff_images() {
        assert_eq!(sniff_mime(PNG), Some("image/png"));
        assert_eq!(sniff_mime(JPEG), Some("image/jpeg"));
        assert_eq!(sniff_mime(GIF), Some("image/gif"));
        assert_eq!(sniff_mime(WEBP), Some("image/webp"));
        assert_eq!(sniff(b"MM\0*\0\0\0\x08"), Sniffed::Image);
    }

    #[test]
    fn test_sniff_exif_jpeg() {
        let exif = b"\xFF\xD8\xFF\xE1\x00\x16Exif\0\0MM";
        assert_eq!(sniff_mime(exif), Some("image/jpeg"));
    }

    #[test]
    fn test_sniff_wav_is_other() {
        assert_eq!(sniff(b"RIFF\x24\0\0\0WAVEfmt "), Sniffed::Other);
    }

    #[test]
    fn test_sniff_unknown_and_empty() {
        assert_eq!(sniff(b"\x00\x01\x02\x03"), Sniffed::Unknown);
        assert_eq!(sniff(b""), Sniffed::Unknown);
        assert_eq!(sniff(b"<div>"), Sniffed::Unknown);
    }

    // ==================== Cascade Tests ====================

    #[test]
    fn test_classify_png_signature_yields_png() {
        let result = classify(PNG, "/a/b/page");
        assert_eq!(result.extension, "png");
        assert_eq!(result.strategy, Strategy::ImageDecoder);
    }

    #[test]
    fn test_classify_jpeg_served_as_png_yields_jpg() {
        let result = classify(JPEG, "/images/001.png");
        assert_eq!(result.extension, "jpg");
    }

    #[test]
    fn test_classify_html_yields_html() {
        let result = classify(b"<html><head></head>", "/chapter/1.jpg");
        assert_eq!(result.extension, "html");
        assert_eq!(result.strategy, Strategy::Markup);
    }

    #[test]
    fn test_classify_xml_yields_xml() {
        let result = classify(b"<?xml version=\"1.0\"?>", "/feed");
        assert_eq!(result.extension, "xml");
    }

    #[test]
    fn test_classify_unknown_blob_falls_back_to_url() {
        let result = classify(b"\x00\x13\x37junk", "/files/foo.bin");
        assert_eq!(result.extension, "bin");
        assert_eq!(result.strategy, Strategy::UrlPath);
    }

    #[test]
    fn test_classify_image_without_decoder_falls_back_to_url() {
        let result = classify(b"#define x_width 1", "/icons/star.xbm");
        assert_eq!(result.extension, "xbm");
        assert_eq!(result.strategy, Strategy::UrlPath);
    }

    #[test]
    fn test_classify_no_signature_no_extension_is_empty() {
        let result = classify(b"plain", "/download");
        assert_eq!(result.extension, "");
    }

    #[test]
    fn test_decide_only_consults_decoders_for_images() {
        let result = decide(Sniffed::Markup, || panic!("decoders must not run"), "/x");
        assert_eq!(result.extension, "html");
    }

    // ==================== URL Path Tests ====================

    #[test]
    fn test_extension_from_url_path() {
        assert_eq!(extension_from_url_path("/ost/Track%2001.MP3"), "MP3");
        assert_eq!(extension_from_url_path("/foo.BIN"), "BIN");
        assert_eq!(extension_from_url_path("/a.b/c"), "");
        assert_eq!(extension_from_url_path(""), "");
        assert_eq!(extension_from_url_path("/archive.tar.gz"), "gz");
    }

    #[test]
    fn test_image_extension_from_bytes() {
        assert_eq!(image_extension(GIF), Some("gif"));
        assert_eq!(image_extension(b"not an image"), None);
    }
}
