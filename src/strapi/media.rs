use serde_json::Value;
use url::Url;

use crate::domain::{ImageSize, ResolvedImage};
use crate::raw::{self, Doc};

/// Strapi's generated renditions, smallest first.
const FORMATS: [&str; 4] = ["thumbnail", "small", "medium", "large"];

/// Resolves Strapi media entries to absolute URLs. Uploads on the local
/// provider come back as `/uploads/...` paths relative to the server.
#[derive(Debug, Clone)]
pub struct StrapiMediaResolver {
    base_url: Url,
}

impl StrapiMediaResolver {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn resolve(&self, media: &Value, size: ImageSize) -> Option<ResolvedImage> {
        self.resolve_doc(media.as_object()?, size)
    }

    pub fn resolve_doc(&self, doc: &Doc, size: ImageSize) -> Option<ResolvedImage> {
        let original = self.rendition(doc)?;

        if size.is_original() {
            return Some(original);
        }

        // Smallest generated format that still covers the requested width.
        let formats = doc.get("formats").and_then(Value::as_object);
        let preferred = formats.and_then(|formats| {
            FORMATS
                .iter()
                .filter_map(|name| formats.get(*name).and_then(Value::as_object))
                .filter_map(|format| self.rendition(format))
                .find(|rendition| rendition.width >= size.width && rendition.width < original.width)
        });

        Some(preferred.unwrap_or(original))
    }

    fn rendition(&self, doc: &Doc) -> Option<ResolvedImage> {
        let url = raw::opt_string(doc, "url")?;
        Some(ResolvedImage {
            url: self.absolute(&url),
            width: raw::unsigned(doc, "width"),
            height: raw::unsigned(doc, "height"),
        })
    }

    pub fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") {
            return url.to_string();
        }
        match self.base_url.join(url.trim_start_matches('/')) {
            Ok(joined) => joined.to_string(),
            Err(_) => url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> StrapiMediaResolver {
        StrapiMediaResolver::new(Url::parse("https://cms.example.com/").unwrap())
    }

    fn media() -> Value {
        json!({
            "url": "/uploads/mango_1a2b.jpg",
            "width": 2000,
            "height": 1500,
            "formats": {
                "thumbnail": {"url": "/uploads/thumbnail_mango_1a2b.jpg", "width": 208, "height": 156},
                "small": {"url": "/uploads/small_mango_1a2b.jpg", "width": 500, "height": 375},
                "medium": {"url": "/uploads/medium_mango_1a2b.jpg", "width": 750, "height": 563},
                "large": {"url": "/uploads/large_mango_1a2b.jpg", "width": 1000, "height": 750}
            }
        })
    }

    #[test]
    fn test_relative_upload_is_made_absolute() {
        let resolved = resolver().resolve(&media(), ImageSize::ORIGINAL).unwrap();
        assert_eq!(resolved.url, "https://cms.example.com/uploads/mango_1a2b.jpg");
        assert_eq!((resolved.width, resolved.height), (2000, 1500));
    }

    #[test]
    fn test_smallest_covering_format_is_preferred() {
        let card = resolver().resolve(&media(), ImageSize::CARD).unwrap();
        assert_eq!(card.url, "https://cms.example.com/uploads/large_mango_1a2b.jpg");

        let thumb = resolver().resolve(&media(), ImageSize::THUMBNAIL).unwrap();
        assert_eq!(thumb.url, "https://cms.example.com/uploads/small_mango_1a2b.jpg");

        let detail = resolver().resolve(&media(), ImageSize::DETAIL).unwrap();
        assert_eq!(detail.url, "https://cms.example.com/uploads/mango_1a2b.jpg");
    }

    #[test]
    fn test_external_urls_are_kept() {
        let resolved = resolver()
            .resolve(&json!({"url": "https://bucket.s3.amazonaws.com/okra.png"}), ImageSize::CARD)
            .unwrap();
        assert_eq!(resolved.url, "https://bucket.s3.amazonaws.com/okra.png");
    }

    #[test]
    fn test_media_without_url() {
        assert!(resolver().resolve(&json!({"width": 10}), ImageSize::CARD).is_none());
        assert!(resolver().resolve(&Value::Null, ImageSize::CARD).is_none());
    }
}
