use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::domain::{ImageSize, ResolvedImage};
use crate::error::{Error, Result};
use crate::raw;

const CDN_BASE: &str = "https://cdn.sanity.io";

/// Builds CDN URLs from Sanity asset references such as
/// `image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg`.
#[derive(Debug, Clone)]
pub struct SanityImageBuilder {
    project_id: String,
    dataset: String,
    asset_ref: Regex,
}

impl SanityImageBuilder {
    pub fn new(project_id: &str, dataset: &str) -> Result<Self> {
        let asset_ref = Regex::new(r"^image-([A-Za-z0-9]+)-(\d+)x(\d+)-([a-z0-9]+)$")
            .map_err(|e| Error::Config(format!("Failed to compile asset pattern: {}", e)))?;

        Ok(Self {
            project_id: project_id.to_string(),
            dataset: dataset.to_string(),
            asset_ref,
        })
    }

    /// Resolve an image object (`{ asset: { _ref } }`, an expanded
    /// `{ asset: { url, metadata } }`, or a bare reference string).
    pub fn resolve(&self, image: &Value, size: ImageSize) -> Option<ResolvedImage> {
        match image {
            Value::String(reference) => self.from_reference(reference, size),
            Value::Object(doc) => {
                let asset = doc.get("asset").and_then(Value::as_object).unwrap_or(doc);

                if let Some(reference) = raw::first_string(asset, &["_ref", "_id"]) {
                    if let Some(resolved) = self.from_reference(&reference, size) {
                        return Some(resolved);
                    }
                }

                let url = raw::opt_string(asset, "url")?;
                let dimensions = asset
                    .get("metadata")
                    .and_then(|m| m.get("dimensions"))
                    .and_then(Value::as_object);
                let (width, height) = dimensions
                    .map(|d| (raw::unsigned(d, "width"), raw::unsigned(d, "height")))
                    .unwrap_or((0, 0));

                Some(self.sized(&url, width, height, size))
            }
            _ => None,
        }
    }

    fn from_reference(&self, reference: &str, size: ImageSize) -> Option<ResolvedImage> {
        let captures = self.asset_ref.captures(reference.trim())?;
        let id = captures.get(1)?.as_str();
        let width: u32 = captures.get(2)?.as_str().parse().ok()?;
        let height: u32 = captures.get(3)?.as_str().parse().ok()?;
        let format = captures.get(4)?.as_str();

        let base = format!(
            "{}/images/{}/{}/{}-{}x{}.{}",
            CDN_BASE, self.project_id, self.dataset, id, width, height, format
        );
        Some(self.sized(&base, width, height, size))
    }

    fn sized(&self, base: &str, width: u32, height: u32, size: ImageSize) -> ResolvedImage {
        if size.is_original() {
            return ResolvedImage {
                url: base.to_string(),
                width,
                height,
            };
        }

        let (out_width, out_height) = scaled_dimensions(width, height, size);
        let url = match Url::parse(base) {
            Ok(mut url) => {
                {
                    let mut query = url.query_pairs_mut();
                    if size.width > 0 {
                        query.append_pair("w", &size.width.to_string());
                    }
                    if size.height > 0 {
                        query.append_pair("h", &size.height.to_string());
                    }
                    if size.width > 0 && size.height > 0 {
                        query.append_pair("fit", "crop");
                    }
                    query.append_pair("auto", "format");
                }
                url.to_string()
            }
            Err(_) => base.to_string(),
        };

        ResolvedImage {
            url,
            width: out_width,
            height: out_height,
        }
    }
}

/// Output size for a requested rendition; a single requested side keeps
/// the source aspect ratio.
fn scaled_dimensions(width: u32, height: u32, size: ImageSize) -> (u32, u32) {
    match (size.width, size.height) {
        (0, 0) => (width, height),
        (w, 0) if width > 0 => (w, scale(height, w, width)),
        (0, h) if height > 0 => (scale(width, h, height), h),
        (w, h) => (w, h),
    }
}

/// `side * target / source`, saturating at `u32::MAX`.
fn scale(side: u32, target: u32, source: u32) -> u32 {
    let scaled = u64::from(side) * u64::from(target) / u64::from(source);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> SanityImageBuilder {
        SanityImageBuilder::new("abc123", "production").unwrap()
    }

    #[test]
    fn test_reference_resolves_to_cdn_url() {
        let image = json!({"asset": {"_ref": "image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg"}});
        let resolved = builder().resolve(&image, ImageSize::ORIGINAL).unwrap();

        assert_eq!(
            resolved.url,
            "https://cdn.sanity.io/images/abc123/production/Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000.jpg"
        );
        assert_eq!((resolved.width, resolved.height), (2000, 3000));
    }

    #[test]
    fn test_crop_parameters() {
        let resolved = builder()
            .resolve(&json!("image-abc-1600x1200-png"), ImageSize::CARD)
            .unwrap();

        assert!(resolved.url.ends_with("abc-1600x1200.png?w=800&h=600&fit=crop&auto=format"));
        assert_eq!((resolved.width, resolved.height), (800, 600));
    }

    #[test]
    fn test_width_only_keeps_aspect_ratio() {
        let resolved = builder()
            .resolve(&json!("image-abc-2000x1000-webp"), ImageSize::new(500, 0))
            .unwrap();

        assert!(resolved.url.contains("w=500"));
        assert!(!resolved.url.contains("fit=crop"));
        assert_eq!((resolved.width, resolved.height), (500, 250));
    }

    #[test]
    fn test_extreme_aspect_ratio_saturates() {
        let tall = scaled_dimensions(1, u32::MAX, ImageSize::new(1600, 0));
        assert_eq!(tall, (1600, u32::MAX));

        let wide = scaled_dimensions(u32::MAX, 1, ImageSize::new(0, 900));
        assert_eq!(wide, (u32::MAX, 900));
    }

    #[test]
    fn test_expanded_asset_with_url() {
        let image = json!({
            "asset": {
                "url": "https://cdn.sanity.io/images/abc123/production/xyz-640x480.jpg",
                "metadata": {"dimensions": {"width": 640, "height": 480}}
            }
        });
        let resolved = builder().resolve(&image, ImageSize::ORIGINAL).unwrap();
        assert_eq!((resolved.width, resolved.height), (640, 480));
    }

    #[test]
    fn test_unresolvable_images() {
        assert!(builder().resolve(&json!({"asset": {"_ref": "file-abc-pdf"}}), ImageSize::ORIGINAL).is_none());
        assert!(builder().resolve(&Value::Null, ImageSize::CARD).is_none());
        assert!(builder().resolve(&json!({"alt": "no asset"}), ImageSize::CARD).is_none());
    }
}
