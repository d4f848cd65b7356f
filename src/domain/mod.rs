pub mod article;
pub mod product;
pub mod statistics;
pub mod team;

pub use article::{Article, ArticleCategory, ArticleContent, ArticleListItem, Author};
pub use product::{Certification, Packaging, Product, ProductCategory};
pub use statistics::{
    ExportKpis, ExportRegion, ExportStatistics, MonthlyVolume, ProductMixEntry, RegionExports,
    TopDestination,
};
pub use team::TeamMember;

use serde::{Deserialize, Serialize};

use crate::locale::LocalizedContent;

/// Served in place of any image the backend does not provide.
pub const PLACEHOLDER_IMAGE_URL: &str = "/images/placeholder.jpg";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt: LocalizedContent,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn placeholder() -> Self {
        Self {
            url: PLACEHOLDER_IMAGE_URL.to_string(),
            alt: LocalizedContent::default(),
            width: 0,
            height: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.url == PLACEHOLDER_IMAGE_URL
    }
}

/// A backend image reference after resolution: where to fetch it and its
/// rendered size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Requested rendition of an image. Zero means "leave to the backend".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const ORIGINAL: ImageSize = ImageSize { width: 0, height: 0 };
    pub const CARD: ImageSize = ImageSize { width: 800, height: 600 };
    pub const DETAIL: ImageSize = ImageSize { width: 1600, height: 0 };
    pub const THUMBNAIL: ImageSize = ImageSize { width: 400, height: 400 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_original(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}
