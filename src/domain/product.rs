use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Image;
use crate::locale::LocalizedContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    Fruits,
    Vegetables,
    Grains,
    Spices,
    Nuts,
    Processed,
    Other,
}

impl ProductCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fruits" | "fruit" => Some(ProductCategory::Fruits),
            "vegetables" | "vegetable" => Some(ProductCategory::Vegetables),
            "grains" | "cereals" => Some(ProductCategory::Grains),
            "spices" | "spice" => Some(ProductCategory::Spices),
            "nuts" | "nut" => Some(ProductCategory::Nuts),
            "processed" => Some(ProductCategory::Processed),
            "other" => Some(ProductCategory::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Fruits => "fruits",
            ProductCategory::Vegetables => "vegetables",
            ProductCategory::Grains => "grains",
            ProductCategory::Spices => "spices",
            ProductCategory::Nuts => "nuts",
            ProductCategory::Processed => "processed",
            ProductCategory::Other => "other",
        }
    }
}

impl Default for ProductCategory {
    fn default() -> Self {
        ProductCategory::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Certification {
    Organic,
    FairTrade,
    GlobalGap,
    Haccp,
    #[serde(rename = "iso-22000")]
    Iso22000,
    Brc,
    Halal,
    Kosher,
}

impl Certification {
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "organic" | "bio" => Some(Certification::Organic),
            "fairtrade" => Some(Certification::FairTrade),
            "globalgap" => Some(Certification::GlobalGap),
            "haccp" => Some(Certification::Haccp),
            "iso22000" => Some(Certification::Iso22000),
            "brc" => Some(Certification::Brc),
            "halal" => Some(Certification::Halal),
            "kosher" => Some(Certification::Kosher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Packaging {
    Bulk,
    #[serde(rename = "bags-25kg")]
    Bags25kg,
    #[serde(rename = "bags-50kg")]
    Bags50kg,
    Cartons,
    Crates,
    #[serde(rename = "container-20ft")]
    Container20ft,
    #[serde(rename = "container-40ft")]
    Container40ft,
}

impl Packaging {
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "bulk" => Some(Packaging::Bulk),
            "bags25kg" => Some(Packaging::Bags25kg),
            "bags50kg" => Some(Packaging::Bags50kg),
            "cartons" | "carton" => Some(Packaging::Cartons),
            "crates" | "crate" => Some(Packaging::Crates),
            "container20ft" => Some(Packaging::Container20ft),
            "container40ft" => Some(Packaging::Container40ft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Backend identity. Never used in URLs; use `slug`.
    pub id: String,
    pub slug: String,
    pub name: LocalizedContent,
    pub description: LocalizedContent,
    pub category: ProductCategory,
    pub origin: Vec<String>,
    pub season: LocalizedContent,
    pub certifications: Vec<Certification>,
    pub packaging: Vec<Packaging>,
    pub images: Vec<Image>,
    /// Decorative layout data, passed through untouched.
    pub constellation: serde_json::Value,
    pub related_products: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// First image, or the placeholder when the product has none.
    pub fn primary_image(&self) -> Image {
        self.images.first().cloned().unwrap_or_else(Image::placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_parsing() {
        assert_eq!(Certification::parse("Fair Trade"), Some(Certification::FairTrade));
        assert_eq!(Certification::parse("GLOBALG.A.P."), Some(Certification::GlobalGap));
        assert_eq!(Certification::parse("GlobalGAP"), Some(Certification::GlobalGap));
        assert_eq!(Certification::parse("ISO 22000"), Some(Certification::Iso22000));
        assert_eq!(Packaging::parse("bags-25kg"), Some(Packaging::Bags25kg));
        assert_eq!(Packaging::parse("Container 40ft"), Some(Packaging::Container40ft));
        assert_eq!(Packaging::parse("pallet"), None);
        assert_eq!(ProductCategory::parse("Cereals"), Some(ProductCategory::Grains));
        assert_eq!(ProductCategory::parse("tubers"), None);
    }

    #[test]
    fn test_vocabulary_serializes_kebab_case() {
        let json = serde_json::to_string(&vec![Certification::FairTrade, Certification::Iso22000]).unwrap();
        assert_eq!(json, r#"["fair-trade","iso-22000"]"#);
        let json = serde_json::to_string(&Packaging::Bags25kg).unwrap();
        assert_eq!(json, r#""bags-25kg""#);
    }
}
