//! Sanity documents to domain entities.
//!
//! Sanity records store localized text as `localeString` objects
//! (`{ "fr": .., "en": .. }`), as camelCase sibling fields (`nameFr`), or,
//! for records created before the site went multilingual, as a bare string.

use serde_json::Value;
use tracing::{debug, warn};

use super::image::SanityImageBuilder;
use crate::domain::{
    Article, ArticleCategory, ArticleContent, ArticleListItem, Author, Certification, ExportKpis,
    ExportRegion, ExportStatistics, Image, ImageSize, MonthlyVolume, Packaging, Product,
    ProductCategory, ProductMixEntry, RegionExports, TeamMember, TopDestination,
};
use crate::error::{Error, Result};
use crate::locale::{localized, localized_values, LocaleShape, SuffixStyle};
use crate::raw::{self, objects, skip_invalid, vocabulary, Doc};

const STYLE: SuffixStyle = SuffixStyle::Camel;

#[derive(Debug, Clone)]
pub struct SanityTransformer {
    images: SanityImageBuilder,
}

impl SanityTransformer {
    pub fn new(images: SanityImageBuilder) -> Self {
        Self { images }
    }

    pub fn products(&self, raw: &Value) -> Result<Vec<Product>> {
        Ok(raw::array(raw, "products")?
            .iter()
            .filter_map(|item| skip_invalid(self.product(item), "product"))
            .collect())
    }

    /// `null` means the slug matched nothing.
    pub fn optional_product(&self, raw: &Value) -> Result<Option<Product>> {
        if raw.is_null() {
            return Ok(None);
        }
        self.product(raw).map(Some)
    }

    pub fn product(&self, raw: &Value) -> Result<Product> {
        let doc = raw::object(raw, "product")?;
        let (id, slug) = identity(doc, "product")?;

        let category = match category_value(doc.get("category")) {
            Some(value) => ProductCategory::parse(&value).unwrap_or_else(|| {
                debug!("Unknown product category {} on {}", value, slug);
                ProductCategory::Other
            }),
            None => ProductCategory::Other,
        };

        let images = match doc.get("images") {
            Some(value) => raw::array(value, "product images")?
                .iter()
                .map(|image| self.image(image, ImageSize::DETAIL))
                .collect(),
            None => Vec::new(),
        };

        Ok(Product {
            name: localized(doc, "name", STYLE),
            description: localized(doc, "description", STYLE),
            season: match LocaleShape::detect(doc, "season", STYLE) {
                LocaleShape::Missing => localized(doc, "availability", STYLE),
                shape => shape.into_content(),
            },
            category,
            origin: raw::string_list(doc, "origin"),
            certifications: vocabulary(doc, "certifications", Certification::parse),
            packaging: vocabulary(doc, "packaging", Packaging::parse),
            images,
            constellation: doc.get("constellation").cloned().unwrap_or(Value::Null),
            related_products: raw::string_list(doc, "relatedProducts"),
            created_at: raw::timestamp_or_epoch(doc, "_createdAt"),
            updated_at: raw::timestamp_or_epoch(doc, "_updatedAt"),
            id,
            slug,
        })
    }

    pub fn slugs(&self, raw: &Value) -> Result<Vec<String>> {
        Ok(raw::array(raw, "slugs")?
            .iter()
            .filter_map(|slug| slug.as_str())
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn article_list(&self, raw: &Value) -> Result<Vec<ArticleListItem>> {
        Ok(raw::array(raw, "articles")?
            .iter()
            .filter_map(|item| skip_invalid(self.article_with(item, ImageSize::CARD), "article"))
            .map(ArticleListItem::from)
            .collect())
    }

    pub fn optional_article(&self, raw: &Value) -> Result<Option<Article>> {
        if raw.is_null() {
            return Ok(None);
        }
        self.article(raw).map(Some)
    }

    pub fn article(&self, raw: &Value) -> Result<Article> {
        self.article_with(raw, ImageSize::DETAIL)
    }

    fn article_with(&self, raw: &Value, image_size: ImageSize) -> Result<Article> {
        let doc = raw::object(raw, "article")?;
        let (id, slug) = identity(doc, "article")?;
        let created_at = raw::timestamp_or_epoch(doc, "_createdAt");

        Ok(Article {
            title: localized(doc, "title", STYLE),
            excerpt: localized(doc, "excerpt", STYLE),
            content: rich_text(doc, "content"),
            featured_image: doc
                .get("featuredImage")
                .filter(|image| !image.is_null())
                .map(|image| self.image(image, image_size)),
            category: doc.get("category").and_then(Value::as_object).and_then(|category| {
                let slug = slug_of(category)?;
                let name = match LocaleShape::detect(category, "name", STYLE) {
                    LocaleShape::Missing => localized(category, "title", STYLE),
                    shape => shape.into_content(),
                };
                Some(ArticleCategory { slug, name })
            }),
            author: self.author(doc.get("author")),
            published_at: raw::timestamp(doc, "publishedAt").unwrap_or(created_at),
            created_at,
            updated_at: raw::timestamp_or_epoch(doc, "_updatedAt"),
            id,
            slug,
        })
    }

    /// Resolve the three stored author shapes: absent, tagged
    /// (`authorType`), or a legacy team-member reference with no tag.
    pub fn author(&self, raw: Option<&Value>) -> Option<Author> {
        let doc = raw?.as_object()?;

        match doc.get("authorType").and_then(Value::as_str) {
            Some("external") => {
                let name = raw::string(doc, "externalName");
                if name.is_empty() {
                    warn!("External author without a name; dropping author");
                    return None;
                }
                Some(Author::External {
                    name,
                    role: raw::string(doc, "externalRole"),
                    url: raw::opt_string(doc, "externalUrl"),
                    photo: doc
                        .get("externalPhoto")
                        .filter(|photo| !photo.is_null())
                        .map(|photo| self.image(photo, ImageSize::THUMBNAIL)),
                })
            }
            Some(_) => doc
                .get("teamMember")
                .and_then(Value::as_object)
                .map(|member| self.team_author(member)),
            None => Some(self.team_author(doc)),
        }
    }

    fn team_author(&self, member: &Doc) -> Author {
        Author::Team {
            id: raw::string(member, "_id"),
            name: localized(member, "name", STYLE),
            role: localized(member, "role", STYLE),
            photo: self.optional_image(member.get("photo"), ImageSize::THUMBNAIL),
        }
    }

    pub fn team_members(&self, raw: &Value) -> Result<Vec<TeamMember>> {
        Ok(raw::array(raw, "team members")?
            .iter()
            .filter_map(|item| skip_invalid(self.team_member(item), "team member"))
            .collect())
    }

    pub fn team_member(&self, raw: &Value) -> Result<TeamMember> {
        let doc = raw::object(raw, "team member")?;
        let id = raw::opt_string(doc, "_id")
            .ok_or_else(|| Error::InvalidResponse("Team member without _id".to_string()))?;

        Ok(TeamMember {
            id,
            name: localized(doc, "name", STYLE),
            role: localized(doc, "role", STYLE),
            bio: localized(doc, "bio", STYLE),
            photo: self.optional_image(doc.get("photo"), ImageSize::THUMBNAIL),
            is_ceo: raw::boolean(doc, "isCEO"),
            order: raw::integer(doc, "order"),
            email: raw::opt_string(doc, "email"),
            linkedin: raw::opt_string(doc, "linkedin"),
        })
    }

    pub fn export_statistics(&self, raw: &Value) -> Result<Option<ExportStatistics>> {
        if raw.is_null() {
            return Ok(None);
        }
        let doc = raw::object(raw, "export statistics")?;

        let kpis = match doc.get("kpis").and_then(Value::as_object) {
            Some(kpis) => ExportKpis {
                tonnage: raw::number(kpis, "tonnage"),
                countries_served: raw::unsigned(kpis, "countriesServed"),
                producer_partners: raw::unsigned(kpis, "producerPartners"),
                years_active: raw::unsigned(kpis, "yearsActive"),
                traced_lots_percentage: raw::number(kpis, "tracedLotsPercentage"),
            },
            None => ExportKpis::default(),
        };

        let exports_by_region = objects(doc, "exportsByRegion")?
            .map(|entry| RegionExports {
                region: ExportRegion::parse(&raw::string(entry, "region")),
                percentage: raw::number(entry, "percentage"),
                countries: raw::string_list(entry, "countries"),
            })
            .collect();

        let top_destinations = objects(doc, "topDestinations")?
            .map(|entry| TopDestination {
                country: localized(entry, "country", STYLE),
                code: raw::string(entry, "code").to_ascii_uppercase(),
                percentage: raw::number(entry, "percentage"),
                port: raw::opt_string(entry, "port"),
            })
            .collect();

        let monthly_volumes = objects(doc, "monthlyVolumes")?
            .map(|entry| MonthlyVolume {
                month: raw::month(entry, "month"),
                year: raw::integer(entry, "year") as i32,
                volume: raw::number(entry, "volume"),
            })
            .collect();

        let product_mix = objects(doc, "productMix")?
            .map(|entry| ProductMixEntry {
                product: match LocaleShape::detect(entry, "name", STYLE) {
                    LocaleShape::Missing => localized(entry, "product", STYLE),
                    shape => shape.into_content(),
                },
                slug: raw::string(entry, "slug"),
                volume: raw::number(entry, "volume"),
                percentage: raw::number(entry, "percentage"),
                color: raw::string(entry, "color"),
            })
            .collect();

        Ok(Some(ExportStatistics {
            last_updated: raw::timestamp(doc, "lastUpdated")
                .unwrap_or_else(|| raw::timestamp_or_epoch(doc, "_updatedAt")),
            kpis,
            exports_by_region,
            top_destinations,
            monthly_volumes,
            product_mix,
        }))
    }

    fn image(&self, raw: &Value, size: ImageSize) -> Image {
        let alt = raw
            .as_object()
            .map(|doc| localized(doc, "alt", STYLE))
            .unwrap_or_default();

        match self.images.resolve(raw, size) {
            Some(resolved) => Image {
                url: resolved.url,
                alt,
                width: resolved.width,
                height: resolved.height,
            },
            None => Image {
                alt,
                ..Image::placeholder()
            },
        }
    }

    fn optional_image(&self, raw: Option<&Value>, size: ImageSize) -> Option<Image> {
        raw.filter(|image| !image.is_null())
            .map(|image| self.image(image, size))
    }
}

/// Per-locale Portable Text blocks.
fn rich_text(doc: &Doc, field: &str) -> Option<ArticleContent> {
    let blocks = localized_values(doc, field, STYLE);
    if blocks.is_empty() {
        None
    } else {
        Some(ArticleContent(blocks))
    }
}

fn identity(doc: &Doc, what: &str) -> Result<(String, String)> {
    let id = raw::opt_string(doc, "_id")
        .ok_or_else(|| Error::InvalidResponse(format!("{} without _id", what)))?;
    let slug = slug_of(doc)
        .ok_or_else(|| Error::InvalidResponse(format!("{} {} without slug", what, id)))?;
    Ok((id, slug))
}

/// `slug` projected as a string, or the raw `{ current }` object.
fn slug_of(doc: &Doc) -> Option<String> {
    match doc.get("slug")? {
        Value::String(slug) if !slug.is_empty() => Some(slug.clone()),
        Value::Object(slug) => raw::opt_string(slug, "current"),
        _ => None,
    }
}

fn category_value(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(value) => Some(value.clone()),
        Value::Object(doc) => slug_of(doc).or_else(|| raw::opt_string(doc, "value")),
        _ => None,
    }
}
