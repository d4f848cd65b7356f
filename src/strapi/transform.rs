//! Strapi entries to domain entities.
//!
//! Entries arrive already flattened by the client. Localized fields are
//! either JSON components keyed by locale, snake_case siblings
//! (`name_fr`), or a single-language text field.

use serde_json::Value;
use tracing::{debug, warn};

use super::media::StrapiMediaResolver;
use crate::domain::{
    Article, ArticleCategory, ArticleContent, ArticleListItem, Author, Certification, ExportKpis,
    ExportRegion, ExportStatistics, Image, ImageSize, MonthlyVolume, Packaging, Product,
    ProductCategory, ProductMixEntry, RegionExports, TeamMember, TopDestination,
};
use crate::error::{Error, Result};
use crate::locale::{localized, localized_values, LocaleShape, SuffixStyle};
use crate::raw::{self, objects, skip_invalid, vocabulary, Doc};

const STYLE: SuffixStyle = SuffixStyle::Snake;

#[derive(Debug, Clone)]
pub struct StrapiTransformer {
    media: StrapiMediaResolver,
}

impl StrapiTransformer {
    pub fn new(media: StrapiMediaResolver) -> Self {
        Self { media }
    }

    pub fn products(&self, raw: &Value) -> Result<Vec<Product>> {
        Ok(raw::array(raw, "products")?
            .iter()
            .filter_map(|item| skip_invalid(self.product(item), "product"))
            .collect())
    }

    /// A slug filter matching nothing comes back as an empty list.
    pub fn optional_product(&self, raw: &Value) -> Result<Option<Product>> {
        match first_entry(raw, "product")? {
            Some(entry) => self.product(entry).map(Some),
            None => Ok(None),
        }
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
            Some(Value::Object(single)) => vec![self.image_doc(single, ImageSize::DETAIL)],
            Some(value) => raw::array(value, "product images")?
                .iter()
                .map(|image| self.image(image, ImageSize::DETAIL))
                .collect(),
            None => Vec::new(),
        };

        let related_products = objects(doc, "related_products")?
            .filter_map(|related| raw::opt_string(related, "slug"))
            .collect();

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
            related_products,
            created_at: raw::timestamp_or_epoch(doc, "createdAt"),
            updated_at: raw::timestamp_or_epoch(doc, "updatedAt"),
            id,
            slug,
        })
    }

    pub fn slugs(&self, raw: &Value) -> Result<Vec<String>> {
        Ok(raw::array(raw, "slugs")?
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|entry| raw::opt_string(entry, "slug"))
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
        match first_entry(raw, "article")? {
            Some(entry) => self.article(entry).map(Some),
            None => Ok(None),
        }
    }

    pub fn article(&self, raw: &Value) -> Result<Article> {
        self.article_with(raw, ImageSize::DETAIL)
    }

    fn article_with(&self, raw: &Value, image_size: ImageSize) -> Result<Article> {
        let doc = raw::object(raw, "article")?;
        let (id, slug) = identity(doc, "article")?;
        let created_at = raw::timestamp_or_epoch(doc, "createdAt");

        let content = localized_values(doc, "content", STYLE);

        Ok(Article {
            title: localized(doc, "title", STYLE),
            excerpt: localized(doc, "excerpt", STYLE),
            content: if content.is_empty() {
                None
            } else {
                Some(ArticleContent(content))
            },
            featured_image: self.optional_image(doc.get("featured_image"), image_size),
            category: doc.get("category").and_then(Value::as_object).and_then(|category| {
                let slug = raw::opt_string(category, "slug")?;
                Some(ArticleCategory {
                    slug,
                    name: localized(category, "name", STYLE),
                })
            }),
            author: self.author(doc.get("author")),
            published_at: raw::timestamp(doc, "published_date")
                .or_else(|| raw::timestamp(doc, "publishedAt"))
                .unwrap_or(created_at),
            created_at,
            updated_at: raw::timestamp_or_epoch(doc, "updatedAt"),
            id,
            slug,
        })
    }

    /// Resolve the author component (`author_type` tagged) or a legacy
    /// relation straight to a team member.
    pub fn author(&self, raw: Option<&Value>) -> Option<Author> {
        let doc = raw?.as_object()?;

        match doc.get("author_type").and_then(Value::as_str) {
            Some("external") => {
                let name = raw::string(doc, "external_name");
                if name.is_empty() {
                    warn!("External author without a name; dropping author");
                    return None;
                }
                Some(Author::External {
                    name,
                    role: raw::string(doc, "external_role"),
                    url: raw::opt_string(doc, "external_url"),
                    photo: self.optional_image(doc.get("external_photo"), ImageSize::THUMBNAIL),
                })
            }
            Some(_) => doc
                .get("team_member")
                .and_then(Value::as_object)
                .map(|member| self.team_author(member)),
            None => Some(self.team_author(doc)),
        }
    }

    fn team_author(&self, member: &Doc) -> Author {
        Author::Team {
            id: entry_id(member).unwrap_or_default(),
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
        let id = entry_id(doc)
            .ok_or_else(|| Error::InvalidResponse("Team member without id".to_string()))?;

        Ok(TeamMember {
            id,
            name: localized(doc, "name", STYLE),
            role: localized(doc, "role", STYLE),
            bio: localized(doc, "bio", STYLE),
            photo: self.optional_image(doc.get("photo"), ImageSize::THUMBNAIL),
            is_ceo: raw::boolean(doc, "is_ceo"),
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
                countries_served: raw::unsigned(kpis, "countries_served"),
                producer_partners: raw::unsigned(kpis, "producer_partners"),
                years_active: raw::unsigned(kpis, "years_active"),
                traced_lots_percentage: raw::number(kpis, "traced_lots_percentage"),
            },
            None => ExportKpis::default(),
        };

        let exports_by_region = objects(doc, "exports_by_region")?
            .map(|entry| RegionExports {
                region: ExportRegion::parse(&raw::string(entry, "region")),
                percentage: raw::number(entry, "percentage"),
                countries: raw::string_list(entry, "countries"),
            })
            .collect();

        let top_destinations = objects(doc, "top_destinations")?
            .map(|entry| TopDestination {
                country: localized(entry, "country", STYLE),
                code: raw::string(entry, "code").to_ascii_uppercase(),
                percentage: raw::number(entry, "percentage"),
                port: raw::opt_string(entry, "port"),
            })
            .collect();

        let monthly_volumes = objects(doc, "monthly_volumes")?
            .map(|entry| MonthlyVolume {
                month: raw::month(entry, "month"),
                year: raw::integer(entry, "year") as i32,
                volume: raw::number(entry, "volume"),
            })
            .collect();

        let product_mix = objects(doc, "product_mix")?
            .map(|entry| {
                // `product` is either the display name or a relation.
                let relation = entry.get("product").and_then(Value::as_object);
                let product = match (LocaleShape::detect(entry, "name", STYLE), relation) {
                    (LocaleShape::Missing, Some(related)) => localized(related, "name", STYLE),
                    (LocaleShape::Missing, None) => localized(entry, "product", STYLE),
                    (shape, _) => shape.into_content(),
                };
                let slug = raw::opt_string(entry, "slug")
                    .or_else(|| relation.and_then(|related| raw::opt_string(related, "slug")))
                    .unwrap_or_default();

                ProductMixEntry {
                    product,
                    slug,
                    volume: raw::number(entry, "volume"),
                    percentage: raw::number(entry, "percentage"),
                    color: raw::string(entry, "color"),
                }
            })
            .collect();

        Ok(Some(ExportStatistics {
            last_updated: raw::timestamp(doc, "last_updated")
                .unwrap_or_else(|| raw::timestamp_or_epoch(doc, "updatedAt")),
            kpis,
            exports_by_region,
            top_destinations,
            monthly_volumes,
            product_mix,
        }))
    }

    fn image(&self, raw: &Value, size: ImageSize) -> Image {
        match raw.as_object() {
            Some(doc) => self.image_doc(doc, size),
            None => Image::placeholder(),
        }
    }

    fn image_doc(&self, doc: &Doc, size: ImageSize) -> Image {
        let alt = match LocaleShape::detect(doc, "alternativeText", STYLE) {
            LocaleShape::Missing => localized(doc, "caption", STYLE),
            shape => shape.into_content(),
        };

        match self.media.resolve_doc(doc, size) {
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
        match raw? {
            Value::Null => None,
            // A multiple-media field used where one image is expected.
            Value::Array(items) => items.first().map(|image| self.image(image, size)),
            image => Some(self.image(image, size)),
        }
    }
}

/// v5 `documentId`, else the numeric v4 `id`.
fn entry_id(doc: &Doc) -> Option<String> {
    raw::first_string(doc, &["documentId", "id"])
}

fn identity(doc: &Doc, what: &str) -> Result<(String, String)> {
    let id = entry_id(doc).ok_or_else(|| Error::InvalidResponse(format!("{} without id", what)))?;
    let slug = raw::opt_string(doc, "slug")
        .ok_or_else(|| Error::InvalidResponse(format!("{} {} without slug", what, id)))?;
    Ok((id, slug))
}

fn first_entry<'a>(raw: &'a Value, what: &str) -> Result<Option<&'a Value>> {
    match raw {
        Value::Object(_) => Ok(Some(raw)),
        other => Ok(raw::array(other, what)?.first()),
    }
}

fn category_value(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(value) => Some(value.clone()),
        Value::Object(doc) => raw::first_string(doc, &["slug", "value", "name"]),
        _ => None,
    }
}
