//! Sanity backend: GROQ over the HTTP query API.

pub mod client;
pub mod image;
pub mod queries;
pub mod transform;

pub use client::SanityClient;
pub use image::SanityImageBuilder;
pub use transform::SanityTransformer;

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::cache::{CacheStats, TtlCache};
use crate::config::{HttpSettings, SanitySettings};
use crate::domain::article::sort_newest_first;
use crate::domain::team::sort_by_order;
use crate::domain::{Article, ArticleListItem, ExportStatistics, Product, TeamMember};
use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::provider::{keys, ContentProvider};

pub struct SanityProvider {
    client: SanityClient,
    transformer: SanityTransformer,
    cache: TtlCache,
}

impl SanityProvider {
    pub fn new(settings: &SanitySettings, http: &HttpSettings, ttl: Duration) -> Result<Self> {
        let project_id = required(&settings.project_id, "sanity.project_id (SANITY_PROJECT_ID)")?;
        let dataset = required(&settings.dataset, "sanity.dataset (SANITY_DATASET)")?;

        let client = SanityClient::new(project_id, dataset, settings, http)?;
        let transformer = SanityTransformer::new(SanityImageBuilder::new(project_id, dataset)?);

        Ok(Self {
            client,
            transformer,
            cache: TtlCache::new(ttl),
        })
    }

    pub fn client(&self) -> &SanityClient {
        &self.client
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Config(format!("Missing required setting {}", name)))
}

#[async_trait]
impl ContentProvider for SanityProvider {
    fn name(&self) -> &'static str {
        "sanity"
    }

    async fn get_products(&self, locale: Locale) -> Result<Vec<Product>> {
        self.cache
            .get_or_fetch(&keys::products(locale), || async move {
                let raw = self.client.query(&queries::products(), &[]).await?;
                self.transformer.products(&raw)
            })
            .await
    }

    async fn get_product_by_slug(&self, slug: &str, locale: Locale) -> Result<Option<Product>> {
        self.cache
            .get_or_fetch(&keys::product(slug, locale), || async move {
                let raw = self
                    .client
                    .query(&queries::product_by_slug(), &[("slug", json!(slug))])
                    .await?;
                self.transformer.optional_product(&raw)
            })
            .await
    }

    async fn get_all_product_slugs(&self) -> Result<Vec<String>> {
        self.cache
            .get_or_fetch(keys::PRODUCT_SLUGS, || async move {
                let raw = self.client.query(&queries::product_slugs(), &[]).await?;
                self.transformer.slugs(&raw)
            })
            .await
    }

    async fn get_articles(&self, locale: Locale, limit: Option<usize>) -> Result<Vec<ArticleListItem>> {
        self.cache
            .get_or_fetch(&keys::articles(locale, limit), || async move {
                let raw = match limit {
                    Some(limit) => {
                        self.client
                            .query(&queries::articles(true), &[("limit", json!(limit))])
                            .await?
                    }
                    None => self.client.query(&queries::articles(false), &[]).await?,
                };

                let mut items = self.transformer.article_list(&raw)?;
                sort_newest_first(&mut items);
                if let Some(limit) = limit {
                    items.truncate(limit);
                }
                Ok(items)
            })
            .await
    }

    async fn get_article_by_slug(&self, slug: &str, locale: Locale) -> Result<Option<Article>> {
        self.cache
            .get_or_fetch(&keys::article(slug, locale), || async move {
                let raw = self
                    .client
                    .query(&queries::article_by_slug(), &[("slug", json!(slug))])
                    .await?;
                self.transformer.optional_article(&raw)
            })
            .await
    }

    async fn get_all_article_slugs(&self) -> Result<Vec<String>> {
        self.cache
            .get_or_fetch(keys::ARTICLE_SLUGS, || async move {
                let raw = self.client.query(&queries::article_slugs(), &[]).await?;
                self.transformer.slugs(&raw)
            })
            .await
    }

    async fn get_team_members(&self, locale: Locale) -> Result<Vec<TeamMember>> {
        self.cache
            .get_or_fetch(&keys::team(locale), || async move {
                let raw = self.client.query(&queries::team_members(), &[]).await?;
                let mut members = self.transformer.team_members(&raw)?;
                sort_by_order(&mut members);
                Ok(members)
            })
            .await
    }

    async fn get_export_statistics(&self, locale: Locale) -> Result<Option<ExportStatistics>> {
        self.cache
            .get_or_fetch(&keys::export_statistics(locale), || async move {
                let raw = self.client.query(&queries::export_statistics(), &[]).await?;
                self.transformer.export_statistics(&raw)
            })
            .await
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }

    fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
