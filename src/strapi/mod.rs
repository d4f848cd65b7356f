//! Strapi backend: REST collection routes under `/api`.

pub mod client;
pub mod media;
pub mod queries;
pub mod transform;

pub use client::StrapiClient;
pub use media::StrapiMediaResolver;
pub use transform::StrapiTransformer;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheStats, TtlCache};
use crate::config::{HttpSettings, StrapiSettings};
use crate::domain::article::sort_newest_first;
use crate::domain::team::sort_by_order;
use crate::domain::{Article, ArticleListItem, ExportStatistics, Product, TeamMember};
use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::provider::{keys, ContentProvider};

pub struct StrapiProvider {
    client: StrapiClient,
    transformer: StrapiTransformer,
    cache: TtlCache,
}

impl StrapiProvider {
    pub fn new(settings: &StrapiSettings, http: &HttpSettings, ttl: Duration) -> Result<Self> {
        let url = settings
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Config("Missing required setting strapi.url (STRAPI_URL)".to_string()))?;

        let client = StrapiClient::new(url, settings.token.clone(), http)?;
        let transformer =
            StrapiTransformer::new(StrapiMediaResolver::new(client.base_url().clone()));

        Ok(Self {
            client,
            transformer,
            cache: TtlCache::new(ttl),
        })
    }

    pub fn client(&self) -> &StrapiClient {
        &self.client
    }
}

#[async_trait]
impl ContentProvider for StrapiProvider {
    fn name(&self) -> &'static str {
        "strapi"
    }

    async fn get_products(&self, locale: Locale) -> Result<Vec<Product>> {
        self.cache
            .get_or_fetch(&keys::products(locale), || async move {
                let raw = self.client.get_all(queries::PRODUCTS, &queries::products()).await?;
                self.transformer.products(&raw)
            })
            .await
    }

    async fn get_product_by_slug(&self, slug: &str, locale: Locale) -> Result<Option<Product>> {
        self.cache
            .get_or_fetch(&keys::product(slug, locale), || async move {
                let raw = self
                    .client
                    .get(queries::PRODUCTS, &queries::product_by_slug(slug))
                    .await?;
                self.transformer.optional_product(&raw)
            })
            .await
    }

    async fn get_all_product_slugs(&self) -> Result<Vec<String>> {
        self.cache
            .get_or_fetch(keys::PRODUCT_SLUGS, || async move {
                let raw = self.client.get_all(queries::PRODUCTS, &queries::slugs()).await?;
                self.transformer.slugs(&raw)
            })
            .await
    }

    async fn get_articles(&self, locale: Locale, limit: Option<usize>) -> Result<Vec<ArticleListItem>> {
        self.cache
            .get_or_fetch(&keys::articles(locale, limit), || async move {
                let params = queries::articles();
                let raw = match limit {
                    Some(limit) => self.client.get_first(queries::ARTICLES, &params, limit).await?,
                    None => self.client.get_all(queries::ARTICLES, &params).await?,
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
                    .get(queries::ARTICLES, &queries::article_by_slug(slug))
                    .await?;
                self.transformer.optional_article(&raw)
            })
            .await
    }

    async fn get_all_article_slugs(&self) -> Result<Vec<String>> {
        self.cache
            .get_or_fetch(keys::ARTICLE_SLUGS, || async move {
                let raw = self
                    .client
                    .get_all(queries::ARTICLES, &queries::article_slugs())
                    .await?;
                self.transformer.slugs(&raw)
            })
            .await
    }

    async fn get_team_members(&self, locale: Locale) -> Result<Vec<TeamMember>> {
        self.cache
            .get_or_fetch(&keys::team(locale), || async move {
                let raw = self
                    .client
                    .get_all(queries::TEAM_MEMBERS, &queries::team_members())
                    .await?;
                let mut members = self.transformer.team_members(&raw)?;
                sort_by_order(&mut members);
                Ok(members)
            })
            .await
    }

    async fn get_export_statistics(&self, locale: Locale) -> Result<Option<ExportStatistics>> {
        self.cache
            .get_or_fetch(&keys::export_statistics(locale), || async move {
                // An unpublished single type answers 404.
                let raw = match self
                    .client
                    .get(queries::EXPORT_STATISTICS, &queries::export_statistics())
                    .await
                {
                    Ok(raw) => raw,
                    Err(err) if err.is_not_found() => {
                        debug!("No export statistics published: {}", err);
                        Value::Null
                    }
                    Err(err) => return Err(err),
                };
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
