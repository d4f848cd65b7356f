//! The content-provider contract shared by every CMS backend.

pub mod factory;

pub use factory::create_provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cache::CacheStats;
use crate::domain::{Article, ArticleListItem, ExportStatistics, Product, ProductCategory, TeamMember};
use crate::error::{Error, Result};
use crate::locale::Locale;

/// Which CMS backend serves content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Sanity,
    Strapi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Sanity => "sanity",
            ProviderKind::Strapi => "strapi",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sanity" => Ok(ProviderKind::Sanity),
            "strapi" => Ok(ProviderKind::Strapi),
            other => Err(Error::Config(format!("Unknown content provider: {}", other))),
        }
    }
}

/// Read access to site content, independent of the backend serving it.
///
/// Lookups by slug return `Ok(None)` when nothing matches; errors are
/// reserved for the backend failing. Every successful result is served from
/// the provider's own cache when fresh, and from its last good value when a
/// refresh fails.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    async fn get_products(&self, locale: Locale) -> Result<Vec<Product>>;

    async fn get_product_by_slug(&self, slug: &str, locale: Locale) -> Result<Option<Product>>;

    /// Every published product slug. Identical for all locales.
    async fn get_all_product_slugs(&self) -> Result<Vec<String>>;

    /// Newest first, at most `limit` items.
    async fn get_articles(&self, locale: Locale, limit: Option<usize>) -> Result<Vec<ArticleListItem>>;

    async fn get_article_by_slug(&self, slug: &str, locale: Locale) -> Result<Option<Article>>;

    async fn get_all_article_slugs(&self) -> Result<Vec<String>>;

    /// Ascending display order.
    async fn get_team_members(&self, locale: Locale) -> Result<Vec<TeamMember>>;

    /// The published export snapshot, if there is one.
    async fn get_export_statistics(&self, locale: Locale) -> Result<Option<ExportStatistics>>;

    async fn get_products_by_category(
        &self,
        category: ProductCategory,
        locale: Locale,
    ) -> Result<Vec<Product>> {
        let products = self.get_products(locale).await?;
        Ok(products
            .into_iter()
            .filter(|product| product.category == category)
            .collect())
    }

    /// Products listed as related to `slug`, in the order the product lists
    /// them. Unknown slugs are skipped.
    async fn get_related_products(&self, slug: &str, locale: Locale) -> Result<Vec<Product>> {
        let Some(product) = self.get_product_by_slug(slug, locale).await? else {
            return Ok(Vec::new());
        };
        if product.related_products.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self.get_products(locale).await?;
        Ok(product
            .related_products
            .iter()
            .filter(|related| related.as_str() != slug)
            .filter_map(|related| catalog.iter().find(|p| &p.slug == related).cloned())
            .collect())
    }

    /// Drop every cached entry. Does not refetch.
    fn clear_cache(&self);

    fn cache_stats(&self) -> CacheStats;
}

/// Cache key helpers shared by the backends.
pub(crate) mod keys {
    use crate::locale::Locale;

    pub const PRODUCT_SLUGS: &str = "product-slugs";
    pub const ARTICLE_SLUGS: &str = "article-slugs";

    pub fn products(locale: Locale) -> String {
        format!("products:{}", locale)
    }

    pub fn product(slug: &str, locale: Locale) -> String {
        format!("product:{}:{}", locale, slug)
    }

    pub fn articles(locale: Locale, limit: Option<usize>) -> String {
        match limit {
            Some(limit) => format!("articles:{}:{}", locale, limit),
            None => format!("articles:{}:all", locale),
        }
    }

    pub fn article(slug: &str, locale: Locale) -> String {
        format!("article:{}:{}", locale, slug)
    }

    pub fn team(locale: Locale) -> String {
        format!("team:{}", locale)
    }

    pub fn export_statistics(locale: Locale) -> String {
        format!("export-statistics:{}", locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Sanity".parse::<ProviderKind>().unwrap(), ProviderKind::Sanity);
        assert_eq!(" strapi ".parse::<ProviderKind>().unwrap(), ProviderKind::Strapi);
        assert!("contentful".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::default(), ProviderKind::Sanity);
    }

    #[test]
    fn test_slug_keys_ignore_locale() {
        assert_eq!(keys::PRODUCT_SLUGS, "product-slugs");
        assert_ne!(keys::product("mango", Locale::Fr), keys::product("mango", Locale::En));
        assert_ne!(keys::articles(Locale::Fr, Some(3)), keys::articles(Locale::Fr, None));
    }
}
