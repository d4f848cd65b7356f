use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Image;
use crate::locale::{Locale, LocalizedContent};

/// Per-locale rich-text payload. The blocks are opaque to this crate and
/// handed to the renderer as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent(pub BTreeMap<Locale, serde_json::Value>);

impl ArticleContent {
    pub fn get(&self, locale: Locale) -> Option<&serde_json::Value> {
        self.0.get(&locale)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCategory {
    pub slug: String,
    pub name: LocalizedContent,
}

/// Who wrote an article: a member of the team, or an outside contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Author {
    Team {
        id: String,
        name: LocalizedContent,
        role: LocalizedContent,
        photo: Option<Image>,
    },
    External {
        name: String,
        role: String,
        url: Option<String>,
        photo: Option<Image>,
    },
}

impl Author {
    pub fn is_external(&self) -> bool {
        matches!(self, Author::External { .. })
    }

    pub fn display_name(&self, locale: Locale) -> &str {
        match self {
            Author::Team { name, .. } => name.get_or_fallback(locale),
            Author::External { name, .. } => name,
        }
    }

    pub fn photo(&self) -> Option<&Image> {
        match self {
            Author::Team { photo, .. } | Author::External { photo, .. } => photo.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: LocalizedContent,
    pub excerpt: LocalizedContent,
    pub content: Option<ArticleContent>,
    pub featured_image: Option<Image>,
    pub category: Option<ArticleCategory>,
    pub author: Option<Author>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection of [`Article`]: no body, list-sized image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleListItem {
    pub id: String,
    pub slug: String,
    pub title: LocalizedContent,
    pub excerpt: LocalizedContent,
    pub featured_image: Option<Image>,
    pub category: Option<ArticleCategory>,
    pub author: Option<Author>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn to_list_item(&self) -> ArticleListItem {
        ArticleListItem::from(self.clone())
    }
}

impl From<Article> for ArticleListItem {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            slug: article.slug,
            title: article.title,
            excerpt: article.excerpt,
            featured_image: article.featured_image,
            category: article.category,
            author: article.author,
            published_at: article.published_at,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

/// Newest first; ties broken by slug so the order is deterministic.
pub fn sort_newest_first(items: &mut [ArticleListItem]) {
    items.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}
