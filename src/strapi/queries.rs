//! Routes and query strings for the Strapi REST API. Drafts are never
//! served: `publicationState=live` is the default and is sent explicitly.

pub const PRODUCTS: &str = "products";
pub const ARTICLES: &str = "articles";
pub const TEAM_MEMBERS: &str = "team-members";
pub const EXPORT_STATISTICS: &str = "export-statistic";

type Params = Vec<(String, String)>;

fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn live() -> (String, String) {
    param("publicationState", "live")
}

fn slug_filter(slug: &str) -> (String, String) {
    param("filters[slug][$eq]", slug)
}

fn product_populate() -> Params {
    vec![
        param("populate[images]", "*"),
        param("populate[category]", "*"),
        param("populate[related_products][fields][0]", "slug"),
    ]
}

fn article_populate() -> Params {
    vec![
        param("populate[featured_image]", "*"),
        param("populate[category]", "*"),
        param("populate[author][populate]", "*"),
    ]
}

pub fn products() -> Params {
    let mut params = vec![live(), param("sort[0]", "order:asc"), param("sort[1]", "createdAt:asc")];
    params.extend(product_populate());
    params
}

pub fn product_by_slug(slug: &str) -> Params {
    let mut params = vec![live(), slug_filter(slug)];
    params.extend(product_populate());
    params
}

pub fn slugs() -> Params {
    vec![live(), param("fields[0]", "slug"), param("sort[0]", "slug:asc")]
}

/// Newest first. Paging is left to the client.
pub fn articles() -> Params {
    let mut params = vec![live(), param("sort[0]", "publishedAt:desc"), param("sort[1]", "slug:asc")];
    params.extend(article_populate());
    params
}

pub fn article_by_slug(slug: &str) -> Params {
    let mut params = vec![live(), slug_filter(slug)];
    params.extend(article_populate());
    params
}

pub fn article_slugs() -> Params {
    vec![live(), param("fields[0]", "slug"), param("sort[0]", "publishedAt:desc")]
}

pub fn team_members() -> Params {
    vec![live(), param("sort[0]", "order:asc"), param("populate[photo]", "*")]
}

pub fn export_statistics() -> Params {
    vec![param("populate", "*")]
}
