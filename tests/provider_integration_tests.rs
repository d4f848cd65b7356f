use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use agro_content::config::{HttpSettings, SanitySettings, StrapiSettings};
use agro_content::domain::{Author, Certification, ProductCategory};
use agro_content::sanity::SanityProvider;
use agro_content::strapi::StrapiProvider;
use agro_content::{ContentProvider, Error, Locale};
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use test_data::*;

const SANITY_QUERY_PATH: &str = "/v2024-01-01/data/query/production";

/// Matches a GROQ request whose `query` parameter contains `fragment`.
struct GroqContains(&'static str);

impl Match for GroqContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "query" && value.contains(self.0))
    }
}

/// Collects formatted log lines written while it is the default subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn json_body(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "application/json")
}

fn sanity_provider(server: &MockServer, ttl: Duration) -> SanityProvider {
    let settings = SanitySettings {
        project_id: Some("abc123".to_string()),
        dataset: Some("production".to_string()),
        api_host: Some(server.uri()),
        ..SanitySettings::default()
    };
    SanityProvider::new(&settings, &HttpSettings::default(), ttl).unwrap()
}

fn strapi_provider(server: &MockServer, ttl: Duration) -> StrapiProvider {
    let settings = StrapiSettings {
        url: Some(server.uri()),
        token: Some("strapi-token".to_string()),
    };
    StrapiProvider::new(&settings, &HttpSettings::default(), ttl).unwrap()
}

#[tokio::test]
async fn test_sanity_products_are_normalized_and_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(GroqContains(r#"_type == "product" && defined(slug.current)"#))
        .respond_with(json_body(SANITY_PRODUCTS))
        .expect(1)
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let products = provider.get_products(Locale::Fr).await.unwrap();
    // The record without a slug is skipped, not fatal.
    assert_eq!(products.len(), 2);

    let mango = &products[0];
    assert_eq!(mango.slug, "mango-kent");
    assert_eq!(mango.name.ru, "Манго Кент");
    assert_eq!(mango.description.ru, "");
    assert_eq!(mango.category, ProductCategory::Fruits);
    assert_eq!(mango.certifications, vec![Certification::GlobalGap, Certification::Organic]);
    assert!(mango.images[0]
        .url
        .starts_with("https://cdn.sanity.io/images/abc123/production/Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x1500.jpg"));

    let cashew = &products[1];
    assert_eq!(cashew.name.fr, "Noix de cajou W320");
    assert_eq!(cashew.name.en, "Cashew nuts W320");
    assert!(cashew.primary_image().is_placeholder());

    let again = provider.get_products(Locale::Fr).await.unwrap();
    assert_eq!(again, products);
    assert_eq!(provider.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_slug_enumeration_shares_one_cache_entry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(GroqContains(".slug.current"))
        .respond_with(json_body(SANITY_PRODUCT_SLUGS))
        .expect(1)
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let first = provider.get_all_product_slugs().await.unwrap();
    let second = provider.get_all_product_slugs().await.unwrap();

    assert_eq!(first, vec!["cashew-w320", "mango-kent", "sesame"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_slug_is_none_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"does-not-exist\""))
        .respond_with(json_body(SANITY_NULL_RESULT))
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    assert!(provider
        .get_product_by_slug("does-not-exist", Locale::En)
        .await
        .unwrap()
        .is_none());
    assert!(provider
        .get_article_by_slug("does-not-exist", Locale::En)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_backend_failures_map_to_taxonomy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"forbidden\""))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"down\""))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"garbled\""))
        .respond_with(json_body("{\"result\": "))
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let err = provider.get_product_by_slug("forbidden", Locale::Fr).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let err = provider.get_product_by_slug("down", Locale::Fr).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert!(err.is_temporary());

    let err = provider.get_product_by_slug("garbled", Locale::Fr).await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn test_stale_value_served_when_refresh_fails() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(GroqContains(r#"_type == "teamMember""#))
        .respond_with(json_body(SANITY_TEAM))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Every entry is expired as soon as it is written.
    let provider = sanity_provider(&server, Duration::ZERO);

    let fresh = provider.get_team_members(Locale::Fr).await.unwrap();
    let stale = provider.get_team_members(Locale::Fr).await.unwrap();
    assert_eq!(fresh, stale);

    let stats = provider.cache_stats();
    assert_eq!(stats.fetch_errors, 1);
    assert_eq!(stats.stale_hits, 1);

    let logged = logs.contents();
    assert!(logged.contains("WARN"));
    assert!(logged.contains("Serving stale cache entry team:fr"));
    assert!(logged.contains("UNKNOWN"));

    // Nothing cached for another locale, so the failure surfaces.
    let err = provider.get_team_members(Locale::En).await.unwrap_err();
    assert!(matches!(err, Error::Unknown(_)));
}

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(GroqContains(r#"_type == "article" && defined(slug.current)"#))
        .respond_with(json_body(SANITY_ARTICLE_SLUGS))
        .expect(2)
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    provider.get_all_article_slugs().await.unwrap();
    provider.get_all_article_slugs().await.unwrap();
    provider.clear_cache();
    assert_eq!(provider.cache_stats().total_entries, 0);
    provider.get_all_article_slugs().await.unwrap();
}

#[tokio::test]
async fn test_sanity_author_variants() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"guest-column\""))
        .respond_with(json_body(SANITY_ARTICLE_EXTERNAL_AUTHOR))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"first-shipment\""))
        .respond_with(json_body(SANITY_ARTICLE_LEGACY_AUTHOR))
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let guest = provider
        .get_article_by_slug("guest-column", Locale::En)
        .await
        .unwrap()
        .unwrap();
    let author = guest.author.unwrap();
    assert!(author.is_external());
    assert_eq!(author.display_name(Locale::En), "Jane Doe");
    assert_eq!(guest.excerpt.fr, "Un point de vue extérieur");
    assert_eq!(guest.excerpt.en, "");
    assert!(guest.content.unwrap().get(Locale::Fr).is_some());

    let legacy = provider
        .get_article_by_slug("first-shipment", Locale::Fr)
        .await
        .unwrap()
        .unwrap();
    match legacy.author.unwrap() {
        Author::Team { id, name, role, .. } => {
            assert_eq!(id, "tm-ceo");
            assert_eq!(name.fr, "Awa Diop");
            assert_eq!(role.en, "CEO");
        }
        other => panic!("Expected team author, got {:?}", other),
    }
    // No publishedAt: falls back to creation time.
    assert_eq!(legacy.published_at, legacy.created_at);
}

#[tokio::test]
async fn test_articles_newest_first_with_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$limit", "2"))
        .respond_with(json_body(SANITY_ARTICLES))
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let articles = provider.get_articles(Locale::Fr, Some(2)).await.unwrap();
    let slugs: Vec<_> = articles.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["newest", "middle"]);
}

#[tokio::test]
async fn test_team_is_sorted_by_display_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(GroqContains(r#"_type == "teamMember""#))
        .respond_with(json_body(SANITY_TEAM))
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let team = provider.get_team_members(Locale::En).await.unwrap();
    let order: Vec<_> = team.iter().map(|m| m.order).collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert!(team[0].is_ceo);
    assert_eq!(team[1].email.as_deref(), Some("fatou@example.com"));
    assert_eq!(team[2].name.fr, "Moussa Ndiaye");
    assert_eq!(team[2].role.fr, "Logistique");
}

#[tokio::test]
async fn test_related_products_follow_the_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(query_param("$slug", "\"mango-kent\""))
        .respond_with(json_body(SANITY_PRODUCT_MANGO))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SANITY_QUERY_PATH))
        .and(GroqContains(r#"_type == "product" && defined(slug.current)"#))
        .respond_with(json_body(SANITY_PRODUCTS))
        .mount(&server)
        .await;

    let provider = sanity_provider(&server, Duration::from_secs(3600));

    let related = provider
        .get_related_products("mango-kent", Locale::Fr)
        .await
        .unwrap();
    let slugs: Vec<_> = related.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["cashew-w320"]);
}

#[tokio::test]
async fn test_strapi_products_flatten_and_resolve_media() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("pagination[page]", "1"))
        .respond_with(json_body(STRAPI_PRODUCTS))
        .expect(1)
        .mount(&server)
        .await;

    let provider = strapi_provider(&server, Duration::from_secs(60));

    let products = provider.get_products(Locale::En).await.unwrap();
    assert_eq!(products.len(), 1);

    let mango = &products[0];
    assert_eq!(mango.id, "1");
    assert_eq!(mango.name.en, "Kent Mango");
    assert_eq!(mango.category, ProductCategory::Fruits);
    assert_eq!(mango.images[0].url, format!("{}/uploads/mango.jpg", server.uri()));
    assert_eq!(mango.images[0].alt.fr, "Mangues");
    assert!(mango.related_products.is_empty());

    let fruits = provider
        .get_products_by_category(ProductCategory::Fruits, Locale::En)
        .await
        .unwrap();
    assert_eq!(fruits.len(), 1);
    let nuts = provider
        .get_products_by_category(ProductCategory::Nuts, Locale::En)
        .await
        .unwrap();
    assert!(nuts.is_empty());
}

#[tokio::test]
async fn test_strapi_not_found_cases() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("filters[slug][$eq]", "unknown"))
        .respond_with(json_body(STRAPI_EMPTY_LIST))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/export-statistic"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = strapi_provider(&server, Duration::from_secs(60));

    assert!(provider
        .get_product_by_slug("unknown", Locale::Fr)
        .await
        .unwrap()
        .is_none());
    assert!(provider
        .get_export_statistics(Locale::Fr)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_strapi_article_with_team_author() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("filters[slug][$eq]", "harvest-2024"))
        .respond_with(json_body(STRAPI_ARTICLE_TEAM_AUTHOR))
        .mount(&server)
        .await;

    let provider = strapi_provider(&server, Duration::from_secs(60));

    let article = provider
        .get_article_by_slug("harvest-2024", Locale::En)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(article.title.en, "Harvest 2024");
    assert_eq!(article.excerpt.fr, "");
    assert_eq!(article.category.as_ref().unwrap().name.en, "News");
    assert_eq!(
        article.featured_image.as_ref().unwrap().url,
        format!("{}/uploads/harvest.jpg", server.uri())
    );
    match article.author.as_ref().unwrap() {
        Author::Team { id, name, role, .. } => {
            assert_eq!(id, "2");
            assert_eq!(name.fr, "Awa Diop");
            assert_eq!(role.en, "CEO");
        }
        other => panic!("Expected team author, got {:?}", other),
    }
}

#[tokio::test]
async fn test_strapi_article_limit_and_tie_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("pagination[pageSize]", "2"))
        .respond_with(json_body(STRAPI_ARTICLES))
        .expect(1)
        .mount(&server)
        .await;

    let provider = strapi_provider(&server, Duration::from_secs(60));

    let articles = provider.get_articles(Locale::Fr, Some(2)).await.unwrap();
    let slugs: Vec<_> = articles.iter().map(|a| a.slug.as_str()).collect();
    // Same publication time: slug order.
    assert_eq!(slugs, vec!["a-article", "b-article"]);
}

#[tokio::test]
async fn test_strapi_team_and_slugs() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/team-members"))
        .respond_with(json_body(STRAPI_TEAM))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("fields[0]", "slug"))
        .respond_with(json_body(STRAPI_ARTICLE_SLUGS))
        .expect(1)
        .mount(&server)
        .await;

    let provider = strapi_provider(&server, Duration::from_secs(60));

    let team = provider.get_team_members(Locale::Ru).await.unwrap();
    assert_eq!(team[0].name.fr, "Awa Diop");
    assert!(team[0].is_ceo);
    assert!(team[0].photo.is_none());
    assert_eq!(team[1].order, 2);

    let first = provider.get_all_article_slugs().await.unwrap();
    let second = provider.get_all_article_slugs().await.unwrap();
    assert_eq!(first, vec!["harvest-2024", "new-warehouse"]);
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_strapi_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let provider = strapi_provider(&server, Duration::from_secs(60));

    let err = provider.get_team_members(Locale::Fr).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    assert_eq!(err.error_code(), "UNAUTHORIZED");
}
