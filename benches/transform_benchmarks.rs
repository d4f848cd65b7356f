use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::runtime::Runtime;
use url::Url;

use agro_content::cache::TtlCache;
use agro_content::locale::{localized, SuffixStyle};
use agro_content::sanity::{SanityImageBuilder, SanityTransformer};
use agro_content::strapi::client::flatten;
use agro_content::strapi::{StrapiMediaResolver, StrapiTransformer};

fn sanity_products(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                json!({
                    "_id": format!("product-{}", i),
                    "_createdAt": "2024-01-10T08:00:00Z",
                    "_updatedAt": "2024-02-01T08:00:00Z",
                    "slug": format!("product-{}", i),
                    "name": {"fr": format!("Produit {}", i), "en": format!("Product {}", i)},
                    "descriptionFr": "Description",
                    "descriptionEn": "Description",
                    "category": "fruits",
                    "origin": ["Casamance", "Niayes"],
                    "certifications": ["GlobalGAP", "organic", "HACCP"],
                    "packaging": ["cartons", "container-40ft"],
                    "images": [
                        {"asset": {"_ref": "image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x1500-jpg"}, "alt": {"fr": "Photo"}},
                        {"asset": {"_ref": "image-Ab12Cd34Ef56-1200x800-png"}}
                    ],
                    "relatedProducts": ["product-0"]
                })
            })
            .collect(),
    )
}

fn strapi_envelope(count: usize) -> Value {
    json!({
        "data": (0..count)
            .map(|i| json!({
                "id": i,
                "attributes": {
                    "slug": format!("product-{}", i),
                    "name_fr": format!("Produit {}", i),
                    "name_en": format!("Product {}", i),
                    "category": {"data": {"id": 1, "attributes": {"slug": "nuts"}}},
                    "images": {"data": [{"id": i, "attributes": {
                        "url": "/uploads/product.jpg", "width": 2000, "height": 1500,
                        "formats": {"small": {"url": "/uploads/small_product.jpg", "width": 500, "height": 375}}
                    }}]},
                    "createdAt": "2024-01-10T08:00:00.000Z"
                }
            }))
            .collect::<Vec<_>>(),
        "meta": {}
    })
}

fn bench_sanity_transform(c: &mut Criterion) {
    let transformer = SanityTransformer::new(SanityImageBuilder::new("abc123", "production").unwrap());

    let mut group = c.benchmark_group("sanity_transform");

    for &count in &[10, 100, 1000] {
        let raw = sanity_products(count);
        group.bench_with_input(BenchmarkId::new("products", count), &raw, |b, raw| {
            b.iter(|| black_box(transformer.products(raw).unwrap()));
        });
    }

    group.finish();
}

fn bench_strapi_transform(c: &mut Criterion) {
    let transformer = StrapiTransformer::new(StrapiMediaResolver::new(
        Url::parse("https://cms.example.com/").unwrap(),
    ));

    let mut group = c.benchmark_group("strapi_transform");

    for &count in &[10, 100, 1000] {
        let envelope = strapi_envelope(count);
        group.bench_with_input(BenchmarkId::new("flatten", count), &envelope, |b, envelope| {
            b.iter(|| black_box(flatten(envelope["data"].clone())));
        });

        let flat = flatten(envelope["data"].clone());
        group.bench_with_input(BenchmarkId::new("products", count), &flat, |b, flat| {
            b.iter(|| black_box(transformer.products(flat).unwrap()));
        });
    }

    group.finish();
}

fn bench_locale_shapes(c: &mut Criterion) {
    let docs = [
        ("keyed", json!({"name": {"fr": "Mangue", "en": "Mango", "ru": "Манго"}})),
        ("suffixed", json!({"nameFr": "Mangue", "nameEn": "Mango", "nameRu": "Манго"})),
        ("bare", json!({"name": "Mangue"})),
        ("missing", json!({"title": "Mangue"})),
    ];

    let mut group = c.benchmark_group("locale_normalization");

    for (name, doc) in &docs {
        let doc = doc.as_object().unwrap().clone();
        group.bench_function(*name, |b| {
            b.iter(|| black_box(localized(&doc, "name", SuffixStyle::Camel)));
        });
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = TtlCache::new(Duration::from_secs(3600));
    let products = sanity_products(100);

    rt.block_on(async {
        cache
            .get_or_fetch("products:fr", || async { Ok(products.clone()) })
            .await
            .unwrap();
    });

    let mut group = c.benchmark_group("cache");

    group.bench_function("hit", |b| {
        b.to_async(&rt).iter(|| async {
            let value: Value = cache
                .get_or_fetch("products:fr", || async { Ok(Value::Null) })
                .await
                .unwrap();
            black_box(value)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sanity_transform,
    bench_strapi_transform,
    bench_locale_shapes,
    bench_cache
);
criterion_main!(benches);
