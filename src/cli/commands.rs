use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Output, SlugCollection};
use crate::config::{Config, LoggingConfig};
use crate::domain::{Author, ProductCategory};
use crate::error::{Error, Result};
use crate::locale::{Locale, LocalizedContent};
use crate::provider::ContentProvider;

/// Write the effective configuration to `path`, or the default location.
pub fn init(config: &Config, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::config_file()?,
    };

    if path.exists() && !force {
        warn!("Configuration file already exists: {}", path.display());
        println!("⚠️  {} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(&path)?;
    info!("Wrote configuration to {}", path.display());

    println!("✅ Configuration written to {}", path.display());
    println!("   Provider: {}", config.provider);
    println!("   Cache TTL: {}s", config.cache_ttl().as_secs());
    Ok(())
}

pub async fn products(
    provider: &dyn ContentProvider,
    category: Option<&str>,
    output: Output,
) -> Result<()> {
    let products = match category {
        Some(name) => {
            let category = ProductCategory::parse(name)
                .ok_or_else(|| Error::Config(format!("Unknown product category: {}", name)))?;
            provider.get_products_by_category(category, output.locale).await?
        }
        None => provider.get_products(output.locale).await?,
    };

    if output.json {
        return print_json(&products);
    }

    if products.is_empty() {
        println!("📦 No products published.");
        return Ok(());
    }

    println!("📦 Products ({})", products.len());
    for product in &products {
        println!(
            "   {:<28} {:<12} {}",
            product.slug,
            product.category.as_str(),
            text(&product.name, output.locale)
        );
    }
    Ok(())
}

pub async fn product(provider: &dyn ContentProvider, slug: &str, output: Output) -> Result<()> {
    let product = provider
        .get_product_by_slug(slug, output.locale)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Product '{}' not found", slug)))?;

    if output.json {
        return print_json(&product);
    }

    let locale = output.locale;
    println!("📦 {}", text(&product.name, locale));
    println!("   Slug: {}", product.slug);
    println!("   Category: {}", product.category.as_str());
    if !product.origin.is_empty() {
        println!("   Origin: {}", product.origin.join(", "));
    }
    if !product.season.is_empty() {
        println!("   Season: {}", text(&product.season, locale));
    }
    if !product.certifications.is_empty() {
        println!("   Certifications: {}", labels(&product.certifications));
    }
    if !product.packaging.is_empty() {
        println!("   Packaging: {}", labels(&product.packaging));
    }
    println!("   Image: {}", product.primary_image().url);
    if !product.related_products.is_empty() {
        println!("   Related: {}", product.related_products.join(", "));
    }
    if !product.description.is_empty() {
        println!("\n{}", text(&product.description, locale));
    }
    Ok(())
}

pub async fn articles(
    provider: &dyn ContentProvider,
    limit: Option<usize>,
    output: Output,
) -> Result<()> {
    let articles = provider.get_articles(output.locale, limit).await?;

    if output.json {
        return print_json(&articles);
    }

    if articles.is_empty() {
        println!("📰 No articles published.");
        return Ok(());
    }

    println!("📰 Articles ({})", articles.len());
    for article in &articles {
        let author = article
            .author
            .as_ref()
            .map(|author| author_label(author, output.locale))
            .unwrap_or_default();
        println!(
            "   {}  {:<32} {}{}",
            article.published_at.format("%Y-%m-%d"),
            article.slug,
            text(&article.title, output.locale),
            author
        );
    }
    Ok(())
}

pub async fn article(provider: &dyn ContentProvider, slug: &str, output: Output) -> Result<()> {
    let article = provider
        .get_article_by_slug(slug, output.locale)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Article '{}' not found", slug)))?;

    if output.json {
        return print_json(&article);
    }

    let locale = output.locale;
    println!("📰 {}", text(&article.title, locale));
    println!("   Slug: {}", article.slug);
    println!("   Published: {}", article.published_at.format("%Y-%m-%d %H:%M UTC"));
    if let Some(category) = &article.category {
        println!("   Category: {}", text(&category.name, locale));
    }
    if let Some(author) = &article.author {
        println!("   Author:{}", author_label(author, locale));
        if let Some(photo) = author.photo() {
            println!("   Author photo: {}", photo.url);
        }
    }
    if let Some(image) = &article.featured_image {
        println!("   Image: {}", image.url);
    }
    let translated = article
        .content
        .as_ref()
        .filter(|content| !content.is_empty())
        .map(|content| {
            content
                .0
                .keys()
                .map(|locale| locale.code())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| "none".to_string());
    println!("   Body locales: {}", translated);
    if !article.excerpt.is_empty() {
        println!("\n{}", text(&article.excerpt, locale));
    }
    Ok(())
}

pub async fn team(provider: &dyn ContentProvider, output: Output) -> Result<()> {
    let members = provider.get_team_members(output.locale).await?;

    if output.json {
        return print_json(&members);
    }

    println!("👥 Team ({})", members.len());
    for member in &members {
        println!(
            "   {:>3}  {}{} - {}",
            member.order,
            text(&member.name, output.locale),
            if member.is_ceo { " (CEO)" } else { "" },
            text(&member.role, output.locale)
        );
    }
    Ok(())
}

pub async fn stats(provider: &dyn ContentProvider, output: Output) -> Result<()> {
    let stats = provider
        .get_export_statistics(output.locale)
        .await?
        .ok_or_else(|| Error::NotFound("No export statistics published".to_string()))?;

    if output.json {
        return print_json(&stats);
    }

    let locale = output.locale;
    println!("📊 Export statistics (updated {})", stats.last_updated.format("%Y-%m-%d"));
    println!("   Tonnage: {}", stats.kpis.tonnage);
    println!("   Countries served: {}", stats.kpis.countries_served);
    println!("   Producer partners: {}", stats.kpis.producer_partners);
    println!("   Years active: {}", stats.kpis.years_active);
    println!("   Traced lots: {}%", stats.kpis.traced_lots_percentage);

    if !stats.exports_by_region.is_empty() {
        println!("\n🌍 By region:");
        for region in &stats.exports_by_region {
            println!("   {:<12} {:>5.1}%", format!("{:?}", region.region), region.percentage);
        }
    }
    if !stats.top_destinations.is_empty() {
        println!("\n🚢 Top destinations:");
        for destination in &stats.top_destinations {
            println!(
                "   {} {:<20} {:>5.1}%",
                destination.code,
                text(&destination.country, locale),
                destination.percentage
            );
        }
    }
    if !stats.product_mix.is_empty() {
        println!("\n📦 Product mix:");
        for entry in &stats.product_mix {
            println!("   {:<24} {:>5.1}%", text(&entry.product, locale), entry.percentage);
        }
    }
    Ok(())
}

pub async fn slugs(
    provider: &dyn ContentProvider,
    collection: SlugCollection,
    output: Output,
) -> Result<()> {
    let slugs = match collection {
        SlugCollection::Products => provider.get_all_product_slugs().await?,
        SlugCollection::Articles => provider.get_all_article_slugs().await?,
    };

    if output.json {
        return print_json(&slugs);
    }

    for slug in &slugs {
        println!("{}", slug);
    }
    Ok(())
}

/// Fetch both slug lists concurrently and report what the backend returned.
pub async fn check(provider: &dyn ContentProvider) -> Result<()> {
    println!("🔌 Checking {} backend...", provider.name());

    let (products, articles) = futures::try_join!(
        provider.get_all_product_slugs(),
        provider.get_all_article_slugs()
    )?;

    println!("✅ Backend reachable");
    println!("   📦 Products: {}", products.len());
    println!("   📰 Articles: {}", articles.len());

    let stats = provider.cache_stats();
    debug!("Cache after check: {:?}", stats);
    println!("   💾 Cached entries: {}", stats.total_entries);
    Ok(())
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let cmd_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, cmd_name, &mut std::io::stdout());
}

/// Initialize logging from the configured level, raised by the verbosity
/// flags. `RUST_LOG` wins when set. Logs go to stderr so `--json` output
/// stays clean. An already installed subscriber is kept.
pub fn init_logging(config: &LoggingConfig, debug: bool, verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.with_file(debug).with_line_number(debug).try_init()
    };
    match result {
        Ok(()) => debug!("Logging initialized"),
        Err(e) => debug!("Keeping the existing subscriber: {}", e),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Requested locale, falling back to any translation that exists.
fn text(content: &LocalizedContent, locale: Locale) -> &str {
    content.get_or_fallback(locale)
}

fn author_label(author: &Author, locale: Locale) -> String {
    match author {
        Author::External { name, .. } => format!(" ({}, guest)", name),
        Author::Team { .. } => format!(" ({})", author.display_name(locale)),
    }
}

fn labels<T: Serialize>(values: &[T]) -> String {
    values
        .iter()
        .filter_map(|value| match serde_json::to_value(value) {
            Ok(serde_json::Value::String(label)) => Some(label),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}
