//! GROQ queries. Drafts are never served.

const PUBLISHED: &str = r#"!(_id in path("drafts.**"))"#;

const IMAGE_PROJECTION: &str = r#"{ asset, alt, altFr, altEn, altRu }"#;

const TEAM_MEMBER_PROJECTION: &str = r#"{
    _id, name, nameFr, nameEn, nameRu, role, roleFr, roleEn, roleRu,
    bio, bioFr, bioEn, bioRu, photo, isCEO, order, email, linkedin
}"#;

fn product_projection() -> String {
    format!(
        r#"{{
    _id, _createdAt, _updatedAt,
    "slug": slug.current,
    name, nameFr, nameEn, nameRu,
    description, descriptionFr, descriptionEn, descriptionRu,
    season, seasonFr, seasonEn, seasonRu,
    "category": coalesce(category->slug.current, category),
    origin, certifications, packaging,
    "images": images[]{image},
    constellation,
    "relatedProducts": relatedProducts[]->slug.current
}}"#,
        image = IMAGE_PROJECTION
    )
}

fn author_projection() -> String {
    format!(
        r#""author": select(
        defined(author.authorType) => author{{
            authorType, externalName, externalRole, externalUrl,
            "externalPhoto": externalPhoto{image},
            "teamMember": teamMember->{team}
        }},
        defined(author._ref) => author->{team},
        null
    )"#,
        image = IMAGE_PROJECTION,
        team = TEAM_MEMBER_PROJECTION
    )
}

fn article_fields(with_content: bool) -> String {
    format!(
        r#"{{
    _id, _createdAt, _updatedAt, publishedAt,
    "slug": slug.current,
    title, titleFr, titleEn, titleRu,
    excerpt, excerptFr, excerptEn, excerptRu,
    {content}
    "featuredImage": coalesce(featuredImage, mainImage){image},
    "category": category->{{ "slug": slug.current, name, nameFr, nameEn, nameRu, title }},
    {author}
}}"#,
        content = if with_content {
            "content, contentFr, contentEn, contentRu,"
        } else {
            ""
        },
        image = IMAGE_PROJECTION,
        author = author_projection()
    )
}

pub fn products() -> String {
    format!(
        r#"*[_type == "product" && defined(slug.current) && {}] | order(coalesce(order, 999) asc, _createdAt asc) {}"#,
        PUBLISHED,
        product_projection()
    )
}

pub fn product_by_slug() -> String {
    format!(
        r#"*[_type == "product" && slug.current == $slug && {}][0] {}"#,
        PUBLISHED,
        product_projection()
    )
}

pub fn product_slugs() -> String {
    format!(
        r#"*[_type == "product" && defined(slug.current) && {}] | order(slug.current asc).slug.current"#,
        PUBLISHED
    )
}

/// Newest first. A limited query takes the item count as `$limit`.
pub fn articles(limited: bool) -> String {
    format!(
        r#"*[_type == "article" && defined(slug.current) && {}] | order(publishedAt desc){} {}"#,
        PUBLISHED,
        if limited { " [0...$limit]" } else { "" },
        article_fields(false)
    )
}

pub fn article_by_slug() -> String {
    format!(
        r#"*[_type == "article" && slug.current == $slug && {}][0] {}"#,
        PUBLISHED,
        article_fields(true)
    )
}

pub fn article_slugs() -> String {
    format!(
        r#"*[_type == "article" && defined(slug.current) && {}] | order(publishedAt desc).slug.current"#,
        PUBLISHED
    )
}

pub fn team_members() -> String {
    format!(
        r#"*[_type == "teamMember" && {}] | order(order asc) {}"#,
        PUBLISHED, TEAM_MEMBER_PROJECTION
    )
}

pub fn export_statistics() -> String {
    format!(
        r#"*[_type == "exportStatistics" && {}] | order(_updatedAt desc)[0] {{
    _updatedAt, lastUpdated, kpis, exportsByRegion,
    topDestinations, monthlyVolumes,
    "productMix": productMix[]{{ ..., "slug": coalesce(product->slug.current, slug) }}
}}"#,
        PUBLISHED
    )
}
