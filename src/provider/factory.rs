use std::sync::Arc;

use tracing::info;

use super::{ContentProvider, ProviderKind};
use crate::config::Config;
use crate::error::Result;
use crate::sanity::SanityProvider;
use crate::strapi::StrapiProvider;

/// Build the provider selected by `config.provider`.
///
/// Missing or malformed settings for the selected backend fail here, not on
/// the first request.
pub fn create_provider(config: &Config) -> Result<Arc<dyn ContentProvider>> {
    let ttl = config.cache_ttl();

    let provider: Arc<dyn ContentProvider> = match config.provider {
        ProviderKind::Sanity => Arc::new(SanityProvider::new(&config.sanity, &config.http, ttl)?),
        ProviderKind::Strapi => Arc::new(StrapiProvider::new(&config.strapi, &config.http, ttl)?),
    };

    info!(
        "Content provider ready: {} (cache TTL {}s)",
        provider.name(),
        ttl.as_secs()
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SanitySettings, StrapiSettings};
    use crate::error::Error;

    #[test]
    fn test_default_provider_requires_sanity_settings() {
        let result = create_provider(&Config::default());
        match result {
            Err(Error::Config(message)) => assert!(message.contains("project_id")),
            Err(other) => panic!("Expected Config error, got {}", other),
            Ok(_) => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_sanity_provider_built() {
        let config = Config {
            sanity: SanitySettings {
                project_id: Some("abc123".to_string()),
                dataset: Some("production".to_string()),
                ..SanitySettings::default()
            },
            ..Config::default()
        };

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "sanity");
    }

    #[test]
    fn test_strapi_requires_url() {
        let config = Config {
            provider: ProviderKind::Strapi,
            ..Config::default()
        };
        assert!(matches!(create_provider(&config), Err(Error::Config(_))));

        let config = Config {
            provider: ProviderKind::Strapi,
            strapi: StrapiSettings {
                url: Some("https://cms.example.com".to_string()),
                token: None,
            },
            ..Config::default()
        };
        assert_eq!(create_provider(&config).unwrap().name(), "strapi");
    }
}
