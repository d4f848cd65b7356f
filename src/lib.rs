pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod locale;
pub mod provider;
pub mod raw;
pub mod sanity;
pub mod strapi;

pub use config::Config;
pub use error::{Error, Result};
pub use locale::{Locale, LocalizedContent};
pub use provider::{create_provider, ContentProvider, ProviderKind};
