pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::locale::Locale;
use crate::provider::{create_provider, ProviderKind};

#[derive(Parser)]
#[command(name = "agro-content")]
#[command(about = "Query the site's headless CMS through the content provider")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured backend (sanity or strapi)
    #[arg(short, long, global = true)]
    pub provider: Option<ProviderKind>,

    /// Locale to display (fr, en, ru)
    #[arg(short, long, global = true, default_value = "fr")]
    pub locale: Locale,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List products
    Products {
        /// Only this category (fruits, vegetables, grains, spices, nuts, processed, other)
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one product
    Product {
        /// Product slug
        slug: String,
    },

    /// List articles, newest first
    Articles {
        /// Maximum number of articles
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show one article
    Article {
        /// Article slug
        slug: String,
    },

    /// List team members in display order
    Team,

    /// Show the export statistics snapshot
    Stats,

    /// List every published slug of a collection
    Slugs {
        #[arg(value_enum)]
        collection: SlugCollection,
    },

    /// Build the provider and check that the backend answers
    Check,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlugCollection {
    Products,
    Articles,
}

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub locale: Locale,
    pub json: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = match self.command {
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                return Ok(());
            }
            command => command,
        };

        let mut config = match (&command, self.config.as_deref()) {
            (Commands::Init { .. }, Some(path)) if !path.exists() => Config::from_env()?,
            (_, path) => Config::discover(path)?,
        };
        if let Some(provider) = self.provider {
            config.provider = provider;
        }

        commands::init_logging(&config.logging, self.debug, self.verbose);

        if let Commands::Init { force } = command {
            return commands::init(&config, self.config, force);
        }

        let provider = create_provider(&config)?;
        let output = Output {
            locale: self.locale,
            json: self.json,
        };

        match command {
            Commands::Products { category } => {
                commands::products(provider.as_ref(), category.as_deref(), output).await
            }
            Commands::Product { slug } => commands::product(provider.as_ref(), &slug, output).await,
            Commands::Articles { limit } => commands::articles(provider.as_ref(), limit, output).await,
            Commands::Article { slug } => commands::article(provider.as_ref(), &slug, output).await,
            Commands::Team => commands::team(provider.as_ref(), output).await,
            Commands::Stats => commands::stats(provider.as_ref(), output).await,
            Commands::Slugs { collection } => commands::slugs(provider.as_ref(), collection, output).await,
            Commands::Check => commands::check(provider.as_ref()).await,
            Commands::Init { .. } | Commands::Completions { .. } => Ok(()),
        }
    }
}
