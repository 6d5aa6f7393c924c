// src/config.rs
use crate::constants::{
    ARTICLES_REQUEST_TIMEOUT, CONTENT_CACHE_TTL, FEATURES_REQUEST_TIMEOUT,
    NEWSLETTER_REQUEST_TIMEOUT,
};
use crate::content::{ArticleDatabases, FeatureDatabases};
use crate::error::AppError;
use crate::newsletter::Delivery;
use crate::types::{ApiKey, DatabaseId, Language, SiteUrl};
use clap::{Parser, Subcommand};
use std::time::Duration;

const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List published posts as JSON
    Posts {
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },
    /// Print one post, with its block tree, as JSON
    Post {
        slug: String,
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },
    /// List feature cards as JSON
    Features {
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },
    /// Dump join diagnostics as JSON
    Debug {
        #[arg(short, long, default_value = "en")]
        lang: Language,
    },
    /// Newsletter issues
    Newsletter {
        #[command(subcommand)]
        action: NewsletterCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewsletterCommand {
    /// Render an issue's email HTML without sending it
    Preview {
        /// Issue page URL or ID
        page: String,
    },
    /// Send one issue if it is scheduled
    Send {
        /// Issue page URL or ID
        page: String,
    },
    /// Send the next due scheduled issue
    SendScheduled {
        /// Must match API_SECRET_KEY when that is set
        #[arg(long)]
        key: Option<String>,
    },
}

/// Token and timeout of one Notion integration.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub token: ApiKey,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NewsletterConfig {
    pub workspace: WorkspaceConfig,
    pub issues: DatabaseId,
}

#[derive(Debug, Clone)]
pub struct FeaturesConfig {
    pub workspace: WorkspaceConfig,
    pub databases: FeatureDatabases,
}

#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub delivery: Delivery,
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &"<redacted>")
            .field("delivery", &self.delivery)
            .finish()
    }
}

/// Everything the site backend reads from its environment.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub articles: WorkspaceConfig,
    pub article_databases: ArticleDatabases,
    pub features: Option<FeaturesConfig>,
    pub newsletter: Option<NewsletterConfig>,
    pub resend: Option<ResendConfig>,
    pub site_url: SiteUrl,
    pub newsletter_language: Language,
    pub api_secret_key: Option<String>,
    pub cache_ttl: Duration,
}

impl SiteConfig {
    /// Resolves the configuration from process environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration through `lookup`, which returns a
    /// variable's value or `None`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                AppError::MissingConfiguration(format!("{} environment variable not set", name))
            })
        };

        let token = required("NOTION_TOKEN")?;
        let articles = WorkspaceConfig {
            token: ApiKey::new(token.clone())?,
            timeout: seconds(var("NOTION_TIMEOUT_SECS"), "NOTION_TIMEOUT_SECS")?
                .unwrap_or(ARTICLES_REQUEST_TIMEOUT),
        };
        let article_databases = ArticleDatabases {
            articles: DatabaseId::parse(&required("NOTION_ARTICLES_DB_ID")?)?,
            locales: DatabaseId::parse(&required("NOTION_LOCALES_DB_ID")?)?,
        };

        let features = match (var("FEATURES_DB_ID"), var("FEATURE_LOCALES_DB_ID")) {
            (Some(features), Some(locales)) => Some(FeaturesConfig {
                workspace: WorkspaceConfig {
                    token: ApiKey::new(var("FEATURES_NOTION_TOKEN").unwrap_or_else(|| token.clone()))?,
                    timeout: FEATURES_REQUEST_TIMEOUT,
                },
                databases: FeatureDatabases {
                    features: DatabaseId::parse(&features)?,
                    locales: DatabaseId::parse(&locales)?,
                },
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::MissingConfiguration(
                    "FEATURES_DB_ID and FEATURE_LOCALES_DB_ID must be set together".to_string(),
                ))
            }
        };

        let newsletter = match var("NEWSLETTER_DB_ID") {
            Some(issues) => Some(NewsletterConfig {
                workspace: WorkspaceConfig {
                    token: ApiKey::new(
                        var("NEWSLETTER_NOTION_TOKEN").unwrap_or_else(|| token.clone()),
                    )?,
                    timeout: NEWSLETTER_REQUEST_TIMEOUT,
                },
                issues: DatabaseId::parse(&issues)?,
            }),
            None => None,
        };

        let resend = match (
            var("RESEND_API_KEY"),
            var("RESEND_AUDIENCE_ID"),
            var("NEWSLETTER_FROM"),
        ) {
            (Some(api_key), Some(audience_id), Some(from)) => Some(ResendConfig {
                api_key,
                delivery: Delivery { audience_id, from },
            }),
            _ => None,
        };

        let site_url = SiteUrl::parse(&var("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()))?;
        let newsletter_language = match var("NEWSLETTER_LANG") {
            Some(tag) => tag.parse::<Language>()?,
            None => Language::En,
        };

        Ok(SiteConfig {
            articles,
            article_databases,
            features,
            newsletter,
            resend,
            site_url,
            newsletter_language,
            api_secret_key: var("API_SECRET_KEY"),
            cache_ttl: seconds(var("CACHE_TTL_SECS"), "CACHE_TTL_SECS")?.unwrap_or(CONTENT_CACHE_TTL),
        })
    }

    /// Gate for the scheduled send. Open when no secret is configured.
    pub fn authorize_cron(&self, provided: Option<&str>) -> Result<(), AppError> {
        match &self.api_secret_key {
            None => Ok(()),
            Some(secret) if provided == Some(secret.as_str()) => Ok(()),
            Some(_) => Err(AppError::Unauthorized(
                "missing or wrong API secret key".to_string(),
            )),
        }
    }
}

fn seconds(value: Option<String>, name: &str) -> Result<Option<Duration>, AppError> {
    value
        .map(|raw| {
            raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                AppError::MissingConfiguration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    name, raw
                ))
            })
        })
        .transpose()
}
