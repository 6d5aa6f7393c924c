// src/main.rs

use anyhow::{anyhow, Context};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notionfolio::config::{Command, CommandLineInput, NewsletterCommand, WorkspaceConfig};
use notionfolio::{
    BlogSource, FeatureSource, IssueRenderer, Newsletter, NotionHttpClient, NotionRepository,
    PageId, ResendClient, SiteConfig, SystemClock,
};
use serde::Serialize;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notionfolio.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Logs go to stderr; stdout carries the JSON or HTML output.
    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn notion_client(workspace: &WorkspaceConfig) -> anyhow::Result<Arc<dyn NotionRepository>> {
    let client = NotionHttpClient::new(&workspace.token, workspace.timeout)
        .context("Failed to build Notion client")?;
    Ok(Arc::new(client))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn blog_source(config: &SiteConfig) -> anyhow::Result<BlogSource> {
    Ok(BlogSource::new(
        notion_client(&config.articles)?,
        config.article_databases.clone(),
        config.cache_ttl,
        Arc::new(SystemClock),
    ))
}

fn newsletter(config: &SiteConfig) -> anyhow::Result<Newsletter> {
    let settings = config
        .newsletter
        .as_ref()
        .ok_or_else(|| anyhow!("NEWSLETTER_DB_ID is not set"))?;
    let renderer = IssueRenderer::new(config.site_url.clone(), config.newsletter_language)?;
    let mut newsletter = Newsletter::new(
        notion_client(&settings.workspace)?,
        settings.issues.clone(),
        renderer,
    );
    if let Some(resend) = &config.resend {
        let client = ResendClient::new(&resend.api_key).context("Failed to build Resend client")?;
        newsletter = newsletter.with_delivery(Arc::new(client), resend.delivery.clone());
    }
    Ok(newsletter)
}

async fn run(command: Command, config: &SiteConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Posts { lang } => {
            let posts = blog_source(config)?.try_posts(lang).await?;
            print_json(&posts)?;
        }
        Command::Post { slug, lang } => {
            match blog_source(config)?.try_post(&slug, lang).await? {
                Some(post) => print_json(&post)?,
                None => {
                    eprintln!("No post '{}' in '{}'", slug, lang);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Features { lang } => {
            let settings = config
                .features
                .as_ref()
                .ok_or_else(|| anyhow!("FEATURES_DB_ID and FEATURE_LOCALES_DB_ID are not set"))?;
            let source = FeatureSource::new(
                notion_client(&settings.workspace)?,
                settings.databases.clone(),
                config.cache_ttl,
                Arc::new(SystemClock),
            );
            print_json(&source.try_features(lang).await?)?;
        }
        Command::Debug { lang } => {
            let report = blog_source(config)?.diagnostics(lang).await?;
            print_json(&report)?;
        }
        Command::Newsletter { action } => match action {
            NewsletterCommand::Preview { page } => {
                let page = PageId::parse(&page)?;
                let rendered = newsletter(config)?.preview_issue(&page, today()).await?;
                println!("{}", rendered.html);
            }
            NewsletterCommand::Send { page } => {
                let page = PageId::parse(&page)?;
                let outcome = newsletter(config)?.send_issue(&page, today()).await?;
                print_json(&outcome)?;
            }
            NewsletterCommand::SendScheduled { key } => {
                config.authorize_cron(key.as_deref())?;
                match newsletter(config)?.send_scheduled(today()).await? {
                    Some(outcome) => print_json(&outcome)?,
                    None => print_json(&serde_json::json!({ "outcome": "nothing_due" }))?,
                }
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).map_err(|e| anyhow!("Failed to initialise logging: {}", e))?;

    let config = SiteConfig::from_env().context("Invalid configuration")?;

    run(cli.command, &config).await
}
