// src/lib.rs
//! notionfolio library: the content backend of a localized blog built on
//! Notion.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `FetchError`, `ValidationError`
//! - **Configuration**: `SiteConfig`
//! - **Domain model**: `Page`, `Block`, `PropertyValue`, `JoinedPost`, `Feature`
//! - **Domain types**: `PageId`, `DatabaseId`, `ApiKey`, `Language`, `SiteUrl`
//! - **API client**: `NotionHttpClient`, `NotionRepository`
//! - **Content**: `BlogSource`, `FeatureSource`, `fetch_block_tree`
//! - **Newsletter**: `Newsletter`, `IssueRenderer`, `ResendClient`

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod error_recovery;
pub mod extract;
pub mod model;
pub mod newsletter;
pub mod types;

// --- Error Handling ---
pub use crate::content::FetchError;
pub use crate::error::AppError;
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::SiteConfig;

// --- Domain Model ---
pub use crate::model::{
    ArticleRow, Block, Feature, JoinedPost, LocaleRow, Page, ParentMatch, PropertyBag,
    PropertyValue,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, BlockId, DatabaseId, Language, PageId, SiteUrl};

// --- API Client ---
pub use crate::api::{DatabaseQuery, NotionHttpClient, NotionRepository};

// --- Caching and Retry ---
pub use crate::cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use crate::error_recovery::{retry_transient, RetryPolicy};

// --- Content ---
pub use crate::content::{
    fetch_block_tree, ArticleDatabases, BlogSource, FeatureDatabases, FeatureSource,
    JoinDiagnostics,
};

// --- Newsletter ---
pub use crate::newsletter::{
    Broadcast, Delivery, EmailProvider, IssueRenderer, IssueStatus, Newsletter, NewsletterIssue,
    ResendClient, SendOutcome,
};
