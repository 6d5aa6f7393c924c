// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role: how long content stays fresh, how hard we retry, which
//! Notion property names carry which facts.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// The Notion API version header every request carries.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Base URL of the Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips when listing database rows and block children.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Request timeout for the articles workspace.
pub const ARTICLES_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request timeout for the newsletter workspace.
pub const NEWSLETTER_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Request timeout for the features workspace.
pub const FEATURES_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Total attempts for a single logical request, the first one included.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; attempt `n` waits `n * base`.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Error message fragments that mark a failure as a transient network blip.
pub const TRANSIENT_ERROR_SIGNATURES: [&str; 3] = ["fetch failed", "econnreset", "timeout"];

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// How long joined posts and features stay fresh in the in-process cache.
pub const CONTENT_CACHE_TTL: Duration = Duration::from_secs(300);

/// The Articles status value that makes an article publicly visible.
pub const PUBLISHED_STATUS: &str = "Published";

/// Ordering key for features that do not carry one.
pub const DEFAULT_FEATURE_ORDER: i64 = 999;

/// Property names read from the Notion databases.
pub mod property {
    pub const ARTICLE_ID: &str = "Article_ID";
    pub const STATUS: &str = "Status";
    pub const DATE: &str = "Date";
    pub const COVER: &str = "Cover";
    pub const TITLE: &str = "Title";
    pub const LANG: &str = "Lang";
    pub const SUMMARY: &str = "Summary";
    pub const TAGS: &str = "Tags";
    pub const PUBLISH: &str = "Publish";
    pub const SLUG: &str = "Slug";
    pub const SLUG_FORMULA: &str = "Slug_Formula";
    pub const MANUAL_SLUG: &str = "Manual_Slug";

    pub const FEATURE_ID: &str = "Feature_ID";
    pub const ICON: &str = "Icon";
    pub const ORDER: &str = "Order";
    pub const LINK: &str = "Link";

    pub const ISSUE_NO: &str = "Issue_No";
    pub const TEMPLATE: &str = "Template";
    pub const MICRO_LOG: &str = "Micro_Log";
}

// ---------------------------------------------------------------------------
// Newsletter
// ---------------------------------------------------------------------------

/// Issue status that makes an issue eligible to send.
pub const ISSUE_STATUS_SCHEDULED: &str = "Scheduled";

/// Issue status written back once the broadcast has gone out.
pub const ISSUE_STATUS_SENT: &str = "Sent";

/// Base URL of the Resend API.
pub const RESEND_API_BASE_URL: &str = "https://api.resend.com";

/// Request timeout for the Resend API.
pub const RESEND_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;
