//! Newsletter issues: fetch, render, and send through an email provider.
//!
//! An issue moves `Scheduled` → `Sent` exactly once. Any other status is not
//! eligible. The status write-back happens after the email has gone out, so
//! a failed write is logged and reported, never turned into an error.

mod issue;
mod resend;
mod template;

pub use issue::{ArticleDigest, IssueStatus, NewsletterIssue, StatusKind, ARTICLE_SLOTS};
pub use resend::{Broadcast, EmailProvider, ResendClient};
pub use template::{markdown_to_html, IssueRenderer, RenderedIssue};

use crate::api::{DatabaseQuery, NotionRepository};
use crate::constants::ISSUE_STATUS_SENT;
use crate::error::AppError;
use crate::model::Page;
use crate::types::{DatabaseId, PageId};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

/// Where broadcasts go and who they come from.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub audience_id: String,
    pub from: String,
}

/// Result of a send request that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// The issue had already been sent; nothing was mailed.
    AlreadySent {
        page_id: PageId,
        issue_no: Option<u32>,
    },
    Sent {
        page_id: PageId,
        issue_no: Option<u32>,
        broadcast_id: String,
        /// Whether the issue's status was written back as `Sent`.
        status_updated: bool,
    },
}

pub struct Newsletter {
    notion: Arc<dyn NotionRepository>,
    issues: DatabaseId,
    renderer: IssueRenderer,
    email: Option<(Arc<dyn EmailProvider>, Delivery)>,
}

impl Newsletter {
    pub fn new(notion: Arc<dyn NotionRepository>, issues: DatabaseId, renderer: IssueRenderer) -> Self {
        Self {
            notion,
            issues,
            renderer,
            email: None,
        }
    }

    /// Enables sending. Without it only previews work.
    pub fn with_delivery(mut self, email: Arc<dyn EmailProvider>, delivery: Delivery) -> Self {
        self.email = Some((email, delivery));
        self
    }

    /// Retrieves and parses an issue, filling empty article slots from the
    /// Locales pages their relations point to.
    pub async fn load_issue(&self, page_id: &PageId) -> Result<NewsletterIssue, AppError> {
        let page = self.notion.retrieve_page(page_id).await?;
        Ok(self.complete_issue(&page).await)
    }

    async fn complete_issue(&self, page: &Page) -> NewsletterIssue {
        let mut issue = NewsletterIssue::from_page(page);

        for (i, digest) in issue.articles.iter_mut().enumerate() {
            if !digest.is_empty() {
                continue;
            }
            let Some(locale_id) = digest.locale_page.clone() else {
                continue;
            };
            match self.notion.retrieve_page(&locale_id).await {
                Ok(locale) => *digest = ArticleDigest::from_locale_page(&locale),
                Err(e) => log::warn!(
                    "Could not load article {} of issue {} from {}: {}",
                    i + 1,
                    issue.page_id,
                    locale_id,
                    e
                ),
            }
        }

        issue
    }

    /// Renders an issue regardless of its status.
    pub async fn preview_issue(
        &self,
        page_id: &PageId,
        today: NaiveDate,
    ) -> Result<RenderedIssue, AppError> {
        let issue = self.load_issue(page_id).await?;
        self.renderer.render(&issue, today)
    }

    /// Sends one issue if it is `Scheduled`.
    pub async fn send_issue(
        &self,
        page_id: &PageId,
        today: NaiveDate,
    ) -> Result<SendOutcome, AppError> {
        let issue = self.load_issue(page_id).await?;
        self.send_loaded(&issue, today).await
    }

    /// Sends the next due issue: `Scheduled`, dated today or earlier (or
    /// undated), lowest issue number first. `None` when nothing is due.
    pub async fn send_scheduled(&self, today: NaiveDate) -> Result<Option<SendOutcome>, AppError> {
        let pages = self
            .notion
            .query_database(&self.issues, &DatabaseQuery::all())
            .await?;

        let next = pages
            .iter()
            .map(|page| (page, NewsletterIssue::from_page(page)))
            .filter(|(_, issue)| issue.is_due(today))
            .min_by_key(|(_, issue)| issue.issue_no.unwrap_or(u32::MAX));

        let Some((page, _)) = next else {
            log::info!("No scheduled issue is due on {}", today);
            return Ok(None);
        };

        let issue = self.complete_issue(page).await;
        self.send_loaded(&issue, today).await.map(Some)
    }

    async fn send_loaded(
        &self,
        issue: &NewsletterIssue,
        today: NaiveDate,
    ) -> Result<SendOutcome, AppError> {
        match &issue.status {
            IssueStatus::Scheduled => {}
            IssueStatus::Sent => {
                log::info!("Issue {} was already sent", issue.page_id);
                return Ok(SendOutcome::AlreadySent {
                    page_id: issue.page_id.clone(),
                    issue_no: issue.issue_no,
                });
            }
            IssueStatus::Other(_) => {
                return Err(AppError::IssueNotEligible {
                    status: issue.status.to_string(),
                });
            }
        }

        let (email, delivery) = self.email.as_ref().ok_or_else(|| {
            AppError::MissingConfiguration(
                "RESEND_API_KEY, RESEND_AUDIENCE_ID and NEWSLETTER_FROM are required to send"
                    .to_string(),
            )
        })?;

        let rendered = self.renderer.render(issue, today)?;
        let broadcast = Broadcast {
            audience_id: delivery.audience_id.clone(),
            from: delivery.from.clone(),
            name: rendered.subject.clone(),
            subject: rendered.subject,
            html: rendered.html,
        };

        let broadcast_id = email.create_broadcast(&broadcast).await?;
        email.send_broadcast(&broadcast_id).await?;
        log::info!(
            "Issue {} sent as broadcast {}",
            issue.page_id,
            broadcast_id
        );

        let payload = issue.status_kind.update_payload(ISSUE_STATUS_SENT);
        let status_updated = match self.notion.update_page(&issue.page_id, payload).await {
            Ok(_) => true,
            Err(e) => {
                log::error!(
                    "Issue {} was sent but its status could not be set to {}: {}",
                    issue.page_id,
                    ISSUE_STATUS_SENT,
                    e
                );
                false
            }
        };

        Ok(SendOutcome::Sent {
            page_id: issue.page_id.clone(),
            issue_no: issue.issue_no,
            broadcast_id,
            status_updated,
        })
    }
}
