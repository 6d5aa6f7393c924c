//! Newsletter issue records as stored in the issues database.

use crate::constants::{property, ISSUE_STATUS_SCHEDULED, ISSUE_STATUS_SENT};
use crate::extract;
use crate::model::{Page, PropertyBag, PropertyValue};
use crate::types::PageId;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Number of article slots an issue template can reference.
pub const ARTICLE_SLOTS: usize = 2;

/// Send state of an issue. Only `Scheduled` issues may be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Scheduled,
    Sent,
    Other(String),
}

impl IssueStatus {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case(ISSUE_STATUS_SCHEDULED) {
            IssueStatus::Scheduled
        } else if value.eq_ignore_ascii_case(ISSUE_STATUS_SENT) {
            IssueStatus::Sent
        } else {
            IssueStatus::Other(value.to_string())
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Scheduled => f.write_str(ISSUE_STATUS_SCHEDULED),
            IssueStatus::Sent => f.write_str(ISSUE_STATUS_SENT),
            IssueStatus::Other(value) if value.is_empty() => f.write_str("<empty>"),
            IssueStatus::Other(value) => f.write_str(value),
        }
    }
}

/// Which Notion property type holds the status; writing it back must use the
/// same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Select,
    Status,
}

impl StatusKind {
    fn of(props: &PropertyBag) -> Self {
        match props.get(property::STATUS) {
            Some(PropertyValue::Status { .. }) => StatusKind::Status,
            _ => StatusKind::Select,
        }
    }

    /// Property payload setting the status to `value`.
    pub fn update_payload(&self, value: &str) -> serde_json::Value {
        let key = match self {
            StatusKind::Select => "select",
            StatusKind::Status => "status",
        };
        let mut payload = serde_json::Map::new();
        payload.insert(
            property::STATUS.to_string(),
            serde_json::json!({ key: { "name": value } }),
        );
        serde_json::Value::Object(payload)
    }
}

/// Title, summary and slug of an article featured in an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleDigest {
    pub title: String,
    pub summary: String,
    pub slug: String,
    /// Locale page the slot's relation points to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale_page: Option<PageId>,
}

impl ArticleDigest {
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Reads slot `n` (1-based) from the computed `ArticleN_*` fields.
    fn from_issue_fields(props: &PropertyBag, n: usize) -> Self {
        Self {
            title: extract::formula_text(props, &format!("Article{}_Title", n))
                .trim()
                .to_string(),
            summary: extract::formula_text(props, &format!("Article{}_Summary", n))
                .trim()
                .to_string(),
            slug: extract::formula_text(props, &format!("Article{}_Slug", n))
                .trim()
                .to_string(),
            locale_page: extract::relation_ids(props, &format!("Article{}", n))
                .into_iter()
                .next(),
        }
    }

    /// Reads the digest straight from a Locales page.
    pub fn from_locale_page(page: &Page) -> Self {
        let props = &page.properties;
        let title = match extract::text(props, property::TITLE) {
            t if t.trim().is_empty() => extract::page_title(props),
            t => t,
        };
        let fallback_id = extract::article_id_number(props)
            .or_else(|| extract::leading_number(&title))
            .unwrap_or_default();
        Self {
            slug: extract::resolve_slug(props, &title, fallback_id),
            summary: extract::full_text(props, property::SUMMARY),
            title,
            locale_page: Some(page.id.clone()),
        }
    }
}

/// One newsletter issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterIssue {
    pub page_id: PageId,
    pub title: String,
    pub issue_no: Option<u32>,
    pub status: IssueStatus,
    pub status_kind: StatusKind,
    pub date: Option<NaiveDate>,
    /// Markdown body with `{{placeholder}}` tokens.
    pub template: String,
    pub micro_log: String,
    pub articles: [ArticleDigest; ARTICLE_SLOTS],
}

impl NewsletterIssue {
    pub fn from_page(page: &Page) -> Self {
        let props = &page.properties;
        let issue_no = extract::number(props, property::ISSUE_NO)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u32)
            .or_else(|| extract::leading_number(&extract::formula_text(props, property::ISSUE_NO)));

        Self {
            page_id: page.id.clone(),
            title: extract::page_title(props),
            issue_no,
            status: IssueStatus::parse(&extract::select(props, property::STATUS)),
            status_kind: StatusKind::of(props),
            date: extract::date(props, property::DATE),
            template: extract::full_text(props, property::TEMPLATE),
            micro_log: extract::full_text(props, property::MICRO_LOG),
            articles: [
                ArticleDigest::from_issue_fields(props, 1),
                ArticleDigest::from_issue_fields(props, 2),
            ],
        }
    }

    /// Email subject line.
    pub fn subject(&self) -> String {
        match (self.title.trim(), self.issue_no) {
            ("", Some(n)) => format!("Issue #{}", n),
            ("", None) => "Newsletter".to_string(),
            (title, _) => title.to_string(),
        }
    }

    /// Whether the issue is due on `today`: scheduled, and dated today or
    /// earlier (or undated).
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.status == IssueStatus::Scheduled && self.date.map_or(true, |date| date <= today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn issue_page(status: serde_json::Value) -> Page {
        serde_json::from_value(json!({
            "id": "issue-7",
            "properties": {
                "Name": {"type": "title", "title": [{"plain_text": "Weekly #7"}]},
                "Issue_No": {"type": "number", "number": 7},
                "Status": status,
                "Date": {"type": "date", "date": {"start": "2024-06-01"}},
                "Template": {"type": "rich_text", "rich_text": [
                    {"plain_text": "# Issue {{issue_no}}\n"},
                    {"plain_text": "{{micro_log}}"}
                ]},
                "Micro_Log": {"type": "rich_text", "rich_text": [{"plain_text": "Shipped."}]},
                "Article1_Title": {"type": "formula", "formula": {"type": "string", "string": "Hello"}},
                "Article1_Summary": {"type": "rollup", "rollup": {"type": "array", "array": [
                    {"type": "rich_text", "rich_text": [{"plain_text": "A greeting"}]}
                ]}},
                "Article1_Slug": {"type": "formula", "formula": {"type": "string", "string": "hello"}},
                "Article2": {"type": "relation", "relation": [{"id": "locale-9"}]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_issue_fields() {
        let issue = NewsletterIssue::from_page(&issue_page(
            json!({"type": "select", "select": {"name": "Scheduled"}}),
        ));
        assert_eq!(issue.issue_no, Some(7));
        assert_eq!(issue.status, IssueStatus::Scheduled);
        assert_eq!(issue.status_kind, StatusKind::Select);
        assert_eq!(issue.template, "# Issue {{issue_no}}\n{{micro_log}}");
        assert_eq!(issue.articles[0].title, "Hello");
        assert_eq!(issue.articles[0].summary, "A greeting");
        assert_eq!(issue.articles[0].slug, "hello");
        assert!(issue.articles[1].is_empty());
        assert_eq!(issue.articles[1].locale_page, Some(PageId::new("locale-9")));
    }

    #[test]
    fn status_kind_follows_property_type() {
        let issue = NewsletterIssue::from_page(&issue_page(
            json!({"type": "status", "status": {"name": "Sent"}}),
        ));
        assert_eq!(issue.status, IssueStatus::Sent);
        assert_eq!(issue.status_kind, StatusKind::Status);
        assert_eq!(
            issue.status_kind.update_payload("Sent"),
            json!({"Status": {"status": {"name": "Sent"}}})
        );
    }

    #[test]
    fn other_statuses_are_kept_verbatim() {
        assert_eq!(
            IssueStatus::parse("Draft"),
            IssueStatus::Other("Draft".to_string())
        );
        assert_eq!(IssueStatus::parse(" scheduled "), IssueStatus::Scheduled);
        assert_eq!(IssueStatus::parse("").to_string(), "<empty>");
    }

    #[test]
    fn due_issues_are_scheduled_and_not_in_the_future() {
        let issue = NewsletterIssue::from_page(&issue_page(
            json!({"type": "select", "select": {"name": "Scheduled"}}),
        ));
        let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(issue.is_due(day("2024-06-01")));
        assert!(!issue.is_due(day("2024-05-31")));
    }

    #[test]
    fn digest_from_locale_page_uses_locale_extractors() {
        let page: Page = serde_json::from_value(json!({
            "id": "locale-9",
            "properties": {
                "Title": {"type": "title", "title": [{"plain_text": "Rust Notes"}]},
                "Summary": {"type": "rich_text", "rich_text": [{"plain_text": "Notes."}]}
            }
        }))
        .unwrap();
        let digest = ArticleDigest::from_locale_page(&page);
        assert_eq!(digest.title, "Rust Notes");
        assert_eq!(digest.slug, "rust-notes");
        assert_eq!(digest.summary, "Notes.");
    }
}
