//! Issue rendering: placeholder substitution, Markdown to HTML, email layout.

use super::issue::NewsletterIssue;
use crate::error::AppError;
use crate::types::{Language, SiteUrl};
use chrono::NaiveDate;
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use pulldown_cmark::{html as md_html, Options, Parser};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::json;

const LAYOUT_TEMPLATE: &str = "email_layout";

/// Placeholders an issue body may use. Any other `{{...}}` is body text.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*(issue_no|date|micro_log|article[12]_(?:title|summary|slug|link))\s*\}\}")
        .expect("placeholder regex is valid")
});

/// Body used when an issue has no template of its own.
const DEFAULT_BODY: &str = "\
# Issue {{issue_no}}

{{micro_log}}

## [{{article1_title}}]({{article1_link}})

{{article1_summary}}

## [{{article2_title}}]({{article2_link}})

{{article2_summary}}
";

const EMAIL_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="{{lang}}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{subject}}</title>
</head>
<body style="margin:0;padding:0;background:#f6f6f6;">
<table role="presentation" width="100%" cellspacing="0" cellpadding="0">
<tr><td align="center" style="padding:24px 12px;">
<table role="presentation" width="600" cellspacing="0" cellpadding="0" style="max-width:600px;background:#ffffff;font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;font-size:16px;line-height:1.6;color:#222;">
<tr><td style="padding:32px;">
{{body}}
</td></tr>
<tr><td style="padding:16px 32px;font-size:12px;color:#888;border-top:1px solid #eee;">
<a href="{{site_url}}/{{lang}}" style="color:#888;">{{site_url}}</a>
</td></tr>
</table>
</td></tr>
</table>
</body>
</html>
"#;

/// A rendered issue, ready to hand to the email provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedIssue {
    pub subject: String,
    /// Body after placeholder substitution, before Markdown conversion.
    pub markdown: String,
    pub html: String,
}

/// Renders issues for one site and link language.
pub struct IssueRenderer {
    handlebars: Handlebars<'static>,
    site_url: SiteUrl,
    language: Language,
}

impl IssueRenderer {
    pub fn new(site_url: SiteUrl, language: Language) -> Result<Self, AppError> {
        let mut handlebars = Handlebars::new();
        // The layout embeds the rendered body HTML as is.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(false);
        handlebars
            .register_template_string(LAYOUT_TEMPLATE, EMAIL_LAYOUT)
            .map_err(|e| AppError::Template {
                name: LAYOUT_TEMPLATE.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            handlebars,
            site_url,
            language,
        })
    }

    /// Placeholder values for an issue. `today` stands in for a missing
    /// issue date.
    pub fn placeholders(&self, issue: &NewsletterIssue, today: NaiveDate) -> serde_json::Value {
        let mut values = serde_json::Map::new();
        values.insert(
            "issue_no".to_string(),
            json!(issue.issue_no.map(|n| n.to_string()).unwrap_or_default()),
        );
        values.insert(
            "date".to_string(),
            json!(issue.date.unwrap_or(today).format("%Y-%m-%d").to_string()),
        );
        values.insert("micro_log".to_string(), json!(issue.micro_log));

        for (i, article) in issue.articles.iter().enumerate() {
            let n = i + 1;
            let link = if article.slug.is_empty() {
                String::new()
            } else {
                self.site_url.article_link(self.language, &article.slug)
            };
            values.insert(format!("article{}_title", n), json!(article.title));
            values.insert(format!("article{}_summary", n), json!(article.summary));
            values.insert(format!("article{}_slug", n), json!(article.slug));
            values.insert(format!("article{}_link", n), json!(link));
        }

        serde_json::Value::Object(values)
    }

    pub fn render(&self, issue: &NewsletterIssue, today: NaiveDate) -> Result<RenderedIssue, AppError> {
        let body_template = if issue.template.trim().is_empty() {
            log::warn!("Issue {} has no template; using the default body", issue.page_id);
            DEFAULT_BODY
        } else {
            issue.template.as_str()
        };

        let markdown = substitute(body_template, &self.placeholders(issue, today));

        let subject = issue.subject();
        let layout_data = json!({
            "subject": subject,
            "lang": self.language.as_str(),
            "site_url": self.site_url.as_str().trim_end_matches('/'),
            "body": markdown_to_html(&markdown),
        });
        let html = self
            .handlebars
            .render(LAYOUT_TEMPLATE, &layout_data)
            .map_err(|e| AppError::Template {
                name: LAYOUT_TEMPLATE.to_string(),
                message: e.to_string(),
            })?;

        Ok(RenderedIssue {
            subject,
            markdown,
            html,
        })
    }
}

/// Replaces the known placeholders in an issue body and leaves every other
/// brace sequence as written. The body is Notion-authored Markdown and may
/// quote template syntax of its own.
fn substitute(body: &str, values: &serde_json::Value) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &Captures| {
            values
                .get(&caps[1])
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        })
        .into_owned()
}

/// Markdown to HTML with tables and strikethrough.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::with_capacity(markdown.len() * 2);
    md_html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn renderer() -> IssueRenderer {
        IssueRenderer::new(SiteUrl::parse("https://example.com").unwrap(), Language::En).unwrap()
    }

    fn issue(template: &str) -> NewsletterIssue {
        let page: Page = serde_json::from_value(json!({
            "id": "issue-3",
            "properties": {
                "Name": {"type": "title", "title": [{"plain_text": "Weekly #3"}]},
                "Issue_No": {"type": "number", "number": 3},
                "Status": {"type": "select", "select": {"name": "Scheduled"}},
                "Template": {"type": "rich_text", "rich_text": [{"plain_text": template}]},
                "Micro_Log": {"type": "rich_text", "rich_text": [{"plain_text": "Fixed <b>bugs</b> & more"}]},
                "Article1_Title": {"type": "formula", "formula": {"type": "string", "string": "Hello"}},
                "Article1_Slug": {"type": "formula", "formula": {"type": "string", "string": "hello"}}
            }
        }))
        .unwrap();
        NewsletterIssue::from_page(&page)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn substitutes_placeholders_without_escaping() {
        let rendered = renderer()
            .render(&issue("#{{issue_no}} {{date}}: {{micro_log}}"), today())
            .unwrap();
        assert_eq!(rendered.markdown, "#3 2024-06-01: Fixed <b>bugs</b> & more");
        assert_eq!(rendered.subject, "Weekly #3");
    }

    #[test]
    fn article_links_point_at_the_site() {
        let rendered = renderer()
            .render(&issue("[{{article1_title}}]({{article1_link}}) [{{article2_title}}]({{article2_link}})"), today())
            .unwrap();
        assert_eq!(rendered.markdown, "[Hello](https://example.com/en/blog/hello) []()");
    }

    #[test]
    fn unknown_placeholders_are_left_as_written() {
        let rendered = renderer().render(&issue("a{{nope}}b"), today()).unwrap();
        assert_eq!(rendered.markdown, "a{{nope}}b");
    }

    #[test]
    fn template_syntax_in_the_body_is_body_text() {
        let body = "In Jinja write `{{ user }}`, Vue uses {{#if ok}} blocks, \
                    Go has `{{.Name}}` and here is an unmatched {{ brace. Issue {{ issue_no }}.";
        let rendered = renderer().render(&issue(body), today()).unwrap();
        assert_eq!(
            rendered.markdown,
            "In Jinja write `{{ user }}`, Vue uses {{#if ok}} blocks, \
             Go has `{{.Name}}` and here is an unmatched {{ brace. Issue 3."
        );
        assert!(rendered.html.contains("<code>{{ user }}</code>"));
        assert!(rendered.html.contains("<code>{{.Name}}</code>"));
    }

    #[test]
    fn placeholder_values_are_not_rescanned() {
        let mut issue = issue("{{micro_log}}");
        issue.micro_log = "literal {{issue_no}}".to_string();
        let rendered = renderer().render(&issue, today()).unwrap();
        assert_eq!(rendered.markdown, "literal {{issue_no}}");
    }

    #[test]
    fn markdown_becomes_html_inside_layout() {
        let rendered = renderer()
            .render(&issue("# Issue {{issue_no}}\n\n~~old~~"), today())
            .unwrap();
        assert!(rendered.html.contains("<h1>Issue 3</h1>"));
        assert!(rendered.html.contains("<del>old</del>"));
        assert!(rendered.html.contains("<title>Weekly #3</title>"));
        assert!(rendered.html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn tables_are_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn empty_template_uses_default_body() {
        let rendered = renderer().render(&issue(""), today()).unwrap();
        assert!(rendered.markdown.starts_with("# Issue 3"));
        assert!(rendered.markdown.contains("(https://example.com/en/blog/hello)"));
    }
}
