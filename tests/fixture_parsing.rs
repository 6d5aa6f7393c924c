//! Parses a recorded Locales query response and reads it the way the joiner
//! does.

use notionfolio::api::parser::parse_pages_pagination;
use notionfolio::api::ApiResponse;
use notionfolio::content::{parse_article_row, parse_locale_row};
use notionfolio::{Language, PageId, PropertyValue};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;

fn locales_response() -> ApiResponse<String> {
    ApiResponse {
        data: include_str!("fixtures/locales_query.json").to_string(),
        status: StatusCode::OK,
        url: "https://api.notion.com/v1/databases/bbbb/query".to_string(),
    }
}

#[test]
fn recorded_locale_row_is_read_leniently() {
    let page = parse_pages_pagination(locales_response())
        .expect("fixture parses")
        .results
        .remove(0);

    assert_eq!(
        page.properties.get("Word_Count"),
        Some(&PropertyValue::Unsupported)
    );
    assert_eq!(
        page.properties.get("Reviewers"),
        Some(&PropertyValue::Unsupported)
    );

    let article: notionfolio::Page = serde_json::from_value(json!({
        "id": "1f2e3d4c5b6a7980a1b2c3d4e5f60718",
        "properties": {
            "Article_ID": {"type": "number", "number": 12},
            "Status": {"type": "status", "status": {"name": "Published"}}
        }
    }))
    .unwrap();
    let articles = vec![parse_article_row(&article, 1)];

    let locale = parse_locale_row(&page, &articles, 1);
    assert_eq!(locale.article_id, Some(12));
    assert_eq!(locale.language, Some(Language::En));
    assert_eq!(locale.title, "Hello, World");
    assert_eq!(locale.slug, "hello-world");
    assert_eq!(locale.summary, "A first post about greetings.");
    assert_eq!(locale.tags, vec!["intro".to_string(), "meta".to_string()]);
    assert!(locale.publish);
    assert_eq!(
        locale.relation_ids,
        vec![PageId::new("1f2e3d4c-5b6a-7980-a1b2-c3d4e5f60718")]
    );
    assert!(articles[0].is_published);
}
