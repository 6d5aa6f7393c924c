//! Post joining against an in-memory workspace: publish rules, slug lookup
//! and cache freshness.

mod common;

use common::*;
use notionfolio::{
    ArticleDatabases, BlogSource, FetchError, Language, ManualClock, ParentMatch,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(300);

fn source(notion: Arc<FakeNotion>, clock: Arc<ManualClock>) -> BlogSource {
    BlogSource::new(
        notion,
        ArticleDatabases {
            articles: db(ARTICLES_DB),
            locales: db(LOCALES_DB),
        },
        TTL,
        clock,
    )
}

fn hello_workspace(publish: bool) -> FakeNotion {
    FakeNotion::new()
        .with_rows(
            ARTICLES_DB,
            vec![article_row("a1", 1, "Published", "2024-01-01")],
        )
        .with_rows(
            LOCALES_DB,
            vec![locale_row("l1", "a1", "en", "Hello", "hello", publish)],
        )
}

fn blog_workspace() -> FakeNotion {
    FakeNotion::new()
        .with_rows(
            ARTICLES_DB,
            vec![
                article_row("a1", 1, "Published", "2024-01-01"),
                article_row("a2", 2, "Published", "2024-02-01"),
                article_row("a3", 3, "Draft", "2024-03-01"),
            ],
        )
        .with_rows(
            LOCALES_DB,
            vec![
                locale_row("l1", "a1", "en", "Hello", "hello", true),
                locale_row("l2", "a1", "es", "Hola", "hola", true),
                locale_row("l3", "a2", "en", "Second", "second-post", true),
                locale_row("l4", "a2", "zh", "第二", "second-zh", false),
                locale_row("l5", "a3", "en", "Draft", "draft-post", true),
            ],
        )
        .with_children(
            "l1",
            vec![
                paragraph("b1", "Intro", false),
                paragraph("b2", "Nested parent", true),
            ],
        )
        .with_children("b2", vec![paragraph("b3", "Nested child", false)])
}

#[tokio::test]
async fn published_article_with_published_locale_becomes_a_post() {
    let notion = Arc::new(hello_workspace(true));
    let blog = source(notion, Arc::new(ManualClock::new()));

    let posts = blog.posts(Language::En).await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].slug, "hello");
    assert_eq!(posts[0].title, "Hello");
    assert_eq!(posts[0].article_id, 1);
    assert_eq!(posts[0].tags, vec!["notes".to_string()]);
    assert_eq!(posts[0].parent_match, ParentMatch::Relation);
    assert!(posts[0].blocks.is_none());
}

#[tokio::test]
async fn unpublished_locale_hides_the_post() {
    let notion = Arc::new(hello_workspace(false));
    let blog = source(notion, Arc::new(ManualClock::new()));

    assert!(blog.posts(Language::En).await.is_empty());
}

#[tokio::test]
async fn posts_exclude_drafts_and_other_languages() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    let slugs: Vec<String> = blog
        .posts(Language::En)
        .await
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(slugs, vec!["second-post", "hello"]);

    assert!(blog.posts(Language::Zh).await.is_empty());
    assert_eq!(blog.posts(Language::Es).await.len(), 1);
}

#[tokio::test]
async fn posts_are_cached_for_the_ttl() {
    let notion = Arc::new(hello_workspace(true));
    let clock = Arc::new(ManualClock::new());
    let blog = source(notion.clone(), clock.clone());

    blog.posts(Language::En).await;
    blog.posts(Language::En).await;
    assert_eq!(notion.query_count(), 2, "one Articles + Locales pair");

    clock.advance(TTL - Duration::from_secs(1));
    blog.posts(Language::En).await;
    assert_eq!(notion.query_count(), 2);

    clock.advance(Duration::from_secs(1));
    blog.posts(Language::En).await;
    assert_eq!(notion.query_count(), 4, "stale entry triggers a fresh pair");
}

#[tokio::test]
async fn languages_are_cached_separately() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion.clone(), Arc::new(ManualClock::new()));

    blog.posts(Language::En).await;
    blog.posts(Language::Es).await;
    assert_eq!(notion.query_count(), 4);
}

#[tokio::test]
async fn post_carries_its_block_tree() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    let post = blog.post("hello", Language::En).await.expect("post exists");
    let blocks = post.blocks.expect("blocks fetched");

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].children.len(), 1);
    assert_eq!(blocks[1].children[0].plain_text(), "Nested child");
}

#[tokio::test]
async fn post_slug_matching_is_case_insensitive() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    let post = blog.post("HeLLo", Language::En).await.expect("post exists");
    assert_eq!(post.slug, "hello");
}

#[tokio::test]
async fn post_in_another_language_resolves_to_requested_language() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    let post = blog.post("hola", Language::En).await.expect("post exists");
    assert_eq!(post.slug, "hello");
    assert_eq!(post.language, Language::En);
}

#[tokio::test]
async fn post_falls_back_to_substring_match() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    let post = blog.post("second", Language::En).await.expect("post exists");
    assert_eq!(post.slug, "second-post");
}

#[tokio::test]
async fn post_of_unpublished_article_is_not_found() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    assert!(blog.post("draft-post", Language::En).await.is_none());
    assert!(blog.post("", Language::En).await.is_none());
    assert!(blog.post("no-such-post", Language::En).await.is_none());
}

#[tokio::test]
async fn successful_post_lookups_are_cached() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion.clone(), Arc::new(ManualClock::new()));

    blog.post("hello", Language::En).await;
    blog.post("HELLO", Language::En).await;
    assert_eq!(notion.query_count(), 2);

    blog.post("missing", Language::En).await;
    blog.post("missing", Language::En).await;
    assert_eq!(notion.query_count(), 6, "misses are not cached");
}

#[tokio::test]
async fn outage_is_distinguishable_from_no_content() {
    let notion = Arc::new(hello_workspace(true));
    notion.fail_queries(true);
    let blog = source(notion.clone(), Arc::new(ManualClock::new()));

    let err = blog.try_posts(Language::En).await.unwrap_err();
    assert!(err.is_outage());
    assert!(matches!(err, FetchError::Api { status: 503, .. }));

    assert!(blog.posts(Language::En).await.is_empty());
    assert!(blog.post("hello", Language::En).await.is_none());

    notion.fail_queries(false);
    assert_eq!(blog.posts(Language::En).await.len(), 1, "errors are not cached");
}

#[tokio::test]
async fn body_failure_is_reported_by_try_post() {
    let notion = Arc::new(hello_workspace(true).failing_children_of("l1"));
    let blog = source(notion, Arc::new(ManualClock::new()));

    assert!(blog.try_post("hello", Language::En).await.is_err());
    assert!(blog.post("hello", Language::En).await.is_none());
}

#[tokio::test]
async fn diagnostics_count_rows() {
    let notion = Arc::new(blog_workspace());
    let blog = source(notion, Arc::new(ManualClock::new()));

    let report = blog.diagnostics(Language::Zh).await.unwrap();
    assert_eq!(report.articles, 3);
    assert_eq!(report.locale_rows, 5);
    assert_eq!(report.locale_rows_in_language, 1);
    assert_eq!(report.unpublished_locale, vec![2]);
    assert_eq!(report.missing_locale, vec![1]);
}
