mod common;

use common::*;
use notionfolio::content::count_blocks;
use notionfolio::{fetch_block_tree, PageId};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn nested_children_are_attached_depth_first() {
    let notion = FakeNotion::new()
        .with_children(
            "page",
            vec![paragraph("b1", "one", true), paragraph("b2", "two", false)],
        )
        .with_children("b1", vec![paragraph("b11", "one.one", true)])
        .with_children("b11", vec![paragraph("b111", "one.one.one", false)]);

    let blocks = fetch_block_tree(&notion, &PageId::new("page")).await.unwrap();

    assert_eq!(count_blocks(&blocks), 4);
    assert_eq!(blocks[0].children[0].children[0].plain_text(), "one.one.one");
    assert!(blocks[1].children.is_empty());
}

#[tokio::test]
async fn nested_failure_degrades_to_empty_children() {
    let notion = FakeNotion::new()
        .with_children(
            "page",
            vec![paragraph("b1", "broken", true), paragraph("b2", "fine", true)],
        )
        .with_children("b2", vec![paragraph("b21", "child", false)])
        .failing_children_of("b1");

    let blocks = fetch_block_tree(&notion, &PageId::new("page")).await.unwrap();

    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].children.is_empty());
    assert_eq!(blocks[1].children.len(), 1);
}

#[tokio::test]
async fn top_level_failure_is_an_error() {
    let notion = FakeNotion::new().failing_children_of("page");

    let err = fetch_block_tree(&notion, &PageId::new("page"))
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
}
