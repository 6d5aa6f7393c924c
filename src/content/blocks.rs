//! Recursive block tree retrieval for a page body.

use crate::api::NotionRepository;
use crate::error::AppError;
use crate::model::Block;
use crate::types::PageId;
use futures::future::{BoxFuture, FutureExt};

/// Fetches a page's blocks and, depth-first, every nested child list.
///
/// Failing to list the page itself is an error. Failing to list a nested
/// block's children leaves that block with no children and moves on.
pub async fn fetch_block_tree(
    notion: &dyn NotionRepository,
    page: &PageId,
) -> Result<Vec<Block>, AppError> {
    let mut blocks = notion.retrieve_children(&page.cast()).await?;
    attach_children(notion, &mut blocks).await;
    Ok(blocks)
}

fn attach_children<'a>(
    notion: &'a dyn NotionRepository,
    blocks: &'a mut [Block],
) -> BoxFuture<'a, ()> {
    async move {
        for block in blocks.iter_mut().filter(|b| b.has_children) {
            match notion.retrieve_children(&block.id).await {
                Ok(mut children) => {
                    attach_children(notion, &mut children).await;
                    block.children = children;
                }
                Err(e) => {
                    log::warn!(
                        "Could not fetch children of {} block {}: {}",
                        block.block_type,
                        block.id,
                        e
                    );
                    block.children = Vec::new();
                }
            }
        }
    }
    .boxed()
}

/// Total number of blocks in a tree, nested ones included.
pub fn count_blocks(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| 1 + count_blocks(&block.children))
        .sum()
}
