//! Site content assembled from Notion: posts, their bodies, and feature
//! cards.

mod blocks;
mod error;
mod features;
mod posts;

pub use blocks::{count_blocks, fetch_block_tree};
pub use error::FetchError;
pub use features::{join_features, FeatureDatabases, FeatureSource};
pub use posts::{
    parse_article_row, parse_locale_row, ArticleDatabases, BlogSource, ContentTables,
    JoinDiagnostics,
};
