// src/api/mod.rs
//! Notion API interaction: the ability to read and update rows in a
//! workspace.
//!
//! Business logic depends on [`NotionRepository`], never on HTTP details,
//! so the joiners and the newsletter sender run against in-memory fakes in
//! tests and against [`NotionHttpClient`] in production.

pub mod client;
pub mod parser;
mod simple_pagination;
pub mod types;

use crate::error::AppError;
use crate::model::{Block, Page};
use crate::types::{BlockId, DatabaseId, PageId};

pub use client::{ApiResponse, NotionHttpClient};
pub use types::{DatabaseQuery, PaginatedResponse, SortDirection};

/// The ability to read and update content in one Notion workspace.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    /// All rows of a database matching `query`, across every result page.
    async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<Vec<Page>, AppError>;

    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError>;

    /// Patches page properties; `properties` is the Notion property payload.
    async fn update_page(
        &self,
        id: &PageId,
        properties: serde_json::Value,
    ) -> Result<Page, AppError>;

    /// Immediate children of a block (or page), across every result page.
    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError>;
}
