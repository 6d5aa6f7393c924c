//! Shared fixtures: in-memory Notion workspace and email provider, plus
//! builders for Notion-shaped page JSON.

#![allow(dead_code)]

use notionfolio::error::NotionErrorCode;
use notionfolio::{
    AppError, Block, Broadcast, DatabaseId, DatabaseQuery, EmailProvider, NotionRepository,
    Page, PageId,
};
use notionfolio::types::BlockId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const ARTICLES_DB: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const LOCALES_DB: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const FEATURES_DB: &str = "cccccccccccccccccccccccccccccccc";
pub const FEATURE_LOCALES_DB: &str = "dddddddddddddddddddddddddddddddd";
pub const ISSUES_DB: &str = "eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

pub fn db(id: &str) -> DatabaseId {
    DatabaseId::new(id)
}

fn service_error(code: NotionErrorCode, message: &str, status: u16) -> AppError {
    AppError::NotionService {
        code,
        message: message.to_string(),
        status: reqwest::StatusCode::from_u16(status).unwrap(),
    }
}

/// A Notion workspace held in memory.
#[derive(Default)]
pub struct FakeNotion {
    databases: Mutex<HashMap<String, Vec<Page>>>,
    pages: Mutex<HashMap<String, Page>>,
    children: Mutex<HashMap<String, Vec<Block>>>,
    failing_children: Mutex<HashSet<String>>,
    fail_queries: AtomicBool,
    fail_updates: AtomicBool,
    queries: AtomicUsize,
    updates: Mutex<Vec<(PageId, Value)>>,
}

impl FakeNotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows to a database; each row is also retrievable as a page.
    pub fn with_rows(self, database: &str, rows: Vec<Value>) -> Self {
        let pages: Vec<Page> = rows.into_iter().map(page).collect();
        for p in &pages {
            self.pages.lock().insert(p.id.as_str().to_string(), p.clone());
        }
        self.databases
            .lock()
            .entry(db(database).as_str().to_string())
            .or_default()
            .extend(pages);
        self
    }

    /// Adds a standalone page.
    pub fn with_page(self, value: Value) -> Self {
        let p = page(value);
        self.pages.lock().insert(p.id.as_str().to_string(), p);
        self
    }

    pub fn with_children(self, parent: &str, blocks: Vec<Value>) -> Self {
        let blocks = blocks
            .into_iter()
            .map(|b| serde_json::from_value(b).expect("fixture block decodes"))
            .collect();
        self.children
            .lock()
            .insert(PageId::new(parent).as_str().to_string(), blocks);
        self
    }

    pub fn failing_children_of(self, parent: &str) -> Self {
        self.failing_children
            .lock()
            .insert(PageId::new(parent).as_str().to_string());
        self
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of database queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<(PageId, Value)> {
        self.updates.lock().clone()
    }
}

#[async_trait::async_trait]
impl NotionRepository for FakeNotion {
    async fn query_database(
        &self,
        database: &DatabaseId,
        _query: &DatabaseQuery,
    ) -> Result<Vec<Page>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(service_error(
                NotionErrorCode::ServiceUnavailable,
                "Notion is down",
                503,
            ));
        }
        self.databases
            .lock()
            .get(database.as_str())
            .cloned()
            .ok_or_else(|| {
                service_error(
                    NotionErrorCode::ObjectNotFound,
                    &format!("database {}", database),
                    404,
                )
            })
    }

    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError> {
        self.pages.lock().get(id.as_str()).cloned().ok_or_else(|| {
            service_error(NotionErrorCode::ObjectNotFound, &format!("page {}", id), 404)
        })
    }

    async fn update_page(&self, id: &PageId, properties: Value) -> Result<Page, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(service_error(
                NotionErrorCode::ValidationFailed,
                "Status is not a property that exists",
                400,
            ));
        }
        self.updates.lock().push((id.clone(), properties));
        self.retrieve_page(id).await
    }

    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError> {
        if self.failing_children.lock().contains(parent.as_str()) {
            return Err(service_error(
                NotionErrorCode::InternalError,
                "Unexpected error",
                500,
            ));
        }
        Ok(self
            .children
            .lock()
            .get(parent.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Records broadcasts instead of mailing anyone.
#[derive(Default)]
pub struct FakeEmail {
    created: Mutex<Vec<Broadcast>>,
    sent: Mutex<Vec<String>>,
}

impl FakeEmail {
    pub fn created(&self) -> Vec<Broadcast> {
        self.created.lock().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait::async_trait]
impl EmailProvider for FakeEmail {
    async fn create_broadcast(&self, broadcast: &Broadcast) -> Result<String, AppError> {
        let mut created = self.created.lock();
        created.push(broadcast.clone());
        Ok(format!("bc_{}", created.len()))
    }

    async fn send_broadcast(&self, broadcast_id: &str) -> Result<(), AppError> {
        self.sent.lock().push(broadcast_id.to_string());
        Ok(())
    }
}

// --- Page JSON builders ---

pub fn page(value: Value) -> Page {
    serde_json::from_value(value).expect("fixture page decodes")
}

pub fn title(text: &str) -> Value {
    json!({"type": "title", "title": [{"plain_text": text}]})
}

pub fn rich_text(text: &str) -> Value {
    json!({"type": "rich_text", "rich_text": [{"plain_text": text}]})
}

pub fn select(name: &str) -> Value {
    json!({"type": "select", "select": {"name": name}})
}

pub fn number(n: i64) -> Value {
    json!({"type": "number", "number": n})
}

pub fn date(start: &str) -> Value {
    json!({"type": "date", "date": {"start": start}})
}

pub fn checkbox(value: bool) -> Value {
    json!({"type": "checkbox", "checkbox": value})
}

pub fn relation(ids: &[&str]) -> Value {
    let refs: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    json!({"type": "relation", "relation": refs})
}

pub fn formula_string(text: &str) -> Value {
    json!({"type": "formula", "formula": {"type": "string", "string": text}})
}

pub fn article_row(id: &str, article_id: i64, status: &str, day: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "properties": {
            "Name": title(&format!("Article {}", article_id)),
            "Article_ID": number(article_id),
            "Status": select(status),
            "Date": date(day)
        }
    })
}

pub fn locale_row(id: &str, article: &str, lang: &str, text: &str, slug: &str, publish: bool) -> Value {
    json!({
        "object": "page",
        "id": id,
        "properties": {
            "Title": title(text),
            "Article_ID": relation(&[article]),
            "Lang": select(lang),
            "Slug": rich_text(slug),
            "Summary": rich_text(&format!("About {}", text)),
            "Tags": {"type": "multi_select", "multi_select": [{"name": "notes"}]},
            "Publish": checkbox(publish)
        }
    })
}

pub fn paragraph(id: &str, text: &str, has_children: bool) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "paragraph",
        "has_children": has_children,
        "paragraph": {"rich_text": [{"plain_text": text}]}
    })
}
