use super::Block;
use crate::types::{Language, PageId};
use chrono::NaiveDate;
use serde::Serialize;

/// Language-independent article facts from the Articles database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRow {
    pub page_id: PageId,
    pub article_id: u32,
    pub date: Option<NaiveDate>,
    pub cover: Option<String>,
    pub status: String,
    pub is_published: bool,
    /// Manually authored slug, when the article row carries one.
    pub manual_slug: String,
    /// Title as written on the article row, used only to locate parents.
    pub title: String,
}

/// One language variant of an article, from the Locales database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocaleRow {
    pub page_id: PageId,
    /// Resolved parent article id, when any strategy produced one.
    pub article_id: Option<u32>,
    /// Raw relation targets, kept for backlink matching.
    pub relation_ids: Vec<PageId>,
    pub language: Option<Language>,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub publish: bool,
}

/// How the parent article of a locale row was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentMatch {
    Relation,
    ArticleId,
    ManualSlug,
    Title,
    /// Best word overlap between titles. A guess.
    TitleOverlap,
    /// Nothing matched; the newest article was used. A guess.
    FirstArticle,
}

impl ParentMatch {
    /// Whether the match is a heuristic that may attach the wrong article.
    pub fn is_heuristic(&self) -> bool {
        matches!(self, ParentMatch::TitleOverlap | ParentMatch::FirstArticle)
    }
}

/// An article merged with one of its language variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedPost {
    pub article_page_id: PageId,
    pub locale_page_id: PageId,
    pub article_id: u32,
    pub language: Language,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub date: Option<NaiveDate>,
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    pub parent_match: ParentMatch,
}

impl JoinedPost {
    pub fn from_rows(article: &ArticleRow, locale: &LocaleRow, language: Language) -> Self {
        Self {
            article_page_id: article.page_id.clone(),
            locale_page_id: locale.page_id.clone(),
            article_id: article.article_id,
            language,
            title: locale.title.clone(),
            slug: locale.slug.clone(),
            summary: locale.summary.clone(),
            tags: locale.tags.clone(),
            date: article.date,
            cover: article.cover.clone(),
            blocks: None,
            parent_match: ParentMatch::ArticleId,
        }
    }
}

/// A feature card merged with its language variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub page_id: PageId,
    pub feature_id: u32,
    pub slug: String,
    pub icon: String,
    pub order: i64,
    pub language: Language,
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}
