//! Joins the Articles database (language-independent facts) with the
//! Locales database (one row per article and language) into posts.
//!
//! The foreign key from a locale row to its article is not stored
//! consistently: some rows use a Notion relation, some a duplicated numeric
//! `Article_ID`, some only carry the number at the start of their title.
//! Every variant is accepted.

use super::blocks::fetch_block_tree;
use super::error::FetchError;
use crate::api::{DatabaseQuery, NotionRepository, SortDirection};
use crate::cache::{Clock, TtlCache};
use crate::constants::{property, PUBLISHED_STATUS};
use crate::error::AppError;
use crate::extract;
use crate::model::{ArticleRow, JoinedPost, LocaleRow, Page, ParentMatch};
use crate::types::{DatabaseId, Language, PageId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// The two databases a blog is assembled from.
#[derive(Debug, Clone)]
pub struct ArticleDatabases {
    pub articles: DatabaseId,
    pub locales: DatabaseId,
}

/// Reads one Articles row. `position` is the 1-based index of the row in
/// its query result, the last-resort article id.
pub fn parse_article_row(page: &Page, position: usize) -> ArticleRow {
    let props = &page.properties;
    let status = extract::select(props, property::STATUS);
    let cover = page
        .cover
        .as_ref()
        .map(|c| c.url().to_string())
        .or_else(|| extract::url(props, property::COVER));
    let title = non_empty_or(extract::text(props, property::TITLE), || {
        extract::page_title(props)
    });

    ArticleRow {
        page_id: page.id.clone(),
        article_id: extract::resolve_article_id(props, position),
        date: extract::date(props, property::DATE),
        cover,
        is_published: status == PUBLISHED_STATUS,
        status,
        manual_slug: extract::text(props, property::MANUAL_SLUG).trim().to_string(),
        title,
    }
}

/// Reads one Locales row, resolving its article through a relation to a
/// known Articles page, else the numeric `Article_ID`, else the leading
/// digits of its title.
pub fn parse_locale_row(page: &Page, articles: &[ArticleRow], position: usize) -> LocaleRow {
    let props = &page.properties;
    let relation_ids = extract::relation_ids(props, property::ARTICLE_ID);
    let title = non_empty_or(extract::text(props, property::TITLE), || {
        extract::page_title(props)
    });

    let article_id = relation_ids
        .iter()
        .find_map(|id| articles.iter().find(|a| &a.page_id == id))
        .map(|article| article.article_id)
        .or_else(|| extract::article_id_number(props))
        .or_else(|| extract::leading_number(&title));

    let fallback_id = article_id.unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX));

    LocaleRow {
        page_id: page.id.clone(),
        article_id,
        relation_ids,
        language: Language::from_tag(&extract::select(props, property::LANG)),
        slug: extract::resolve_slug(props, &title, fallback_id),
        summary: extract::full_text(props, property::SUMMARY),
        tags: extract::tags(props, property::TAGS),
        publish: extract::checkbox(props, property::PUBLISH),
        title,
    }
}

fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value
    }
}

/// Both tables, parsed.
#[derive(Debug, Clone, Default)]
pub struct ContentTables {
    /// Newest first.
    pub articles: Vec<ArticleRow>,
    pub locales: Vec<LocaleRow>,
}

impl ContentTables {
    pub fn from_pages(article_pages: &[Page], locale_pages: &[Page]) -> Self {
        let mut articles: Vec<ArticleRow> = article_pages
            .iter()
            .enumerate()
            .map(|(i, page)| parse_article_row(page, i + 1))
            .collect();
        articles.sort_by(|a, b| b.date.cmp(&a.date));

        let locales = locale_pages
            .iter()
            .enumerate()
            .map(|(i, page)| parse_locale_row(page, &articles, i + 1))
            .collect();

        Self { articles, locales }
    }

    /// Locale row per (article id, language). A published row displaces an
    /// unpublished one; otherwise the first row wins.
    fn locale_index(&self) -> HashMap<(u32, Language), &LocaleRow> {
        let mut index: HashMap<(u32, Language), &LocaleRow> = HashMap::new();
        for locale in &self.locales {
            let (Some(article_id), Some(language)) = (locale.article_id, locale.language) else {
                continue;
            };
            index
                .entry((article_id, language))
                .and_modify(|existing| {
                    if !existing.publish && locale.publish {
                        *existing = locale;
                    }
                })
                .or_insert(locale);
        }
        index
    }

    /// Every post visible in `language`, newest first.
    pub fn join(&self, language: Language) -> Vec<JoinedPost> {
        let locales = self.locale_index();
        let mut emitted = HashSet::new();
        let mut posts = Vec::new();

        for article in self.articles.iter().filter(|a| a.is_published) {
            if !emitted.insert(article.article_id) {
                continue;
            }
            let Some(locale) = locales.get(&(article.article_id, language)) else {
                continue;
            };
            if !locale.publish {
                continue;
            }
            let mut post = JoinedPost::from_rows(article, locale, language);
            if locale.relation_ids.contains(&article.page_id) {
                post.parent_match = ParentMatch::Relation;
            }
            posts.push(post);
        }

        posts
    }

    /// Picks the locale row a slug refers to, trying progressively looser
    /// matches among published rows.
    pub fn find_locale(&self, slug: &str, language: Language) -> Option<&LocaleRow> {
        let wanted = slug.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let candidates: Vec<&LocaleRow> = self.locales.iter().filter(|l| l.publish).collect();

        let exact = candidates
            .iter()
            .find(|l| l.language == Some(language) && l.slug.to_lowercase() == wanted)
            .copied();
        if let Some(locale) = exact {
            return Some(locale);
        }

        let any_language = candidates
            .iter()
            .find(|l| l.slug.to_lowercase() == wanted)
            .copied();
        if let Some(other) = any_language {
            let sibling = candidates.iter().find(|l| {
                l.language == Some(language)
                    && (l.relation_ids.iter().any(|id| other.relation_ids.contains(id))
                        || (other.article_id.is_some() && l.article_id == other.article_id))
            })
            .copied();
            return Some(sibling.unwrap_or(other));
        }

        candidates
            .iter()
            .find(|l| {
                let candidate = l.slug.to_lowercase();
                l.language == Some(language)
                    && !candidate.is_empty()
                    && (candidate.contains(&wanted) || wanted.contains(&candidate))
            })
            .copied()
    }

    /// Locates the article a locale row belongs to.
    ///
    /// Relation, article id, manual slug and title equality are reliable.
    /// Title word overlap and "newest article" are guesses that can attach
    /// content to the wrong article; they are reported through the returned
    /// [`ParentMatch`] and logged.
    pub fn find_parent(&self, locale: &LocaleRow) -> Option<(&ArticleRow, ParentMatch)> {
        if let Some(article) = self
            .articles
            .iter()
            .find(|a| locale.relation_ids.contains(&a.page_id))
        {
            return Some((article, ParentMatch::Relation));
        }

        if let Some(article_id) = locale.article_id {
            if let Some(article) = self.articles.iter().find(|a| a.article_id == article_id) {
                return Some((article, ParentMatch::ArticleId));
            }
        }

        if let Some(article) = self
            .articles
            .iter()
            .find(|a| !a.manual_slug.is_empty() && a.manual_slug.eq_ignore_ascii_case(&locale.slug))
        {
            return Some((article, ParentMatch::ManualSlug));
        }

        let locale_title = normalize_title(&locale.title);
        if !locale_title.is_empty() {
            if let Some(article) = self
                .articles
                .iter()
                .find(|a| normalize_title(&a.title) == locale_title)
            {
                return Some((article, ParentMatch::Title));
            }
        }

        let mut best: Option<(&ArticleRow, usize)> = None;
        for article in self.articles.iter().filter(|a| a.is_published) {
            let score = title_overlap(&article.title, &locale.title);
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((article, score));
            }
        }
        if let Some((article, score)) = best {
            log::warn!(
                "Locale row {} ('{}') attached to article {} by title overlap (score {})",
                locale.page_id,
                locale.title,
                article.article_id,
                score
            );
            return Some((article, ParentMatch::TitleOverlap));
        }

        let first = self.articles.first()?;
        log::warn!(
            "Locale row {} ('{}') has no resolvable parent; using newest article {}",
            locale.page_id,
            locale.title,
            first.article_id
        );
        Some((first, ParentMatch::FirstArticle))
    }

    /// Join bookkeeping for one language.
    pub fn diagnostics(&self, language: Language) -> JoinDiagnostics {
        let locales = self.locale_index();
        let mut missing_locale = Vec::new();
        let mut unpublished_locale = Vec::new();

        for article in self.articles.iter().filter(|a| a.is_published) {
            match locales.get(&(article.article_id, language)) {
                None => missing_locale.push(article.article_id),
                Some(locale) if !locale.publish => unpublished_locale.push(article.article_id),
                Some(_) => {}
            }
        }

        JoinDiagnostics {
            language,
            articles: self.articles.len(),
            published_articles: self.articles.iter().filter(|a| a.is_published).count(),
            locale_rows: self.locales.len(),
            locale_rows_in_language: self
                .locales
                .iter()
                .filter(|l| l.language == Some(language))
                .count(),
            joined_posts: self.join(language).len(),
            unresolved_locale_rows: self
                .locales
                .iter()
                .filter(|l| l.article_id.is_none() || l.language.is_none())
                .map(|l| l.page_id.clone())
                .collect(),
            missing_locale,
            unpublished_locale,
        }
    }
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn title_words(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn title_overlap(a: &str, b: &str) -> usize {
    let left = title_words(a);
    let right = title_words(b);
    left.intersection(&right).count()
}

/// What the join did for one language, for the debug command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinDiagnostics {
    pub language: Language,
    pub articles: usize,
    pub published_articles: usize,
    pub locale_rows: usize,
    pub locale_rows_in_language: usize,
    pub joined_posts: usize,
    /// Locale rows without a resolvable article id or language.
    pub unresolved_locale_rows: Vec<PageId>,
    /// Published articles with no locale row in this language.
    pub missing_locale: Vec<u32>,
    /// Published articles whose locale row in this language is unpublished.
    pub unpublished_locale: Vec<u32>,
}

/// Cached access to the blog's posts.
pub struct BlogSource {
    notion: Arc<dyn NotionRepository>,
    databases: ArticleDatabases,
    posts_cache: TtlCache<Vec<JoinedPost>>,
    post_cache: TtlCache<JoinedPost>,
}

impl BlogSource {
    pub fn new(
        notion: Arc<dyn NotionRepository>,
        databases: ArticleDatabases,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notion,
            databases,
            posts_cache: TtlCache::new(ttl, clock.clone()),
            post_cache: TtlCache::new(ttl, clock),
        }
    }

    /// Queries and parses both tables. Articles are requested newest first.
    pub async fn load_tables(&self) -> Result<ContentTables, AppError> {
        let article_query = DatabaseQuery::all().sorted_by(property::DATE, SortDirection::Descending);
        let article_pages = self
            .notion
            .query_database(&self.databases.articles, &article_query)
            .await?;
        let locale_pages = self
            .notion
            .query_database(&self.databases.locales, &DatabaseQuery::all())
            .await?;

        log::debug!(
            "Loaded {} article rows and {} locale rows",
            article_pages.len(),
            locale_pages.len()
        );
        Ok(ContentTables::from_pages(&article_pages, &locale_pages))
    }

    /// Posts visible in `language`, newest first.
    pub async fn try_posts(&self, language: Language) -> Result<Vec<JoinedPost>, FetchError> {
        let key = format!("posts_{}", language);
        if let Some(posts) = self.posts_cache.get(&key) {
            return Ok(posts);
        }

        let tables = self.load_tables().await?;
        let posts = tables.join(language);
        log::info!("Joined {} posts for '{}'", posts.len(), language);

        self.posts_cache.insert(key, posts.clone());
        Ok(posts)
    }

    /// Like [`Self::try_posts`], but an upstream failure reads as "no posts".
    pub async fn posts(&self, language: Language) -> Vec<JoinedPost> {
        self.try_posts(language).await.unwrap_or_else(|e| {
            log::error!("Failed to load posts for '{}': {}", language, e);
            Vec::new()
        })
    }

    /// One post by slug, with its block tree.
    pub async fn try_post(
        &self,
        slug: &str,
        language: Language,
    ) -> Result<Option<JoinedPost>, FetchError> {
        let wanted = slug.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(None);
        }

        let key = format!("post_{}_{}", language, wanted);
        if let Some(post) = self.post_cache.get(&key) {
            return Ok(Some(post));
        }

        let tables = self.load_tables().await?;
        let Some(locale) = tables.find_locale(&wanted, language) else {
            log::info!("No post matches slug '{}' in '{}'", slug, language);
            return Ok(None);
        };

        let Some(post) = self.materialize(&tables, locale, language).await? else {
            return Ok(None);
        };

        self.post_cache.insert(key, post.clone());
        Ok(Some(post))
    }

    /// Like [`Self::try_post`], but an upstream failure reads as "not found".
    pub async fn post(&self, slug: &str, language: Language) -> Option<JoinedPost> {
        self.try_post(slug, language).await.unwrap_or_else(|e| {
            log::error!("Failed to load post '{}' for '{}': {}", slug, language, e);
            None
        })
    }

    pub async fn diagnostics(&self, language: Language) -> Result<JoinDiagnostics, FetchError> {
        let tables = self.load_tables().await?;
        Ok(tables.diagnostics(language))
    }

    async fn materialize(
        &self,
        tables: &ContentTables,
        locale: &LocaleRow,
        requested: Language,
    ) -> Result<Option<JoinedPost>, AppError> {
        let Some((article, parent_match)) = tables.find_parent(locale) else {
            log::warn!("No articles to attach locale row {} to", locale.page_id);
            return Ok(None);
        };
        if !article.is_published {
            log::info!(
                "Article {} for slug '{}' is not published (status '{}')",
                article.article_id,
                locale.slug,
                article.status
            );
            return Ok(None);
        }

        let blocks = fetch_block_tree(self.notion.as_ref(), &locale.page_id).await?;
        log::debug!(
            "Fetched {} blocks for '{}'",
            super::blocks::count_blocks(&blocks),
            locale.slug
        );

        let language = locale.language.unwrap_or(requested);
        let mut post = JoinedPost::from_rows(article, locale, language);
        post.blocks = Some(blocks);
        post.parent_match = parent_match;
        Ok(Some(post))
    }
}
