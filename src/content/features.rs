//! Feature cards: a Features database joined with a Feature Locales database,
//! the same way posts are joined, without bodies or slug heuristics.

use super::error::FetchError;
use crate::api::{DatabaseQuery, NotionRepository};
use crate::cache::{Clock, TtlCache};
use crate::constants::{property, DEFAULT_FEATURE_ORDER};
use crate::error::AppError;
use crate::extract;
use crate::model::{Feature, Page};
use crate::types::{DatabaseId, Language, PageId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FeatureDatabases {
    pub features: DatabaseId,
    pub locales: DatabaseId,
}

#[derive(Debug, Clone, PartialEq)]
struct FeatureRow {
    page_id: PageId,
    feature_id: u32,
    slug: String,
    icon: String,
    order: i64,
    link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct FeatureLocaleRow {
    feature_id: Option<u32>,
    language: Option<Language>,
    title: String,
    summary: String,
}

fn parse_feature_row(page: &Page, position: usize) -> FeatureRow {
    let props = &page.properties;
    let feature_id = extract::number(props, property::FEATURE_ID)
        .filter(|n| n.is_finite() && n.fract() == 0.0 && *n >= 0.0)
        .map(|n| n as u32)
        .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX));

    let slug = match extract::text(props, property::SLUG).trim() {
        "" => extract::slugify(&extract::page_title(props)),
        explicit => explicit.to_string(),
    };

    let icon = match extract::text(props, property::ICON).trim() {
        "" => page
            .icon
            .as_ref()
            .map(|icon| icon.as_display().to_string())
            .unwrap_or_default(),
        explicit => explicit.to_string(),
    };

    let order = extract::number(props, property::ORDER)
        .filter(|n| n.is_finite())
        .map(|n| n as i64)
        .unwrap_or(DEFAULT_FEATURE_ORDER);

    FeatureRow {
        page_id: page.id.clone(),
        feature_id,
        slug,
        icon,
        order,
        link: extract::url(props, property::LINK),
    }
}

/// The locale side accepts its foreign key as a relation to a Features
/// page or as a plain number.
fn parse_feature_locale(page: &Page, features: &[FeatureRow]) -> FeatureLocaleRow {
    let props = &page.properties;
    let feature_id = extract::relation_ids(props, property::FEATURE_ID)
        .iter()
        .find_map(|id| features.iter().find(|f| &f.page_id == id))
        .map(|feature| feature.feature_id)
        .or_else(|| {
            extract::number(props, property::FEATURE_ID)
                .filter(|n| n.is_finite() && n.fract() == 0.0 && *n >= 0.0)
                .map(|n| n as u32)
        });

    let title = match extract::text(props, property::TITLE) {
        t if t.trim().is_empty() => extract::page_title(props),
        t => t,
    };

    FeatureLocaleRow {
        feature_id,
        language: Language::from_tag(&extract::select(props, property::LANG)),
        title,
        summary: extract::full_text(props, property::SUMMARY),
    }
}

/// Joins parsed feature pages for one language, ordered by `Order`.
pub fn join_features(
    feature_pages: &[Page],
    locale_pages: &[Page],
    language: Language,
) -> Vec<Feature> {
    let rows: Vec<FeatureRow> = feature_pages
        .iter()
        .enumerate()
        .map(|(i, page)| parse_feature_row(page, i + 1))
        .collect();

    let mut locales: HashMap<u32, FeatureLocaleRow> = HashMap::new();
    for page in locale_pages {
        let locale = parse_feature_locale(page, &rows);
        match (locale.feature_id, locale.language) {
            (Some(id), Some(lang)) if lang == language => {
                locales.entry(id).or_insert(locale);
            }
            _ => {}
        }
    }

    let mut features: Vec<Feature> = rows
        .into_iter()
        .filter_map(|row| {
            let Some(locale) = locales.get(&row.feature_id) else {
                log::debug!("Feature {} has no '{}' locale row", row.feature_id, language);
                return None;
            };
            Some(Feature {
                page_id: row.page_id,
                feature_id: row.feature_id,
                slug: row.slug,
                icon: row.icon,
                order: row.order,
                language,
                title: locale.title.clone(),
                summary: locale.summary.clone(),
                link: row.link,
            })
        })
        .collect();

    features.sort_by_key(|feature| feature.order);
    features
}

/// Cached access to the feature cards.
pub struct FeatureSource {
    notion: Arc<dyn NotionRepository>,
    databases: FeatureDatabases,
    cache: TtlCache<Vec<Feature>>,
}

impl FeatureSource {
    pub fn new(
        notion: Arc<dyn NotionRepository>,
        databases: FeatureDatabases,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notion,
            databases,
            cache: TtlCache::new(ttl, clock),
        }
    }

    pub async fn try_features(&self, language: Language) -> Result<Vec<Feature>, FetchError> {
        let key = format!("features_{}", language);
        if let Some(features) = self.cache.get(&key) {
            return Ok(features);
        }

        let features = self.load(language).await?;
        log::info!("Loaded {} features for '{}'", features.len(), language);

        self.cache.insert(key, features.clone());
        Ok(features)
    }

    /// Like [`Self::try_features`], but an upstream failure reads as "no
    /// features".
    pub async fn features(&self, language: Language) -> Vec<Feature> {
        self.try_features(language).await.unwrap_or_else(|e| {
            log::error!("Failed to load features for '{}': {}", language, e);
            Vec::new()
        })
    }

    async fn load(&self, language: Language) -> Result<Vec<Feature>, AppError> {
        let query = DatabaseQuery::all();
        let feature_pages = self
            .notion
            .query_database(&self.databases.features, &query)
            .await?;
        let locale_pages = self
            .notion
            .query_database(&self.databases.locales, &query)
            .await?;
        Ok(join_features(&feature_pages, &locale_pages, language))
    }
}
