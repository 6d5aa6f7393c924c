// src/extract.rs
//! Field extraction from loosely-typed Notion property bags.
//!
//! Every extractor is total: a missing property, a property of an unexpected
//! type, or an empty value yields the default (`""`, `[]`, `None`, `false`)
//! instead of an error. The fallback chains here absorb years of schema drift
//! in the source databases (fields renamed, retyped, duplicated by hand), so
//! each step of a chain is load-bearing for some set of real rows.

use crate::constants::property;
use crate::model::{FormulaValue, PropertyBag, PropertyValue, RichText, RollupValue};
use crate::types::PageId;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("slug character regex is valid"));
static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("hyphen regex is valid"));

fn first_plain_text(items: &[RichText]) -> String {
    items
        .first()
        .map(|item| item.plain_text.clone())
        .unwrap_or_default()
}

fn joined_plain_text(items: &[RichText]) -> String {
    items.iter().map(|item| item.plain_text.as_str()).collect()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// First segment of a title-typed property.
pub fn title(props: &PropertyBag, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::Title { title }) => first_plain_text(title),
        _ => String::new(),
    }
}

/// First segment of a rich-text property.
pub fn rich_text(props: &PropertyBag, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::RichText { rich_text }) => first_plain_text(rich_text),
        _ => String::new(),
    }
}

/// First segment of whatever text-like property sits under `name`: title,
/// rich text, or a string formula.
pub fn text(props: &PropertyBag, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::Title { title }) => first_plain_text(title),
        Some(PropertyValue::RichText { rich_text }) => first_plain_text(rich_text),
        Some(PropertyValue::Formula {
            formula: FormulaValue::String { string },
        }) => string.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

/// All segments of a title or rich-text property, concatenated.
///
/// Notion splits long text into several segments; anything that may exceed
/// one segment (a Markdown body, for instance) must be read with this.
pub fn full_text(props: &PropertyBag, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::Title { title }) => joined_plain_text(title),
        Some(PropertyValue::RichText { rich_text }) => joined_plain_text(rich_text),
        _ => String::new(),
    }
}

/// The row's title, whatever the title property is called.
pub fn page_title(props: &PropertyBag) -> String {
    props
        .iter()
        .find_map(|(_, value)| match value {
            PropertyValue::Title { title } => Some(first_plain_text(title)),
            _ => None,
        })
        .unwrap_or_default()
}

/// Select value, falling back to a status value, then to the same name read
/// as a title field (some environments store the language as the title).
pub fn select(props: &PropertyBag, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::Select {
            select: Some(option),
        }) => option.name.clone(),
        Some(PropertyValue::Status {
            status: Some(option),
        }) => option.name.clone(),
        Some(PropertyValue::Title { title }) => first_plain_text(title),
        _ => String::new(),
    }
}

/// Tags from a multi-select, or from a comma-separated rich-text string.
pub fn tags(props: &PropertyBag, name: &str) -> Vec<String> {
    match props.get(name) {
        Some(PropertyValue::MultiSelect { multi_select }) => multi_select
            .iter()
            .map(|option| option.name.clone())
            .filter(|name| !name.is_empty())
            .collect(),
        Some(PropertyValue::RichText { rich_text }) => joined_plain_text(rich_text)
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn checkbox(props: &PropertyBag, name: &str) -> bool {
    match props.get(name) {
        Some(PropertyValue::Checkbox { checkbox }) => *checkbox,
        Some(PropertyValue::Formula {
            formula: FormulaValue::Boolean { boolean },
        }) => boolean.unwrap_or(false),
        _ => false,
    }
}

pub fn number(props: &PropertyBag, name: &str) -> Option<f64> {
    match props.get(name) {
        Some(PropertyValue::Number { number }) => *number,
        Some(PropertyValue::Formula {
            formula: FormulaValue::Number { number },
        }) => *number,
        Some(PropertyValue::Rollup {
            rollup: RollupValue::Number { number },
        }) => *number,
        _ => None,
    }
}

/// Start date of a date, date formula, or date rollup property.
pub fn date(props: &PropertyBag, name: &str) -> Option<NaiveDate> {
    let value = match props.get(name) {
        Some(PropertyValue::Date { date }) => date.as_ref(),
        Some(PropertyValue::Formula {
            formula: FormulaValue::Date { date },
        }) => date.as_ref(),
        Some(PropertyValue::Rollup {
            rollup: RollupValue::Date { date },
        }) => date.as_ref(),
        _ => None,
    };
    value.and_then(|d| d.start_date())
}

pub fn relation_ids(props: &PropertyBag, name: &str) -> Vec<PageId> {
    match props.get(name) {
        Some(PropertyValue::Relation { relation }) => {
            relation.iter().map(|r| r.id.clone()).collect()
        }
        _ => Vec::new(),
    }
}

pub fn url(props: &PropertyBag, name: &str) -> Option<String> {
    match props.get(name) {
        Some(PropertyValue::Url { url }) => url.clone().filter(|u| !u.is_empty()),
        _ => None,
    }
}

/// Text of a computed field: string or number formula, rich text or title,
/// or the first non-empty text item of a rollup array.
pub fn formula_text(props: &PropertyBag, name: &str) -> String {
    props.get(name).map(value_text).unwrap_or_default()
}

fn value_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Formula { formula } => match formula {
            FormulaValue::String { string } => string.clone().unwrap_or_default(),
            FormulaValue::Number { number: Some(n) } => format_number(*n),
            _ => String::new(),
        },
        PropertyValue::RichText { rich_text } => joined_plain_text(rich_text),
        PropertyValue::Title { title } => joined_plain_text(title),
        PropertyValue::Rollup {
            rollup: RollupValue::Array { array },
        } => array
            .iter()
            .map(value_text)
            .find(|text| !text.is_empty())
            .unwrap_or_default(),
        PropertyValue::Rollup {
            rollup: RollupValue::Number { number: Some(n) },
        } => format_number(*n),
        _ => String::new(),
    }
}

/// URL-safe slug from free text.
///
/// Lowercases, drops everything but ASCII letters, digits, whitespace and
/// hyphens, turns whitespace runs into hyphens, collapses repeated hyphens
/// and trims them from both ends. Applying it to its own output is a no-op.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase().replace('_', "-");
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(stripped.trim(), "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Slug of a locale row.
///
/// Order: formula-computed slug, manually authored slug, plain `Slug` text,
/// slug generated from the title, then `article-<id>`.
pub fn resolve_slug(props: &PropertyBag, title: &str, fallback_id: u32) -> String {
    let explicit = [
        formula_text(props, property::SLUG_FORMULA),
        text(props, property::MANUAL_SLUG),
        text(props, property::SLUG),
    ];
    if let Some(slug) = explicit
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
    {
        return slug.to_string();
    }

    let generated = slugify(title);
    if !generated.is_empty() {
        return generated;
    }

    format!("article-{}", fallback_id)
}

fn as_article_id(n: f64) -> Option<u32> {
    (n.is_finite() && n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

/// Numeric article id of an Articles row.
///
/// Order: the `Article_ID` number, the row title parsed as an integer, the
/// `Article_ID` rich text parsed as an integer, then `position` (1-based
/// index of the row in its query result).
pub fn resolve_article_id(props: &PropertyBag, position: usize) -> u32 {
    if let Some(id) = number(props, property::ARTICLE_ID).and_then(as_article_id) {
        return id;
    }
    if let Ok(id) = page_title(props).trim().parse::<u32>() {
        return id;
    }
    if let Ok(id) = rich_text(props, property::ARTICLE_ID).trim().parse::<u32>() {
        return id;
    }
    u32::try_from(position).unwrap_or(u32::MAX)
}

/// `Article_ID` held as a plain number on a locale row.
pub fn article_id_number(props: &PropertyBag) -> Option<u32> {
    number(props, property::ARTICLE_ID).and_then(as_article_id)
}

/// Leading digits of a string, e.g. `"12 - Hello"` → `12`.
pub fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
