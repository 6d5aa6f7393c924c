//! Domain model: Notion pages and blocks as this crate reads them, and the
//! joined content built from them.

mod content;
mod property_value;

pub use content::{ArticleRow, Feature, JoinedPost, LocaleRow, ParentMatch};
pub use property_value::{
    DateValue, FormulaValue, PropertyBag, PropertyValue, RelationRef, RichText, RollupValue,
    SelectOption,
};

use crate::types::{BlockId, PageId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A Notion page, typically a database row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default, deserialize_with = "lenient")]
    pub cover: Option<FileObject>,
    #[serde(default, deserialize_with = "lenient")]
    pub icon: Option<Icon>,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// A hosted or external file reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileObject {
    External { external: FileUrl },
    File { file: FileUrl },
}

impl FileObject {
    pub fn url(&self) -> &str {
        match self {
            FileObject::External { external } => &external.url,
            FileObject::File { file } => &file.url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

/// Page icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { external: FileUrl },
    File { file: FileUrl },
}

impl Icon {
    /// The emoji itself, or the image URL.
    pub fn as_display(&self) -> &str {
        match self {
            Icon::Emoji { emoji } => emoji,
            Icon::External { external } => &external.url,
            Icon::File { file } => &file.url,
        }
    }
}

/// A content block with its type-specific payload kept as raw JSON for the
/// renderer, and its resolved children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: String,
    pub has_children: bool,
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl Block {
    /// Concatenated plain text of the block's `rich_text`, if it has any.
    pub fn plain_text(&self) -> String {
        self.content
            .get("rich_text")
            .and_then(|items| items.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("plain_text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct RawBlock {
    id: BlockId,
    #[serde(rename = "type", default)]
    block_type: String,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl From<RawBlock> for Block {
    fn from(mut raw: RawBlock) -> Self {
        let content = raw
            .rest
            .remove(&raw.block_type)
            .unwrap_or(serde_json::Value::Null);
        Block {
            id: raw.id,
            block_type: raw.block_type,
            has_children: raw.has_children,
            content,
            children: Vec::new(),
        }
    }
}

/// Decodes an optional field, treating a malformed value as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
