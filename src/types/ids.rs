use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// Strong typing for IDs with phantom types
#[derive(Debug)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatabaseMarker;

/// Type aliases for specific ID types
pub type PageId = Id<PageMarker>;
pub type BlockId = Id<BlockMarker>;
pub type DatabaseId = Id<DatabaseMarker>;

static URL_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#]|$)",
    )
    .expect("Notion ID regex is valid")
});

impl<T> Id<T> {
    /// Parse a user-supplied Notion ID (bare, dashed, or inside a notion.so URL).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');

        if let Ok(uuid) = Uuid::parse_str(cleaned) {
            return Ok(Self::from_normalized(uuid.as_simple().to_string()));
        }

        if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
            if let Some(id) = URL_ID_REGEX
                .captures(cleaned)
                .and_then(|captures| captures.get(1))
            {
                return Ok(Self::from_normalized(
                    id.as_str().replace('-', "").to_lowercase(),
                ));
            }
            return Err(ValidationError::InvalidId(format!(
                "Could not extract ID from URL: {}",
                input
            )));
        }

        Err(ValidationError::InvalidId(format!(
            "Could not parse Notion ID from: {}",
            input
        )))
    }

    /// Wrap an ID as returned by the API, without validation.
    ///
    /// Dashes are dropped and hex is lowercased so that relation references
    /// (dashed) compare equal to page IDs regardless of how either was written.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self::from_normalized(value.as_ref().trim().replace('-', "").to_lowercase())
    }

    fn from_normalized(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get the ID with dashes for API calls
    pub fn to_dashed(&self) -> String {
        if self.value.len() == 32 && self.value.is_ascii() {
            format!(
                "{}-{}-{}-{}-{}",
                &self.value[0..8],
                &self.value[8..12],
                &self.value[12..16],
                &self.value[16..20],
                &self.value[20..32]
            )
        } else {
            self.value.clone()
        }
    }

    /// Reinterpret the same Notion object under another ID kind.
    ///
    /// Pages are blocks too: a page's body is listed through the block API.
    pub fn cast<U>(&self) -> Id<U> {
        Id::from_normalized(self.value.clone())
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_normalized(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}
