//! Notion property values as a tagged union.
//!
//! Every property Notion returns carries a `type` discriminator and a field
//! of the same name holding the value. Decoding is lenient per property: a
//! value that does not match its declared shape becomes
//! [`PropertyValue::Unsupported`] instead of failing the whole page.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A single rich text segment. Only the rendered text matters here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            href: None,
        }
    }
}

/// A select, multi-select or status option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Date property payload. `start` is either a date or an RFC 3339 datetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

impl DateValue {
    /// Calendar date of `start`, ignoring any time component.
    pub fn start_date(&self) -> Option<NaiveDate> {
        let day = self.start.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// Reference to another page through a relation property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: crate::types::PageId,
}

/// Computed formula result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String { string: Option<String> },
    Number { number: Option<f64> },
    Boolean { boolean: Option<bool> },
    Date { date: Option<DateValue> },
    #[serde(other)]
    Unsupported,
}

/// Rollup result. Array items are themselves property values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RollupValue {
    Array {
        #[serde(default)]
        array: Vec<PropertyValue>,
    },
    Number {
        number: Option<f64>,
    },
    Date {
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unsupported,
}

/// The property types this crate reads, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Number {
        number: Option<f64>,
    },
    Select {
        select: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Date {
        date: Option<DateValue>,
    },
    Formula {
        formula: FormulaValue,
    },
    Relation {
        #[serde(default)]
        relation: Vec<RelationRef>,
    },
    Rollup {
        rollup: RollupValue,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Url {
        url: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Returns the Notion API type name for this property value.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Title { .. } => "title",
            PropertyValue::RichText { .. } => "rich_text",
            PropertyValue::Number { .. } => "number",
            PropertyValue::Select { .. } => "select",
            PropertyValue::MultiSelect { .. } => "multi_select",
            PropertyValue::Status { .. } => "status",
            PropertyValue::Date { .. } => "date",
            PropertyValue::Formula { .. } => "formula",
            PropertyValue::Relation { .. } => "relation",
            PropertyValue::Rollup { .. } => "rollup",
            PropertyValue::Checkbox { .. } => "checkbox",
            PropertyValue::Url { .. } => "url",
            PropertyValue::Unsupported => "unsupported",
        }
    }
}

/// Property name → value, in the order Notion returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag(IndexMap<String, PropertyValue>);

impl PropertyBag {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(name, value)| {
                let parsed = serde_json::from_value(value).unwrap_or_else(|e| {
                    log::debug!("Property '{}' did not decode ({}), ignoring it", name, e);
                    PropertyValue::Unsupported
                });
                (name, parsed)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_known_types() {
        let bag: PropertyBag = serde_json::from_value(json!({
            "Title": {"id": "title", "type": "title", "title": [{"plain_text": "Hello"}]},
            "Lang": {"id": "a", "type": "select", "select": {"name": "en"}},
            "Publish": {"id": "b", "type": "checkbox", "checkbox": true},
            "Slug_Formula": {"id": "c", "type": "formula", "formula": {"type": "string", "string": "hello"}},
            "Article_ID": {"id": "d", "type": "relation", "relation": [{"id": "a1"}], "has_more": false}
        }))
        .unwrap();

        assert_eq!(bag.len(), 5);
        assert_eq!(bag.get("Publish"), Some(&PropertyValue::Checkbox { checkbox: true }));
        assert_eq!(bag.get("Article_ID").map(|p| p.type_name()), Some("relation"));
        assert_eq!(bag.get("Slug_Formula").map(|p| p.type_name()), Some("formula"));
    }

    #[test]
    fn malformed_and_unknown_properties_degrade() {
        let bag: PropertyBag = serde_json::from_value(json!({
            "Broken": {"type": "multi_select", "multi_select": "not a list"},
            "People": {"type": "people", "people": []},
            "Number": {"type": "number", "number": null}
        }))
        .unwrap();

        assert_eq!(bag.get("Broken"), Some(&PropertyValue::Unsupported));
        assert_eq!(bag.get("People"), Some(&PropertyValue::Unsupported));
        assert_eq!(bag.get("Number"), Some(&PropertyValue::Number { number: None }));
    }

    #[test]
    fn date_start_accepts_datetimes() {
        let date = DateValue {
            start: "2024-03-05T10:00:00.000+08:00".to_string(),
            end: None,
        };
        assert_eq!(date.start_date(), NaiveDate::from_ymd_opt(2024, 3, 5));
    }
}
