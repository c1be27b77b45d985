//! YAML frontmatter of a vault note

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::model::{Color, NoteRecord};
use crate::normalize::label_to_tag;

/// Recognized frontmatter keys, in the order they are written.
///
/// Unknown keys are preserved in `extra` and written after the known ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub edited: Option<String>,
    #[serde(default, deserialize_with = "tag_list", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Frontmatter {
    /// Parse a YAML block. An empty block yields default frontmatter.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Frontmatter describing a remote note.
    pub fn from_record(record: &NoteRecord) -> Self {
        let mut tags: Vec<String> = record.labels.iter().map(|l| label_to_tag(l)).collect();
        tags.sort();
        tags.dedup();

        Self {
            id: Some(record.id.clone()),
            title: Some(record.title.clone()),
            color: Some(record.color.as_str().to_string()),
            pinned: Some(record.pinned),
            created: record.timestamps.created.map(format_timestamp),
            updated: record.timestamps.updated.map(format_timestamp),
            edited: record.timestamps.edited.map(format_timestamp),
            tags,
            archived: Some(record.archived),
            trashed: Some(record.trashed),
            extra: BTreeMap::new(),
        }
    }

    /// Non-empty note id.
    pub fn note_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Non-blank title.
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Colour, defaulting to white when absent. `Err` carries an unknown name.
    pub fn color_value(&self) -> Result<Color, &str> {
        match self.color.as_deref() {
            None => Ok(Color::White),
            Some(name) => Color::parse(name).ok_or(name),
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }

    pub fn is_archived(&self) -> bool {
        self.archived.unwrap_or(false)
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed.unwrap_or(false)
    }

    /// Parsed `updated` key. Unparseable values are logged and ignored.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.updated.as_deref()?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            tracing::warn!(value = raw, "ignoring unparseable 'updated' timestamp");
        }
        parsed
    }

    /// Copy authoritative values from a freshly committed record.
    ///
    /// Used after a create so the local file carries the server id.
    pub fn adopt_record(&mut self, record: &NoteRecord) {
        let fresh = Self::from_record(record);
        self.id = fresh.id;
        self.title = fresh.title;
        self.color = fresh.color;
        self.tags = fresh.tags;
        if fresh.created.is_some() {
            self.created = fresh.created;
        }
        if fresh.updated.is_some() {
            self.updated = fresh.updated;
        }
    }
}

/// Timestamps are written in RFC 3339 UTC with a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 or offset-less ISO 8601 timestamp.
///
/// Offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value))
}

fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let tags = match value {
        Value::Sequence(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };
    Ok(tags)
}
