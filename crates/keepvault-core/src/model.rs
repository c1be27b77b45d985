//! Remote note model
//!
//! A [`NoteRecord`] is owned by the remote store. Plain-text and checklist
//! notes share all metadata and differ only in [`NoteContent`].

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize;

/// Note colour as understood by the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[default]
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    DarkBlue,
    Purple,
    Pink,
    Brown,
    Gray,
}

impl Color {
    pub const ALL: [Color; 12] = [
        Color::White,
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Teal,
        Color::Blue,
        Color::DarkBlue,
        Color::Purple,
        Color::Pink,
        Color::Brown,
        Color::Gray,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Red => "Red",
            Self::Orange => "Orange",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Teal => "Teal",
            Self::Blue => "Blue",
            Self::DarkBlue => "DarkBlue",
            Self::Purple => "Purple",
            Self::Pink => "Pink",
            Self::Brown => "Brown",
            Self::Gray => "Gray",
        }
    }

    /// Parse a frontmatter colour string.
    ///
    /// Matching ignores case, underscores, dashes and spaces, and accepts the
    /// store's wire names (`DEFAULT`, `CERULEAN`) and `grey`.
    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "default" => Some(Self::White),
            "cerulean" => Some(Self::DarkBlue),
            "grey" => Some(Self::Gray),
            _ => Self::ALL
                .into_iter()
                .find(|c| c.as_str().eq_ignore_ascii_case(&key)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    pub checked: bool,
    /// Position key; items render in ascending order.
    #[serde(default)]
    pub sort: i64,
}

impl ListItem {
    pub fn new(text: impl Into<String>, checked: bool, sort: i64) -> Self {
        Self {
            text: text.into(),
            checked,
            sort,
        }
    }
}

/// Body of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NoteContent {
    Text(String),
    Checklist(Vec<ListItem>),
}

impl Default for NoteContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl NoteContent {
    pub fn is_checklist(&self) -> bool {
        matches!(self, Self::Checklist(_))
    }

    /// Items in display order, skipping entries without text.
    pub fn sorted_items(&self) -> Vec<&ListItem> {
        match self {
            Self::Text(_) => Vec::new(),
            Self::Checklist(items) => {
                let mut sorted: Vec<&ListItem> =
                    items.iter().filter(|i| !i.text.is_empty()).collect();
                sorted.sort_by_key(|i| i.sort);
                sorted
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub edited: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    /// File name inside the vault attachment directory.
    pub filename: String,
}

/// A note as held by the remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: NoteContent,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl NoteRecord {
    /// A plain-text note with default metadata.
    pub fn text(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: NoteContent::Text(text.into()),
            ..Self::default()
        }
    }

    /// A checklist note with default metadata.
    pub fn checklist(id: impl Into<String>, title: impl Into<String>, items: Vec<ListItem>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: NoteContent::Checklist(items),
            ..Self::default()
        }
    }

    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.timestamps.updated = Some(updated);
        if self.timestamps.created.is_none() {
            self.timestamps.created = Some(updated);
        }
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_flags(mut self, pinned: bool, archived: bool, trashed: bool) -> Self {
        self.pinned = pinned;
        self.archived = archived;
        self.trashed = trashed;
        self
    }

    pub fn with_attachment(mut self, id: impl Into<String>, filename: impl Into<String>) -> Self {
        self.attachments.push(Attachment {
            id: id.into(),
            filename: filename.into(),
        });
        self
    }

    /// True when the note carries nothing worth writing to disk.
    pub fn is_empty(&self) -> bool {
        let has_title = !self.title.trim().is_empty();
        let has_body = match &self.content {
            NoteContent::Text(text) => !normalize::normalize(text).is_empty(),
            NoteContent::Checklist(items) => items.iter().any(|i| !i.text.trim().is_empty()),
        };
        !(has_title || has_body || !self.attachments.is_empty() || !self.annotations.is_empty())
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.timestamps.updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("White", Some(Color::White))]
    #[case("WHITE", Some(Color::White))]
    #[case("DEFAULT", Some(Color::White))]
    #[case("darkblue", Some(Color::DarkBlue))]
    #[case("DARK_BLUE", Some(Color::DarkBlue))]
    #[case("Cerulean", Some(Color::DarkBlue))]
    #[case("grey", Some(Color::Gray))]
    #[case("magenta", None)]
    #[case("", None)]
    fn color_parse(#[case] input: &str, #[case] expected: Option<Color>) {
        assert_eq!(Color::parse(input), expected);
    }

    #[test]
    fn color_names_round_trip() {
        for color in Color::ALL {
            assert_eq!(Color::parse(color.as_str()), Some(color));
        }
    }

    #[test]
    fn empty_note_detection() {
        assert!(NoteRecord::text("a", "", "  \n\n ").is_empty());
        assert!(NoteRecord::checklist("a", "", vec![ListItem::new(" ", false, 0)]).is_empty());
        assert!(!NoteRecord::text("a", "Title", "").is_empty());
        assert!(!NoteRecord::text("a", "", "body").is_empty());
        assert!(!NoteRecord::text("a", "", "").with_attachment("b", "x.png").is_empty());
    }

    #[test]
    fn sorted_items_orders_by_sort_and_drops_blank() {
        let content = NoteContent::Checklist(vec![
            ListItem::new("second", false, 20),
            ListItem::new("", true, 5),
            ListItem::new("first", true, 10),
        ]);
        let texts: Vec<&str> = content.sorted_items().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
