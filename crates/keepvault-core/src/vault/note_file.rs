//! A markdown note file in the vault

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use keepvault_fs::{NormalizedPath, io};
use regex::Regex;

use super::frontmatter::Frontmatter;
use crate::model::{ListItem, NoteContent};
use crate::normalize::{self, unescape_markers, unify_line_endings};
use crate::{Error, Result};

const DELIMITER: &str = "---";
const ATTACHMENTS_HEADING: &str = "## Attachments";

static CHECKLIST_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*\[([xX ])\]\s*(.*)$").expect("Invalid checklist regex"));

/// A note file as found on disk.
#[derive(Debug, Clone)]
pub struct LocalNoteFile {
    pub path: NormalizedPath,
    pub frontmatter: Frontmatter,
    /// False when the file has no opening `---` line.
    pub has_frontmatter: bool,
    /// Everything after the closing delimiter, untouched.
    pub body: String,
    /// File modification time.
    pub modified: Option<DateTime<Utc>>,
}

/// Title and body of a local note as they would be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContent {
    /// YAML title, else the leading `# ` heading, else empty.
    pub title: String,
    /// True when `title` came from a heading that was removed from the body.
    pub title_from_heading: bool,
    /// Body without the heading and the attachment section, LF line endings.
    pub body: String,
}

impl LocalContent {
    /// Text sent to the remote store: markers unescaped, block trimmed.
    pub fn push_text(&self) -> String {
        unescape_markers(&self.body).trim().to_string()
    }

    /// Canonical body for comparison.
    pub fn normalized(&self) -> String {
        normalize::normalize(&self.body)
    }

    pub fn has_checklist(&self) -> bool {
        self.body
            .lines()
            .any(|line| CHECKLIST_LINE.is_match(line.trim()))
    }

    /// Checklist items parsed from `- [ ]` / `- [x]` lines.
    pub fn checklist_items(&self) -> Vec<ListItem> {
        let text = self.push_text();
        text.lines()
            .filter_map(|line| CHECKLIST_LINE.captures(line.trim()))
            .filter_map(|caps| {
                let checked = caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case("x"));
                let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                (!text.is_empty()).then(|| text.to_string()).map(|t| (t, checked))
            })
            .enumerate()
            .map(|(i, (text, checked))| ListItem::new(text, checked, i as i64))
            .collect()
    }

    /// Remote content this body maps to.
    pub fn to_note_content(&self, checklist: bool) -> NoteContent {
        if checklist {
            NoteContent::Checklist(self.checklist_items())
        } else {
            NoteContent::Text(self.push_text())
        }
    }
}

impl LocalNoteFile {
    /// Read and parse a note file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let text = io::read_text(path)?;
        let modified = match io::modified_time(path) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "cannot read modification time");
                None
            }
        };
        Self::parse(path.clone(), &text, modified)
    }

    /// Parse file text. Malformed frontmatter is an [`Error::Parse`].
    pub fn parse(
        path: NormalizedPath,
        text: &str,
        modified: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let Some((yaml, body)) = split_document(text).map_err(|message| Error::Parse {
            path: path.clone(),
            message: message.to_string(),
        })?
        else {
            return Ok(Self {
                path,
                frontmatter: Frontmatter::default(),
                has_frontmatter: false,
                body: text.to_string(),
                modified,
            });
        };

        let frontmatter = Frontmatter::from_yaml(yaml).map_err(|e| Error::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            path,
            frontmatter,
            has_frontmatter: true,
            body: body.to_string(),
            modified,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.frontmatter.note_id()
    }

    /// Later of the frontmatter `updated` value and the file modification time.
    pub fn effective_updated(&self) -> Option<DateTime<Utc>> {
        match (self.frontmatter.updated_at(), self.modified) {
            (Some(yaml), Some(file)) => Some(yaml.max(file)),
            (yaml, file) => yaml.or(file),
        }
    }

    /// Title and body as they would be pushed.
    pub fn content(&self) -> LocalContent {
        extract_content(self.frontmatter.title_text(), &self.body)
    }

    /// Title a new remote note would get: YAML title, heading, else file stem.
    pub fn candidate_title(&self) -> String {
        let content = self.content();
        if !content.title.trim().is_empty() {
            return content.title;
        }
        self.path.file_stem().unwrap_or_default().to_string()
    }

    /// Body with the leading `# ` heading removed, when there is one.
    pub fn body_without_heading(&self) -> String {
        let trimmed = self.body.trim_start();
        match leading_heading(trimmed) {
            Some((_, rest)) => rest.trim_start_matches(['\r', '\n']).to_string(),
            None => self.body.clone(),
        }
    }

    /// Render frontmatter and body back into file text.
    pub fn to_markdown(&self) -> Result<String> {
        let yaml = self.frontmatter.to_yaml()?;
        Ok(format!("{DELIMITER}\n{}\n{DELIMITER}\n{}", yaml.trim_end(), self.body))
    }
}

/// Split file text into YAML block and body.
///
/// Returns `Ok(None)` when the first line is not `---`.
pub fn split_document(text: &str) -> std::result::Result<Option<(&str, &str)>, &'static str> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim() != DELIMITER {
        return Ok(None);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim() == DELIMITER {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Ok(Some((yaml, body)));
        }
        offset += line.len();
    }
    Err("missing closing '---' frontmatter delimiter")
}

/// Derive pushable title and body from the YAML title and raw body.
pub fn extract_content(yaml_title: Option<&str>, raw_body: &str) -> LocalContent {
    let mut body = raw_body.trim_start();
    let mut title = yaml_title.unwrap_or_default().to_string();
    let mut title_from_heading = false;

    // With a YAML title every heading line is body text.
    if yaml_title.is_none() {
        if let Some((heading, rest)) = leading_heading(body) {
            title = heading.to_string();
            title_from_heading = true;
            body = rest.trim_start_matches(['\r', '\n']);
        }
    }

    let unified = unify_line_endings(body);
    let kept: Vec<&str> = unified
        .split('\n')
        .take_while(|line| line.trim() != ATTACHMENTS_HEADING)
        .collect();

    LocalContent {
        title,
        title_from_heading,
        body: kept.join("\n"),
    }
}

/// `# Title` on the first line, with the remainder after that line.
fn leading_heading(body: &str) -> Option<(&str, &str)> {
    let (line, rest) = match body.find('\n') {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None => (body, ""),
    };
    let after_hash = line.strip_prefix('#')?;
    if !after_hash.starts_with([' ', '\t']) {
        return None;
    }
    let heading = after_hash.trim();
    (!heading.is_empty()).then_some((heading, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<LocalNoteFile> {
        LocalNoteFile::parse(NormalizedPath::new("/vault/Note.md"), text, None)
    }

    #[test]
    fn splits_frontmatter_and_body() {
        let file = parse("---\nid: abc\ntitle: T\n---\nbody line\n").unwrap();
        assert!(file.has_frontmatter);
        assert_eq!(file.id(), Some("abc"));
        assert_eq!(file.body, "body line\n");
    }

    #[test]
    fn crlf_documents_split() {
        let file = parse("---\r\nid: abc\r\n---\r\nbody\r\n").unwrap();
        assert_eq!(file.id(), Some("abc"));
        assert_eq!(file.body, "body\r\n");
    }

    #[test]
    fn missing_opening_delimiter_is_plain_body() {
        let file = parse("# Idea\nsomething\n").unwrap();
        assert!(!file.has_frontmatter);
        assert_eq!(file.id(), None);
        assert_eq!(file.candidate_title(), "Idea");
    }

    #[test]
    fn missing_closing_delimiter_is_parse_error() {
        let err = parse("---\nid: abc\nbody\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let err = parse("---\nid: [oops\n---\nbody\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn heading_becomes_title_only_without_yaml_title() {
        let with_yaml = extract_content(Some("Real"), "# Heading\nbody");
        assert_eq!(with_yaml.title, "Real");
        assert_eq!(with_yaml.body, "# Heading\nbody");

        let repeated = extract_content(Some("Heading"), "# Heading\nbody");
        assert_eq!(repeated.title, "Heading");
        assert!(!repeated.title_from_heading);
        assert_eq!(repeated.body, "# Heading\nbody");

        let without = extract_content(None, "\n\n# Heading\r\n\r\nbody");
        assert_eq!(without.title, "Heading");
        assert!(without.title_from_heading);
        assert_eq!(without.body, "body");
    }

    #[test]
    fn body_without_heading_drops_only_the_first_heading() {
        let file = parse("# Idea\n\nthought\n# Later\n").unwrap();
        assert_eq!(file.body_without_heading(), "thought\n# Later\n");

        let plain = parse("---\ntitle: T\n---\nno heading\n").unwrap();
        assert_eq!(plain.body_without_heading(), "no heading\n");
    }

    #[test]
    fn attachment_section_is_cut() {
        let content = extract_content(
            Some("T"),
            "milk\neggs\n\n## Attachments\n- ![[Attachments/a.png]]\n",
        );
        assert_eq!(content.body, "milk\neggs\n");
        assert_eq!(content.normalized(), "milk\neggs");
    }

    #[test]
    fn push_text_unescapes_and_keeps_blank_lines() {
        let content = extract_content(Some("T"), "\\#tag one\n\nsecond\n");
        assert_eq!(content.push_text(), "#tag one\n\nsecond");
    }

    #[test]
    fn checklist_lines_are_parsed() {
        let content = extract_content(Some("T"), "- [ ] milk\n- [x] eggs\n- [X]  bread \n- [ ]\nnote");
        assert!(content.has_checklist());
        assert_eq!(
            content.checklist_items(),
            vec![
                ListItem::new("milk", false, 0),
                ListItem::new("eggs", true, 1),
                ListItem::new("bread", true, 2),
            ]
        );
    }

    #[test]
    fn candidate_title_falls_back_to_file_stem() {
        let file = parse("---\nid:\n---\nno heading\n").unwrap();
        assert_eq!(file.candidate_title(), "Note");
    }

    #[test]
    fn effective_updated_takes_the_later_timestamp() {
        let yaml_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let file_time = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let file = LocalNoteFile::parse(
            NormalizedPath::new("/vault/a.md"),
            "---\nupdated: 2024-01-01T00:00:00Z\n---\n",
            Some(file_time),
        )
        .unwrap();
        assert_eq!(file.effective_updated(), Some(file_time));

        let file = LocalNoteFile::parse(
            NormalizedPath::new("/vault/a.md"),
            "---\nupdated: 2024-01-01T00:00:00Z\n---\n",
            None,
        )
        .unwrap();
        assert_eq!(file.effective_updated(), Some(yaml_time));
    }
}
