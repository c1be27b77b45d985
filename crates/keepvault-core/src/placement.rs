//! File placement for notes
//!
//! A note's path is `<dir>/<sanitized title>.md`, where `<dir>` follows its
//! trashed/archived flags. When that name is taken by another file a numeric
//! suffix is appended, up to a fixed bound.

use std::collections::HashSet;

use keepvault_fs::constants::NOTE_EXTENSION;
use keepvault_fs::{NormalizedPath, VaultLayout};

use crate::normalize::collapse_whitespace;
use crate::{Error, Result};

/// Characters that are never allowed in a file name.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '\\', '|', '?', '*'];

/// Device names Windows refuses as file stems.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turn a note title into a portable `.md` file name.
///
/// The stem is at most `max_len` characters and never a reserved device
/// name. An empty title gives `Untitled_<id>`; a title that sanitizes to
/// nothing gives `Note_<id>`.
pub fn sanitize_filename(title: &str, id: &str, max_len: usize) -> String {
    let max_len = max_len.max(1);

    let stem = if title.trim().is_empty() {
        truncate(&format!("Untitled_{id}"), max_len)
    } else {
        let cleaned: String = title
            .replace('/', "_")
            .chars()
            .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
            .collect();
        let collapsed = collapse_whitespace(&cleaned);
        let mut stem = truncate(&collapsed, max_len)
            .trim_end_matches(['.', ' '])
            .to_string();

        if is_reserved(&stem) {
            stem = truncate(&format!("_{stem}"), max_len);
        }
        if stem.is_empty() {
            stem = truncate(&format!("Note_{id}"), max_len);
        }
        stem
    };

    format!("{stem}.{NOTE_EXTENSION}")
}

fn truncate(text: &str, max_len: usize) -> String {
    text.chars().take(max_len).collect()
}

fn is_reserved(stem: &str) -> bool {
    let base = stem.split('.').next().unwrap_or_default().to_uppercase();
    RESERVED_NAMES.contains(&base.as_str())
}

/// Computes collision-free paths for notes within one run.
///
/// Paths handed out are remembered, so two notes never receive the same path
/// even when nothing is written to disk (dry run).
#[derive(Debug)]
pub struct PlacementResolver {
    layout: VaultLayout,
    max_len: usize,
    max_suffix: u32,
    claimed: HashSet<NormalizedPath>,
}

impl PlacementResolver {
    pub fn new(layout: VaultLayout, max_len: usize, max_suffix: u32) -> Self {
        Self {
            layout,
            max_len,
            max_suffix,
            claimed: HashSet::new(),
        }
    }

    /// Path the note should live at.
    ///
    /// `current` is where the note's file is now, if it has one; that path is
    /// never treated as a collision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlacementCollisionExhausted`] when the base name and
    /// every suffixed name up to the bound are taken.
    pub fn place(
        &mut self,
        title: &str,
        id: &str,
        trashed: bool,
        archived: bool,
        current: Option<&NormalizedPath>,
    ) -> Result<NormalizedPath> {
        let dir = self.layout.note_dir(trashed, archived).clone();
        let file_name = sanitize_filename(title, id, self.max_len);
        let base = dir.join(&file_name);

        if self.is_free(&base, current) {
            return Ok(self.claim(base));
        }

        let stem = file_name
            .strip_suffix(&format!(".{NOTE_EXTENSION}"))
            .unwrap_or(&file_name)
            .to_string();
        for n in 1..=self.max_suffix {
            let candidate = dir.join(&format!("{stem}_{n}.{NOTE_EXTENSION}"));
            if self.is_free(&candidate, current) {
                tracing::debug!(note_id = id, path = %candidate, "name taken, using suffix");
                return Ok(self.claim(candidate));
            }
        }

        Err(Error::PlacementCollisionExhausted {
            path: base,
            attempts: self.max_suffix,
        })
    }

    /// Forget a claimed path, e.g. after its file was deleted.
    pub fn release(&mut self, path: &NormalizedPath) {
        self.claimed.remove(path);
    }

    fn is_free(&self, candidate: &NormalizedPath, current: Option<&NormalizedPath>) -> bool {
        if current == Some(candidate) {
            return true;
        }
        !self.claimed.contains(candidate) && !candidate.exists()
    }

    fn claim(&mut self, path: NormalizedPath) -> NormalizedPath {
        self.claimed.insert(path.clone());
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Groceries", "Groceries.md")]
    #[case("a/b\\c", "a_bc.md")]
    #[case("what? <now>: \"x\" | *", "what now x.md")]
    #[case("  spaced \t\n out  ", "spaced out.md")]
    #[case("trailing dots...", "trailing dots.md")]
    #[case("CON", "_CON.md")]
    #[case("con.txt", "_con.txt.md")]
    #[case("LPT1", "_LPT1.md")]
    #[case("CONSOLE", "CONSOLE.md")]
    #[case("", "Untitled_id1.md")]
    #[case("   ", "Untitled_id1.md")]
    #[case("???", "Note_id1.md")]
    #[case("...", "Note_id1.md")]
    fn sanitize_cases(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(sanitize_filename(title, "id1", 90), expected);
    }

    #[test]
    fn sanitize_truncates_then_strips() {
        assert_eq!(sanitize_filename("abcd. efgh", "x", 6), "abcd.md");
    }

    #[test]
    fn sanitize_truncates_by_characters() {
        assert_eq!(sanitize_filename("ééééé", "x", 3), "ééé.md");
    }

    #[test]
    fn reserved_prefix_respects_length() {
        assert_eq!(sanitize_filename("COM1", "x", 4), "_COM.md");
    }

    fn resolver(dir: &tempfile::TempDir, max_suffix: u32) -> PlacementResolver {
        PlacementResolver::new(VaultLayout::open(dir.path()).unwrap(), 90, max_suffix)
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    fn collisions_on_disk_get_the_next_free_suffix(#[case] taken: u32) {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Idea.md"), "other").unwrap();
        for n in 1..taken {
            std::fs::write(dir.path().join(format!("Idea_{n}.md")), "other").unwrap();
        }

        let path = resolver(&dir, 10).place("Idea", "n1", false, false, None).unwrap();

        assert_eq!(path.file_name(), Some(format!("Idea_{taken}.md").as_str()));
        assert!(!path.exists());
    }

    #[test]
    fn current_path_and_claims_are_respected() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Idea.md"), "mine").unwrap();
        let layout = VaultLayout::open(dir.path()).unwrap();
        let current = layout.root().join("Idea.md");
        let mut resolver = PlacementResolver::new(layout, 90, 10);

        let own = resolver.place("Idea", "n1", false, false, Some(&current)).unwrap();
        assert_eq!(own, current);

        let other = resolver.place("Idea", "n2", false, false, None).unwrap();
        assert_eq!(other.file_name(), Some("Idea_1.md"));
        let third = resolver.place("Idea", "n3", false, false, None).unwrap();
        assert_eq!(third.file_name(), Some("Idea_2.md"));
    }

    #[test]
    fn exhausted_suffixes_are_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Idea.md"), "").unwrap();
        std::fs::write(dir.path().join("Idea_1.md"), "").unwrap();

        let err = resolver(&dir, 1).place("Idea", "n1", false, false, None).unwrap_err();
        assert!(matches!(err, Error::PlacementCollisionExhausted { attempts: 1, .. }));
    }

    proptest! {
        #[test]
        fn sanitized_names_are_bounded_and_safe(title in ".{0,200}", max in 1usize..120) {
            let name = sanitize_filename(&title, "abc", max);
            let stem = name.strip_suffix(".md").expect("always ends in .md");

            prop_assert!(stem.chars().count() <= max);
            prop_assert!(!stem.is_empty());
            prop_assert!(!stem.contains(['/', '\\', '<', '>', ':', '"', '|', '?', '*']));
            prop_assert!(!stem.chars().any(char::is_control));
            prop_assert!(!is_reserved(stem));
        }
    }
}
