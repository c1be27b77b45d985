//! Remote note to markdown rendering

use crate::Result;
use crate::model::{NoteContent, NoteRecord};
use crate::normalize::{escape_markers, unify_line_endings};

use super::frontmatter::Frontmatter;

/// Body lines for a note without escaping, as compared against local text.
pub fn remote_body(content: &NoteContent) -> String {
    render_body(content, false)
}

/// Full file text for a remote note.
///
/// `attachments_dir` is the vault-relative directory used in embed links.
pub fn render_note(record: &NoteRecord, attachments_dir: &str) -> Result<String> {
    let yaml = Frontmatter::from_record(record).to_yaml()?;
    let body = render_markdown_body(record, attachments_dir);
    Ok(format!("---\n{}\n---\n{}", yaml.trim_end(), body))
}

/// Markdown body: escaped text or checklist, then the attachment section.
pub fn render_markdown_body(record: &NoteRecord, attachments_dir: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    let body = render_body(&record.content, true);
    if !body.is_empty() {
        parts.push(body);
    }

    let links: Vec<String> = record
        .attachments
        .iter()
        .filter(|a| !a.filename.is_empty())
        .map(|a| format!("- ![[{}/{}]]", attachments_dir.trim_end_matches('/'), a.filename))
        .collect();
    if !links.is_empty() {
        if !parts.is_empty() {
            parts.push(String::new());
        }
        parts.push("## Attachments".to_string());
        parts.extend(links);
    }

    parts.join("\n").trim().to_string()
}

fn render_body(content: &NoteContent, escape: bool) -> String {
    let escape_if = |text: &str| {
        if escape {
            escape_markers(text)
        } else {
            text.to_string()
        }
    };

    match content {
        NoteContent::Text(text) => {
            let unified = unify_line_endings(text);
            let cleaned = unified
                .split('\n')
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n");
            escape_if(&cleaned)
        }
        NoteContent::Checklist(_) => content
            .sorted_items()
            .into_iter()
            .map(|item| {
                let mark = if item.checked { "[x]" } else { "[ ]" };
                format!("- {} {}", mark, escape_if(item.text.trim_end()))
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListItem;
    use crate::normalize::normalize;
    use crate::vault::note_file::extract_content;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_body_is_escaped_and_trimmed() {
        let record = NoteRecord::text("a", "T", "milk  \r\n#tag eggs\r\n");
        assert_eq!(render_markdown_body(&record, "Attachments"), "milk\n\\#tag eggs");
    }

    #[test]
    fn checklist_body_is_sorted() {
        let record = NoteRecord::checklist(
            "a",
            "T",
            vec![
                ListItem::new("eggs", true, 2),
                ListItem::new("milk", false, 1),
                ListItem::new("", false, 0),
            ],
        );
        assert_eq!(
            render_markdown_body(&record, "Attachments"),
            "- [ ] milk\n- [x] eggs"
        );
    }

    #[test]
    fn attachments_are_linked_after_a_blank_line() {
        let record = NoteRecord::text("a", "T", "body")
            .with_attachment("b1", "photo.png")
            .with_attachment("b2", "scan.pdf");
        assert_eq!(
            render_markdown_body(&record, "Attachments"),
            "body\n\n## Attachments\n- ![[Attachments/photo.png]]\n- ![[Attachments/scan.pdf]]"
        );
    }

    #[test]
    fn rendered_body_compares_equal_to_remote() {
        let record = NoteRecord::checklist(
            "a",
            "T",
            vec![ListItem::new("#urgent call", false, 0), ListItem::new("done", true, 1)],
        )
        .with_attachment("b", "x.png");

        let body = render_markdown_body(&record, "Attachments");
        let local = extract_content(Some("T"), &body);
        assert_eq!(local.normalized(), normalize(&remote_body(&record.content)));
    }

    #[test]
    fn full_note_has_frontmatter() {
        let record = NoteRecord::text("abc123", "Groceries", "milk\neggs");
        let text = render_note(&record, "Attachments").unwrap();
        assert!(text.starts_with("---\nid: abc123\ntitle: Groceries\n"));
        assert!(text.ends_with("---\nmilk\neggs"));
    }
}
