//! The local markdown vault
//!
//! File format: `---\n<YAML>\n---\n<body>`. The body may start with a
//! `# Title` heading and may end with a `## Attachments` section that never
//! takes part in content comparison.

pub mod frontmatter;
pub mod index;
pub mod note_file;
pub mod render;

pub use frontmatter::{Frontmatter, format_timestamp, parse_timestamp};
pub use index::VaultIndex;
pub use note_file::{LocalContent, LocalNoteFile, extract_content, split_document};
pub use render::{remote_body, render_markdown_body, render_note};
