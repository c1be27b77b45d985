//! Interactive prompts for sync decisions
//!
//! Uses dialoguer for terminal-based selection and `similar` for the
//! local/remote diff shown before each cherry-pick.

use colored::Colorize;
use dialoguer::{Confirm, Select};
use keepvault_core::vault::remote_body;
use keepvault_core::{
    CherryPickRequest, Choice, DecisionProvider, PushPlan, SyncAction,
};
use similar::{ChangeTag, TextDiff};

/// Cherry-pick answers in menu order.
const CHOICES: &[(&str, Choice)] = &[
    ("Keep local (push to remote)", Choice::Local),
    ("Keep remote (overwrite local file)", Choice::Remote),
    ("Skip this note", Choice::Skip),
];

/// Decision provider that asks on the terminal.
#[derive(Debug, Default)]
pub struct TerminalDecisionProvider;

impl DecisionProvider for TerminalDecisionProvider {
    fn choose(&mut self, request: &CherryPickRequest<'_>) -> keepvault_core::Result<Choice> {
        let remote = request.remote;
        println!();
        println!(
            "{} {} ({})",
            "Note".bold(),
            remote.title.cyan(),
            remote.id.dimmed()
        );
        println!("  {}: {}", "File".dimmed(), request.local.path);
        println!("  {}: {}", "Differs in".dimmed(), request.reasons.to_string().yellow());
        println!();

        let local_text = request.local.content().push_text();
        for (tag, line) in diff_lines(&remote_body(&remote.content), &local_text) {
            match tag {
                ChangeTag::Delete => println!("  {}", format!("- {line}").red()),
                ChangeTag::Insert => println!("  {}", format!("+ {line}").green()),
                ChangeTag::Equal => println!("    {line}"),
            }
        }
        println!("  {} remote  {} local", "-".red(), "+".green());
        println!();

        let labels: Vec<&str> = CHOICES.iter().map(|(label, _)| *label).collect();
        let index = Select::new()
            .with_prompt("Which version should win?")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_error)?;
        Ok(CHOICES[index].1)
    }

    fn confirm_batch(&mut self, plan: &PushPlan) -> keepvault_core::Result<bool> {
        println!();
        println!(
            "{} {} note(s) to create, {} note(s) to update:",
            "Push".bold(),
            plan.creates(),
            plan.updates()
        );
        for action in &plan.actions {
            match action {
                SyncAction::Create { path } => println!("   {} {}", "+".green(), path),
                SyncAction::Update { note_id, path, reasons } => println!(
                    "   {} {} ({}) {}",
                    "~".yellow(),
                    path,
                    note_id.dimmed(),
                    reasons.to_string().dimmed()
                ),
                other => println!("   {other}"),
            }
        }
        println!();

        Confirm::new()
            .with_prompt("Push these changes?")
            .default(false)
            .interact()
            .map_err(prompt_error)
    }
}

/// Line diff from `old` to `new`, without trailing newlines.
pub fn diff_lines(old: &str, new: &str) -> Vec<(ChangeTag, String)> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .map(|change| {
            let line = change.value().trim_end_matches(['\r', '\n']).to_string();
            (change.tag(), line)
        })
        .collect()
}

fn prompt_error(e: dialoguer::Error) -> keepvault_core::Error {
    keepvault_core::Error::Prompt {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn choices_cover_every_answer() {
        let answers: Vec<Choice> = CHOICES.iter().map(|(_, c)| *c).collect();
        assert_eq!(answers, vec![Choice::Local, Choice::Remote, Choice::Skip]);
    }

    #[test]
    fn diff_marks_changed_lines() {
        let diff = diff_lines("milk\neggs\n", "milk\nbread\n");
        assert_eq!(
            diff,
            vec![
                (ChangeTag::Equal, "milk".to_string()),
                (ChangeTag::Delete, "eggs".to_string()),
                (ChangeTag::Insert, "bread".to_string()),
            ]
        );
    }

    #[test]
    fn identical_text_has_only_equal_lines() {
        let diff = diff_lines("a\nb\n", "a\nb\n");
        assert!(diff.iter().all(|(tag, _)| *tag == ChangeTag::Equal));
        assert_eq!(diff.len(), 2);
    }
}
