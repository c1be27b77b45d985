//! Terminal rendering of a sync report

use colored::Colorize;
use keepvault_core::SyncReport;

/// Print counters, actions, and errors of a finished run.
pub fn print_report(report: &SyncReport) {
    print_counters("Pull", &report.pull.entries());
    print_counters("Push", &report.push.entries());
    if report.push_cancelled {
        println!("   {} push cancelled at confirmation", "-".yellow());
    }

    if !report.actions.is_empty() {
        println!();
        println!("{}:", "Actions".bold());
        for action in &report.actions {
            println!("   {} {}", "+".green(), action);
        }
    }

    if !report.skipped_files.is_empty() {
        println!();
        println!("{}:", "Skipped files".bold());
        for skipped in &report.skipped_files {
            println!("   {} {}", "-".yellow(), skipped);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("{}:", "Errors".bold());
        for error in &report.errors {
            println!("   {} {}", "!".red(), error);
        }
    }
}

/// Print the non-zero counters of one phase.
fn print_counters(phase: &str, entries: &[(&'static str, usize)]) {
    let nonzero: Vec<String> = entries
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| format!("{label}: {n}"))
        .collect();
    if nonzero.is_empty() {
        println!("{}: {}", phase.bold(), "nothing to do".dimmed());
    } else {
        println!("{}: {}", phase.bold(), nonzero.join(", "));
    }
}
