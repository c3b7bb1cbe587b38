//! Colored terminal rendering for run reports.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use weeksync_core::{CleanupReport, ReconcileAction, ReconcileReport, TemplateOutcome};

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap(),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// One line per template: what happened to it.
pub fn render_outcome(outcome: &TemplateOutcome) -> String {
    match outcome.action {
        ReconcileAction::Created { occurrences } => format!(
            "{} {} {}",
            "+".green(),
            outcome.title,
            format!(
                "({} {} created)",
                occurrences,
                pluralize("occurrence", occurrences)
            )
            .dimmed()
        ),
        ReconcileAction::Updated => {
            format!("{} {} {}", "~".yellow(), outcome.title, "(updated)".dimmed())
        }
        ReconcileAction::Recreated { occurrences } => format!(
            "{} {} {}",
            "~".yellow(),
            outcome.title,
            format!(
                "(recreated, {} {})",
                occurrences,
                pluralize("occurrence", occurrences)
            )
            .dimmed()
        ),
        ReconcileAction::Failed => {
            format!("{} {} {}", "x".red(), outcome.title, "(failed)".dimmed())
        }
    }
}

pub fn render_outcome_errors(outcome: &TemplateOutcome) -> Vec<String> {
    outcome.errors.iter().map(|e| e.red().to_string()).collect()
}

pub fn render_reconcile_summary(report: &ReconcileReport) -> String {
    let (created, updated, recreated, failed) = report.counts();

    let mut parts = vec![
        format!("{} created", created),
        format!("{} updated", updated),
    ];
    if recreated > 0 {
        parts.push(format!("{} recreated", recreated));
    }
    if failed > 0 {
        parts.push(format!("{} failed", failed).red().to_string());
    }

    format!("Applied: {}", parts.join(", "))
}

pub fn render_cleanup(report: &CleanupReport) -> String {
    let mut lines = vec![format!(
        "Deleted {} tracked {}",
        report.deleted.len(),
        pluralize("event", report.deleted.len())
    )];

    for (title, error) in &report.failed {
        lines.push(format!(
            "   {}",
            format!("Failed to delete '{}': {}", title, error).red()
        ));
    }

    lines.join("\n")
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
