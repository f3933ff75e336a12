//! Colored terminal rendering for shiftsync-core types.

use owo_colors::OwoColorize;
use shiftsync_core::cycle::{CycleReport, SyncOutcome};
use shiftsync_core::diff::{ChangeKind, DateChange};
use shiftsync_core::shift::Shift;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

fn colorize(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::Added => text.green().to_string(),
        ChangeKind::Updated => text.yellow().to_string(),
        ChangeKind::Removed => text.red().to_string(),
    }
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        colorize(*self, &self.to_string())
    }
}

impl Render for DateChange {
    fn render(&self) -> String {
        colorize(self.kind, &self.line())
    }
}

impl Render for Shift {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            self.date().format("%a %Y-%m-%d"),
            self.span().bold(),
            self.label.dimmed()
        )
    }
}

/// Threshold for compact view (counts instead of one line per date)
const COMPACT_THRESHOLD: usize = 10;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn render_changes(changes: &[DateChange], lines: &mut Vec<String>) {
    if changes.len() <= COMPACT_THRESHOLD {
        lines.extend(changes.iter().map(|c| format!("   {}", c.render())));
        return;
    }

    for kind in [ChangeKind::Added, ChangeKind::Updated, ChangeKind::Removed] {
        let count = changes.iter().filter(|c| c.kind == kind).count();
        if count > 0 {
            let label = format!("{} {} {}", kind.symbol(), count, pluralize("date", count));
            lines.push(format!("   {} {}", colorize(kind, &label), kind.render()));
        }
    }
}

/// Summary printed after `sync` and `status`.
pub fn render_report(report: &CycleReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "📅 {} {} parsed ({} {})",
        report.shifts.len(),
        pluralize("shift", report.shifts.len()),
        report.attempts,
        pluralize("attempt", report.attempts)
    ));

    if let Some(path) = &report.export {
        lines.push(format!("   {}", format!("exported to {}", path.display()).dimmed()));
    }
    if report.pruned > 0 {
        lines.push(format!(
            "   {}",
            format!("pruned {} old {}", report.pruned, pluralize("export", report.pruned)).dimmed()
        ));
    }

    match &report.sync {
        SyncOutcome::Skipped => {
            lines.push(format!(
                "   {}",
                "Nothing parsed; calendar left untouched".yellow()
            ));
        }
        SyncOutcome::Planned { reconciliation } => {
            if report.changes.is_empty() && reconciliation.duplicates.is_empty() {
                lines.push(format!("   {}", "Calendar is up to date".dimmed()));
            } else {
                lines.push("   Would apply:".to_string());
                render_changes(&report.changes, &mut lines);
            }
            if !reconciliation.duplicates.is_empty() {
                lines.push(format!(
                    "   {}",
                    format!(
                        "{} duplicate {} to remove",
                        reconciliation.duplicates.len(),
                        pluralize("event", reconciliation.duplicates.len())
                    )
                    .yellow()
                ));
            }
            render_deferred(reconciliation.out_of_window.len(), &mut lines);
        }
        SyncOutcome::Applied {
            reconciliation,
            report: applied,
        } => {
            if report.changes.is_empty() && applied.duplicates_removed == 0 {
                lines.push(format!("   {}", "Calendar is up to date".dimmed()));
            } else {
                render_changes(&report.changes, &mut lines);
            }
            if applied.duplicates_removed > 0 {
                lines.push(format!(
                    "   {}",
                    format!(
                        "removed {} duplicate {}",
                        applied.duplicates_removed,
                        pluralize("event", applied.duplicates_removed)
                    )
                    .dimmed()
                ));
            }
            if applied.failures() > 0 {
                lines.push(format!(
                    "   {}",
                    format!(
                        "{} calendar {} failed; the next sync will retry",
                        applied.failures(),
                        pluralize("operation", applied.failures())
                    )
                    .red()
                ));
            }
            render_deferred(reconciliation.out_of_window.len(), &mut lines);
        }
    }

    lines.join("\n")
}

fn render_deferred(count: usize, lines: &mut Vec<String>) {
    if count > 0 {
        lines.push(format!(
            "   {}",
            format!("{count} {} beyond the sync window", pluralize("shift", count)).dimmed()
        ));
    }
}
