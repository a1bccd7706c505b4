#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::ScoreReport;
use crate::{
    config::PrettyPolicy,
    gate::GateOutcome,
    util::{truncate_chars, wrap_words},
};

/// Width of the console report.
pub const WIDTH: usize = 80;

/// Characters of each description that are shown.
const DESCRIPTION_WIDTH: usize = 30;

/// Renders the fixed-width console report.
///
/// * `policy`: title, notes, and total settings
/// * `report`: the finalized report
/// * `gate`: whether to remind the student to commit
pub fn render(policy: &PrettyPolicy, report: &ScoreReport, gate: GateOutcome) -> String {
    let rule = "-".repeat(WIDTH);
    let mut lines = vec![rule.clone()];

    if let Some(title) = &policy.title {
        lines.push(title.clone());
        lines.push(rule.clone());
    }

    lines.extend(report.scores.iter().map(|entry| {
        format!(
            "{:<31}{:<5}{}",
            truncate_chars(&entry.description, DESCRIPTION_WIDTH),
            entry.points_earned,
            entry.explanation
        )
    }));
    lines.push(rule.clone());

    if policy.show_total {
        let mut total = format!("{:<31}{:<5}", "Total", report.points_earned);
        if let Some(raw) = report.raw_points_earned {
            total.push_str(&format!("(the maximum, capped from {raw})"));
        }
        lines.push(total);
        lines.push(rule.clone());
    }

    if let Some(notes) = &policy.notes {
        if notes.contains('\n') {
            lines.push(notes.clone());
        } else {
            lines.push(wrap_words(notes, WIDTH));
        }
        lines.push(rule.clone());
    }

    if gate.needs_commit {
        lines.push(format!(
            "CONGRATULATIONS: Your changes increased your score from {} to {}!",
            gate.prior_max, report.points_earned
        ));
        lines.push(
            "Commit your work right away! The autograder will not run again until you do."
                .to_string(),
        );
        lines.push(rule);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
