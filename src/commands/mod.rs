pub mod fields;
pub mod set;
pub mod tree;

pub use fields::handle_fields;
pub use set::handle_set;
pub use tree::handle_tree;

use colored::*;

use crate::api::{NodeStatus, TraversalReport};
use crate::error::{GhSubError, GhSubResult};

/// Parse an `owner/repo#number` issue reference.
pub fn parse_issue_ref(reference: &str) -> GhSubResult<(String, String, u64)> {
    let invalid = || {
        GhSubError::InvalidInput(format!(
            "'{}' is not an issue reference (expected owner/repo#number)",
            reference
        ))
    };

    let (repo_part, number_part) = reference.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = repo_part.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number: u64 = number_part.parse().map_err(|_| invalid())?;

    Ok((owner.to_string(), repo.to_string(), number))
}

/// Render a traversal report in the per-line style of the bulk commands.
pub fn print_report(report: &TraversalReport, dry_run: bool) {
    for result in &report.results {
        let label = match (result.number, &result.title) {
            (Some(number), Some(title)) => format!("#{} {}", number, title),
            _ => result.issue_id.clone(),
        };
        let indent = "  ".repeat(result.depth as usize);

        match &result.status {
            NodeStatus::Updated => {
                println!("{}{} {}", indent, "✓".bright_green(), label)
            }
            NodeStatus::WouldUpdate => {
                println!("{}{} {} {}", indent, "~".bright_yellow(), label, "(would change)".dimmed())
            }
            NodeStatus::Listed => println!("{}{}", indent, label),
            NodeStatus::Failed(reason) => {
                println!("{}{} {}: {}", indent, "✗".bright_red(), label, reason)
            }
            NodeStatus::SkippedCycle => {
                println!("{}{} {} {}", indent, "↻".bright_yellow(), label, "(already visited, skipped)".dimmed())
            }
        }
    }

    for (issue_id, error) in &report.fetch_errors {
        println!(
            "{} could not list children of {}: {}",
            "✗".bright_red(),
            issue_id,
            error
        );
    }

    let verb = if dry_run { "would update" } else { "updated" };
    println!(
        "\n{} visited, {} {}, {} failed, {} skipped",
        report.visited(),
        report.mutated(),
        verb,
        report.failed(),
        report.skipped()
    );
}
