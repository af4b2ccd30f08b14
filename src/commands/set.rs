use clap::ArgMatches;
use colored::*;

use crate::api::lookup::{resolve_issue_node_id, resolve_project_id};
use crate::api::{FieldChange, HierarchyWalker};
use crate::cli_context::CliContext;
use crate::commands::{parse_issue_ref, print_report};
use crate::config::get_owner;
use crate::error::{GhSubError, GhSubResult};

pub async fn handle_set(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    handle_set_impl(matches)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

async fn handle_set_impl(matches: &ArgMatches) -> GhSubResult<()> {
    let mut context = CliContext::load()?;
    let transport = context.transport();

    let reference = matches
        .get_one::<String>("issue")
        .ok_or_else(|| GhSubError::InvalidInput("issue reference is required".to_string()))?;
    let (issue_owner, repo, number) = parse_issue_ref(reference)?;

    let field_arg = matches
        .get_one::<String>("field")
        .ok_or_else(|| GhSubError::InvalidInput("--field is required".to_string()))?;
    let value_arg = matches
        .get_one::<String>("value")
        .ok_or_else(|| GhSubError::InvalidInput("--value is required".to_string()))?;

    let board_owner = matches
        .get_one::<String>("owner")
        .cloned()
        .or_else(|| get_owner(&context.config))
        .unwrap_or_else(|| issue_owner.clone());
    let project_number = matches
        .get_one::<u32>("project")
        .copied()
        .or(context.config.project_number)
        .ok_or_else(|| {
            GhSubError::InvalidInput(
                "no project number given; pass --project or set one in config".to_string(),
            )
        })?;

    let cascade = matches.get_flag("cascade");
    let dry_run = matches.get_flag("dry-run");
    let depth = if cascade {
        matches.get_one::<u32>("depth").copied().unwrap_or(10)
    } else {
        0
    };

    let project_id = resolve_project_id(transport.as_ref(), &board_owner, project_number).await?;
    context
        .schema_cache
        .ensure_loaded(transport.as_ref(), &project_id)
        .await?;

    // The alias table is plain config data; the core only sees the
    // canonical name.
    let field_name = context.config.resolve_alias(field_arg).to_string();
    let field = context.schema_cache.resolve(&field_name)?;
    let value = field.value_for(value_arg)?;

    let change = FieldChange {
        project_id,
        field_id: field.id.clone(),
        value,
    };

    let root_id = resolve_issue_node_id(transport.as_ref(), &issue_owner, &repo, number).await?;

    if dry_run {
        println!("{}", "Dry run: no changes will be made.\n".bright_yellow());
    }

    let walker = HierarchyWalker::new(transport.as_ref());
    let report = walker.apply(&root_id, Some(&change), depth, dry_run).await?;

    print_report(&report, dry_run);

    Ok(())
}
