use clap::ArgMatches;

use crate::api::lookup::resolve_issue_node_id;
use crate::api::HierarchyWalker;
use crate::cli_context::CliContext;
use crate::commands::{parse_issue_ref, print_report};
use crate::error::{GhSubError, GhSubResult};

pub async fn handle_tree(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    handle_tree_impl(matches)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

async fn handle_tree_impl(matches: &ArgMatches) -> GhSubResult<()> {
    let context = CliContext::load()?;
    let transport = context.transport();

    let reference = matches
        .get_one::<String>("issue")
        .ok_or_else(|| GhSubError::InvalidInput("issue reference is required".to_string()))?;
    let (owner, repo, number) = parse_issue_ref(reference)?;
    let depth = matches.get_one::<u32>("depth").copied().unwrap_or(10);

    let root_id = resolve_issue_node_id(transport.as_ref(), &owner, &repo, number).await?;

    let walker = HierarchyWalker::new(transport.as_ref());
    let report = walker.apply(&root_id, None, depth, false).await?;

    println!("Sub-issue tree of {}:\n", reference);
    print_report(&report, false);

    Ok(())
}
