use clap::ArgMatches;
use colored::*;

use crate::api::lookup::resolve_project_id;
use crate::api::FieldDataType;
use crate::cli_context::CliContext;
use crate::config::get_owner;
use crate::error::{GhSubError, GhSubResult};

pub async fn handle_fields(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    handle_fields_impl(matches)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

async fn handle_fields_impl(matches: &ArgMatches) -> GhSubResult<()> {
    let mut context = CliContext::load()?;
    let transport = context.transport();

    let owner = matches
        .get_one::<String>("owner")
        .cloned()
        .or_else(|| get_owner(&context.config))
        .ok_or_else(|| {
            GhSubError::InvalidInput("no owner given; pass --owner or set one in config".to_string())
        })?;
    let number = matches
        .get_one::<u32>("project")
        .copied()
        .or(context.config.project_number)
        .ok_or_else(|| {
            GhSubError::InvalidInput(
                "no project number given; pass --project or set one in config".to_string(),
            )
        })?;

    let project_id = resolve_project_id(transport.as_ref(), &owner, number).await?;
    context
        .schema_cache
        .ensure_loaded(transport.as_ref(), &project_id)
        .await?;

    println!(
        "{} fields on {}'s project {}:\n",
        context.schema_cache.fields().len(),
        owner.bold(),
        number
    );

    for field in context.schema_cache.fields() {
        let type_label = match &field.data_type {
            FieldDataType::Text => "text".to_string(),
            FieldDataType::Number => "number".to_string(),
            FieldDataType::Date => "date".to_string(),
            FieldDataType::SingleSelect => "single select".to_string(),
            FieldDataType::Other(t) => t.to_lowercase(),
        };
        println!("{} {}", field.name.bright_blue().bold(), format!("({})", type_label).dimmed());
        for option in &field.options {
            println!("  - {}", option.name);
        }
    }

    Ok(())
}
