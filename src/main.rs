use std::process;

use clap::{value_parser, Arg, ArgAction, Command};

use ghsub_cli::commands::{handle_fields, handle_set, handle_tree};
use ghsub_cli::logging::init_logging;

#[tokio::main]
async fn main() {
    let _ = init_logging();

    let app = Command::new("ghsub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage GitHub sub-issue hierarchies and Projects v2 fields")
        .subcommand(
            Command::new("fields")
                .about("List a project's fields and their options")
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .value_name("OWNER")
                        .help("Project owner (user or organization)"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .value_name("NUMBER")
                        .value_parser(value_parser!(u32))
                        .help("Project number"),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the sub-issue hierarchy under an issue")
                .arg(
                    Arg::new("issue")
                        .value_name("ISSUE")
                        .help("Issue reference (owner/repo#number)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("depth")
                        .long("depth")
                        .value_name("N")
                        .value_parser(value_parser!(u32))
                        .help("How many levels to descend (default 10)"),
                ),
        )
        .subcommand(
            Command::new("set")
                .about("Set a project field on an issue, optionally cascading to sub-issues")
                .arg(
                    Arg::new("issue")
                        .value_name("ISSUE")
                        .help("Issue reference (owner/repo#number)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("field")
                        .long("field")
                        .value_name("NAME")
                        .help("Field name or configured alias")
                        .required(true),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .value_name("VALUE")
                        .help("New value (option label for single-select fields)")
                        .required(true),
                )
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .value_name("OWNER")
                        .help("Project owner, when it differs from the issue owner"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .value_name("NUMBER")
                        .value_parser(value_parser!(u32))
                        .help("Project number"),
                )
                .arg(
                    Arg::new("cascade")
                        .long("cascade")
                        .action(ArgAction::SetTrue)
                        .help("Also update every sub-issue within --depth"),
                )
                .arg(
                    Arg::new("depth")
                        .long("depth")
                        .value_name("N")
                        .value_parser(value_parser!(u32))
                        .help("Cascade depth ceiling (default 10)"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would change without mutating anything"),
                ),
        );

    let matches = app.get_matches();

    let result = match matches.subcommand() {
        Some(("fields", sub_matches)) => handle_fields(sub_matches).await,
        Some(("tree", sub_matches)) => handle_tree(sub_matches).await,
        Some(("set", sub_matches)) => handle_set(sub_matches).await,
        _ => {
            eprintln!("Unknown command. Use 'ghsub --help' for available commands.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
