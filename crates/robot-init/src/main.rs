//! robot-init - Project scaffolding for Robot Framework test automation

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use initializer_core::tui::CreateArgs;
use initializer_core::DependencyManager;
use std::path::PathBuf;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "robot-init")]
#[command(about = "CLI for scaffolding Robot Framework projects")]
#[command(version)]
pub struct Args {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Robot Framework project
    Create(CliCreateArgs),
    /// List the libraries in the catalog
    Libraries(LibrariesArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Project name (also the root folder of the generated project)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Project description written into the README
    #[arg(long)]
    pub description: Option<String>,

    /// Python version
    #[arg(long)]
    pub python: Option<String>,

    /// Robot Framework version
    #[arg(long)]
    pub robot: Option<String>,

    /// Dependency manager
    #[arg(short, long, value_enum)]
    pub manager: Option<DependencyManager>,

    /// Libraries to include by id (repeatable or comma-separated)
    #[arg(short, long = "library", value_delimiter = ',')]
    pub libraries: Option<Vec<String>>,

    /// YAML preset with settings and library choices
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Library catalog file (defaults to $ROBOT_INIT_CATALOG, then the bundled catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Directory the zip (or unpacked project) is written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extract the project into the output directory instead of writing a zip
    #[arg(long)]
    pub unpack: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            name: args.name,
            description: args.description,
            python: args.python,
            robot: args.robot,
            manager: args.manager,
            libraries: args.libraries,
            preset: args.preset,
            catalog: args.catalog,
            output: args.output,
            unpack: args.unpack,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct LibrariesArgs {
    /// Only libraries carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Case-insensitive match on name or description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Library catalog file (defaults to $ROBOT_INIT_CATALOG, then the bundled catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    initializer_core::logging::init(args.verbose).ok();

    match args.command {
        Some(Command::Create(create_args)) => create(create_args.into()).await,
        Some(Command::Libraries(list_args)) => initializer_core::list_libraries(
            list_args.catalog.as_deref(),
            list_args.tag.as_deref(),
            list_args.search.as_deref(),
        ),
        None => {
            // No subcommand provided, default to create behavior (interactive mode)
            create(CreateArgs::default()).await
        }
    }
}

async fn create(args: CreateArgs) -> Result<()> {
    let result = initializer_core::run(args, CLI_VERSION).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_create_flags() {
        let args = Args::try_parse_from([
            "robot-init",
            "create",
            "--name",
            "shop",
            "--manager",
            "poetry",
            "--library",
            "robotframework-browser,robotframework-requests",
            "--library",
            "robotframework-sshlibrary",
            "--yes",
        ])
        .unwrap();

        let Some(Command::Create(create)) = args.command else {
            panic!("expected create");
        };
        let create: CreateArgs = create.into();
        assert_eq!(create.name.as_deref(), Some("shop"));
        assert_eq!(create.manager, Some(DependencyManager::Poetry));
        assert_eq!(
            create.libraries.unwrap(),
            vec![
                "robotframework-browser",
                "robotframework-requests",
                "robotframework-sshlibrary"
            ]
        );
        assert!(create.yes);
        assert!(!create.unpack);
    }

    #[test]
    fn test_pip_alias() {
        let args = Args::try_parse_from(["robot-init", "create", "-m", "pip"]).unwrap();
        let Some(Command::Create(create)) = args.command else {
            panic!("expected create");
        };
        assert_eq!(create.manager, Some(DependencyManager::Venv));
    }

    #[test]
    fn test_default_is_interactive_create() {
        let args = Args::try_parse_from(["robot-init", "-v"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_libraries_filters() {
        let args =
            Args::try_parse_from(["robot-init", "libraries", "--tag", "web", "-s", "browser"])
                .unwrap();
        let Some(Command::Libraries(list)) = args.command else {
            panic!("expected libraries");
        };
        assert_eq!(list.tag.as_deref(), Some("web"));
        assert_eq!(list.search.as_deref(), Some("browser"));
    }
}
