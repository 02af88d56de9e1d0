//! Charm-style CLI prompts using cliclack

use crate::archive::{Delivery, DirectoryDelivery, UnpackDelivery};
use crate::catalog::{Catalog, CatalogSource, LibraryDescriptor, ParameterType};
use crate::error::SelectionError;
use crate::generator::{GenerationReport, Generator};
use crate::preset::Preset;
use crate::project::{validate_project_name, DependencyManager, ProjectDescriptor, ProjectSettings};
use crate::selection::{Confirmation, Selection};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Project name, also the archive root folder
    pub name: Option<String>,

    pub description: Option<String>,

    /// Python version offered by the catalog
    pub python: Option<String>,

    /// Robot Framework version offered by the catalog
    pub robot: Option<String>,

    pub manager: Option<DependencyManager>,

    /// Library ids; replaces the default or preset selection
    pub libraries: Option<Vec<String>>,

    /// YAML preset with settings and selections
    pub preset: Option<PathBuf>,

    /// Catalog file to use instead of the bundled one
    pub catalog: Option<PathBuf>,

    /// Where the zip (or unpacked project) goes
    pub output: Option<PathBuf>,

    /// Extract the project instead of writing a zip
    pub unpack: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// How the finished project is handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Zip,
    Folder,
}

/// Run the CLI with interactive prompts
pub async fn run(args: CreateArgs, cli_version: &str) -> Result<()> {
    let interactive = !args.yes;
    if interactive && !console::Term::stderr().is_term() {
        anyhow::bail!("Not running in a terminal; pass --yes to create the project non-interactively.");
    }

    if interactive {
        cliclack::intro(format!("robot-init {}", cli_version))?;
    } else {
        println!(
            "{}",
            format!("robot-init {}", cli_version).cyan().bold()
        );
    }

    // Step 1: Load catalog and preset
    let catalog = load_catalog(args.catalog.as_deref())?;
    let preset = match &args.preset {
        Some(path) => Some(
            Preset::load(path, &catalog)
                .with_context(|| format!("Failed to load preset {}", path.display()))?,
        ),
        None => None,
    };

    // Step 2: Project settings
    let mut settings = ProjectSettings::defaults(&catalog);
    if let Some(preset) = &preset {
        preset.apply_settings(&mut settings);
    }
    apply_flags(&args, &mut settings);
    if interactive {
        prompt_settings(&catalog, &args, &mut settings)?;
    }

    // Step 3: Libraries
    let mut selection = match &preset {
        Some(preset) => preset.selection(&catalog)?,
        None => Selection::new(&catalog),
    };
    if let Some(ids) = &args.libraries {
        replace_selection(&catalog, &mut selection, ids, interactive)?;
    } else if interactive {
        prompt_libraries(&catalog, &mut selection)?;
    }
    if interactive {
        customize_libraries(&catalog, &mut selection)?;
    }

    // Step 4: Snapshot
    let project = ProjectDescriptor::snapshot(&catalog, &selection, settings)
        .context("Invalid project settings")?;
    report_selection(&project, interactive)?;

    // Step 5: Destination
    let output_dir = select_output_dir(&args)?;
    let output = select_output(&args)?;
    if output == Output::Folder {
        check_target(&output_dir.join(&project.name), &args)?;
    }

    // Step 6: Generate
    let report = match output {
        Output::Zip => generate(DirectoryDelivery::new(&output_dir), &project, interactive).await?,
        Output::Folder => generate(UnpackDelivery::new(&output_dir), &project, interactive).await?,
    };

    // Step 7: Show next steps
    print_next_steps(&project, &report, output, interactive)?;

    Ok(())
}

/// Print the catalog, optionally filtered by tag and search term
pub fn list_libraries(
    catalog_path: Option<&Path>,
    tag: Option<&str>,
    search: Option<&str>,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;

    let libraries: Vec<&LibraryDescriptor> = catalog.search(search.unwrap_or(""), tag).collect();
    if libraries.is_empty() {
        println!("{}", "No libraries match.".yellow());
        println!("  Tags: {}", catalog.tags().join(", ").dimmed());
        return Ok(());
    }

    for lib in libraries {
        let origin = if lib.origin.is_builtin() {
            "built-in".dimmed()
        } else {
            "external".normal()
        };
        let version = lib.latest_version().unwrap_or("-");
        println!(
            "  {} {} {} {} {}",
            "●".blue(),
            lib.name.bold(),
            format!("({})", lib.id).dimmed(),
            origin,
            version.green()
        );
        if !lib.description.is_empty() {
            println!("      {}", lib.description);
        }

        let relations = catalog.relations();
        let incompatible = related(&catalog, lib, |a, b| relations.is_incompatible(a, b));
        let conflicting = related(&catalog, lib, |a, b| {
            relations.is_conflicting(a, b) && !relations.is_incompatible(a, b)
        });
        if !incompatible.is_empty() {
            println!("      {} {}", "incompatible:".red(), incompatible.join(", "));
        }
        if !conflicting.is_empty() {
            println!("      {} {}", "conflicts:".yellow(), conflicting.join(", "));
        }
    }

    Ok(())
}

fn related<F>(catalog: &Catalog, lib: &LibraryDescriptor, relation: F) -> Vec<String>
where
    F: Fn(&str, &str) -> bool,
{
    catalog
        .libraries()
        .iter()
        .filter(|other| relation(&lib.id, &other.id))
        .map(|other| other.name.clone())
        .collect()
}

fn load_catalog(explicit: Option<&Path>) -> Result<Catalog> {
    let source = CatalogSource::resolve(explicit);
    let catalog = Catalog::load(&source).context("Failed to load library catalog")?;
    if let CatalogSource::File(path) = &source {
        tracing::info!(path = %path.display(), "using catalog file");
    }
    Ok(catalog)
}

fn apply_flags(args: &CreateArgs, settings: &mut ProjectSettings) {
    if let Some(name) = &args.name {
        settings.name = name.clone();
    }
    if let Some(description) = &args.description {
        settings.description = description.clone();
    }
    if let Some(version) = &args.python {
        settings.python_version = version.clone();
    }
    if let Some(version) = &args.robot {
        settings.robot_framework_version = version.clone();
    }
    if let Some(manager) = args.manager {
        settings.manager = manager;
    }
}

/// Prompt for every setting not given as a flag
fn prompt_settings(catalog: &Catalog, args: &CreateArgs, settings: &mut ProjectSettings) -> Result<()> {
    if args.name.is_none() {
        settings.name = cliclack::input("Project name")
            .default_input(&settings.name)
            .validate(|input: &String| {
                validate_project_name(input).map_err(|e| e.to_string())
            })
            .interact()?;
    }

    if args.description.is_none() {
        settings.description = cliclack::input("Description")
            .default_input(&settings.description)
            .required(false)
            .interact()?;
    }

    if args.python.is_none() {
        let mut select = cliclack::select("Python version");
        for version in catalog.python_versions().iter().rev() {
            select = select.item(version.clone(), version, "");
        }
        settings.python_version = select
            .initial_value(settings.python_version.clone())
            .interact()?;
    }

    if args.robot.is_none() {
        let mut select = cliclack::select("Robot Framework version");
        for version in catalog.robot_framework_versions().iter().rev() {
            select = select.item(version.clone(), version, "");
        }
        settings.robot_framework_version = select
            .initial_value(settings.robot_framework_version.clone())
            .interact()?;
    }

    if args.manager.is_none() {
        let mut select = cliclack::select("Dependency manager");
        for manager in DependencyManager::ALL {
            select = select.item(manager, manager.display_name(), manager.manifest_file());
        }
        settings.manager = select.initial_value(settings.manager).interact()?;
    }

    Ok(())
}

/// Replace the selection with `ids`, in the given order
fn replace_selection(
    catalog: &Catalog,
    selection: &mut Selection,
    ids: &[String],
    interactive: bool,
) -> Result<()> {
    for id in selection.selected().to_vec() {
        selection.remove(&id);
    }
    for id in ids {
        if interactive {
            add_library(catalog, selection, id)?;
        } else {
            // --yes confirms soft conflicts; hard ones still fail
            selection
                .add(catalog, id, Confirmation::Confirmed)
                .with_context(|| format!("Cannot select '{}'", id))?;
        }
    }
    Ok(())
}

fn prompt_libraries(catalog: &Catalog, selection: &mut Selection) -> Result<()> {
    let mut multi = cliclack::multiselect("Select libraries");
    for lib in catalog.libraries() {
        let hint = if lib.origin.is_builtin() {
            "built-in".to_string()
        } else {
            lib.latest_version().unwrap_or_default().to_string()
        };
        multi = multi.item(lib.id.clone(), &lib.name, hint);
    }

    let chosen: Vec<String> = multi
        .initial_values(selection.selected().to_vec())
        .required(false)
        .interact()?;

    for id in selection.selected().to_vec() {
        if !chosen.contains(&id) {
            selection.remove(&id);
        }
    }
    for id in &chosen {
        if !selection.is_selected(id) {
            add_library(catalog, selection, id)?;
        }
    }

    Ok(())
}

/// Add one library, asking before accepting a soft conflict
fn add_library(catalog: &Catalog, selection: &mut Selection, id: &str) -> Result<()> {
    match selection.add(catalog, id, Confirmation::Unconfirmed) {
        Ok(()) => Ok(()),
        Err(SelectionError::Rejected { with, .. }) => {
            cliclack::log::error(format!(
                "{} cannot be used together with {}; it was not added",
                display_name(catalog, id),
                display_names(catalog, &with)
            ))?;
            Ok(())
        }
        Err(SelectionError::NeedsConfirmation { with, .. }) => {
            let confirm: bool = cliclack::confirm(format!(
                "{} conflicts with {}. Add it anyway?",
                display_name(catalog, id),
                display_names(catalog, &with)
            ))
            .initial_value(false)
            .interact()?;

            if confirm {
                selection.add(catalog, id, Confirmation::Confirmed)?;
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn display_name(catalog: &Catalog, id: &str) -> String {
    catalog
        .library(id)
        .map_or_else(|| id.to_string(), |lib| lib.name.clone())
}

fn display_names(catalog: &Catalog, ids: &[String]) -> String {
    ids.iter()
        .map(|id| display_name(catalog, id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Optional pass over versions and parameters of the selected libraries
fn customize_libraries(catalog: &Catalog, selection: &mut Selection) -> Result<()> {
    let configurable: Vec<&LibraryDescriptor> = selection
        .selected()
        .iter()
        .filter_map(|id| catalog.library(id))
        .filter(|lib| lib.versions.len() > 1 || !lib.parameters.is_empty())
        .collect();

    if configurable.is_empty() {
        return Ok(());
    }

    let customize: bool = cliclack::confirm("Customize library versions and parameters?")
        .initial_value(false)
        .interact()?;
    if !customize {
        return Ok(());
    }

    for lib in configurable {
        if lib.versions.len() > 1 {
            let current = selection
                .resolve_version(&lib.id)
                .unwrap_or_default()
                .to_string();
            let mut select = cliclack::select(format!("{} version", lib.name));
            for version in lib.versions.iter().rev() {
                select = select.item(version.clone(), version, "");
            }
            let version: String = select.initial_value(current).interact()?;
            selection.set_version(catalog, &lib.id, &version)?;
        }

        for param in &lib.parameters {
            let current = selection
                .resolve_parameter(&lib.id, &param.name)
                .unwrap_or(&param.default_value)
                .to_string();
            let prompt = format!("{} {}", lib.name, param.name);

            let value: String = match param.kind {
                ParameterType::Boolean => {
                    let mut select = cliclack::select(prompt);
                    for value in &param.values {
                        select = select.item(value.clone(), value, "");
                    }
                    select.initial_value(current).interact()?
                }
                ParameterType::Text => cliclack::input(prompt)
                    .default_input(&current)
                    .required(false)
                    .interact()?,
            };
            selection.set_parameter(catalog, &lib.id, &param.name, &value)?;
        }
    }

    Ok(())
}

fn report_selection(project: &ProjectDescriptor, interactive: bool) -> Result<()> {
    let names: Vec<String> = project
        .libraries
        .iter()
        .map(|lib| match &lib.version {
            Some(version) if !lib.builtin => format!("{} {}", lib.name, version),
            _ => lib.name.clone(),
        })
        .collect();
    let summary = if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    };

    if interactive {
        cliclack::log::success(format!("Libraries: {}", summary))?;
    } else {
        println!("  {} Project: {}", "●".blue(), project.name.bold());
        println!(
            "  {} Python {}, Robot Framework {}, {}",
            "●".blue(),
            project.python_version,
            project.robot_framework_version,
            project.manager.display_name()
        );
        println!("  {} Libraries: {}", "●".blue(), summary);
    }
    Ok(())
}

fn select_output_dir(args: &CreateArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Use --output flag if provided
    let path = if let Some(dir) = &args.output {
        if dir.is_absolute() {
            dir.clone()
        } else {
            current_dir.join(dir)
        }
    } else if args.yes {
        current_dir
    } else {
        let input: String = cliclack::input("Output directory")
            .placeholder(".")
            .default_input(".")
            .interact()?;

        if input.is_empty() || input == "." {
            current_dir
        } else {
            let p = PathBuf::from(&input);
            if p.is_absolute() {
                p
            } else {
                current_dir.join(p)
            }
        }
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    Ok(path)
}

fn select_output(args: &CreateArgs) -> Result<Output> {
    if args.unpack {
        return Ok(Output::Folder);
    }
    if args.yes {
        return Ok(Output::Zip);
    }

    let output = cliclack::select("Output")
        .item(Output::Zip, "Zip archive", "<project>.zip")
        .item(Output::Folder, "Project folder", "extract into the output directory")
        .interact()?;
    Ok(output)
}

/// Warn before extracting over an existing, non-empty folder
fn check_target(target: &Path, args: &CreateArgs) -> Result<()> {
    if !target.is_dir() {
        return Ok(());
    }
    let count = std::fs::read_dir(target)
        .with_context(|| format!("Failed to read {}", target.display()))?
        .count();
    if count == 0 {
        return Ok(());
    }

    // Auto-confirm with --yes flag
    let confirm = if args.yes {
        println!(
            "  {} {} has {} existing items; matching files are overwritten",
            "Warning:".yellow(),
            target.display(),
            count
        );
        true
    } else {
        cliclack::log::warning(format!(
            "{} has {} existing items",
            target.display(),
            count
        ))?;
        cliclack::confirm("Overwrite matching files?")
            .initial_value(false)
            .interact()?
    };

    if !confirm {
        anyhow::bail!("Setup cancelled.");
    }
    Ok(())
}

async fn generate<D: Delivery>(
    delivery: D,
    project: &ProjectDescriptor,
    interactive: bool,
) -> Result<GenerationReport> {
    let generator = Generator::new(delivery);

    if interactive {
        let spinner = cliclack::spinner();
        spinner.start("Generating project...");
        match generator.generate(project).await {
            Ok(report) => {
                spinner.stop(format!(
                    "Created {} ({} files, {} bytes)",
                    report.location.display(),
                    report.file_count,
                    report.archive_size
                ));
                Ok(report)
            }
            Err(e) => {
                spinner.stop("Generation failed");
                Err(e).context("Failed to generate project")
            }
        }
    } else {
        start_status(&mut std::io::stdout(), "Generating project...")
            .context("Failed to write to stdout")?;
        match generator.generate(project).await {
            Ok(report) => {
                println!(" {} ({} bytes)", "done".green(), report.archive_size);
                Ok(report)
            }
            Err(e) => {
                println!(" {}", "failed".red());
                Err(e).context("Failed to generate project")
            }
        }
    }
}

/// Print a status line without its newline, flushed so it shows before the work runs
fn start_status<W: Write>(out: &mut W, message: &str) -> std::io::Result<()> {
    write!(out, "  {} {}", "->".blue(), message)?;
    out.flush()
}

fn install_command(manager: DependencyManager) -> &'static str {
    match manager {
        DependencyManager::Venv => {
            "python -m venv venv && source venv/bin/activate && pip install -r requirements.txt"
        }
        DependencyManager::Uv => "uv venv && uv pip install -r requirements.txt",
        DependencyManager::Poetry => "poetry install",
        DependencyManager::Pdm => "pdm install",
    }
}

fn print_next_steps(
    project: &ProjectDescriptor,
    report: &GenerationReport,
    output: Output,
    interactive: bool,
) -> Result<()> {
    let mut steps = Vec::new();
    match output {
        Output::Zip => {
            steps.push(format!("unzip {}", report.location.display()));
            steps.push(format!("cd {}", project.name));
        }
        Output::Folder => {
            let current = std::env::current_dir().ok();
            if current.as_ref() != Some(&report.location) {
                steps.push(format!("cd {}", report.location.display()));
            }
        }
    }
    steps.push(install_command(project.manager).to_string());
    steps.push("robot -d results tests".to_string());

    println!();
    println!("  {}", "Next steps".bold());
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}  {}", format!("{}.", i + 1).dimmed(), step);
    }

    if interactive {
        cliclack::outro("Happy testing!")?;
    } else {
        println!();
    }

    Ok(())
}
