//! Dependency manifest rendering for each dependency manager

use crate::project::{DependencyManager, ProjectDescriptor, ResolvedDependency};
use toml::{Table, Value};

/// Render the manifest for the project's dependency manager
pub fn render_manifest(project: &ProjectDescriptor) -> String {
    match project.manager {
        DependencyManager::Venv | DependencyManager::Uv => render_requirements(project),
        DependencyManager::Poetry => render_poetry(project),
        DependencyManager::Pdm => render_pdm(project),
    }
}

/// `requirements.txt`: framework, then each external library followed by its dependencies
pub fn render_requirements(project: &ProjectDescriptor) -> String {
    let mut out = requirement_line(
        "robotframework",
        Some(&project.robot_framework_version),
        None,
    );
    out.push('\n');

    for lib in project.external_libraries() {
        out.push_str(&requirement_line(&lib.id, lib.version.as_deref(), None));
        out.push('\n');
        for dep in &lib.dependencies {
            out.push_str(&requirement_line(
                &dep.name,
                dep.version.as_deref(),
                dep.platform,
            ));
            out.push('\n');
        }
    }

    out
}

/// `<name>[==<version>][ ; platform_system=="<os>"]`
fn requirement_line(name: &str, version: Option<&str>, platform: Option<&str>) -> String {
    let mut line = name.to_string();
    if let Some(version) = version {
        line.push_str("==");
        line.push_str(version);
    }
    if let Some(platform) = platform {
        line.push_str(&format!(" ; platform_system==\"{}\"", platform));
    }
    line
}

/// `pyproject.toml` with a `[tool.poetry]` table
pub fn render_poetry(project: &ProjectDescriptor) -> String {
    let mut dependencies = Table::new();
    dependencies.insert(
        "python".to_string(),
        Value::String(format!("^{}", project.python_version)),
    );
    dependencies.insert(
        "robotframework".to_string(),
        Value::String(format!("^{}", project.robot_framework_version)),
    );

    for lib in project.external_libraries() {
        let version = match &lib.version {
            Some(version) => format!("^{}", version),
            None => "*".to_string(),
        };
        dependencies.insert(lib.id.clone(), Value::String(version));
    }

    for dep in merged_dependencies(project) {
        let version = Value::String(dep.version.unwrap_or_else(|| "*".to_string()));
        let value = match dep.markers {
            Some(markers) => {
                let mut constraint = Table::new();
                constraint.insert("version".to_string(), version);
                constraint.insert("markers".to_string(), Value::String(markers));
                Value::Table(constraint)
            }
            None => version,
        };
        dependencies.insert(dep.name, value);
    }

    let mut poetry = Table::new();
    poetry.insert("name".to_string(), Value::String(project.package_name()));
    poetry.insert("version".to_string(), Value::from("0.1.0"));
    poetry.insert(
        "description".to_string(),
        Value::String(project.description.clone()),
    );
    poetry.insert(
        "authors".to_string(),
        Value::Array(vec![Value::from("Your Name <your.email@example.com>")]),
    );
    poetry.insert("package-mode".to_string(), Value::Boolean(false));
    poetry.insert("dependencies".to_string(), Value::Table(dependencies));

    let mut tool = Table::new();
    tool.insert("poetry".to_string(), Value::Table(poetry));

    let mut document = Table::new();
    document.insert("tool".to_string(), Value::Table(tool));
    document.insert(
        "build-system".to_string(),
        build_system("poetry-core", "poetry.core.masonry.api"),
    );
    document.to_string()
}

/// `pyproject.toml` with a PEP 621 `[project]` table for PDM
pub fn render_pdm(project: &ProjectDescriptor) -> String {
    let mut dependencies = vec![Value::String(format!(
        "robotframework=={}",
        project.robot_framework_version
    ))];
    for lib in project.external_libraries() {
        dependencies.push(Value::String(pep508(&lib.id, lib.version.as_deref(), None)));
        for dep in &lib.dependencies {
            dependencies.push(Value::String(pep508(
                &dep.name,
                dep.version.as_deref(),
                dep.platform,
            )));
        }
    }

    let mut author = Table::new();
    author.insert("name".to_string(), Value::from("Your Name"));
    author.insert("email".to_string(), Value::from("your.email@example.com"));

    let mut table = Table::new();
    table.insert("name".to_string(), Value::String(project.package_name()));
    table.insert("version".to_string(), Value::from("0.1.0"));
    table.insert(
        "description".to_string(),
        Value::String(project.description.clone()),
    );
    table.insert("authors".to_string(), Value::Array(vec![Value::Table(author)]));
    table.insert("dependencies".to_string(), Value::Array(dependencies));
    table.insert(
        "requires-python".to_string(),
        Value::String(format!(">={}", project.python_version)),
    );

    let mut document = Table::new();
    document.insert("project".to_string(), Value::Table(table));
    document.insert(
        "build-system".to_string(),
        build_system("pdm-backend", "pdm.backend"),
    );
    document.to_string()
}

fn build_system(requires: &str, backend: &str) -> Value {
    let mut table = Table::new();
    table.insert("requires".to_string(), Value::Array(vec![Value::from(requires)]));
    table.insert("build-backend".to_string(), Value::from(backend));
    Value::Table(table)
}

fn pep508(name: &str, version: Option<&str>, platform: Option<&str>) -> String {
    let mut spec = name.to_string();
    if let Some(version) = version {
        spec.push_str("==");
        spec.push_str(version);
    }
    if let Some(platform) = platform {
        spec.push_str(&format!("; {}", marker(platform)));
    }
    spec
}

fn marker(platform: &str) -> String {
    format!("platform_system == '{}'", platform)
}

/// A dependency shared by several libraries, listed once
struct MergedDependency {
    name: String,
    version: Option<String>,
    /// `None` when any contributor applies to all platforms
    markers: Option<String>,
}

/// TOML tables cannot repeat keys, so dependencies are merged by name:
/// the first pinned version wins and platform markers are OR-ed.
fn merged_dependencies(project: &ProjectDescriptor) -> Vec<MergedDependency> {
    let mut merged: Vec<(String, Option<String>, Option<Vec<&'static str>>)> = Vec::new();

    let deps: Vec<&ResolvedDependency> = project
        .external_libraries()
        .flat_map(|lib| lib.dependencies.iter())
        .collect();

    for dep in deps {
        match merged.iter_mut().find(|(name, _, _)| *name == dep.name) {
            Some((_, version, platforms)) => {
                if version.is_none() {
                    *version = dep.version.clone();
                }
                match dep.platform {
                    None => *platforms = None,
                    Some(platform) => {
                        if let Some(list) = platforms.as_mut() {
                            if !list.contains(&platform) {
                                list.push(platform);
                            }
                        }
                    }
                }
            }
            None => merged.push((
                dep.name.clone(),
                dep.version.clone(),
                dep.platform.map(|p| vec![p]),
            )),
        }
    }

    merged
        .into_iter()
        .map(|(name, version, platforms)| MergedDependency {
            name,
            version,
            markers: platforms.map(|list| {
                list.iter()
                    .map(|p| marker(p))
                    .collect::<Vec<_>>()
                    .join(" or ")
            }),
        })
        .collect()
}
