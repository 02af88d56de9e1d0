//! Immutable project snapshot handed to the renderer

use crate::catalog::{Capability, Catalog, Dependency, LibraryDescriptor};
use crate::error::{SelectionError, SelectionResult};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PROJECT_NAME: &str = "my-robot-project";
pub const DEFAULT_PROJECT_DESCRIPTION: &str = "A Robot Framework project for test automation";

/// Supported dependency managers
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DependencyManager {
    #[value(alias = "pip")]
    #[serde(alias = "pip")]
    Venv,
    #[default]
    Uv,
    Poetry,
    Pdm,
}

impl DependencyManager {
    pub const ALL: [DependencyManager; 4] = [
        DependencyManager::Venv,
        DependencyManager::Uv,
        DependencyManager::Poetry,
        DependencyManager::Pdm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyManager::Venv => "venv",
            DependencyManager::Uv => "uv",
            DependencyManager::Poetry => "poetry",
            DependencyManager::Pdm => "pdm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DependencyManager::Venv => "venv + pip",
            DependencyManager::Uv => "uv",
            DependencyManager::Poetry => "Poetry",
            DependencyManager::Pdm => "PDM",
        }
    }

    /// Name of the manifest file this manager reads
    pub fn manifest_file(&self) -> &'static str {
        match self {
            DependencyManager::Venv | DependencyManager::Uv => "requirements.txt",
            DependencyManager::Poetry | DependencyManager::Pdm => "pyproject.toml",
        }
    }
}

impl fmt::Display for DependencyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DependencyManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "venv" | "pip" => Ok(DependencyManager::Venv),
            "uv" => Ok(DependencyManager::Uv),
            "poetry" => Ok(DependencyManager::Poetry),
            "pdm" => Ok(DependencyManager::Pdm),
            other => Err(format!(
                "unknown dependency manager '{}' (expected venv, uv, poetry or pdm)",
                other
            )),
        }
    }
}

/// Which web automation library the sample files are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebDriver {
    Selenium,
    Browser,
    None,
}

impl WebDriver {
    pub fn is_web(&self) -> bool {
        !matches!(self, WebDriver::None)
    }
}

/// User-editable project settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub name: String,
    pub description: String,
    pub python_version: String,
    pub robot_framework_version: String,
    pub manager: DependencyManager,
}

impl ProjectSettings {
    /// Defaults taken from the catalog
    pub fn defaults(catalog: &Catalog) -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            description: DEFAULT_PROJECT_DESCRIPTION.to_string(),
            python_version: catalog.default_python_version().to_string(),
            robot_framework_version: catalog.default_robot_framework_version().to_string(),
            manager: DependencyManager::default(),
        }
    }
}

/// A selected library with its effective values attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    pub id: String,
    pub name: String,
    pub import_name: String,
    pub builtin: bool,
    pub capability: Capability,
    /// `None` when the library is unversioned
    pub version: Option<String>,
    /// Declared parameters with effective values, in declaration order
    pub parameters: Vec<(String, String)>,
    pub dependencies: Vec<ResolvedDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,
    pub version: Option<String>,
    /// `platform_system` value, `None` for all platforms
    pub platform: Option<&'static str>,
}

impl From<&Dependency> for ResolvedDependency {
    fn from(dep: &Dependency) -> Self {
        Self {
            name: dep.name.clone(),
            version: dep.pinned_version().map(str::to_string),
            platform: dep.os.platform_system(),
        }
    }
}

impl ResolvedLibrary {
    fn resolve(lib: &LibraryDescriptor, selection: &Selection) -> Self {
        Self {
            id: lib.id.clone(),
            name: lib.name.clone(),
            import_name: lib.import_name().to_string(),
            builtin: lib.origin.is_builtin(),
            capability: lib.capability,
            version: selection.resolve_version(&lib.id).map(str::to_string),
            parameters: selection.resolved_parameters(lib),
            dependencies: lib.dependencies.iter().map(ResolvedDependency::from).collect(),
        }
    }
}

/// Confirmed snapshot of everything generation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub name: String,
    pub description: String,
    pub python_version: String,
    pub robot_framework_version: String,
    pub manager: DependencyManager,
    pub libraries: Vec<ResolvedLibrary>,
}

impl ProjectDescriptor {
    /// Validate settings and copy the current selection into a snapshot.
    ///
    /// Later changes to `selection` do not affect the returned descriptor.
    pub fn snapshot(
        catalog: &Catalog,
        selection: &Selection,
        settings: ProjectSettings,
    ) -> SelectionResult<Self> {
        validate_project_name(&settings.name)?;

        if !catalog.python_versions().contains(&settings.python_version) {
            return Err(SelectionError::UnsupportedVersion {
                kind: "python",
                version: settings.python_version,
            });
        }
        if !catalog
            .robot_framework_versions()
            .contains(&settings.robot_framework_version)
        {
            return Err(SelectionError::UnsupportedVersion {
                kind: "robot framework",
                version: settings.robot_framework_version,
            });
        }

        let libraries = selection
            .selected()
            .iter()
            .map(|id| {
                catalog
                    .library(id)
                    .map(|lib| ResolvedLibrary::resolve(lib, selection))
                    .ok_or_else(|| SelectionError::UnknownLibrary(id.clone()))
            })
            .collect::<SelectionResult<Vec<_>>>()?;

        Ok(Self {
            name: settings.name,
            description: settings.description,
            python_version: settings.python_version,
            robot_framework_version: settings.robot_framework_version,
            manager: settings.manager,
            libraries,
        })
    }

    /// Libraries that belong in a dependency manifest
    pub fn external_libraries(&self) -> impl Iterator<Item = &ResolvedLibrary> {
        self.libraries.iter().filter(|lib| !lib.builtin)
    }

    /// Project name as a PEP 508 distribution name, for `pyproject.toml`.
    ///
    /// Runs of other characters become a single `-`; the result starts and
    /// ends with a letter or digit.
    pub fn package_name(&self) -> String {
        let mut name = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                name.push(c);
            } else if !name.ends_with('-') {
                name.push('-');
            }
        }
        let name = name.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if name.is_empty() {
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            name.to_string()
        }
    }

    /// Web automation library the sample files target.
    ///
    /// Selenium and Browser are hard-incompatible, so at most one is present.
    pub fn web_driver(&self) -> WebDriver {
        let mut driver = WebDriver::None;
        for lib in &self.libraries {
            match lib.capability {
                Capability::WebUiSelenium => return WebDriver::Selenium,
                Capability::WebUiBrowser => driver = WebDriver::Browser,
                Capability::None => {}
            }
        }
        driver
    }
}

/// Project names become the archive root folder
pub fn validate_project_name(name: &str) -> SelectionResult<()> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if invalid {
        return Err(SelectionError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}
