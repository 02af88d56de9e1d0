//! Catalog data types and parsing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a library comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Ships with Robot Framework, never written to a dependency manifest
    #[serde(alias = "builtIn")]
    BuiltIn,
    /// Installed from a package index
    #[serde(alias = "pypi")]
    ExternalPackage,
}

impl Origin {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Origin::BuiltIn)
    }
}

/// Operating system a dependency is restricted to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    #[default]
    All,
    Windows,
    Linux,
    Darwin,
}

impl TargetOs {
    /// Value of Python's `platform.system()` on this OS, `None` for `All`
    pub fn platform_system(&self) -> Option<&'static str> {
        match self {
            TargetOs::All => None,
            TargetOs::Windows => Some("Windows"),
            TargetOs::Linux => Some("Linux"),
            TargetOs::Darwin => Some("Darwin"),
        }
    }
}

/// Closed set of capabilities that drive the sample test content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[default]
    None,
    WebUiSelenium,
    WebUiBrowser,
}

/// Parameter value kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Boolean,
    #[default]
    Text,
}

/// Library import argument exposed for configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type")]
    pub kind: ParameterType,

    /// Allowed values (boolean parameters only)
    #[serde(default)]
    pub values: Vec<String>,

    pub default_value: String,
}

impl Parameter {
    /// Check a candidate value against the allowed list (text accepts anything)
    pub fn accepts(&self, value: &str) -> bool {
        match self.kind {
            ParameterType::Text => true,
            ParameterType::Boolean => self.values.iter().any(|v| v == value),
        }
    }
}

/// Package that rides along with a library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,

    #[serde(default = "default_dependency_origin")]
    pub origin: Origin,

    #[serde(default)]
    pub os: TargetOs,

    /// Empty or absent means unpinned
    #[serde(default)]
    pub version: Option<String>,
}

fn default_dependency_origin() -> Origin {
    Origin::ExternalPackage
}

impl Dependency {
    /// Version pin, treating an empty string as unpinned
    pub fn pinned_version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }
}

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDescriptor {
    /// Stable identity; also the package name on the index
    pub id: String,

    /// Display name
    pub name: String,

    /// Name used in `Library` imports (defaults to `name`)
    #[serde(default)]
    pub import_name: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: String,

    pub origin: Origin,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub capability: Capability,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Oldest first; the last entry is the default
    #[serde(default)]
    pub versions: Vec<String>,

    /// Soft incompatibilities
    #[serde(default)]
    pub conflicting_libraries: Vec<String>,

    /// Hard incompatibilities
    #[serde(default)]
    pub incompatible_libraries: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl LibraryDescriptor {
    pub fn import_name(&self) -> &str {
        self.import_name.as_deref().unwrap_or(&self.name)
    }

    /// Last listed version, `None` for unversioned libraries
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive substring match over name and description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

impl fmt::Display for LibraryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Root catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub default_python_version: String,

    pub default_robot_framework_version: String,

    pub python_versions: Vec<String>,

    pub robot_framework_versions: Vec<String>,

    /// Library ids selected when a new selection is created
    #[serde(default)]
    pub default_selection: Vec<String>,

    pub libraries: Vec<LibraryDescriptor>,
}
