//! Project presets
//!
//! A preset is a YAML file carrying project settings, a library selection and
//! per-library overrides. It is validated against the catalog when loaded, so
//! a bad id or version is reported before any prompt or generation runs.
//!
//! ```yaml
//! name: checkout-tests
//! manager: poetry
//! libraries: [robotframework-browser, robotframework-requests]
//! versions:
//!   robotframework-browser: "19.1.0"
//! parameters:
//!   robotframework-ftplibrary:
//!     printOutput: "false"
//! ```

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult, SelectionError};
use crate::project::{DependencyManager, ProjectSettings};
use crate::selection::{Confirmation, Selection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub python_version: Option<String>,

    #[serde(default)]
    pub robot_framework_version: Option<String>,

    #[serde(default)]
    pub manager: Option<DependencyManager>,

    /// Replaces the catalog's default selection when present
    #[serde(default)]
    pub libraries: Option<Vec<String>>,

    #[serde(default)]
    pub versions: BTreeMap<String, String>,

    #[serde(default)]
    pub parameters: BTreeMap<String, BTreeMap<String, String>>,
}

impl Preset {
    /// Read, parse and validate a preset file
    pub fn load(path: &Path, catalog: &Catalog) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, &path.display().to_string(), catalog)
    }

    pub fn from_yaml(content: &str, what: &str, catalog: &Catalog) -> CatalogResult<Self> {
        let preset: Preset = serde_yaml::from_str(content).map_err(|source| CatalogError::Parse {
            what: what.to_string(),
            source,
        })?;
        preset.validate(catalog, what)?;
        Ok(preset)
    }

    /// Check every reference against the catalog
    pub fn validate(&self, catalog: &Catalog, context: &str) -> CatalogResult<()> {
        if let Some(version) = &self.python_version {
            if !catalog.python_versions().contains(version) {
                return Err(CatalogError::Invalid {
                    context: context.to_string(),
                    message: format!("python version '{}' is not offered", version),
                });
            }
        }
        if let Some(version) = &self.robot_framework_version {
            if !catalog.robot_framework_versions().contains(version) {
                return Err(CatalogError::Invalid {
                    context: context.to_string(),
                    message: format!("robot framework version '{}' is not offered", version),
                });
            }
        }

        if let Some(libraries) = &self.libraries {
            for id in libraries {
                if !catalog.contains(id) {
                    return Err(CatalogError::UnknownLibrary {
                        context: context.to_string(),
                        library: id.clone(),
                    });
                }
            }
            catalog.relations().check_no_hard_pairs(context, libraries)?;
            for (first, second) in catalog.relations().soft_pairs(libraries) {
                tracing::warn!(%first, %second, "preset selects conflicting libraries");
            }
        }

        for (id, version) in &self.versions {
            let lib = catalog.library(id).ok_or_else(|| CatalogError::UnknownLibrary {
                context: context.to_string(),
                library: id.clone(),
            })?;
            if !lib.has_version(version) {
                return Err(CatalogError::UnknownVersion {
                    context: context.to_string(),
                    library: id.clone(),
                    version: version.clone(),
                });
            }
        }

        for (id, params) in &self.parameters {
            let lib = catalog.library(id).ok_or_else(|| CatalogError::UnknownLibrary {
                context: context.to_string(),
                library: id.clone(),
            })?;
            for (name, value) in params {
                let param = lib.parameter(name).ok_or_else(|| CatalogError::UnknownParameter {
                    context: context.to_string(),
                    library: id.clone(),
                    parameter: name.clone(),
                })?;
                if !param.accepts(value) {
                    return Err(CatalogError::Invalid {
                        context: context.to_string(),
                        message: format!(
                            "'{}' is not an allowed value for {}.{}",
                            value, id, name
                        ),
                    });
                }
            }
        }

        Ok(())
    }

    /// Overlay the preset's settings
    pub fn apply_settings(&self, settings: &mut ProjectSettings) {
        if let Some(name) = &self.name {
            settings.name = name.clone();
        }
        if let Some(description) = &self.description {
            settings.description = description.clone();
        }
        if let Some(version) = &self.python_version {
            settings.python_version = version.clone();
        }
        if let Some(version) = &self.robot_framework_version {
            settings.robot_framework_version = version.clone();
        }
        if let Some(manager) = self.manager {
            settings.manager = manager;
        }
    }

    /// Build the selection the preset describes.
    ///
    /// Listing two softly conflicting libraries counts as confirming the conflict.
    pub fn selection(&self, catalog: &Catalog) -> Result<Selection, SelectionError> {
        let mut selection = match &self.libraries {
            Some(libraries) => {
                let mut selection = Selection::empty(catalog);
                for id in libraries {
                    selection.add(catalog, id, Confirmation::Confirmed)?;
                }
                selection
            }
            None => Selection::new(catalog),
        };

        for (id, version) in &self.versions {
            selection.set_version(catalog, id, version)?;
        }
        for (id, params) in &self.parameters {
            for (name, value) in params {
                selection.set_parameter(catalog, id, name, value)?;
            }
        }

        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::bundled().unwrap()
    }

    #[test]
    fn test_full_preset() {
        let catalog = catalog();
        let yaml = r#"
name: checkout-tests
manager: poetry
libraries: [robotframework-browser, robotframework-ftplibrary]
versions:
  robotframework-browser: "19.1.0"
parameters:
  robotframework-ftplibrary:
    printOutput: "false"
"#;
        let preset = Preset::from_yaml(yaml, "preset.yaml", &catalog).unwrap();

        let mut settings = ProjectSettings::defaults(&catalog);
        preset.apply_settings(&mut settings);
        assert_eq!(settings.name, "checkout-tests");
        assert_eq!(settings.manager, DependencyManager::Poetry);
        assert_eq!(settings.python_version, "3.12");

        let selection = preset.selection(&catalog).unwrap();
        assert_eq!(
            selection.selected(),
            &["robotframework-browser".to_string(), "robotframework-ftplibrary".to_string()]
        );
        assert_eq!(selection.resolve_version("robotframework-browser"), Some("19.1.0"));
        assert_eq!(
            selection.resolve_parameter("robotframework-ftplibrary", "printOutput"),
            Some("false")
        );
    }

    #[test]
    fn test_empty_preset_keeps_defaults() {
        let catalog = catalog();
        let preset = Preset::from_yaml("{}", "preset.yaml", &catalog).unwrap();
        let selection = preset.selection(&catalog).unwrap();
        assert_eq!(selection.selected(), catalog.default_selection());
    }

    #[test]
    fn test_incompatible_libraries_rejected_at_load() {
        let yaml = "libraries: [robotframework-seleniumlibrary, robotframework-browser]\n";
        let err = Preset::from_yaml(yaml, "preset.yaml", &catalog()).unwrap_err();
        assert!(matches!(err, CatalogError::IncompatiblePair { .. }));
    }

    #[test]
    fn test_soft_conflict_accepted() {
        let catalog = catalog();
        let yaml = "libraries: [robotframework-browser, robotframework-appiumlibrary]\n";
        let preset = Preset::from_yaml(yaml, "preset.yaml", &catalog).unwrap();
        assert_eq!(preset.selection(&catalog).unwrap().selected().len(), 2);
    }

    #[test]
    fn test_unknown_references_rejected_at_load() {
        let catalog = catalog();

        let err = Preset::from_yaml("libraries: [nope]\n", "p", &catalog).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownLibrary { .. }));

        let err = Preset::from_yaml(
            "versions:\n  robotframework-browser: \"1.0\"\n",
            "p",
            &catalog,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownVersion { .. }));

        let err = Preset::from_yaml(
            "parameters:\n  robotframework-ftplibrary:\n    verbose: \"true\"\n",
            "p",
            &catalog,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownParameter { .. }));

        let err = Preset::from_yaml("python_version: \"2.7\"\n", "p", &catalog).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Preset::from_yaml("colour: blue\n", "p", &catalog()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
