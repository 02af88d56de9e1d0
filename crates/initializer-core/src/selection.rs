//! Library selection state and version/parameter resolution
//!
//! Every catalog library gets its default version and parameter values when the
//! selection is created, whether or not it is ever selected. Lookups therefore
//! never have to distinguish "untouched" from "overridden".

use crate::catalog::{Catalog, LibraryDescriptor};
use crate::compat::Decision;
use crate::error::{SelectionError, SelectionResult};
use std::collections::HashMap;

/// Whether the caller has explicitly accepted a soft conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    Unconfirmed,
    Confirmed,
}

/// Selected library ids plus per-library version and parameter values
#[derive(Debug, Clone)]
pub struct Selection {
    selected: Vec<String>,
    versions: HashMap<String, String>,
    parameters: HashMap<String, HashMap<String, String>>,
}

impl Selection {
    /// New selection holding the catalog's default libraries
    pub fn new(catalog: &Catalog) -> Self {
        let mut selection = Self::empty(catalog);
        selection.selected = catalog.default_selection().to_vec();
        selection
    }

    /// New selection with nothing selected
    pub fn empty(catalog: &Catalog) -> Self {
        let mut versions = HashMap::new();
        let mut parameters = HashMap::new();

        for lib in catalog.libraries() {
            if let Some(latest) = lib.latest_version() {
                versions.insert(lib.id.clone(), latest.to_string());
            }
            if !lib.parameters.is_empty() {
                let defaults = lib
                    .parameters
                    .iter()
                    .map(|p| (p.name.clone(), p.default_value.clone()))
                    .collect();
                parameters.insert(lib.id.clone(), defaults);
            }
        }

        Self {
            selected: Vec::new(),
            versions,
            parameters,
        }
    }

    /// Selected ids in selection order
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Evaluate an addition without committing it
    pub fn evaluate(&self, catalog: &Catalog, id: &str) -> SelectionResult<Decision> {
        known(catalog, id)?;
        Ok(catalog.evaluate(id, &self.selected))
    }

    /// Add a library, subject to the compatibility decision.
    ///
    /// A soft conflict is committed only with `Confirmation::Confirmed`.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        id: &str,
        confirmation: Confirmation,
    ) -> SelectionResult<()> {
        match self.evaluate(catalog, id)? {
            Decision::Allowed => {}
            Decision::Blocked { with } => {
                return Err(SelectionError::Rejected {
                    candidate: id.to_string(),
                    with,
                });
            }
            Decision::Warn { with } => {
                if confirmation != Confirmation::Confirmed {
                    return Err(SelectionError::NeedsConfirmation {
                        candidate: id.to_string(),
                        with,
                    });
                }
                tracing::debug!(id, ?with, "soft conflict confirmed");
            }
        }

        if !self.is_selected(id) {
            self.selected.push(id.to_string());
        }
        Ok(())
    }

    /// Remove a library; always permitted
    pub fn remove(&mut self, id: &str) {
        self.selected.retain(|s| s != id);
    }

    /// Remove when selected, add otherwise
    pub fn toggle(
        &mut self,
        catalog: &Catalog,
        id: &str,
        confirmation: Confirmation,
    ) -> SelectionResult<()> {
        if self.is_selected(id) {
            self.remove(id);
            Ok(())
        } else {
            self.add(catalog, id, confirmation)
        }
    }

    /// Choose a version from the library's declared list
    pub fn set_version(&mut self, catalog: &Catalog, id: &str, version: &str) -> SelectionResult<()> {
        let lib = known(catalog, id)?;
        if !lib.has_version(version) {
            return Err(SelectionError::UnknownVersion {
                library: id.to_string(),
                version: version.to_string(),
            });
        }
        self.versions.insert(id.to_string(), version.to_string());
        Ok(())
    }

    /// Set a parameter value, checking boolean parameters against their allowed values
    pub fn set_parameter(
        &mut self,
        catalog: &Catalog,
        id: &str,
        name: &str,
        value: &str,
    ) -> SelectionResult<()> {
        let lib = known(catalog, id)?;
        let param = lib
            .parameter(name)
            .ok_or_else(|| SelectionError::UnknownParameter {
                library: id.to_string(),
                parameter: name.to_string(),
            })?;
        if !param.accepts(value) {
            return Err(SelectionError::InvalidParameterValue {
                library: id.to_string(),
                parameter: name.to_string(),
                value: value.to_string(),
                allowed: param.values.clone(),
            });
        }
        self.parameters
            .entry(id.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Effective version: override, else latest; `None` for unversioned libraries
    pub fn resolve_version(&self, id: &str) -> Option<&str> {
        self.versions.get(id).map(String::as_str)
    }

    /// Effective parameter value: override, else declared default
    pub fn resolve_parameter(&self, id: &str, name: &str) -> Option<&str> {
        self.parameters
            .get(id)
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// Every declared parameter of `lib` with its effective value, in declaration order
    pub fn resolved_parameters(&self, lib: &LibraryDescriptor) -> Vec<(String, String)> {
        lib.parameters
            .iter()
            .map(|p| {
                let value = self
                    .resolve_parameter(&lib.id, &p.name)
                    .unwrap_or(&p.default_value);
                (p.name.clone(), value.to_string())
            })
            .collect()
    }
}

fn known<'a>(catalog: &'a Catalog, id: &str) -> SelectionResult<&'a LibraryDescriptor> {
    catalog
        .library(id)
        .ok_or_else(|| SelectionError::UnknownLibrary(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELENIUM: &str = "robotframework-seleniumlibrary";
    const BROWSER: &str = "robotframework-browser";
    const APPIUM: &str = "robotframework-appiumlibrary";
    const FTP: &str = "robotframework-ftplibrary";
    const STRING: &str = "robotframework-string";

    fn catalog() -> Catalog {
        Catalog::bundled().unwrap()
    }

    #[test]
    fn test_new_uses_default_selection() {
        let catalog = catalog();
        let selection = Selection::new(&catalog);
        assert_eq!(selection.selected(), catalog.default_selection());
    }

    #[test]
    fn test_defaults_precomputed_for_unselected_libraries() {
        let catalog = catalog();
        let selection = Selection::empty(&catalog);

        assert!(selection.selected().is_empty());
        assert_eq!(selection.resolve_version(SELENIUM), Some("6.7.1"));
        assert_eq!(selection.resolve_version(BROWSER), Some("19.4.0"));
        assert_eq!(selection.resolve_parameter(FTP, "printOutput"), Some("true"));
    }

    #[test]
    fn test_version_default_is_last_listed() {
        let yaml = r#"
default_python_version: "3.12"
default_robot_framework_version: "7.2.2"
python_versions: ["3.12"]
robot_framework_versions: ["7.2.2"]
libraries:
  - id: lib
    name: Lib
    origin: pypi
    versions: ["1.0", "1.1", "2.0"]
"#;
        let catalog = Catalog::from_yaml(yaml, "test").unwrap();
        let selection = Selection::empty(&catalog);
        assert_eq!(selection.resolve_version("lib"), Some("2.0"));
    }

    #[test]
    fn test_builtin_is_unversioned() {
        let selection = Selection::new(&catalog());
        assert_eq!(selection.resolve_version(STRING), None);
    }

    #[test]
    fn test_blocked_addition_is_not_committed() {
        let catalog = catalog();
        let mut selection = Selection::empty(&catalog);
        selection
            .add(&catalog, SELENIUM, Confirmation::Unconfirmed)
            .unwrap();

        let err = selection
            .add(&catalog, BROWSER, Confirmation::Confirmed)
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::Rejected {
                candidate: BROWSER.to_string(),
                with: vec![SELENIUM.to_string()]
            }
        );
        assert!(!selection.is_selected(BROWSER));
    }

    #[test]
    fn test_soft_conflict_needs_confirmation() {
        let catalog = catalog();
        let mut selection = Selection::empty(&catalog);
        selection
            .add(&catalog, BROWSER, Confirmation::Unconfirmed)
            .unwrap();

        let err = selection
            .add(&catalog, APPIUM, Confirmation::Unconfirmed)
            .unwrap_err();
        assert!(matches!(err, SelectionError::NeedsConfirmation { .. }));
        assert!(!selection.is_selected(APPIUM));

        selection
            .add(&catalog, APPIUM, Confirmation::Confirmed)
            .unwrap();
        assert!(selection.is_selected(APPIUM));
    }

    #[test]
    fn test_removal_never_blocked() {
        let catalog = catalog();
        let mut selection = Selection::empty(&catalog);
        selection
            .add(&catalog, BROWSER, Confirmation::Unconfirmed)
            .unwrap();
        selection
            .add(&catalog, APPIUM, Confirmation::Confirmed)
            .unwrap();

        selection.toggle(&catalog, BROWSER, Confirmation::Unconfirmed).unwrap();
        selection.toggle(&catalog, APPIUM, Confirmation::Unconfirmed).unwrap();
        assert!(selection.selected().is_empty());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let catalog = catalog();
        let mut selection = Selection::empty(&catalog);

        selection.toggle(&catalog, SELENIUM, Confirmation::Unconfirmed).unwrap();
        assert!(selection.is_selected(SELENIUM));
        selection.toggle(&catalog, SELENIUM, Confirmation::Unconfirmed).unwrap();
        assert!(!selection.is_selected(SELENIUM));
    }

    #[test]
    fn test_unknown_library_rejected() {
        let catalog = catalog();
        let mut selection = Selection::empty(&catalog);
        let err = selection
            .add(&catalog, "robotframework-nope", Confirmation::Confirmed)
            .unwrap_err();
        assert_eq!(err, SelectionError::UnknownLibrary("robotframework-nope".to_string()));
    }

    #[test]
    fn test_version_override() {
        let catalog = catalog();
        let mut selection = Selection::new(&catalog);

        selection.set_version(&catalog, SELENIUM, "6.1.0").unwrap();
        assert_eq!(selection.resolve_version(SELENIUM), Some("6.1.0"));

        let err = selection.set_version(&catalog, SELENIUM, "99.0").unwrap_err();
        assert!(matches!(err, SelectionError::UnknownVersion { .. }));
        assert_eq!(selection.resolve_version(SELENIUM), Some("6.1.0"));
    }

    #[test]
    fn test_parameter_override() {
        let catalog = catalog();
        let mut selection = Selection::new(&catalog);

        selection
            .set_parameter(&catalog, FTP, "printOutput", "false")
            .unwrap();
        assert_eq!(selection.resolve_parameter(FTP, "printOutput"), Some("false"));

        let err = selection
            .set_parameter(&catalog, FTP, "printOutput", "sometimes")
            .unwrap_err();
        assert!(matches!(err, SelectionError::InvalidParameterValue { .. }));

        let err = selection
            .set_parameter(&catalog, FTP, "timeout", "10")
            .unwrap_err();
        assert!(matches!(err, SelectionError::UnknownParameter { .. }));
    }

    #[test]
    fn test_resolved_parameters_in_declared_order() {
        let catalog = catalog();
        let selection = Selection::new(&catalog);
        let ftp = catalog.library(FTP).unwrap();

        assert_eq!(
            selection.resolved_parameters(ftp),
            vec![("printOutput".to_string(), "true".to_string())]
        );
    }
}
