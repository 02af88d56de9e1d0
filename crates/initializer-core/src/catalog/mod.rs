//! Library catalog loading, validation and queries
//!
//! The catalog is a read-only YAML feed. A Robot Framework catalog is bundled
//! into the binary; a different file can be supplied with `--catalog` or the
//! `ROBOT_INIT_CATALOG` environment variable.
//!
//! Everything that can be wrong with the data (dangling relations, duplicate
//! ids, bad defaults) is reported when the catalog is loaded, so later stages
//! can look ids up without handling "unknown" cases.

pub mod library;

use crate::compat::{Decision, RelationIndex};
use crate::error::{CatalogError, CatalogResult};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

pub use library::{
    Capability, CatalogData, Dependency, LibraryDescriptor, Origin, Parameter, ParameterType,
    TargetOs,
};

/// Environment variable pointing at a catalog file
pub const CATALOG_ENV: &str = "ROBOT_INIT_CATALOG";

const BUNDLED_CATALOG: &str = include_str!("robot-framework.yaml");

/// Where a catalog is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Bundled,
    File(PathBuf),
}

impl CatalogSource {
    /// Explicit path first, then `ROBOT_INIT_CATALOG`, then the bundled catalog
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::File(path.to_path_buf());
        }
        match std::env::var_os(CATALOG_ENV) {
            Some(value) if !value.is_empty() => Self::File(PathBuf::from(value)),
            _ => Self::Bundled,
        }
    }
}

/// Validated, indexed catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    data: CatalogData,
    by_id: HashMap<String, usize>,
    relations: RelationIndex,
}

impl Catalog {
    /// The catalog compiled into the crate
    pub fn bundled() -> CatalogResult<Self> {
        Self::from_yaml(BUNDLED_CATALOG, "bundled catalog")
    }

    /// Load from a source
    pub fn load(source: &CatalogSource) -> CatalogResult<Self> {
        match source {
            CatalogSource::Bundled => Self::bundled(),
            CatalogSource::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })?;
                Self::from_yaml(&content, &path.display().to_string())
            }
        }
    }

    /// Parse and validate a YAML catalog document
    pub fn from_yaml(content: &str, what: &str) -> CatalogResult<Self> {
        let data: CatalogData =
            serde_yaml::from_str(content).map_err(|source| CatalogError::Parse {
                what: what.to_string(),
                source,
            })?;
        Self::from_data(data)
    }

    /// Validate already-parsed catalog data
    pub fn from_data(data: CatalogData) -> CatalogResult<Self> {
        let mut by_id = HashMap::with_capacity(data.libraries.len());
        for (idx, lib) in data.libraries.iter().enumerate() {
            if by_id.insert(lib.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateLibrary(lib.id.clone()));
            }
        }

        validate_versions("python", &data.python_versions, &data.default_python_version)?;
        validate_versions(
            "robot framework",
            &data.robot_framework_versions,
            &data.default_robot_framework_version,
        )?;

        for lib in &data.libraries {
            validate_relations(lib, "conflicting_libraries", &lib.conflicting_libraries, &by_id)?;
            validate_relations(
                lib,
                "incompatible_libraries",
                &lib.incompatible_libraries,
                &by_id,
            )?;
            validate_parameters(lib)?;
        }

        let relations = RelationIndex::build(&data.libraries);

        for id in &data.default_selection {
            if !by_id.contains_key(id) {
                return Err(CatalogError::UnknownLibrary {
                    context: "default_selection".to_string(),
                    library: id.clone(),
                });
            }
        }
        relations.check_no_hard_pairs("default_selection", &data.default_selection)?;

        tracing::debug!(
            libraries = data.libraries.len(),
            python_versions = data.python_versions.len(),
            robot_framework_versions = data.robot_framework_versions.len(),
            "catalog loaded"
        );

        Ok(Self {
            data,
            by_id,
            relations,
        })
    }

    pub fn library(&self, id: &str) -> Option<&LibraryDescriptor> {
        self.by_id.get(id).map(|&idx| &self.data.libraries[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All libraries in catalog order
    pub fn libraries(&self) -> &[LibraryDescriptor] {
        &self.data.libraries
    }

    /// Libraries matching a search term (name or description) and an optional tag
    pub fn search<'a>(
        &'a self,
        term: &'a str,
        tag: Option<&'a str>,
    ) -> impl Iterator<Item = &'a LibraryDescriptor> + 'a {
        self.data
            .libraries
            .iter()
            .filter(move |lib| lib.matches(term) && tag.map_or(true, |t| lib.has_tag(t)))
    }

    /// Sorted, de-duplicated tag list
    pub fn tags(&self) -> Vec<&str> {
        let tags: BTreeSet<&str> = self
            .data
            .libraries
            .iter()
            .flat_map(|lib| lib.tags.iter().map(String::as_str))
            .collect();
        tags.into_iter().collect()
    }

    pub fn python_versions(&self) -> &[String] {
        &self.data.python_versions
    }

    pub fn robot_framework_versions(&self) -> &[String] {
        &self.data.robot_framework_versions
    }

    pub fn default_python_version(&self) -> &str {
        &self.data.default_python_version
    }

    pub fn default_robot_framework_version(&self) -> &str {
        &self.data.default_robot_framework_version
    }

    pub fn default_selection(&self) -> &[String] {
        &self.data.default_selection
    }

    pub fn relations(&self) -> &RelationIndex {
        &self.relations
    }

    /// Compatibility decision for adding `candidate` to `selected`
    pub fn evaluate<S: AsRef<str>>(&self, candidate: &str, selected: &[S]) -> Decision {
        self.relations.evaluate(candidate, selected)
    }
}

fn validate_versions(kind: &'static str, versions: &[String], default: &str) -> CatalogResult<()> {
    if versions.is_empty() {
        return Err(CatalogError::EmptyVersions { kind });
    }
    if !versions.iter().any(|v| v == default) {
        return Err(CatalogError::UnknownDefaultVersion {
            kind,
            version: default.to_string(),
        });
    }
    Ok(())
}

fn validate_relations(
    lib: &LibraryDescriptor,
    relation: &'static str,
    targets: &[String],
    by_id: &HashMap<String, usize>,
) -> CatalogResult<()> {
    for target in targets {
        if *target == lib.id {
            return Err(CatalogError::SelfReference {
                library: lib.id.clone(),
                relation,
            });
        }
        if !by_id.contains_key(target) {
            return Err(CatalogError::UnknownRelation {
                library: lib.id.clone(),
                relation,
                target: target.clone(),
            });
        }
    }
    Ok(())
}

fn validate_parameters(lib: &LibraryDescriptor) -> CatalogResult<()> {
    let mut seen = HashSet::new();
    for param in &lib.parameters {
        let invalid = |message: String| CatalogError::InvalidParameter {
            library: lib.id.clone(),
            parameter: param.name.clone(),
            message,
        };

        if !seen.insert(param.name.as_str()) {
            return Err(invalid("declared more than once".to_string()));
        }
        if param.kind == ParameterType::Boolean && param.values.is_empty() {
            return Err(invalid("boolean parameter has no allowed values".to_string()));
        }
        if !param.accepts(&param.default_value) {
            return Err(invalid(format!(
                "default '{}' is not one of {}",
                param.default_value,
                param.values.join(", ")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
default_python_version: "3.12"
default_robot_framework_version: "7.2.2"
python_versions: ["3.12"]
robot_framework_versions: ["7.2.2"]
libraries:
  - id: a
    name: A
    origin: pypi
    incompatible_libraries: [b]
  - id: b
    name: B
    origin: pypi
"#;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = Catalog::bundled().unwrap();

        assert_eq!(catalog.default_python_version(), "3.12");
        assert_eq!(catalog.default_robot_framework_version(), "7.2.2");
        assert!(catalog.contains("robotframework-seleniumlibrary"));
        assert_eq!(
            catalog.default_selection(),
            &[
                "robotframework-string".to_string(),
                "robotframework-collections".to_string(),
                "robotframework-datetime".to_string()
            ]
        );
    }

    #[test]
    fn test_minimal_catalog_loads() {
        let catalog = Catalog::from_yaml(MINIMAL, "test").unwrap();
        assert_eq!(catalog.libraries().len(), 2);
        assert!(catalog.library("a").is_some());
        assert!(catalog.library("c").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let yaml = MINIMAL.replace("id: b", "id: a");
        let err = Catalog::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLibrary(id) if id == "a"));
    }

    #[test]
    fn test_unknown_relation_rejected() {
        let yaml = MINIMAL.replace("incompatible_libraries: [b]", "incompatible_libraries: [zzz]");
        let err = Catalog::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnknownRelation { ref target, .. } if target == "zzz"
        ));
    }

    #[test]
    fn test_self_reference_flagged() {
        let yaml = MINIMAL.replace(
            "incompatible_libraries: [b]",
            "conflicting_libraries: [a]",
        );
        let err = Catalog::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::SelfReference { ref library, relation: "conflicting_libraries" }
                if library == "a"
        ));
    }

    #[test]
    fn test_unknown_default_version_rejected() {
        let yaml = MINIMAL.replace("python_versions: [\"3.12\"]", "python_versions: [\"3.11\"]");
        let err = Catalog::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDefaultVersion { kind: "python", .. }));
    }

    #[test]
    fn test_bad_parameter_default_rejected() {
        let yaml = format!(
            "{}    parameters:\n      - name: flag\n        type: boolean\n        values: [\"true\", \"false\"]\n        default_value: \"yes\"\n",
            MINIMAL
        );
        let err = Catalog::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidParameter { ref parameter, .. } if parameter == "flag"));
    }

    #[test]
    fn test_incompatible_default_selection_rejected() {
        let yaml = MINIMAL.replace("\nlibraries:\n", "\ndefault_selection: [a, b]\nlibraries:\n");
        let err = Catalog::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, CatalogError::IncompatiblePair { .. }));
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = Catalog::from_yaml("libraries: [", "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_search_by_term_and_tag() {
        let catalog = Catalog::bundled().unwrap();

        let web: Vec<_> = catalog.search("", Some("web")).map(|l| l.id.as_str()).collect();
        assert!(web.contains(&"robotframework-seleniumlibrary"));
        assert!(web.contains(&"robotframework-browser"));
        assert!(!web.contains(&"robotframework-requests"));

        let ssh: Vec<_> = catalog.search("ssh", None).map(|l| l.id.as_str()).collect();
        assert_eq!(ssh, vec!["robotframework-sshlibrary"]);
    }

    #[test]
    fn test_tags_sorted_and_unique() {
        let catalog = Catalog::bundled().unwrap();
        let tags = catalog.tags();

        let mut sorted = tags.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(tags, sorted);
        assert!(tags.contains(&"web"));
    }

    #[test]
    fn test_explicit_source_wins() {
        let source = CatalogSource::resolve(Some(Path::new("custom.yaml")));
        assert_eq!(source, CatalogSource::File(PathBuf::from("custom.yaml")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load(&CatalogSource::File(PathBuf::from("/nonexistent/catalog.yaml")))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
