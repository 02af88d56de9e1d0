//! Compatibility checking between libraries
//!
//! Relations may be declared on one side only in the catalog. The index stores
//! both directions once, at load time, so a check only walks the current
//! selection.

use crate::catalog::LibraryDescriptor;
use crate::error::{CatalogError, CatalogResult};
use std::collections::{BTreeSet, HashMap};

/// Outcome of evaluating a library addition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Hard incompatibility with the listed selected ids
    Blocked { with: Vec<String> },
    /// Soft conflict with the listed selected ids; commit only after confirmation
    Warn { with: Vec<String> },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Blocked { .. })
    }
}

/// Symmetric adjacency of both relation kinds
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    incompatible: HashMap<String, BTreeSet<String>>,
    conflicting: HashMap<String, BTreeSet<String>>,
}

impl RelationIndex {
    pub fn build(libraries: &[LibraryDescriptor]) -> Self {
        let mut index = Self::default();
        for lib in libraries {
            for other in &lib.incompatible_libraries {
                link(&mut index.incompatible, &lib.id, other);
            }
            for other in &lib.conflicting_libraries {
                link(&mut index.conflicting, &lib.id, other);
            }
        }

        for (id, others) in &index.incompatible {
            for other in others {
                if id < other && index.is_conflicting(id, other) {
                    tracing::debug!(%id, %other, "pair is both conflicting and incompatible");
                }
            }
        }

        index
    }

    pub fn is_incompatible(&self, a: &str, b: &str) -> bool {
        self.incompatible.get(a).is_some_and(|set| set.contains(b))
    }

    pub fn is_conflicting(&self, a: &str, b: &str) -> bool {
        self.conflicting.get(a).is_some_and(|set| set.contains(b))
    }

    /// Decide whether `candidate` may join `selected`.
    ///
    /// Only additions are evaluated; a candidate already in the selection is
    /// `Allowed`. Hard incompatibilities are checked before soft conflicts.
    pub fn evaluate<S: AsRef<str>>(&self, candidate: &str, selected: &[S]) -> Decision {
        if selected.iter().any(|s| s.as_ref() == candidate) {
            return Decision::Allowed;
        }

        let blocked = hits(self.incompatible.get(candidate), selected);
        if !blocked.is_empty() {
            tracing::debug!(candidate, with = ?blocked, "addition blocked");
            return Decision::Blocked { with: blocked };
        }

        let conflicts = hits(self.conflicting.get(candidate), selected);
        if !conflicts.is_empty() {
            tracing::debug!(candidate, with = ?conflicts, "addition needs confirmation");
            return Decision::Warn { with: conflicts };
        }

        Decision::Allowed
    }

    /// Fail on the first hard-incompatible pair within `ids`
    pub fn check_no_hard_pairs<S: AsRef<str>>(&self, context: &str, ids: &[S]) -> CatalogResult<()> {
        for (i, first) in ids.iter().enumerate() {
            for second in &ids[i + 1..] {
                if self.is_incompatible(first.as_ref(), second.as_ref()) {
                    return Err(CatalogError::IncompatiblePair {
                        context: context.to_string(),
                        first: first.as_ref().to_string(),
                        second: second.as_ref().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// All softly conflicting pairs within `ids`
    pub fn soft_pairs<S: AsRef<str>>(&self, ids: &[S]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (i, first) in ids.iter().enumerate() {
            for second in &ids[i + 1..] {
                if self.is_conflicting(first.as_ref(), second.as_ref()) {
                    pairs.push((first.as_ref().to_string(), second.as_ref().to_string()));
                }
            }
        }
        pairs
    }
}

fn link(map: &mut HashMap<String, BTreeSet<String>>, a: &str, b: &str) {
    map.entry(a.to_string()).or_default().insert(b.to_string());
    map.entry(b.to_string()).or_default().insert(a.to_string());
}

fn hits<S: AsRef<str>>(related: Option<&BTreeSet<String>>, selected: &[S]) -> Vec<String> {
    let Some(related) = related else {
        return Vec::new();
    };
    let found: BTreeSet<&str> = selected
        .iter()
        .map(|s| s.as_ref())
        .filter(|id| related.contains(*id))
        .collect();
    found.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const SELENIUM: &str = "robotframework-seleniumlibrary";
    const BROWSER: &str = "robotframework-browser";
    const APPIUM: &str = "robotframework-appiumlibrary";
    const SAPGUI: &str = "robotframework-sapguilibrary";
    const REQUESTS: &str = "robotframework-requests";

    fn one_sided() -> Vec<LibraryDescriptor> {
        let yaml = r#"
- id: a
  name: A
  origin: pypi
  incompatible_libraries: [b]
  conflicting_libraries: [c]
- id: b
  name: B
  origin: pypi
- id: c
  name: C
  origin: pypi
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_hard_relation_is_symmetric() {
        let index = RelationIndex::build(&one_sided());

        assert!(index.evaluate("b", &["a"]).is_blocked());
        assert!(index.evaluate("a", &["b"]).is_blocked());
    }

    #[test]
    fn test_soft_relation_is_symmetric() {
        let index = RelationIndex::build(&one_sided());

        assert_eq!(
            index.evaluate("c", &["a"]),
            Decision::Warn {
                with: vec!["a".to_string()]
            }
        );
        assert_eq!(
            index.evaluate("a", &["c"]),
            Decision::Warn {
                with: vec!["c".to_string()]
            }
        );
    }

    #[test]
    fn test_hard_wins_over_soft() {
        let index = RelationIndex::build(&one_sided());
        assert_eq!(
            index.evaluate("a", &["c", "b"]),
            Decision::Blocked {
                with: vec!["b".to_string()]
            }
        );
    }

    #[test]
    fn test_already_selected_is_allowed() {
        let index = RelationIndex::build(&one_sided());
        assert!(index.evaluate("a", &["a", "b"]).is_allowed());
    }

    #[test]
    fn test_empty_selection_is_allowed() {
        let index = RelationIndex::build(&one_sided());
        let empty: [&str; 0] = [];
        assert!(index.evaluate("a", &empty).is_allowed());
    }

    #[test]
    fn test_symmetry_over_bundled_catalog() {
        let catalog = Catalog::bundled().unwrap();
        for lib in catalog.libraries() {
            for other in &lib.incompatible_libraries {
                assert!(catalog.evaluate(other, &[lib.id.as_str()]).is_blocked());
                assert!(catalog.evaluate(&lib.id, &[other.as_str()]).is_blocked());
            }
        }
    }

    #[test]
    fn test_bundled_web_libraries() {
        let catalog = Catalog::bundled().unwrap();

        assert!(catalog.evaluate(BROWSER, &[SELENIUM]).is_blocked());
        assert!(catalog.evaluate(SELENIUM, &[BROWSER]).is_blocked());
        // Appium declares the conflict only on its own side
        assert_eq!(
            catalog.evaluate(BROWSER, &[APPIUM]),
            Decision::Warn {
                with: vec![APPIUM.to_string()]
            }
        );
        assert_eq!(
            catalog.evaluate(SAPGUI, &[SELENIUM, REQUESTS]),
            Decision::Warn {
                with: vec![SELENIUM.to_string()]
            }
        );
        assert!(catalog.evaluate(REQUESTS, &[SELENIUM]).is_allowed());
    }

    #[test]
    fn test_blocked_lists_every_offender_sorted() {
        let yaml = r#"
- id: x
  name: X
  origin: pypi
  incompatible_libraries: [z, y]
- id: y
  name: Y
  origin: pypi
- id: z
  name: Z
  origin: pypi
"#;
        let libs: Vec<LibraryDescriptor> = serde_yaml::from_str(yaml).unwrap();
        let index = RelationIndex::build(&libs);

        assert_eq!(
            index.evaluate("x", &["z", "y"]),
            Decision::Blocked {
                with: vec!["y".to_string(), "z".to_string()]
            }
        );
    }

    #[test]
    fn test_pair_checks() {
        let index = RelationIndex::build(&one_sided());

        assert!(index.check_no_hard_pairs("preset", &["a", "c"]).is_ok());
        assert!(index.check_no_hard_pairs("preset", &["b", "c", "a"]).is_err());
        assert_eq!(
            index.soft_pairs(&["c", "b", "a"]),
            vec![("c".to_string(), "a".to_string())]
        );
    }
}
