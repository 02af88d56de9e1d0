//! Scaffold rendering
//!
//! Turns a [`ProjectDescriptor`] into named text blobs:
//! - the dependency manifest for the chosen manager
//! - README, sample test suite, sample resource and `.gitignore`
//! - the directory layout, including the empty `results/` folder
//!
//! Rendering is pure; the same descriptor always yields the same content.

pub mod manifest;
pub mod readme;
pub mod robot;

use crate::project::ProjectDescriptor;

pub use manifest::render_manifest;
pub use readme::render_readme;
pub use robot::{render_sample_resource, render_sample_test};

/// Folders every scaffold contains, relative to the project root
pub const PROJECT_DIRECTORIES: [&str; 3] = ["tests", "resources", "results"];

pub const SAMPLE_TEST_PATH: &str = "tests/example_test.robot";
pub const SAMPLE_RESOURCE_PATH: &str = "resources/common.resource";

const GITIGNORE: &str = "# Python
__pycache__/
*.py[cod]
*$py.class
*.so
.Python
env/
build/
develop-eggs/
dist/
downloads/
eggs/
.eggs/
lib/
lib64/
parts/
sdist/
var/
*.egg-info/
.installed.cfg
*.egg
venv/
.venv/

# Dependency management
.pdm.toml
.pdm-python
pdm.lock
poetry.lock
uv.lock
.uv/

# Robot Framework
log.html
output.xml
report.html
results/
selenium-screenshot-*.png

# IDE files
.idea/
.vscode/
*.swp
*.swo
";

/// One rendered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the project root, `/`-separated
    pub path: String,
    pub content: String,
}

/// Rendered scaffold: directories plus files, in archive order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedProject {
    pub root: String,
    pub directories: Vec<String>,
    pub files: Vec<RenderedFile>,
}

impl RenderedProject {
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

/// Render every file of the scaffold
pub fn render(project: &ProjectDescriptor) -> RenderedProject {
    let files = vec![
        RenderedFile {
            path: "README.md".to_string(),
            content: render_readme(project),
        },
        RenderedFile {
            path: project.manager.manifest_file().to_string(),
            content: render_manifest(project),
        },
        RenderedFile {
            path: SAMPLE_TEST_PATH.to_string(),
            content: render_sample_test(project),
        },
        RenderedFile {
            path: SAMPLE_RESOURCE_PATH.to_string(),
            content: render_sample_resource(project),
        },
        RenderedFile {
            path: ".gitignore".to_string(),
            content: GITIGNORE.to_string(),
        },
    ];

    tracing::debug!(
        project = %project.name,
        manager = %project.manager,
        libraries = project.libraries.len(),
        "scaffold rendered"
    );

    RenderedProject {
        root: project.name.clone(),
        directories: PROJECT_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::project::{DependencyManager, ProjectSettings};
    use crate::selection::{Confirmation, Selection};

    fn project(manager: DependencyManager) -> ProjectDescriptor {
        let catalog = Catalog::bundled().unwrap();
        let mut selection = Selection::new(&catalog);
        selection
            .add(&catalog, "robotframework-sshlibrary", Confirmation::Unconfirmed)
            .unwrap();
        let mut settings = ProjectSettings::defaults(&catalog);
        settings.manager = manager;
        ProjectDescriptor::snapshot(&catalog, &selection, settings).unwrap()
    }

    #[test]
    fn test_exactly_one_manifest_per_manager() {
        for manager in DependencyManager::ALL {
            let rendered = render(&project(manager));
            let manifests: Vec<_> = rendered
                .paths()
                .filter(|p| *p == "requirements.txt" || *p == "pyproject.toml")
                .collect();
            assert_eq!(manifests, vec![manager.manifest_file()]);
        }
    }

    #[test]
    fn test_layout() {
        let rendered = render(&project(DependencyManager::Uv));

        assert_eq!(rendered.root, "my-robot-project");
        assert_eq!(rendered.directories, vec!["tests", "resources", "results"]);
        assert_eq!(
            rendered.paths().collect::<Vec<_>>(),
            vec![
                "README.md",
                "requirements.txt",
                "tests/example_test.robot",
                "resources/common.resource",
                ".gitignore",
            ]
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let project = project(DependencyManager::Poetry);
        assert_eq!(render(&project), render(&project));
    }

    #[test]
    fn test_gitignore_is_static() {
        let a = render(&project(DependencyManager::Uv));
        let b = render(&project(DependencyManager::Pdm));
        assert_eq!(a.file(".gitignore"), b.file(".gitignore"));
        assert!(a.file(".gitignore").unwrap().contains("output.xml\n"));
    }
}
