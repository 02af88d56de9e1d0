//! Initializer Core - Robot Framework project initialization
//!
//! This library turns a library catalog plus a user's choices into a ready-to-run
//! Robot Framework project, delivered as a zip archive or unpacked on disk.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Data** - `catalog` (YAML library feed) and `compat` (symmetric
//!   incompatible/conflicting relations)
//! - **Layer 2: Choices** - `selection` (libraries, versions, parameters),
//!   `preset` (choices from a file) and `project` (immutable snapshot)
//! - **Layer 3: Output** - `render` (file contents), `archive` (zip packaging
//!   and delivery) and `generator` (single in-flight generation)
//! - **Layer 4: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use initializer_core::{Catalog, Confirmation, Generator, ProjectDescriptor};
//! use initializer_core::{DirectoryDelivery, ProjectSettings, Selection};
//!
//! let catalog = Catalog::bundled()?;
//! let mut selection = Selection::new(&catalog);
//! selection.add(&catalog, "robotframework-browser", Confirmation::Unconfirmed)?;
//!
//! let settings = ProjectSettings::defaults(&catalog);
//! let project = ProjectDescriptor::snapshot(&catalog, &selection, settings)?;
//!
//! let generator = Generator::new(DirectoryDelivery::new("."));
//! let report = generator.generate(&project).await?;
//! ```

pub mod archive;
pub mod catalog;
pub mod compat;
pub mod error;
pub mod generator;
pub mod logging;
pub mod preset;
pub mod project;
pub mod render;
pub mod selection;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use archive::{Delivery, DirectoryDelivery, MemoryDelivery, UnpackDelivery};
pub use catalog::{Catalog, CatalogSource, LibraryDescriptor};
pub use compat::Decision;
pub use error::{CatalogError, ScaffoldError, SelectionError};
pub use generator::{GenerationReport, Generator};
pub use preset::Preset;
pub use project::{DependencyManager, ProjectDescriptor, ProjectSettings, WebDriver};
pub use selection::{Confirmation, Selection};

#[cfg(feature = "tui")]
pub use tui::{list_libraries, run};
