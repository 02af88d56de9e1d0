//! Scaffold packaging
//!
//! A fresh in-memory [`ScaffoldTree`] is built for every generation. All
//! declared folders are created before any file is added, so a folder failure
//! aborts the build with nothing written. The tree is then serialized as a zip
//! rooted at the project name.

pub mod delivery;

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::render::RenderedProject;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub use delivery::{Delivery, DirectoryDelivery, MemoryDelivery, UnpackDelivery};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Dir(String),
    File { path: String, content: Vec<u8> },
}

impl Entry {
    fn path(&self) -> &str {
        match self {
            Entry::Dir(path) => path,
            Entry::File { path, .. } => path,
        }
    }
}

/// In-memory file tree under a single root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldTree {
    root: String,
    entries: Vec<Entry>,
}

impl ScaffoldTree {
    /// Create the root folder
    pub fn new(root: &str) -> ScaffoldResult<Self> {
        if let Err(reason) = check_segment(root) {
            return Err(ScaffoldError::Folder {
                path: root.to_string(),
                reason,
            });
        }
        Ok(Self {
            root: root.to_string(),
            entries: Vec::new(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Create a folder; its parent must already exist
    pub fn add_dir(&mut self, path: &str) -> ScaffoldResult<()> {
        let folder_error = |reason: String| ScaffoldError::Folder {
            path: path.to_string(),
            reason,
        };

        check_relative(path).map_err(folder_error)?;
        match self.find(path) {
            Some(Entry::Dir(_)) => return Ok(()),
            Some(Entry::File { .. }) => {
                return Err(folder_error("a file with that name exists".to_string()))
            }
            None => {}
        }
        self.check_parent(path).map_err(folder_error)?;

        self.entries.push(Entry::Dir(path.to_string()));
        Ok(())
    }

    /// Add a file; its parent folder must already exist
    pub fn add_file(&mut self, path: &str, content: impl Into<Vec<u8>>) -> ScaffoldResult<()> {
        let file_error = |reason: String| ScaffoldError::File {
            path: path.to_string(),
            reason,
        };

        check_relative(path).map_err(file_error)?;
        if self.find(path).is_some() {
            return Err(file_error("path already exists".to_string()));
        }
        self.check_parent(path).map_err(file_error)?;

        self.entries.push(Entry::File {
            path: path.to_string(),
            content: content.into(),
        });
        Ok(())
    }

    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Dir(path) => Some(path.as_str()),
            Entry::File { .. } => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().filter_map(|e| match e {
            Entry::File { path, content } => Some((path.as_str(), content.as_slice())),
            Entry::Dir(_) => None,
        })
    }

    /// Serialize as a zip with explicit directory entries.
    ///
    /// Timestamps and permissions are fixed so equal trees give equal bytes.
    pub fn to_zip(&self) -> ScaffoldResult<Vec<u8>> {
        let mut zip_buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
            let base = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(DateTime::default());
            let dir_options = base.unix_permissions(0o755);
            let file_options = base.unix_permissions(0o644);

            zip.add_directory(format!("{}/", self.root), dir_options)?;
            for entry in &self.entries {
                match entry {
                    Entry::Dir(path) => {
                        zip.add_directory(format!("{}/{}/", self.root, path), dir_options)?;
                    }
                    Entry::File { path, content } => {
                        zip.start_file(format!("{}/{}", self.root, path), file_options)?;
                        zip.write_all(content).map_err(|source| ScaffoldError::Io {
                            path: PathBuf::from(&self.root).join(path),
                            source,
                        })?;
                    }
                }
            }

            zip.finish()?;
        }

        Ok(zip_buffer)
    }

    fn find(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path() == path)
    }

    fn check_parent(&self, path: &str) -> Result<(), String> {
        match path.rsplit_once('/') {
            None => Ok(()),
            Some((parent, _)) => match self.find(parent) {
                Some(Entry::Dir(_)) => Ok(()),
                Some(Entry::File { .. }) => Err(format!("parent '{}' is a file", parent)),
                None => Err(format!("parent folder '{}' does not exist", parent)),
            },
        }
    }
}

fn check_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty name".to_string());
    }
    if segment == "." || segment == ".." {
        return Err("relative path component".to_string());
    }
    if segment.contains(['/', '\\']) {
        return Err("contains a path separator".to_string());
    }
    if segment.chars().any(char::is_control) {
        return Err("contains control characters".to_string());
    }
    Ok(())
}

fn check_relative(path: &str) -> Result<(), String> {
    path.split('/').try_for_each(check_segment)
}

/// Build the tree for a rendered project: root, then every folder, then files
pub fn build_tree(rendered: &RenderedProject) -> ScaffoldResult<ScaffoldTree> {
    let mut tree = ScaffoldTree::new(&rendered.root)?;
    for dir in &rendered.directories {
        tree.add_dir(dir)?;
    }
    for file in &rendered.files {
        tree.add_file(&file.path, file.content.as_bytes())?;
    }
    Ok(tree)
}

/// Build and serialize in one step
pub fn package(rendered: &RenderedProject) -> ScaffoldResult<Vec<u8>> {
    build_tree(rendered)?.to_zip()
}

/// An archive entry read back from a zip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    Dir(PathBuf),
    File(PathBuf, Vec<u8>),
}

/// Read every entry of a zip, refusing paths that would escape the extraction root
pub fn read_entries(zip_bytes: &[u8]) -> ScaffoldResult<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();
        let relative = file
            .enclosed_name()
            .filter(|p| is_plain_relative(p))
            .ok_or_else(|| ScaffoldError::UnsafeEntry(name.clone()))?;

        if file.is_dir() {
            entries.push(ArchiveEntry::Dir(relative));
        } else {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|source| ScaffoldError::Io {
                    path: relative.clone(),
                    source,
                })?;
            entries.push(ArchiveEntry::File(relative, contents));
        }
    }

    Ok(entries)
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Extract a zip below `target_dir`.
///
/// Every target path is checked before anything is written: a folder entry
/// that exists as a file, or a file entry that exists as a folder, fails the
/// extraction with the disk untouched.
pub async fn unpack(zip_bytes: &[u8], target_dir: &Path) -> ScaffoldResult<Vec<PathBuf>> {
    let entries = read_entries(zip_bytes)?;
    check_targets(&entries, target_dir).await?;

    tokio::fs::create_dir_all(target_dir)
        .await
        .map_err(|source| ScaffoldError::Io {
            path: target_dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::new();
    for entry in entries {
        match entry {
            ArchiveEntry::Dir(relative) => {
                let path = target_dir.join(relative);
                tokio::fs::create_dir_all(&path)
                    .await
                    .map_err(|source| ScaffoldError::Io {
                        path: path.clone(),
                        source,
                    })?;
            }
            ArchiveEntry::File(relative, contents) => {
                let path = target_dir.join(relative);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|source| ScaffoldError::Io {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                }
                tokio::fs::write(&path, &contents)
                    .await
                    .map_err(|source| ScaffoldError::Io {
                        path: path.clone(),
                        source,
                    })?;
                written.push(path);
            }
        }
    }

    Ok(written)
}

/// Reject entries whose target already exists with the other kind
async fn check_targets(entries: &[ArchiveEntry], target_dir: &Path) -> ScaffoldResult<()> {
    for entry in entries {
        let (relative, want_dir) = match entry {
            ArchiveEntry::Dir(relative) => (relative, true),
            ArchiveEntry::File(relative, _) => (relative, false),
        };
        let path = target_dir.join(relative);
        let metadata = match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => return Err(ScaffoldError::Io { path, source }),
        };

        let display = relative.to_string_lossy().into_owned();
        if want_dir && !metadata.is_dir() {
            return Err(ScaffoldError::Folder {
                path: display,
                reason: "a file with that name exists".to_string(),
            });
        }
        if !want_dir && metadata.is_dir() {
            return Err(ScaffoldError::File {
                path: display,
                reason: "a folder with that name exists".to_string(),
            });
        }
    }
    Ok(())
}
