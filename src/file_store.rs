//! The generated application's file tree.
//!
//! [`FileStore`] keeps everything in memory and is what tests and dry runs
//! inspect. [`DiskFileWriter`] writes the same files below the application
//! root and keeps a [`FileStore`] snapshot of what it wrote.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Destination for the files generated by a template run.
pub trait FileWriter {
    /// Writes `content` to `path`, replacing whatever was there.
    fn write(&mut self, path: &str, content: &str) -> Result<()>;

    /// Current content of `path`, or `None` if the file does not exist.
    fn read_existing(&self, path: &str) -> Result<Option<String>>;

    /// Files known to this writer, in first-write order.
    fn files(&self) -> &FileStore;
}

/// Relative path -> final content, in first-write order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileStore {
    files: IndexMap<String, String>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file that already exists in the application.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }
}

impl FileWriter for FileStore {
    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        validate_relative_path(path)?;
        debug!("Storing file: {path}");
        self.insert(path, content);
        Ok(())
    }

    fn read_existing(&self, path: &str) -> Result<Option<String>> {
        Ok(self.get(path).map(str::to_string))
    }

    fn files(&self) -> &FileStore {
        self
    }
}

/// Writes generated files below an application root directory.
#[derive(Debug)]
pub struct DiskFileWriter {
    root: PathBuf,
    written: FileStore,
}

impl DiskFileWriter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf(), written: FileStore::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileWriter for DiskFileWriter {
    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        validate_relative_path(path)?;
        let abs_path = self.root.join(path);
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).map_err(Error::IoError)?;
        }
        debug!("Writing file: {}", abs_path.display());
        fs::write(&abs_path, content).map_err(Error::IoError)?;
        self.written.insert(path, content);
        Ok(())
    }

    fn read_existing(&self, path: &str) -> Result<Option<String>> {
        validate_relative_path(path)?;
        let abs_path = self.root.join(path);
        if !abs_path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(abs_path).map(Some).map_err(Error::IoError)
    }

    fn files(&self) -> &FileStore {
        &self.written
    }
}

/// Generated paths must stay inside the application directory.
pub fn validate_relative_path(path: &str) -> Result<()> {
    let candidate = Path::new(path);
    let escapes = path.trim().is_empty()
        || candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));

    if escapes {
        return Err(Error::TemplateError(format!(
            "refusing to write outside the application: '{path}'"
        )));
    }
    Ok(())
}
