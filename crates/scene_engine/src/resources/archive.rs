//! Archives: named byte sources that resources and scripts are read from
//!
//! The resource core only needs two things from storage: list the names that
//! match a pattern, and open a name as a stream. [`Archive`] covers one
//! location; [`ArchiveProvider`] resolves names across the locations of a
//! resource group. Closing a stream is dropping it.

use super::ResourceError;
use globset::{Glob, GlobMatcher};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Readable stream handed to payloads and script loaders
pub type DataStream = Box<dyn Read + Send>;

/// Compile a wildcard pattern (`*.mesh`, `models/**`)
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, ResourceError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| ResourceError::InvalidData(format!("bad pattern '{}': {}", pattern, e)))
}

/// A single storage location
pub trait Archive: Send + Sync + fmt::Debug {
    /// Display name of the location
    fn name(&self) -> &str;

    /// All file names in the archive, sorted
    fn list(&self) -> Result<Vec<String>, ResourceError>;

    /// Whether a file exists
    fn exists(&self, filename: &str) -> bool;

    /// Open a file as a stream
    fn open(&self, filename: &str) -> Result<DataStream, ResourceError>;

    /// File names matching a wildcard pattern, sorted
    fn find(&self, pattern: &str) -> Result<Vec<String>, ResourceError> {
        let matcher = compile_pattern(pattern)?;
        Ok(self
            .list()?
            .into_iter()
            .filter(|name| matcher.is_match(name))
            .collect())
    }
}

/// Resolves names across the archives of a resource group
pub trait ArchiveProvider: Send + Sync {
    /// Names matching `pattern` in `group`, in archive order, without duplicates
    fn find(&self, group: &str, pattern: &str) -> Result<Vec<String>, ResourceError>;

    /// Open `filename` from the first archive of `group` that has it
    fn open(&self, group: &str, filename: &str) -> Result<DataStream, ResourceError>;
}

fn missing_file(archive: &str, filename: &str) -> ResourceError {
    ResourceError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("'{}' not found in archive '{}'", filename, archive),
    ))
}

/// Directory on disk; names are `/`-separated paths relative to the root
#[derive(Debug, Clone)]
pub struct FileSystemArchive {
    name: String,
    root: PathBuf,
}

impl FileSystemArchive {
    /// Create an archive rooted at a directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            name: root.display().to_string(),
            root,
        }
    }

    fn collect(&self, dir: &Path, prefix: &str, names: &mut Vec<String>) -> io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                file_name
            } else {
                format!("{}/{}", prefix, file_name)
            };

            if entry.file_type()?.is_dir() {
                self.collect(&entry.path(), &relative, names)?;
            } else {
                names.push(relative);
            }
        }
        Ok(())
    }
}

impl Archive for FileSystemArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<String>, ResourceError> {
        let mut names = Vec::new();
        self.collect(&self.root, "", &mut names)?;
        names.sort();
        Ok(names)
    }

    fn exists(&self, filename: &str) -> bool {
        self.root.join(filename).is_file()
    }

    fn open(&self, filename: &str) -> Result<DataStream, ResourceError> {
        let path = self.root.join(filename);
        if !path.is_file() {
            return Err(missing_file(&self.name, filename));
        }
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory archive of named buffers
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    name: String,
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryArchive {
    /// Create an empty archive
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add or replace a file
    pub fn insert(&mut self, filename: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(filename.into(), Arc::from(data.into()));
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_file(mut self, filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(filename, data);
        self
    }
}

/// Cursor over a shared buffer so opening a file does not copy it
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Archive for MemoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<String>, ResourceError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn exists(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    fn open(&self, filename: &str) -> Result<DataStream, ResourceError> {
        let data = self
            .files
            .get(filename)
            .ok_or_else(|| missing_file(&self.name, filename))?;
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(data)))))
    }
}
