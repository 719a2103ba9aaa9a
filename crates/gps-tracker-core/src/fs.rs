//! Filesystem abstraction.
//!
//! The config store reads one small file from whatever storage the platform
//! provides:
//! - Linux: a data directory on the host filesystem
//! - ESP32: a SPIFFS partition mounted into the VFS
//!
//! Both end up behind `std::fs`, so [`StdFilesystem`] serves either one once
//! the storage is mounted.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// An open file handle.
///
/// The handle is closed when it is dropped.
pub trait ConfigFile: Read {
    /// Size of the file in bytes.
    fn size(&self) -> io::Result<u64>;
}

/// Storage that config files are read from.
pub trait Filesystem {
    type File: ConfigFile;

    /// Make the storage available. Called once during startup.
    fn mount(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Open a file for reading. Paths are absolute within the storage,
    /// e.g. `/config.json`.
    fn open(&self, path: &str) -> io::Result<Self::File>;
}

impl ConfigFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

/// Filesystem backed by `std::fs`, rooted at a directory.
#[derive(Debug, Clone)]
pub struct StdFilesystem {
    root: PathBuf,
}

impl StdFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage path onto the host path below the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Filesystem for StdFilesystem {
    type File = File;

    fn mount(&mut self) -> io::Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            ))
        }
    }

    fn open(&self, path: &str) -> io::Result<File> {
        File::open(self.resolve(path))
    }
}
