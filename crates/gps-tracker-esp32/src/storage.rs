//! SPIFFS storage for the config file.
//!
//! The SPIFFS partition is registered with the ESP-IDF VFS under
//! [`SPIFFS_BASE_PATH`]; after that `std::fs` reaches it like any other
//! directory and reading is delegated to [`StdFilesystem`].

use std::ffi::CStr;
use std::fs::File;
use std::io;
use std::ptr;

use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, esp_vfs_spiffs_unregister};
use gps_tracker_core::fs::{Filesystem, StdFilesystem};
use log::{info, warn};

/// VFS mount point of the SPIFFS partition.
pub const SPIFFS_BASE_PATH: &CStr = c"/spiffs";

/// Maximum number of files open at the same time.
const MAX_OPEN_FILES: usize = 5;

/// Config storage on a SPIFFS partition.
pub struct SpiffsFilesystem {
    base_path: &'static CStr,
    /// `None` selects the first partition with subtype `spiffs`.
    partition_label: Option<&'static CStr>,
    inner: StdFilesystem,
    mounted: bool,
}

impl SpiffsFilesystem {
    /// Default SPIFFS partition mounted at [`SPIFFS_BASE_PATH`].
    pub fn new() -> Self {
        Self::with_partition(SPIFFS_BASE_PATH, None)
    }

    pub fn with_partition(base_path: &'static CStr, partition_label: Option<&'static CStr>) -> Self {
        Self {
            base_path,
            partition_label,
            inner: StdFilesystem::new(base_path.to_string_lossy().into_owned()),
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn label_ptr(&self) -> *const core::ffi::c_char {
        self.partition_label.map_or(ptr::null(), CStr::as_ptr)
    }
}

impl Default for SpiffsFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for SpiffsFilesystem {
    type File = File;

    fn mount(&mut self) -> io::Result<()> {
        if self.mounted {
            return Ok(());
        }

        let conf = esp_vfs_spiffs_conf_t {
            base_path: self.base_path.as_ptr(),
            partition_label: self.label_ptr(),
            max_files: MAX_OPEN_FILES as _,
            format_if_mount_failed: false,
        };

        // SAFETY: `conf` and the strings it points to outlive the call; the
        // VFS copies what it keeps.
        esp!(unsafe { esp_vfs_spiffs_register(&conf) })
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        self.mounted = true;
        info!("SPIFFS mounted at {}", self.inner.root().display());
        Ok(())
    }

    fn open(&self, path: &str) -> io::Result<File> {
        if !self.mounted {
            return Err(io::Error::new(io::ErrorKind::NotFound, "SPIFFS is not mounted"));
        }
        self.inner.open(path)
    }
}

impl Drop for SpiffsFilesystem {
    fn drop(&mut self) {
        if self.mounted {
            // SAFETY: the label pointer is either null or a static C string.
            if let Err(e) = esp!(unsafe { esp_vfs_spiffs_unregister(self.label_ptr()) }) {
                warn!("Failed to unmount SPIFFS: {}", e);
            }
        }
    }
}
