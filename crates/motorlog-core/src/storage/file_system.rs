//! File system primitives used by the backup archiver and the exporter.

use std::io;
use std::path::{Path, PathBuf};

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

/// Copy/delete/list/free-space capability.
///
/// All methods are blocking; async callers run them on a blocking thread.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Lists the direct children of `path`, in no particular order.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Copies a file, overwriting `to`. Returns the number of bytes copied.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Free bytes on the volume holding `path`.
    fn available_space(&self, path: &Path) -> io::Result<u64>;
}
