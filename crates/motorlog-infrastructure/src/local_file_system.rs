//! [`FileSystem`] over the local disk.

use motorlog_core::storage::{DirEntry, FileSystem};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(DirEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        Ok(entries)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn available_space(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_copy_remove() {
        let temp = TempDir::new().unwrap();
        let fs_impl = LocalFileSystem::new();

        let source = temp.path().join("Motorlog.sqlite");
        fs_impl.write_file(&source, b"store").unwrap();
        fs_impl.create_dir_all(&temp.path().join("Backups")).unwrap();

        let copied = fs_impl
            .copy_file(&source, &temp.path().join("Backups").join("Motorlog.sqlite"))
            .unwrap();
        assert_eq!(copied, 5);

        let mut names: Vec<(String, bool)> = fs_impl
            .list_dir(temp.path())
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.is_dir))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                ("Backups".to_string(), true),
                ("Motorlog.sqlite".to_string(), false)
            ]
        );

        fs_impl.remove_dir_all(&temp.path().join("Backups")).unwrap();
        fs_impl.remove_file(&source).unwrap();
        assert!(fs_impl.list_dir(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_available_space_is_reported() {
        let temp = TempDir::new().unwrap();
        assert!(LocalFileSystem::new().available_space(temp.path()).is_ok());
    }
}
