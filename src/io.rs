//! Filesystem boundary: listing input stacks, reading and writing byte
//! streams, and derived output naming

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File extensions recognized as TIFF stacks
pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Trait for the storage backing a batch run
#[async_trait]
pub trait StackStore: Send + Sync {
    /// List TIFF files directly inside a directory, sorted by path for a
    /// stable processing order
    async fn list_stacks(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Read a file into memory
    async fn read(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a path, creating parent directories as needed
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Ensure a directory exists
    async fn create_dir(&self, dir: &Path) -> Result<()>;
}

/// Local filesystem store
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemStore;

impl FileSystemStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StackStore for FileSystemStore {
    async fn list_stacks(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.is_file() && is_tiff_path(&path) {
                entries.push(path);
            }
        }

        entries.sort();
        Ok(entries)
    }

    async fn read(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        Ok(())
    }

    async fn create_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await?;
        Ok(())
    }
}

/// Check whether a path carries a recognized TIFF extension
pub fn is_tiff_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TIFF_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Derive the output path for an input stack: `{stem}_cropped{suffix}` in
/// the output directory
pub fn derived_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stack");
    let suffix = input
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("tif");
    output_dir.join(format!("{}_cropped.{}", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_stacks_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new();

        for name in ["b.tif", "a.tiff", "notes.txt", "c.TIF"] {
            store
                .write(&temp_dir.path().join(name), b"x")
                .await
                .unwrap();
        }

        let listed = store.list_stacks(temp_dir.path()).await.unwrap();
        let names: Vec<_> = listed
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.tiff", "b.tif", "c.TIF"]);
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new();
        let path = temp_dir.path().join("nested/out/stack.tif");

        store.write(&path, b"data").await.unwrap();
        let read_back = store.read(&path).await.unwrap();
        assert_eq!(&read_back[..], b"data");
    }

    #[test]
    fn test_derived_output_path() {
        let out = derived_output_path(Path::new("/in/embryo_01.tif"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/embryo_01_cropped.tif"));

        let out = derived_output_path(Path::new("/in/scan.tiff"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/scan_cropped.tiff"));
    }

    #[test]
    fn test_is_tiff_path() {
        assert!(is_tiff_path(Path::new("a.tif")));
        assert!(is_tiff_path(Path::new("a.TIFF")));
        assert!(!is_tiff_path(Path::new("a.png")));
        assert!(!is_tiff_path(Path::new("tif")));
    }
}
