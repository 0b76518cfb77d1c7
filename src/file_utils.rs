use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extensions accepted as exported subtitle images
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpeg", "jpg", "png", "bmp", "gif", "webp"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @removes: Every file below a directory, keeping the directory itself
    pub fn clear_dir<P: AsRef<Path>>(path: P) -> Result<usize> {
        let path = path.as_ref();
        if !Self::dir_exists(path) {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(path).with_context(|| format!("Failed to read directory: {:?}", path))? {
            let entry_path = entry?.path();
            if entry_path.is_dir() {
                fs::remove_dir_all(&entry_path)
                    .with_context(|| format!("Failed to remove directory: {:?}", entry_path))?;
            } else {
                fs::remove_file(&entry_path)
                    .with_context(|| format!("Failed to remove file: {:?}", entry_path))?;
            }
            removed += 1;
        }
        Ok(removed)
    }

    /// Find image files below a directory, ordered by file name
    pub fn collect_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_image(path) {
                result.push(path.to_path_buf());
            }
        }

        // names carry the time range, so name order is time order within a channel
        result.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

        Ok(result)
    }

    // @checks: Extension is one of the supported image types
    pub fn is_image<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }

    /// First free path of the form `stem.ext`, `stem_1.ext`, `stem_2.ext`, ...
    pub fn unique_path<P: AsRef<Path>>(dir: P, stem: &str, extension: &str) -> PathBuf {
        let dir = dir.as_ref();
        let mut candidate = dir.join(format!("{}.{}", stem, extension));
        let mut counter = 1;
        while candidate.exists() {
            candidate = dir.join(format!("{}_{}.{}", stem, counter, extension));
            counter += 1;
        }
        candidate
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }
}
