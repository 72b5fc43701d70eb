use anyhow::{Result, Context};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a translated document
    // @params: input_file, target_language
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str) -> PathBuf {
        let input_file = input_file.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();
        let extension = input_file
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "json".to_string());

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(&target_language.to_lowercase());
        output_filename.push('.');
        output_filename.push_str(&extension);

        match input_file.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        }
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write bytes so that readers see either the old file or the complete new one.
    ///
    /// The content goes to a temporary file in the destination directory which
    /// is then renamed over the destination.
    pub fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
