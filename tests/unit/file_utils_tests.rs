/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use doctwin::file_utils::FileManager;

use crate::common;

/// Test file existence check
#[test]
fn test_file_exists_withExistingAndMissingPaths_shouldDistinguish() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "doc.json", "{}")?;

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.json")));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test output path generation
#[test]
fn test_generate_output_path_withLanguage_shouldInsertLowercaseCode() {
    let output = FileManager::generate_output_path("/data/rapport.json", "EN-US");

    assert_eq!(output, PathBuf::from("/data/rapport.en-us.json"));
}

/// Test output path generation without extension
#[test]
fn test_generate_output_path_withoutExtension_shouldDefaultToJson() {
    let output = FileManager::generate_output_path("rapport", "fr");

    assert_eq!(output, PathBuf::from("rapport.fr.json"));
}

/// Test directory creation
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;

    assert!(nested.is_dir());
    Ok(())
}

/// Test atomic write replaces content completely
#[test]
fn test_write_atomic_withExistingFile_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "out.json", "old content that is longer")?;

    FileManager::write_atomic(&path, b"new")?;

    assert_eq!(fs::read_to_string(&path)?, "new");
    assert_eq!(FileManager::read_to_string(&path)?, "new");
    Ok(())
}

/// Test that reading a missing file fails with context
#[test]
fn test_read_to_string_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let result = FileManager::read_to_string(temp_dir.path().join("missing.txt"));

    assert!(result.is_err());
    Ok(())
}
