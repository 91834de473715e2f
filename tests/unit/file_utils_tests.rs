/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use subtitler::file_utils::{FileManager, FileType};
use crate::common;

#[test]
fn test_generate_output_path_withLanguage_shouldInsertLanguageTag() {
    let output = FileManager::generate_output_path("/videos/movie.mkv", "es", "srt");
    assert_eq!(output, PathBuf::from("/videos/movie.es.srt"));

    let output = FileManager::generate_output_path("movie.en.srt", "spa_Latn", "srt");
    assert_eq!(output, PathBuf::from("movie.en.spa_Latn.srt"));
}

#[test]
fn test_transcript_output_path_shouldSwapExtension() {
    assert_eq!(
        FileManager::transcript_output_path("/talks/keynote.mp4"),
        PathBuf::from("/talks/keynote.srt")
    );
    assert_eq!(
        FileManager::transcript_output_path(Path::new("audio")),
        PathBuf::from("audio.srt")
    );
}

#[test]
fn test_detect_file_type_shouldUseExtension() {
    assert_eq!(FileManager::detect_file_type("a.srt"), FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type("a.SRT"), FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type("a.mkv"), FileType::Media);
    assert_eq!(FileManager::detect_file_type("a.mp3"), FileType::Media);
    assert_eq!(FileManager::detect_file_type("a.txt"), FileType::Unknown);
    assert_eq!(FileManager::detect_file_type("noext"), FileType::Unknown);
}

#[test]
fn test_write_atomic_shouldCreateParentsAndReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.srt");

    FileManager::write_atomic(&path, "first")?;
    FileManager::write_atomic(&path, "second")?;

    assert_eq!(FileManager::read_to_string(&path)?, "second");
    let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("nested"))?.collect();
    assert_eq!(leftovers.len(), 1, "no temp files should be left behind");
    Ok(())
}

#[test]
fn test_read_to_string_withMissingFile_shouldFail() {
    assert!(FileManager::read_to_string("/definitely/not/here.srt").is_err());
}

#[test]
fn test_collect_inputs_withDirectory_shouldKeepWantedTypeSorted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    fs::create_dir(dir.join("season1"))?;
    common::create_test_media(dir, "b.mp4")?;
    common::create_test_media(&dir.join("season1"), "a.mkv")?;
    common::create_test_subtitle(dir, "b.srt")?;
    common::create_test_file(dir, "notes.txt", "hello")?;

    let media = FileManager::collect_inputs(&[dir.to_path_buf()], FileType::Media)?;
    let subtitles = FileManager::collect_inputs(&[dir.to_path_buf()], FileType::Subtitle)?;

    assert_eq!(media, vec![dir.join("b.mp4"), dir.join("season1").join("a.mkv")]);
    assert_eq!(subtitles, vec![dir.join("b.srt")]);
    Ok(())
}

#[test]
fn test_collect_inputs_withExplicitFile_shouldKeepItRegardlessOfType() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "recording.bin", "data")?;

    let inputs = FileManager::collect_inputs(&[file.clone()], FileType::Media)?;

    assert_eq!(inputs, vec![file]);
    Ok(())
}

#[test]
fn test_collect_inputs_withMissingPath_shouldFail() {
    let result = FileManager::collect_inputs(&[PathBuf::from("/no/such/input.mkv")], FileType::Media);
    assert!(result.is_err());
}

#[test]
fn test_ensure_dir_shouldCreateNestedDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;

    assert!(nested.is_dir());
    Ok(())
}
