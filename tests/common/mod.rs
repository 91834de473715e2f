/*!
 * Common test utilities for the subtitler test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use subtitler::app_config::Config;
use subtitler::subtitle_processor::SubtitleEntry;
use subtitler::transcription::RawSegment;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Creates a placeholder media file; mock recognizers never read it
pub fn create_test_media(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, "not really audio")
}

/// Segment with timings in whole seconds
pub fn segment(start_s: u64, end_s: u64, text: &str) -> RawSegment {
    RawSegment::new(start_s * 1000, end_s * 1000, text)
}

/// Cue with timings in milliseconds
pub fn cue(seq_num: usize, start_ms: u64, end_ms: u64, text: &str) -> SubtitleEntry {
    SubtitleEntry::new(seq_num, start_ms, end_ms, text.to_string())
}

/// Config with the languages set, everything else default
pub fn config_with_languages(source: Option<&str>, target: Option<&str>) -> Config {
    Config {
        source_language: source.map(str::to_string),
        target_language: target.map(str::to_string),
        ..Config::default()
    }
}

/// Route library logs to the test harness output, once per process
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
