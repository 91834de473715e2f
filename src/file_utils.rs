use anyhow::{Result, Context, anyhow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @const: Extensions treated as audio or video input for transcription
const MEDIA_EXTENSIONS: [&str; 22] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
    "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
    "wav", "mp3", "flac", "m4a", "aac", "ogg", "opus", "wma",
];

/// Kind of input file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Audio or video file ffmpeg can decode
    Media,
    /// Anything else
    Unknown,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file through a sibling temp file, so readers never see a partial file
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write subtitle data for {}", path.display()))?;
        temp.persist(path)
            .map_err(|e| anyhow!("Failed to move finished file to {}: {}", path.display(), e.error))?;

        Ok(())
    }

    // @generates: Output path with a language tag, e.g. movie.es.srt next to movie.mkv
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str, extension: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let output_filename = format!("{}.{}.{}", stem, target_language, extension);

        match input_file.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        }
    }

    // @generates: Same-language transcript path, movie.mkv -> movie.srt
    pub fn transcript_output_path<P: AsRef<Path>>(input_file: P) -> PathBuf {
        input_file.as_ref().with_extension("srt")
    }

    /// Classify a path by its extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let ext = path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());

        match ext.as_deref() {
            Some("srt") => FileType::Subtitle,
            Some(ext) if MEDIA_EXTENSIONS.contains(&ext) => FileType::Media,
            _ => FileType::Unknown,
        }
    }

    /// Expand the given paths into input files.
    ///
    /// Files are kept as given, whatever their type. Directories are walked
    /// recursively and contribute only files of `wanted` type, sorted by path.
    pub fn collect_inputs(paths: &[PathBuf], wanted: FileType) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for path in paths {
            if path.is_dir() {
                let mut found = Vec::new();
                for entry in WalkDir::new(path).follow_links(true) {
                    let entry = entry.context("Failed to read directory entry")?;
                    if entry.file_type().is_file() && Self::detect_file_type(entry.path()) == wanted {
                        found.push(entry.path().to_path_buf());
                    }
                }
                found.sort();
                result.extend(found);
            } else if path.is_file() {
                result.push(path.clone());
            } else {
                return Err(anyhow!("Input path does not exist: {:?}", path));
            }
        }

        Ok(result)
    }
}
