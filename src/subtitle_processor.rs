use std::fmt;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: Cue model and SRT track boundary

// @const: SRT timing line, tolerant of '.' millis and trailing position hints
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d+:\d{2}:\d{2}[,.]\d{3})")
        .expect("timing line regex is valid")
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number, 1-based
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, may span several lines
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new cue. An end time before the start is raised to the start.
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms: end_time_ms.max(start_time_ms),
            text,
        }
    }

    /// A cue is valid when it has a positive index and does not end before it starts
    pub fn is_valid(&self) -> bool {
        self.seq_num >= 1 && self.end_time_ms >= self.start_time_ms
    }

    /// Time the cue stays on screen
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(invalid());
        }

        let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
        let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;
        let seconds: u64 = parts[2].parse().map_err(|_| invalid())?;
        let millis: u64 = parts[3].parse().map_err(|_| invalid())?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(invalid());
        }

        hours.checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .ok_or_else(invalid)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Text lines as written to SRT. A blank line would end the block, so
    /// blank lines are dropped and trailing whitespace is trimmed.
    pub fn display_lines(&self) -> impl Iterator<Item = &str> {
        self.text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        for line in self.display_lines() {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// An ordered subtitle track with the file it came from
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Media or subtitle file the track belongs to
    pub source_file: PathBuf,

    /// Cues ordered by start time
    pub entries: Vec<SubtitleEntry>,

    /// Language of the cue text, "auto" when unknown
    pub language: String,
}

impl SubtitleCollection {
    /// Create an empty track
    pub fn new(source_file: PathBuf, language: String) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            language,
        }
    }

    /// Wrap already built cues
    pub fn with_entries(source_file: PathBuf, language: String, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
            language,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reassign sequence numbers 1..=n in track order
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }
    }

    /// Read and parse an SRT file
    pub fn read_srt<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let entries = Self::parse_srt_string(&content)?;
        debug!("Read {} cues from {}", entries.len(), path.display());

        Ok(Self::with_entries(path.to_path_buf(), "auto".to_string(), entries))
    }

    /// Render the track as SRT text. Cues are numbered from 1 regardless of their seq_num.
    pub fn to_srt_string(&self) -> String {
        let mut output = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let numbered = SubtitleEntry {
                seq_num: i + 1,
                ..entry.clone()
            };
            output.push_str(&numbered.to_string());
        }
        output
    }

    /// Write the track to an SRT file. The file only appears once fully written.
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        FileManager::write_atomic(path, &self.to_srt_string())
    }

    /// Parse SRT format string into subtitle entries
    ///
    /// Blocks are separated by blank lines. Each block needs a numeric index line,
    /// a timing line and zero or more text lines. Anything else is a parse error.
    /// The result is ordered by start time and renumbered from 1.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut entries = Vec::new();

        let mut block: Vec<(usize, &str)> = Vec::new();
        for (line_idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    entries.push(Self::parse_block(&block)?);
                    block.clear();
                }
                continue;
            }
            block.push((line_idx + 1, line));
        }
        if !block.is_empty() {
            entries.push(Self::parse_block(&block)?);
        }

        if entries.is_empty() {
            warn!("No subtitle entries found in content");
            return Ok(entries);
        }

        // Stable, so cues sharing a start keep their file order
        entries.sort_by_key(|entry| entry.start_time_ms);

        let overlap_count = entries
            .windows(2)
            .filter(|pair| pair[0].end_time_ms > pair[1].start_time_ms)
            .count();
        if overlap_count > 0 {
            debug!("Found {} overlapping subtitle entries", overlap_count);
        }

        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        Ok(entries)
    }

    fn parse_block(block: &[(usize, &str)]) -> Result<SubtitleEntry, SubtitleError> {
        let (index_line, index_text) = block[0];
        let seq_num: usize = index_text.trim().parse().map_err(|_| SubtitleError::Parse {
            line: index_line,
            message: format!("expected cue number, found '{}'", index_text.trim()),
        })?;

        let (timing_line, timing_text) = block.get(1).copied().ok_or(SubtitleError::Parse {
            line: index_line,
            message: "cue has no timing line".to_string(),
        })?;

        let caps = TIMING_LINE_REGEX.captures(timing_text.trim()).ok_or_else(|| SubtitleError::Parse {
            line: timing_line,
            message: format!("expected 'start --> end', found '{}'", timing_text.trim()),
        })?;

        let timestamp = |idx: usize| -> Result<u64, SubtitleError> {
            let raw = caps.get(idx).map_or("", |m| m.as_str());
            SubtitleEntry::parse_timestamp(raw).map_err(|e| SubtitleError::Parse {
                line: timing_line,
                message: e.to_string(),
            })
        };

        let start_ms = timestamp(1)?;
        let end_ms = timestamp(2)?;
        if end_ms < start_ms {
            return Err(SubtitleError::Parse {
                line: timing_line,
                message: "cue ends before it starts".to_string(),
            });
        }

        let text = block[2..]
            .iter()
            .map(|(_, line)| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(SubtitleEntry {
            seq_num,
            start_time_ms: start_ms,
            end_time_ms: end_ms,
            text,
        })
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.language)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
