/*!
 * Tests for the cue model and SRT parsing
 */

use anyhow::Result;
use std::fmt::Write;
use std::path::PathBuf;
use subtitler::errors::SubtitleError;
use subtitler::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = SubtitleEntry::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5025678);

    let formatted = SubtitleEntry::format_timestamp(ms);
    assert_eq!(formatted, ts);
}

#[test]
fn test_timestamp_parsing_withDotSeparator_shouldParse() {
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:01.500").unwrap(), 1500);
}

#[test]
fn test_timestamp_parsing_withInvalidTimestamp_shouldFail() {
    for ts in ["", "00:00:01", "00:61:00,000", "aa:bb:cc,ddd", "00:00:00,1000"] {
        assert!(
            matches!(SubtitleEntry::parse_timestamp(ts), Err(SubtitleError::InvalidTimestamp(_))),
            "'{}' should be rejected",
            ts
        );
    }
}

#[test]
fn test_timestamp_parsing_withHugeHours_shouldFailInsteadOfOverflowing() {
    for ts in ["9999999999999999:00:00,000", "99999999999999999999999:00:00,000"] {
        assert!(
            matches!(SubtitleEntry::parse_timestamp(ts), Err(SubtitleError::InvalidTimestamp(_))),
            "'{}' should be rejected",
            ts
        );
    }
}

#[test]
fn test_parse_srt_withOverflowingTimestamp_shouldReportParseError() {
    let content = "1\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nToo late\n";

    match SubtitleCollection::parse_srt_string(content) {
        Err(SubtitleError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_timestamp_formatting_withLongDuration_shouldKeepHours() {
    assert_eq!(SubtitleEntry::format_timestamp(0), "00:00:00,000");
    assert_eq!(SubtitleEntry::format_timestamp(100 * 3_600_000 + 1), "100:00:00,001");
}

/// Test subtitle entry display formatting
#[test]
fn test_subtitle_entry_display_withValidEntry_shouldFormatAsSrtBlock() {
    let entry = SubtitleEntry::new(1, 5000, 10000, "Test subtitle".to_string());
    let mut output = String::new();
    write!(output, "{}", entry).unwrap();

    assert_eq!(output, "1\n00:00:05,000 --> 00:00:10,000\nTest subtitle\n\n");
}

#[test]
fn test_subtitle_entry_new_withEndBeforeStart_shouldClampEnd() {
    let entry = SubtitleEntry::new(1, 5000, 1000, "x".to_string());
    assert_eq!(entry.end_time_ms, 5000);
    assert_eq!(entry.duration_ms(), 0);
    assert!(entry.is_valid());
}

#[test]
fn test_subtitle_entry_isValid_withZeroIndex_shouldBeInvalid() {
    let entry = SubtitleEntry::new(0, 0, 1000, "x".to_string());
    assert!(!entry.is_valid());
}

#[test]
fn test_parse_srt_withValidContent_shouldParseAllBlocks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let collection = SubtitleCollection::read_srt(&path)?;

    assert_eq!(collection.len(), 3);
    assert_eq!(collection.language, "auto");
    assert_eq!(collection.source_file, path);
    assert_eq!(collection.entries[1].start_time_ms, 5000);
    assert_eq!(collection.entries[1].end_time_ms, 9000);
    assert_eq!(collection.entries[2].text, "For testing purposes.");
    Ok(())
}

#[test]
fn test_parse_srt_withCrlfAndBom_shouldParse() -> Result<()> {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\nthere\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nAgain\r\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "Hello\nthere");
    assert_eq!(entries[1].text, "Again");
    Ok(())
}

#[test]
fn test_parse_srt_withEmptyContent_shouldReturnEmptyTrack() -> Result<()> {
    assert!(SubtitleCollection::parse_srt_string("")?.is_empty());
    assert!(SubtitleCollection::parse_srt_string("\n\n  \n")?.is_empty());
    Ok(())
}

#[test]
fn test_parse_srt_withMissingTimingLine_shouldReportLine() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nFine\n\n2\nnot a timing line\nText\n";

    match SubtitleCollection::parse_srt_string(content) {
        Err(SubtitleError::Parse { line, .. }) => assert_eq!(line, 6),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_parse_srt_withNonNumericIndex_shouldFail() {
    let content = "first\n00:00:01,000 --> 00:00:02,000\nText\n";
    assert!(matches!(
        SubtitleCollection::parse_srt_string(content),
        Err(SubtitleError::Parse { line: 1, .. })
    ));
}

#[test]
fn test_parse_srt_withEndBeforeStart_shouldFail() {
    let content = "1\n00:00:05,000 --> 00:00:02,000\nBackwards\n";
    assert!(SubtitleCollection::parse_srt_string(content).is_err());
}

#[test]
fn test_parse_srt_withUnorderedBlocks_shouldSortAndRenumber() -> Result<()> {
    let content = "7\n00:00:10,000 --> 00:00:11,000\nLater\n\n3\n00:00:01,000 --> 00:00:02,000\nEarlier\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    assert_eq!(entries[0].text, "Earlier");
    assert_eq!(entries[0].seq_num, 1);
    assert_eq!(entries[1].text, "Later");
    assert_eq!(entries[1].seq_num, 2);
    Ok(())
}

#[test]
fn test_parse_srt_withEmptyCueText_shouldKeepCue() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nText\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "");
    Ok(())
}

#[test]
fn test_to_srt_string_shouldNumberFromOne() {
    let collection = SubtitleCollection::with_entries(
        PathBuf::from("test.mkv"),
        "en".to_string(),
        vec![
            common::cue(10, 0, 1000, "a"),
            common::cue(20, 1000, 2000, "b"),
        ],
    );

    let srt = collection.to_srt_string();

    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,000\na\n\n2\n"));
    assert!(!srt.contains("10\n"));
}

#[test]
fn test_srt_roundTrip_withSeveralTexts_shouldPreserveText() -> Result<()> {
    let texts = [
        "Single line",
        "Two\nlines",
        "  Indented first line\nsecond",
        "1234",
        "Ends with arrow -->",
        "Ünïcödé ✓ 日本語",
    ];

    for text in texts {
        let collection = SubtitleCollection::with_entries(
            PathBuf::from("test.mkv"),
            "en".to_string(),
            vec![common::cue(1, 0, 1000, text), common::cue(2, 1000, 2000, "next")],
        );

        let entries = SubtitleCollection::parse_srt_string(&collection.to_srt_string())?;

        assert_eq!(entries.len(), 2, "text {:?}", text);
        assert_eq!(entries[0].text, text);
        assert_eq!(entries[1].text, "next");
    }
    Ok(())
}

#[test]
fn test_srt_roundTrip_withBlankLinesInText_shouldStayParseable() -> Result<()> {
    let collection = SubtitleCollection::with_entries(
        PathBuf::from("test.mkv"),
        "es".to_string(),
        vec![
            common::cue(1, 0, 1000, "Hola\n\nmundo"),
            common::cue(2, 1000, 2000, "trailing   \n   \nspaces\t"),
            common::cue(3, 2000, 3000, "\n\n"),
            common::cue(4, 3000, 4000, "last"),
        ],
    );

    let srt = collection.to_srt_string();
    let entries = SubtitleCollection::parse_srt_string(&srt)?;

    let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Hola\nmundo", "trailing\nspaces", "", "last"]);

    // Rendering the parsed track again is stable
    let reparsed = SubtitleCollection::with_entries(PathBuf::from("test.mkv"), "es".to_string(), entries);
    assert_eq!(reparsed.to_srt_string(), srt);
    Ok(())
}

#[test]
fn test_subtitle_entry_display_withBlankLine_shouldDropIt() {
    let entry = SubtitleEntry::new(1, 0, 1000, "A\n\nB".to_string());
    assert_eq!(entry.to_string(), "1\n00:00:00,000 --> 00:00:01,000\nA\nB\n\n");
}

#[test]
fn test_renumber_shouldAssignContiguousIndices() {
    let mut collection = SubtitleCollection::with_entries(
        PathBuf::from("test.mkv"),
        "en".to_string(),
        vec![common::cue(5, 0, 1000, "a"), common::cue(9, 1000, 2000, "b")],
    );

    collection.renumber();

    let indices: Vec<usize> = collection.entries.iter().map(|e| e.seq_num).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[test]
fn test_in_memory_subtitle_collection_display_shouldSummarize() {
    let collection = SubtitleCollection::new(PathBuf::from("test.mkv"), "en".to_string());
    let summary = collection.to_string();

    assert!(summary.contains("Language: en"));
    assert!(summary.contains("Entries: 0"));
    assert!(collection.is_empty());
}
