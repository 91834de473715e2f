use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use log::{debug, error};
use tokio::process::Command;

use crate::errors::ProviderError;

// @module: Audio track extraction with ffmpeg

// @const: Whisper models are trained on 16 kHz mono
pub const SAMPLE_RATE_HZ: u32 = 16_000;

// @const: Canonical RIFF header written by ffmpeg for pcm_s16le
const WAV_HEADER_BYTES: usize = 44;

/// Decode the first audio stream of a media file into a 16 kHz mono PCM WAV held in memory
pub async fn extract_wav<P: AsRef<Path>>(media_path: P, timeout_secs: u64) -> Result<Vec<u8>, ProviderError> {
    let media_path = media_path.as_ref();
    if !media_path.exists() {
        return Err(ProviderError::AudioExtraction(format!("Media file does not exist: {:?}", media_path)));
    }

    let sample_rate = SAMPLE_RATE_HZ.to_string();
    let ffmpeg_future = Command::new("ffmpeg")
        .arg("-nostdin")
        .arg("-i")
        .arg(media_path)
        .args([
            "-vn",                      // Drop video
            "-acodec", "pcm_s16le",
            "-ar", &sample_rate,
            "-ac", "1",
            "-f", "wav",
            "-loglevel", "error",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let timeout_duration = Duration::from_secs(timeout_secs);
    let output = tokio::select! {
        result = ffmpeg_future => {
            result.map_err(|e| ProviderError::AudioExtraction(format!("Failed to execute ffmpeg: {}", e)))?
        },
        _ = tokio::time::sleep(timeout_duration) => {
            return Err(ProviderError::AudioExtraction(format!("ffmpeg timed out after {} seconds", timeout_secs)));
        }
    };

    if !output.status.success() {
        let stderr = filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
        error!("Audio extraction failed: {}", stderr);
        return Err(ProviderError::AudioExtraction(stderr));
    }

    if output.stdout.is_empty() {
        return Err(ProviderError::AudioExtraction(format!("No audio stream found in {:?}", media_path)));
    }

    debug!("Extracted {} bytes of audio from {:?}", output.stdout.len(), media_path);
    Ok(output.stdout)
}

/// Playback length of a 16 kHz mono 16-bit WAV of `byte_len` bytes
pub fn wav_duration_ms(byte_len: usize) -> u64 {
    let bytes_per_second = u64::from(SAMPLE_RATE_HZ) * 2;
    byte_len.saturating_sub(WAV_HEADER_BYTES) as u64 * 1000 / bytes_per_second
}

/// Keep only the ffmpeg stderr lines that say what went wrong
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error".to_string()
    } else {
        meaningful.join("\n")
    }
}
