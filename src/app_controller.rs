use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, Mode};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::providers::whisper::WhisperClient;
use crate::subtitle_processor::SubtitleCollection;
use crate::timing::DurationNormalizer;
use crate::transcription::{Transcriber, TranscriptionOptions, TranscriptionTask, merge_stream};
use crate::translation::{BatchTranslator, TextTranslator, TranslationService};

// @module: Application controller for subtitle generation and translation

/// Outcome of a run over several input files
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Output files written, in input order
    pub written: Vec<PathBuf>,
    /// Inputs that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration, validated for the mode
    config: Config,
    mode: Mode,
    transcriber: Option<Arc<dyn Transcriber>>,
    translation: Option<TranslationService>,
}

impl Controller {
    // @method: Validate the configuration and build the real backends for the mode
    pub fn from_config(config: Config, mode: Mode) -> Result<Self> {
        config.validate_for_mode(mode)?;

        let transcriber: Option<Arc<dyn Transcriber>> = match mode {
            Mode::Translate => None,
            _ => Some(Arc::new(
                WhisperClient::new(&config.transcription).context("Failed to create Whisper client")?,
            )),
        };

        let translation = match mode {
            Mode::Transcribe => None,
            _ => {
                let (source, target) = Self::translation_pair(&config, mode)?;
                Some(
                    TranslationService::from_config(&config.translation, &source, &target)
                        .context("Failed to create translation service")?,
                )
            }
        };

        Ok(Self { config, mode, transcriber, translation })
    }

    /// Build a controller around injected backends
    pub fn with_backends(
        config: Config,
        mode: Mode,
        transcriber: Option<Arc<dyn Transcriber>>,
        translator: Option<Arc<dyn TextTranslator>>,
    ) -> Result<Self> {
        config.validate_for_mode(mode)?;

        if mode != Mode::Translate && transcriber.is_none() {
            return Err(anyhow!("Mode '{}' needs a transcription backend", mode));
        }

        let translation = match (mode, translator) {
            (Mode::Transcribe, _) => None,
            (_, Some(backend)) => {
                let (source, target) = Self::translation_pair(&config, mode)?;
                Some(TranslationService::new(backend, source, target, (&config.translation).into()))
            }
            (_, None) => return Err(anyhow!("Mode '{}' needs a translation backend", mode)),
        };

        Ok(Self { config, mode, transcriber, translation })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    // Source and target handed to the translator. Speech is translated from the
    // pivot language, since the recognizer either hears it or translates into it.
    fn translation_pair(config: &Config, mode: Mode) -> Result<(String, String)> {
        let target = config.target_language.clone()
            .ok_or_else(|| anyhow!("A target language is required for mode '{}'", mode))?;

        let source = match mode {
            Mode::Translate => config.source_language.clone()
                .ok_or_else(|| anyhow!("A source language is required for mode '{}'", mode))?,
            _ => config.translation.backend.pivot_language().to_string(),
        };

        Ok((source, target))
    }

    /// Process every input, continuing past failures.
    ///
    /// Directories are expanded to the media (or subtitle, for `translate`)
    /// files they contain.
    pub async fn run(&self, inputs: &[PathBuf]) -> Result<RunSummary> {
        let start_time = Instant::now();

        let wanted = match self.mode {
            Mode::Translate => FileType::Subtitle,
            _ => FileType::Media,
        };
        let files = FileManager::collect_inputs(inputs, wanted)?;
        if files.is_empty() {
            return Err(anyhow!("No input files to process"));
        }

        info!("Mode: {} - {} file(s)", self.mode, files.len());
        self.check_backends().await;

        let multi_progress = MultiProgress::new();
        let files_pb = if files.len() > 1 {
            let pb = multi_progress.add(ProgressBar::new(files.len() as u64));
            pb.set_style(bar_style("{pos}/{len} files ({percent}%) {msg}"));
            Some(pb)
        } else {
            None
        };

        let mut summary = RunSummary::default();
        for file in &files {
            if let Some(pb) = &files_pb {
                pb.set_message(file_name(file));
            }

            match self.process_file(file, &multi_progress).await {
                Ok(output_path) => summary.written.push(output_path),
                Err(e) => {
                    error!("Failed to process {}: {:#}", file.display(), e);
                    summary.failed.push((file.clone(), format!("{:#}", e)));
                }
            }

            if let Some(pb) = &files_pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = files_pb {
            pb.finish_and_clear();
        }

        let elapsed = Self::format_duration(start_time.elapsed());
        if summary.has_failures() {
            warn!(
                "Done in {}: {} written, {} failed",
                elapsed,
                summary.written.len(),
                summary.failed.len()
            );
        } else {
            info!("Done in {}: {} written", elapsed, summary.written.len());
        }

        Ok(summary)
    }

    // A backend that is down is only reported here; each file then fails with the request error
    async fn check_backends(&self) {
        if let Some(transcriber) = &self.transcriber {
            match transcriber.test_connection().await {
                Ok(()) => debug!("Transcription backend {} is reachable", transcriber.name()),
                Err(e) => warn!("Transcription backend {} is not reachable: {}", transcriber.name(), e),
            }
        }

        if let Some(service) = &self.translation {
            match service.test_connection().await {
                Ok(()) => debug!("Translation backend {} is reachable", service.backend_name()),
                Err(e) => warn!("Translation backend {} is not reachable: {}", service.backend_name(), e),
            }
        }
    }

    /// Run the pipeline for one input and return the path written
    pub async fn process_file(&self, input_file: &Path, multi_progress: &MultiProgress) -> Result<PathBuf> {
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {}", input_file.display()));
        }

        let start_time = Instant::now();

        let (track, output_path) = match self.mode {
            Mode::Transcribe => {
                let options = TranscriptionOptions {
                    language: self.speech_language_hint()?,
                    task: TranscriptionTask::Transcribe,
                };
                let track = self.transcribe_to_track(input_file, &options, multi_progress).await?;
                (track, FileManager::transcript_output_path(input_file))
            }
            Mode::TranscribeTranslate => {
                let options = self.pivot_transcription_options()?;
                let mut track = self.transcribe_to_track(input_file, &options, multi_progress).await?;
                let target = self.target_language()?;

                let pivot = self.config.translation.backend.pivot_language();
                if language_utils::language_codes_match(pivot, target) {
                    info!("Target language is the recognizer output language, skipping translation");
                    track.language = target.to_string();
                } else {
                    self.translate_track(&mut track, multi_progress).await?;
                }
                (track, FileManager::generate_output_path(input_file, target, "srt"))
            }
            Mode::Translate => {
                let mut track = SubtitleCollection::read_srt(input_file)?;
                if let Some(source) = &self.config.source_language {
                    track.language = source.clone();
                }
                self.translate_track(&mut track, multi_progress).await?;
                let target = self.target_language()?;
                (track, FileManager::generate_output_path(input_file, target, "srt"))
            }
        };

        if track.is_empty() {
            warn!("No subtitles produced for {}, writing an empty file", input_file.display());
        }

        track.write_to_srt(&output_path)?;
        info!(
            "Success: {} ({} cues, {})",
            output_path.display(),
            track.len(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(output_path)
    }

    // Speech language for Whisper, which takes ISO 639-1 codes
    fn speech_language_hint(&self) -> Result<Option<String>> {
        match self.config.source_language.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(code) => Ok(Some(language_utils::normalize_to_part1_or_part2t(code)?)),
            None => Ok(None),
        }
    }

    // The recognizer keeps the speech as is when it already is the pivot
    // language, and translates it to English otherwise.
    fn pivot_transcription_options(&self) -> Result<TranscriptionOptions> {
        let pivot = self.config.translation.backend.pivot_language();
        let hint = self.speech_language_hint()?;

        let speaks_pivot = self.config.source_language
            .as_deref()
            .is_some_and(|source| language_utils::language_codes_match(source, pivot));

        let task = if speaks_pivot {
            TranscriptionTask::Transcribe
        } else {
            TranscriptionTask::Translate
        };
        debug!("Recognizer task: {}", task.as_str());

        Ok(TranscriptionOptions { language: hint, task })
    }

    fn target_language(&self) -> Result<&str> {
        self.config.target_language
            .as_deref()
            .ok_or_else(|| anyhow!("A target language is required for mode '{}'", self.mode))
    }

    /// Recognize, merge and normalize one media file into a track
    async fn transcribe_to_track(
        &self,
        input_file: &Path,
        options: &TranscriptionOptions,
        multi_progress: &MultiProgress,
    ) -> Result<SubtitleCollection> {
        let transcriber = self.transcriber
            .as_ref()
            .ok_or_else(|| anyhow!("No transcription backend configured"))?;

        info!("Transcribing {} with {}", input_file.display(), transcriber.name());
        let transcription = transcriber.transcribe(input_file, options).await
            .with_context(|| format!("Transcription failed for {}", input_file.display()))?;

        let progress_bar = match transcription.duration_ms {
            Some(total_ms) => {
                let pb = multi_progress.add(ProgressBar::new(total_ms / 1000));
                pb.set_style(bar_style("{pos}/{len}s of audio ({percent}%) {msg}"));
                pb
            }
            None => multi_progress.add(ProgressBar::new_spinner()),
        };
        progress_bar.set_message("Transcribing");

        let pb = progress_bar.clone();
        let entries = merge_stream(
            transcription.segments,
            self.config.subtitle.merge_policy,
            move |end_ms| pb.set_position(end_ms / 1000),
        )
        .await;
        progress_bar.finish_and_clear();
        let mut entries = entries
            .with_context(|| format!("Transcription failed for {}", input_file.display()))?;

        DurationNormalizer::new(self.config.subtitle.min_duration_ms)
            .clip_overlaps(self.config.subtitle.clip_overlaps)
            .apply(&mut entries);

        let language = transcription.language
            .or_else(|| options.language.clone())
            .unwrap_or_else(|| "auto".to_string());

        Ok(SubtitleCollection::with_entries(input_file.to_path_buf(), language, entries))
    }

    /// Translate a track in place, with a batch progress bar
    async fn translate_track(&self, track: &mut SubtitleCollection, multi_progress: &MultiProgress) -> Result<()> {
        let service = self.translation
            .clone()
            .ok_or_else(|| anyhow!("No translation backend configured"))?;

        info!(
            "Translating {} cues {} -> {} with {}",
            track.len(),
            service.source_language,
            service.target_language,
            service.backend_name()
        );

        let batch_translator = BatchTranslator::new(service);
        let total_batches = track.len().div_ceil(batch_translator.service().options.batch_size.max(1));

        let progress_bar = multi_progress.add(ProgressBar::new(total_batches as u64));
        progress_bar.set_style(bar_style("{pos}/{len} batches ({percent}%) {msg} {eta}"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let result = batch_translator
            .translate_collection(track, move |completed, _total| pb.set_position(completed as u64))
            .await;
        progress_bar.finish_and_clear();

        result.with_context(|| format!("Translation failed for {}", track.source_file.display()))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn bar_style(counter: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {}", counter))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
