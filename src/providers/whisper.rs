use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::app_config::TranscriptionConfig;
use crate::errors::ProviderError;
use crate::providers::{Provider, request_error, status_error};
use crate::transcription::audio;
use crate::transcription::{
    RawSegment, SegmentStream, Transcriber, Transcription, TranscriptionOptions, TranscriptionTask, seconds_to_ms,
};

/// Client for an OpenAI-compatible Whisper server (faster-whisper-server, speaches, whisper.cpp server)
pub struct WhisperClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL, e.g. http://localhost:8000/v1
    endpoint: String,
    /// Bearer token, empty for local servers
    api_key: String,
    /// Model name sent with every request
    model: String,
    timeout_secs: u64,
    ffmpeg_timeout_secs: u64,
    stream_segments: bool,
}

impl fmt::Debug for WhisperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhisperClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("stream_segments", &self.stream_segments)
            .finish()
    }
}

/// Audio upload for the transcription or translation endpoint
#[derive(Debug)]
pub struct WhisperRequest {
    /// WAV bytes
    pub audio: Vec<u8>,
    /// File name reported in the multipart upload
    pub file_name: String,
    pub task: TranscriptionTask,
    /// ISO 639-1 code of the spoken language, transcribe task only
    pub language: Option<String>,
    /// Ask for server-sent segment events instead of one JSON body
    pub stream: bool,
}

/// `verbose_json` response body, or one streamed event carrying some segments
#[derive(Debug, Default, Deserialize)]
pub struct VerboseTranscription {
    /// Spoken language as reported by the server
    #[serde(default)]
    pub language: Option<String>,
    /// Audio duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Full transcript
    #[serde(default)]
    pub text: String,
    /// Timed segments in order
    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
}

/// One recognized segment
#[derive(Debug, Deserialize)]
pub struct WhisperSegment {
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    pub text: String,
}

impl WhisperClient {
    /// Create a client from configuration; the endpoint must be an absolute URL
    pub fn new(config: &TranscriptionConfig) -> Result<Self, ProviderError> {
        Url::parse(&config.endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Whisper endpoint '{}': {}", config.endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            ffmpeg_timeout_secs: config.ffmpeg_timeout_secs,
            stream_segments: config.stream_segments,
        })
    }

    fn url_for(&self, task: TranscriptionTask) -> String {
        match task {
            TranscriptionTask::Transcribe => format!("{}/audio/transcriptions", self.endpoint),
            TranscriptionTask::Translate => format!("{}/audio/translations", self.endpoint),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }

    async fn send(&self, request: WhisperRequest) -> Result<Response, ProviderError> {
        let audio_part = Part::bytes(request.audio)
            .file_name(request.file_name)
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        if request.task == TranscriptionTask::Transcribe {
            if let Some(language) = request.language {
                form = form.text("language", language);
            }
        }
        if request.stream {
            form = form.text("stream", "true");
        }

        let response = self.authorize(self.client.post(self.url_for(request.task)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(status_error(status, error_text));
        }

        Ok(response)
    }

    /// Read segments from a successful response.
    ///
    /// An event-stream body is consumed as it arrives: only the first event is
    /// awaited here, the rest is read while the returned stream is polled.
    /// Any other body is parsed whole as `verbose_json`.
    pub async fn read_segments(
        response: Response,
        timeout_secs: u64,
    ) -> Result<(Option<String>, SegmentStream), ProviderError> {
        if !is_event_stream(&response) {
            let body = response.json::<VerboseTranscription>().await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;
            let language = body.language.clone();
            let segments = Self::to_raw_segments(body);
            return Ok((language, stream::iter(segments.into_iter().map(Ok)).boxed()));
        }

        let mut events = SegmentEvents::new(response, timeout_secs);
        let language = events.read_first().await?;

        let segments = stream::try_unfold(events, |mut events| async move {
            let next = events.next_segment().await;
            next.map(|segment| segment.map(|segment| (segment, events)))
        });

        Ok((language, segments.boxed()))
    }

    /// Turn server segments into pipeline segments; blank segments carry nothing to show
    pub fn to_raw_segments(response: VerboseTranscription) -> Vec<RawSegment> {
        response.segments
            .into_iter()
            .filter_map(|segment| {
                let text = segment.text.trim();
                if text.is_empty() {
                    debug!("Skipping blank segment at {:.2}s", segment.start);
                    None
                } else {
                    Some(RawSegment::from_seconds(segment.start, segment.end, text))
                }
            })
            .collect()
    }
}

#[async_trait]
impl Provider for WhisperClient {
    type Request = WhisperRequest;
    type Response = VerboseTranscription;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self.send(WhisperRequest { stream: false, ..request }).await?;

        response.json::<VerboseTranscription>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self.authorize(self.client.get(format!("{}/models", self.endpoint)))
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, response.text().await.unwrap_or_default()))
        }
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, media_path: &Path, options: &TranscriptionOptions) -> Result<Transcription, ProviderError> {
        let audio = audio::extract_wav(media_path, self.ffmpeg_timeout_secs).await?;
        let audio_ms = audio::wav_duration_ms(audio.len());

        let file_name = media_path.file_stem()
            .map(|stem| format!("{}.wav", stem.to_string_lossy()))
            .unwrap_or_else(|| "audio.wav".to_string());

        info!("Sending {} of audio to {} ({})",
              format_size(audio.len()), self.endpoint, options.task.as_str());

        let request = WhisperRequest {
            audio,
            file_name,
            task: options.task,
            language: options.language.clone(),
            stream: self.stream_segments,
        };

        if !self.stream_segments {
            let response = self.complete(request).await?;
            let duration_ms = response.duration.map(seconds_to_ms).or(Some(audio_ms));
            let language = response.language.clone();
            let segments = Self::to_raw_segments(response);

            return Ok(Transcription {
                duration_ms,
                language,
                segments: stream::iter(segments.into_iter().map(Ok)).boxed(),
            });
        }

        let response = self.send(request).await?;
        let (language, segments) = Self::read_segments(response, self.timeout_secs).await?;

        Ok(Transcription {
            duration_ms: Some(audio_ms),
            language,
            segments,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Provider::test_connection(self).await
    }
}

fn is_event_stream(response: &Response) -> bool {
    response.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/event-stream"))
}

/// Splits a server-sent event body into `data:` payloads, chunk by chunk
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
}

impl EventDecoder {
    /// Feed a body chunk and return the payloads of every completed line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            payloads.extend(Self::payload(&line));
        }
        payloads
    }

    /// Payload of a last line the body did not terminate
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        Self::payload(&rest)
    }

    // Lines are split on bytes, so a multi-byte character cut by a chunk
    // boundary is decoded once the line is whole.
    fn payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
        if data.is_empty() || data == "[DONE]" {
            None
        } else {
            Some(data.to_string())
        }
    }
}

/// Segments of a streamed response, read from the body on demand
struct SegmentEvents {
    response: Response,
    decoder: EventDecoder,
    payloads: VecDeque<String>,
    pending: VecDeque<RawSegment>,
    body_done: bool,
    timeout_secs: u64,
}

impl SegmentEvents {
    fn new(response: Response, timeout_secs: u64) -> Self {
        Self {
            response,
            decoder: EventDecoder::default(),
            payloads: VecDeque::new(),
            pending: VecDeque::new(),
            body_done: false,
            timeout_secs,
        }
    }

    /// Wait for the first event and return the language it reports
    async fn read_first(&mut self) -> Result<Option<String>, ProviderError> {
        match self.next_event().await? {
            Some(event) => {
                let language = event.language.clone();
                self.pending.extend(WhisperClient::to_raw_segments(event));
                Ok(language)
            }
            None => Ok(None),
        }
    }

    async fn next_segment(&mut self) -> Result<Option<RawSegment>, ProviderError> {
        loop {
            if let Some(segment) = self.pending.pop_front() {
                return Ok(Some(segment));
            }
            match self.next_event().await? {
                Some(event) => self.pending.extend(WhisperClient::to_raw_segments(event)),
                None => return Ok(None),
            }
        }
    }

    async fn next_event(&mut self) -> Result<Option<VerboseTranscription>, ProviderError> {
        loop {
            if let Some(payload) = self.payloads.pop_front() {
                return serde_json::from_str::<VerboseTranscription>(&payload)
                    .map(Some)
                    .map_err(|e| ProviderError::ParseError(format!("Bad segment event: {}", e)));
            }
            if self.body_done {
                return Ok(None);
            }

            let chunk = self.response.chunk().await
                .map_err(|e| request_error(e, self.timeout_secs))?;
            match chunk {
                Some(bytes) => {
                    let payloads = self.decoder.push(&bytes);
                    self.payloads.extend(payloads);
                }
                None => {
                    self.body_done = true;
                    self.payloads.extend(self.decoder.finish());
                }
            }
        }
    }
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}
