use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::app_config::{TranslationBackend, TranslationConfig};
use crate::errors::ProviderError;
use crate::providers::{Provider, request_error, status_error};
use crate::translation::core::TextTranslator;

/// Client for Hugging Face style translation inference (hosted Inference API or a self-hosted server)
pub struct HuggingFaceTranslator {
    /// HTTP client for API requests
    client: Client,
    /// Base URL; the model id is appended per request
    endpoint: String,
    /// Bearer token, empty when the server needs none
    api_key: String,
    /// Model family, decides model id and language parameters
    backend: TranslationBackend,
    timeout_secs: u64,
}

impl fmt::Debug for HuggingFaceTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceTranslator")
            .field("endpoint", &self.endpoint)
            .field("backend", &self.backend)
            .finish()
    }
}

/// Translation pipeline request
#[derive(Debug, Serialize)]
pub struct TranslationRequest {
    /// Model the request is routed to; part of the URL, not the body
    #[serde(skip)]
    pub model_id: String,

    /// Texts to translate
    pub inputs: Vec<String>,

    /// Language parameters, needed by multilingual models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TranslationParameters>,

    /// Server behaviour options
    pub options: RequestOptions,
}

/// Language pair for multilingual models
#[derive(Debug, Serialize)]
pub struct TranslationParameters {
    pub src_lang: String,
    pub tgt_lang: String,
}

/// Inference server options
#[derive(Debug, Serialize)]
pub struct RequestOptions {
    /// Block until a cold model is loaded instead of answering 503
    pub wait_for_model: bool,
}

/// One translated text
#[derive(Debug, Deserialize)]
pub struct TranslationOutput {
    pub translation_text: String,
}

impl TranslationRequest {
    /// Build the request for a batch, in the format the backend expects
    pub fn new(backend: TranslationBackend, texts: &[String], source_language: &str, target_language: &str) -> Self {
        let parameters = match backend {
            TranslationBackend::Helsinki => None,
            TranslationBackend::Nllb => Some(TranslationParameters {
                src_lang: source_language.to_string(),
                tgt_lang: target_language.to_string(),
            }),
        };

        Self {
            model_id: backend.model_id(source_language, target_language),
            inputs: texts.to_vec(),
            parameters,
            options: RequestOptions { wait_for_model: true },
        }
    }
}

impl HuggingFaceTranslator {
    /// Create a client from configuration; the endpoint must be an absolute URL
    pub fn new(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Url::parse(&config.endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid translation endpoint '{}': {}", config.endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            backend: config.backend,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.endpoint, model_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl Provider for HuggingFaceTranslator {
    type Request = TranslationRequest;
    type Response = Vec<TranslationOutput>;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let url = self.model_url(&request.model_id);
        debug!("POST {} with {} inputs", url, request.inputs.len());

        let response = self.authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(status_error(status, error_text));
        }

        response.json::<Vec<TranslationOutput>>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let probe = vec!["Hello".to_string()];
        let pivot = self.backend.pivot_language();
        let target = match self.backend {
            TranslationBackend::Helsinki => "es",
            TranslationBackend::Nllb => "spa_Latn",
        };

        self.complete(TranslationRequest::new(self.backend, &probe, pivot, target)).await?;
        Ok(())
    }
}

#[async_trait]
impl TextTranslator for HuggingFaceTranslator {
    fn name(&self) -> &str {
        match self.backend {
            TranslationBackend::Helsinki => "helsinki",
            TranslationBackend::Nllb => "nllb",
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = TranslationRequest::new(self.backend, texts, source_language, target_language);
        let outputs = self.complete(request).await?;

        Ok(outputs.into_iter().map(|output| output.translation_text).collect())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Provider::test_connection(self).await
    }
}
