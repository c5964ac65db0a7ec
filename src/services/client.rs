//! Workers AI client
//!
//! One operation per capability: validate the input, build the request, send
//! it through the transport and wrap the successful response in a typed view.

use crate::config::ClientConfig;
use crate::models::catalog::{
    ImageClassificationModel, ImageToTextModel, ModelId, ObjectDetectionModel, SpeechRecognitionModel,
    SummarizationModel,
};
use crate::models::request::{
    validate_binary_size, SummarizationPayload, TextGenerationRequest, TextToImageRequest, TranslationRequest,
    AUDIO_CONTENT_TYPE, IMAGE_CONTENT_TYPE,
};
use crate::models::response::{
    ImageClassificationResponse, ImageResponse, ImageToTextResponse, ObjectDetectionResponse,
    SpeechRecognitionResponse, SummarizationResponse, TextGenerationResponse, TranslationResponse,
};
use crate::services::stream::TextGenerationStream;
use crate::services::transport::{HttpRequest, HttpTransport, RawResponse, Transport};
use crate::utils::error::{ClientError, ClientResult};
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Workers AI client
///
/// Cheap to clone; clones share the configuration and the connection pool.
#[derive(Clone)]
pub struct WorkersAi {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl WorkersAi {
    /// Create a client backed by the HTTP transport
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client using the environment for configuration
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client with a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint for a model: `{base}/{model_id}`
    pub fn build_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.config.base_url(), model_id)
    }

    /// Generate text from a system and a user prompt
    pub async fn text_generation(
        &self,
        request: TextGenerationRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<TextGenerationResponse> {
        request.validate()?;
        let http = HttpRequest::json(self.build_url(request.model.model_id()), &request.to_payload(false))?;
        let raw = self.dispatch(http, cancel).await?;
        TextGenerationResponse::from_raw(raw)
    }

    /// Generate text, receiving the body as it is produced
    pub async fn text_generation_stream(
        &self,
        request: TextGenerationRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<TextGenerationStream> {
        request.validate()?;
        let http = HttpRequest::json(self.build_url(request.model.model_id()), &request.to_payload(true))?
            .with_stream(true);
        let raw = self.dispatch(http, cancel).await?;
        Ok(TextGenerationStream::from_raw(raw))
    }

    pub async fn translation(
        &self,
        request: TranslationRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<TranslationResponse> {
        request.validate()?;
        let http = HttpRequest::json(self.build_url(request.model.model_id()), &request.to_payload())?;
        let raw = self.dispatch(http, cancel).await?;
        TranslationResponse::from_raw(raw)
    }

    /// Classify an image (at most 6 MiB)
    pub async fn image_classification(
        &self,
        image: impl Into<Bytes>,
        model: ImageClassificationModel,
        cancel: &CancellationToken,
    ) -> ClientResult<ImageClassificationResponse> {
        let image = image.into();
        validate_binary_size("Image", &image)?;
        let http = HttpRequest::binary(self.build_url(model.model_id()), image, IMAGE_CONTENT_TYPE);
        let raw = self.dispatch(http, cancel).await?;
        ImageClassificationResponse::from_raw(raw)
    }

    /// Transcribe audio (at most 6 MiB)
    pub async fn speech_recognition(
        &self,
        audio: impl Into<Bytes>,
        model: SpeechRecognitionModel,
        cancel: &CancellationToken,
    ) -> ClientResult<SpeechRecognitionResponse> {
        let audio = audio.into();
        validate_binary_size("Audio", &audio)?;
        let http = HttpRequest::binary(self.build_url(model.model_id()), audio, AUDIO_CONTENT_TYPE);
        let raw = self.dispatch(http, cancel).await?;
        SpeechRecognitionResponse::from_raw(raw)
    }

    /// Generate an image; the response body is the image itself
    pub async fn text_to_image(
        &self,
        request: TextToImageRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<ImageResponse> {
        request.validate()?;
        let http = HttpRequest::json(self.build_url(request.model.model_id()), &request.to_payload())?;
        let raw = self.dispatch(http, cancel).await?;
        ImageResponse::from_raw(raw)
    }

    /// Describe an image
    pub async fn image_to_text(
        &self,
        image: impl Into<Bytes>,
        model: ImageToTextModel,
        cancel: &CancellationToken,
    ) -> ClientResult<ImageToTextResponse> {
        let http = HttpRequest::binary(self.build_url(model.model_id()), image, IMAGE_CONTENT_TYPE);
        let raw = self.dispatch(http, cancel).await?;
        ImageToTextResponse::from_raw(raw)
    }

    pub async fn summarization(
        &self,
        text: impl Into<String>,
        model: SummarizationModel,
        cancel: &CancellationToken,
    ) -> ClientResult<SummarizationResponse> {
        let payload = SummarizationPayload { text: text.into() };
        let http = HttpRequest::json(self.build_url(model.model_id()), &payload)?;
        let raw = self.dispatch(http, cancel).await?;
        SummarizationResponse::from_raw(raw)
    }

    /// Detect objects in an image
    pub async fn object_detection(
        &self,
        image: impl Into<Bytes>,
        model: ObjectDetectionModel,
        cancel: &CancellationToken,
    ) -> ClientResult<ObjectDetectionResponse> {
        let http = HttpRequest::binary(self.build_url(model.model_id()), image, IMAGE_CONTENT_TYPE);
        let raw = self.dispatch(http, cancel).await?;
        ObjectDetectionResponse::from_raw(raw)
    }

    /// Send through the transport and reject non-2xx statuses
    async fn dispatch(&self, request: HttpRequest, cancel: &CancellationToken) -> ClientResult<RawResponse> {
        debug!("Calling Workers AI model: {}", request.url);

        let result = match self.transport.send(request, cancel).await {
            Ok(raw) => raw.error_for_status(),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            log_failure(e);
        }
        result
    }
}

impl std::fmt::Debug for WorkersAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkersAi").field("config", &self.config).finish_non_exhaustive()
    }
}

fn log_failure(e: &ClientError) {
    if e.is_cancelled() {
        debug!("Workers AI request cancelled");
    } else if e.should_log_details() {
        error!("Workers AI request failed: {}", e);
    } else {
        warn!("Workers AI request rejected: {}", e.error_type());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::TranslationModel;
    use async_trait::async_trait;

    struct UnreachableTransport;

    #[async_trait]
    impl Transport for UnreachableTransport {
        async fn send(&self, _request: HttpRequest, _cancel: &CancellationToken) -> ClientResult<RawResponse> {
            panic!("validation should reject the request before it is sent");
        }
    }

    fn client(config: ClientConfig) -> WorkersAi {
        WorkersAi::with_transport(config, Arc::new(UnreachableTransport))
    }

    #[test]
    fn test_build_url_account_form() {
        let ai = client(ClientConfig::new("key", "acc123").unwrap());
        assert_eq!(
            ai.build_url("@cf/meta/m2m100-1.2b"),
            "https://api.cloudflare.com/client/v4/accounts/acc123/ai/run/@cf/meta/m2m100-1.2b"
        );
    }

    #[test]
    fn test_build_url_gateway_form_ignores_account() {
        let config = ClientConfig::builder()
            .api_key("key")
            .account_identifier("acc123")
            .gateway_url("https://gateway.example.com/v1/x/y/workers-ai")
            .build()
            .unwrap();
        let url = client(config).build_url(TranslationModel::M2m100.model_id());

        assert_eq!(url, "https://gateway.example.com/v1/x/y/workers-ai/@cf/meta/m2m100-1.2b");
        assert!(!url.contains("acc123"));
    }

    #[tokio::test]
    async fn test_oversized_audio_never_sent() {
        let ai = client(ClientConfig::new("key", "acc").unwrap());
        let audio = vec![0u8; 6 * 1024 * 1024 + 1];

        let err = ai
            .speech_recognition(audio, SpeechRecognitionModel::Whisper, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
