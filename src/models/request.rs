//! Request data models
//!
//! Capability inputs, their validation rules, and the JSON payloads sent on the wire

use super::catalog::{TextGenerationModel, TextToImageModel, TranslationLanguage, TranslationModel};
use crate::utils::error::{helpers::validation_error, ClientResult};
use serde::{Deserialize, Serialize};

/// Maximum prompt length, in characters
pub const MAX_PROMPT_CHARS: usize = 4096;

/// Maximum `max_tokens` accepted for text generation
pub const MAX_TOKENS: u32 = 256;

/// Default `max_tokens` for text generation
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Maximum diffusion steps for text to image
pub const MAX_STEPS: u32 = 20;

/// Default diffusion steps for text to image
pub const DEFAULT_STEPS: u32 = 20;

/// Size limit for image classification and speech recognition uploads (6 MiB)
pub const MAX_BINARY_BYTES: usize = 6 * 1024 * 1024;

/// Content type for image uploads
pub const IMAGE_CONTENT_TYPE: &str = "image/*";

/// Content type for audio uploads
pub const AUDIO_CONTENT_TYPE: &str = "audio/*";

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role (system/user)
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Text generation input
#[derive(Debug, Clone)]
pub struct TextGenerationRequest {
    pub model: TextGenerationModel,
    /// Defines the assistant's behaviour
    pub system_prompt: String,
    /// The actual question or conversation turn
    pub user_prompt: String,
    pub max_tokens: u32,
}

impl TextGenerationRequest {
    pub fn new(
        model: TextGenerationModel,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        let prompt_chars = self.user_prompt.chars().count();
        if prompt_chars > MAX_PROMPT_CHARS {
            return Err(validation_error(format!(
                "Prompt length cannot exceed {} characters (got {})",
                MAX_PROMPT_CHARS, prompt_chars
            )));
        }

        if self.max_tokens > MAX_TOKENS {
            return Err(validation_error(format!(
                "Max tokens cannot exceed {} (got {})",
                MAX_TOKENS, self.max_tokens
            )));
        }

        Ok(())
    }

    /// Wire payload
    pub fn to_payload(&self, stream: bool) -> TextGenerationPayload {
        TextGenerationPayload {
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(self.user_prompt.clone()),
            ],
            stream,
            max_tokens: self.max_tokens,
        }
    }
}

/// Text generation wire payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationPayload {
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_tokens: u32,
}

/// Translation input
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub model: TranslationModel,
    pub text: String,
    pub source_lang: TranslationLanguage,
    pub target_lang: TranslationLanguage,
}

impl TranslationRequest {
    pub fn new(
        model: TranslationModel,
        text: impl Into<String>,
        source_lang: TranslationLanguage,
        target_lang: TranslationLanguage,
    ) -> Self {
        Self {
            model,
            text: text.into(),
            source_lang,
            target_lang,
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.source_lang == self.target_lang {
            return Err(validation_error(format!(
                "Source and target languages cannot be the same ({})",
                self.source_lang
            )));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> TranslationPayload {
        TranslationPayload {
            text: self.text.clone(),
            source_lang: self.source_lang,
            target_lang: self.target_lang,
        }
    }
}

/// Translation wire payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationPayload {
    pub text: String,
    pub source_lang: TranslationLanguage,
    pub target_lang: TranslationLanguage,
}

/// Text to image input
#[derive(Debug, Clone)]
pub struct TextToImageRequest {
    pub model: TextToImageModel,
    pub prompt: String,
    pub steps: u32,
}

impl TextToImageRequest {
    pub fn new(model: TextToImageModel, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            steps: DEFAULT_STEPS,
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.steps > MAX_STEPS {
            return Err(validation_error(format!(
                "Steps cannot exceed {} (got {})",
                MAX_STEPS, self.steps
            )));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> TextToImagePayload {
        TextToImagePayload {
            prompt: self.prompt.clone(),
            steps: self.steps,
        }
    }
}

/// Text to image wire payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToImagePayload {
    pub prompt: String,
    pub steps: u32,
}

/// Summarization wire payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationPayload {
    pub text: String,
}

/// Check a binary upload against the size limit
pub fn validate_binary_size(kind: &str, bytes: &[u8]) -> ClientResult<()> {
    if bytes.len() > MAX_BINARY_BYTES {
        return Err(validation_error(format!(
            "{} size cannot exceed 6MB (got {} bytes)",
            kind,
            bytes.len()
        )));
    }
    Ok(())
}
