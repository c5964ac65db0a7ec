//! Capability catalog
//!
//! Static mapping from each capability to the Workers AI model identifiers
//! that serve it, plus the supported translation languages.

use crate::utils::error::{helpers::validation_error, ClientError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inference task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextGeneration,
    Translation,
    ImageClassification,
    SpeechRecognition,
    TextToImage,
    ImageToText,
    Summarization,
    ObjectDetection,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Capability::TextGeneration,
        Capability::Translation,
        Capability::ImageClassification,
        Capability::SpeechRecognition,
        Capability::TextToImage,
        Capability::ImageToText,
        Capability::Summarization,
        Capability::ObjectDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TextGeneration => "text-generation",
            Capability::Translation => "translation",
            Capability::ImageClassification => "image-classification",
            Capability::SpeechRecognition => "speech-recognition",
            Capability::TextToImage => "text-to-image",
            Capability::ImageToText => "image-to-text",
            Capability::Summarization => "summarization",
            Capability::ObjectDetection => "object-detection",
        }
    }

    /// Model identifiers valid for this capability
    pub fn model_ids(&self) -> Vec<&'static str> {
        fn ids<M: ModelId>(all: &[M]) -> Vec<&'static str> {
            all.iter().map(ModelId::model_id).collect()
        }

        match self {
            Capability::TextGeneration => ids(TextGenerationModel::ALL),
            Capability::Translation => ids(TranslationModel::ALL),
            Capability::ImageClassification => ids(ImageClassificationModel::ALL),
            Capability::SpeechRecognition => ids(SpeechRecognitionModel::ALL),
            Capability::TextToImage => ids(TextToImageModel::ALL),
            Capability::ImageToText => ids(ImageToTextModel::ALL),
            Capability::Summarization => ids(SummarizationModel::ALL),
            Capability::ObjectDetection => ids(ObjectDetectionModel::ALL),
        }
    }

    /// Whether `model_id` belongs to this capability
    pub fn supports(&self, model_id: &str) -> bool {
        self.model_ids().contains(&model_id)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model identifier bound to one capability
pub trait ModelId: Copy + Send + Sync + 'static {
    /// Capability the model serves
    const CAPABILITY: Capability;

    /// Identifier used in the endpoint path, e.g. `@cf/meta/m2m100-1.2b`
    fn model_id(&self) -> &'static str;
}

macro_rules! model_catalog {
    (
        $(#[$meta:meta])*
        $name:ident => $capability:ident {
            $($variant:ident = $id:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $id),+
                }
            }
        }

        impl ModelId for $name {
            const CAPABILITY: Capability = Capability::$capability;

            fn model_id(&self) -> &'static str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ClientError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|model| model.as_str() == s)
                    .ok_or_else(|| {
                        validation_error(format!(
                            "Unknown {} model: {}",
                            <$name as ModelId>::CAPABILITY,
                            s
                        ))
                    })
            }
        }
    };
}

model_catalog! {
    /// Text generation (chat) models
    TextGenerationModel => TextGeneration {
        Llama2_7b = "@cf/meta/llama-2-7b-chat-fp16",
        Llama2_7bInt8 = "@cf/meta/llama-2-7b-chat-int8",
        Mistral7b = "@cf/mistral/mistral-7b-instruct-v0.1",
        CodeLlama7b = "@hf/thebloke/codellama-7b-instruct-awq",
        Llama2_13b = "@hf/thebloke/llama-2-13b-chat-awq",
        Zephyr7b = "@hf/thebloke/zephyr-7b-beta-awq",
        Mistral7bAwq = "@hf/thebloke/mistral-7b-instruct-v0.1-awq",
        OpenHermesMistral7b = "@hf/thebloke/openhermes-2.5-mistral-7b-awq",
        NeuralChat7b = "@hf/thebloke/neural-chat-7b-v3-1-awq",
        LlamaGuard7b = "@hf/thebloke/llamaguard-7b-awq",
        DeepseekCoderBase = "@hf/thebloke/deepseek-coder-6.7b-base-awq",
        DeepseekCoderInstruct = "@hf/thebloke/deepseek-coder-6.7b-instruct-awq",
        DeepseekMath7b = "@cf/deepseek-ai/deepseek-math-7b-instruct",
        OpenChat35 = "@cf/openchat/openchat-3.5-0106",
        Phi2 = "@cf/microsoft/phi-2",
        TinyLlama = "@cf/tinyllama/tinyllama-1.1b-chat-v1.0",
        DiscoLmGerman7b = "@cf/thebloke/discolm-german-7b-v1-awq",
        Qwen15_0_5b = "@cf/qwen/qwen1.5-0.5b-chat",
        Qwen15_1_8b = "@cf/qwen/qwen1.5-1.8b-chat",
        Qwen15_7b = "@cf/qwen/qwen1.5-7b-chat-awq",
        Qwen15_14b = "@cf/qwen/qwen1.5-14b-chat-awq",
        Falcon7b = "@cf/tiiuae/falcon-7b-instruct",
        SqlCoder7b = "@cf/defog/sqlcoder-7b-2",
    }
}

model_catalog! {
    /// Translation models
    TranslationModel => Translation {
        M2m100 = "@cf/meta/m2m100-1.2b",
    }
}

model_catalog! {
    /// Image classification models
    ImageClassificationModel => ImageClassification {
        Resnet50 = "@cf/microsoft/resnet-50",
    }
}

model_catalog! {
    /// Automatic speech recognition models
    SpeechRecognitionModel => SpeechRecognition {
        Whisper = "@cf/openai/whisper",
    }
}

model_catalog! {
    /// Text to image models
    TextToImageModel => TextToImage {
        StableDiffusionXlBase = "@cf/stabilityai/stable-diffusion-xl-base-1.0",
        Dreamshaper8Lcm = "@cf/lykon/dreamshaper-8-lcm",
        StableDiffusion15Inpainting = "@cf/runwayml/stable-diffusion-v1-5-inpainting",
        StableDiffusion15Img2Img = "@cf/runwayml/stable-diffusion-v1-5-img2img",
        StableDiffusionXlLightning = "@cf/bytedance/stable-diffusion-xl-lightning",
    }
}

model_catalog! {
    /// Image to text (captioning) models
    ImageToTextModel => ImageToText {
        UformGen2Qwen500m = "@cf/unum/uform-gen2-qwen-500m",
    }
}

model_catalog! {
    /// Summarization models
    SummarizationModel => Summarization {
        BartLargeCnn = "@cf/facebook/bart-large-cnn",
    }
}

model_catalog! {
    /// Object detection models
    ObjectDetectionModel => ObjectDetection {
        DetrResnet50 = "@cf/meta/detr-resnet-50",
    }
}

/// Languages supported by the translation models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationLanguage {
    English,
    Chinese,
    French,
    Spanish,
    Arabic,
    Russian,
    German,
    Japanese,
    Portuguese,
    Hindi,
}

impl TranslationLanguage {
    pub const ALL: &'static [TranslationLanguage] = &[
        TranslationLanguage::English,
        TranslationLanguage::Chinese,
        TranslationLanguage::French,
        TranslationLanguage::Spanish,
        TranslationLanguage::Arabic,
        TranslationLanguage::Russian,
        TranslationLanguage::German,
        TranslationLanguage::Japanese,
        TranslationLanguage::Portuguese,
        TranslationLanguage::Hindi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationLanguage::English => "english",
            TranslationLanguage::Chinese => "chinese",
            TranslationLanguage::French => "french",
            TranslationLanguage::Spanish => "spanish",
            TranslationLanguage::Arabic => "arabic",
            TranslationLanguage::Russian => "russian",
            TranslationLanguage::German => "german",
            TranslationLanguage::Japanese => "japanese",
            TranslationLanguage::Portuguese => "portuguese",
            TranslationLanguage::Hindi => "hindi",
        }
    }
}

impl fmt::Display for TranslationLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationLanguage {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == lower)
            .ok_or_else(|| validation_error(format!("Unsupported translation language: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_round_trip_through_catalog() {
        for model in TextGenerationModel::ALL {
            assert_eq!(model.as_str().parse::<TextGenerationModel>().unwrap(), *model);
            assert!(Capability::TextGeneration.supports(model.model_id()));
        }
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = "@cf/unknown/model".parse::<TranslationModel>().unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(err.to_string().contains("translation"));

        let err = "@cf/meta/m2m100-1.2b".parse::<ObjectDetectionModel>().unwrap_err();
        assert!(err.to_string().contains(ObjectDetectionModel::CAPABILITY.as_str()));
    }

    #[test]
    fn test_capability_model_ids() {
        assert_eq!(Capability::SpeechRecognition.model_ids(), vec!["@cf/openai/whisper"]);
        assert_eq!(Capability::ObjectDetection.model_ids(), vec!["@cf/meta/detr-resnet-50"]);
        assert!(!Capability::Translation.supports("@cf/openai/whisper"));
        assert_eq!(Capability::ALL.len(), 8);
    }

    #[test]
    fn test_translation_language_parsing() {
        assert_eq!("French".parse::<TranslationLanguage>().unwrap(), TranslationLanguage::French);
        assert!("klingon".parse::<TranslationLanguage>().is_err());
        assert_eq!(
            serde_json::to_value(TranslationLanguage::Japanese).unwrap(),
            serde_json::json!("japanese")
        );
    }
}
