//! Data models module
//!
//! Model catalog, request inputs and response views for the Workers AI API

pub mod catalog;
pub mod request;
pub mod response;

pub use catalog::*;
pub use request::{ChatMessage, TextGenerationRequest, TextToImageRequest, TranslationRequest};
pub use response::*;
