//! Service layer module
//!
//! Contains the HTTP transport, the streaming decoder and the client facade

pub mod client;
pub mod stream;
pub mod transport;

pub use client::WorkersAi;
pub use stream::{SseDecoder, TextGenerationStream};
pub use transport::{HttpRequest, HttpTransport, RawResponse, RequestBody, ResponseBody, Transport};
