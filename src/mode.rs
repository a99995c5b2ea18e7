//! # Mode Resolution
//!
//! Decides how a request is answered before any content is produced:
//! chat vs. legacy prompt shape, streamed vs. buffered delivery. Resolution
//! itself never fails; validation only rejects what the producer can't use.

use serde_json::Value;

use crate::{error::ProxyError, schemas::CompletionRequest};

/// Delivery and shape flags for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionModes {
    /// Reply with Server-Sent Events instead of one JSON document
    pub streaming: bool,
    /// Shape buffered choices as `{role, text}` instead of `{message}`
    pub prompt_mode: bool,
}

impl CompletionModes {
    /// Resolve both flags from a decoded request.
    pub fn resolve(request: &CompletionRequest) -> Self {
        Self {
            streaming: resolve_streaming(request.stream.as_ref()),
            prompt_mode: resolve_prompt_mode(request.prompt.as_ref()),
        }
    }
}

/// `true` unless `stream` is literally `false`.
pub fn resolve_streaming(stream: Option<&Value>) -> bool {
    match stream {
        Some(Value::Bool(flag)) => *flag,
        _ => true,
    }
}

/// `true` only when `prompt` is a JSON array.
pub fn resolve_prompt_mode(prompt: Option<&Value>) -> bool {
    matches!(prompt, Some(Value::Array(_)))
}

/// A request that passed validation and can be handed to the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub model: String,
    pub modes: CompletionModes,
}

impl ValidRequest {
    /// Validate a decoded request. A missing `model` falls back to
    /// `default_model`; a `model` of any other JSON type is rejected.
    pub fn from_request(request: &CompletionRequest, default_model: &str) -> Result<Self, ProxyError> {
        let model = match request.model.as_ref() {
            None | Some(Value::Null) => default_model.to_string(),
            Some(Value::String(model)) if model.trim().is_empty() => {
                return Err(ProxyError::BadRequest("model must not be empty".to_string()));
            }
            Some(Value::String(model)) => model.clone(),
            Some(_) => {
                return Err(ProxyError::BadRequest("model must be a string".to_string()));
            }
        };

        Ok(Self {
            model,
            modes: CompletionModes::resolve(request),
        })
    }

    /// Decode and validate a raw request body in one step.
    pub fn from_slice(body: &[u8], default_model: &str) -> Result<Self, ProxyError> {
        let request: CompletionRequest = serde_json::from_slice(body)?;
        Self::from_request(&request, default_model)
    }
}
