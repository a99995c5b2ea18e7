//! # Schemas Module
//!
//! Wire types for the mock completions endpoint: the inbound request as the
//! client sends it, the streamed chunk, the buffered document and the error
//! payloads. Field order in the serialized structs matches what existing
//! clients of this endpoint already parse, so don't reorder fields casually.

use serde::{Deserialize, Serialize};

/// `object` value of every streamed chunk.
pub const CHUNK_OBJECT: &str = "chat.completion.chunk";
/// `object` value of the buffered document.
pub const COMPLETION_OBJECT: &str = "chat.completion";
/// Prefix of every generated completion id.
pub const COMPLETION_ID_PREFIX: &str = "chatcmpl-";
/// Finish reason carried by the stream terminator chunk.
pub const STREAM_FINISH_REASON: &str = "done";
/// Finish reason carried by every buffered choice.
pub const DOCUMENT_FINISH_REASON: &str = "stop";
/// Role of the fabricated reply.
pub const ASSISTANT_ROLE: &str = "assistant";

/// # Completion Request
///
/// The request body exactly as decoded from JSON. Every field is kept loose
/// on purpose: `stream` and `prompt` are interpreted by shape, not by type,
/// so they stay as raw JSON values until [`crate::mode`] looks at them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompletionRequest {
    /// Model identifier; must be a string when present
    #[serde(default)]
    pub model: Option<serde_json::Value>,
    /// Streaming flag; only a strict boolean is honoured
    #[serde(default)]
    pub stream: Option<serde_json::Value>,
    /// Legacy prompt list; an array selects prompt mode
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
    /// Everything else (messages, temperature, ...) is accepted and ignored
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// # Completion Chunk (SSE Format)
///
/// One streamed increment, sent as `data: <json>\n\n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// `chatcmpl-<epoch millis>`, regenerated per chunk
    pub id: String,
    pub model: String,
    /// Always "chat.completion.chunk"
    pub object: String,
    /// Position of this chunk in the stream
    pub index: usize,
    /// null for content chunks, "done" for the terminator
    pub finish_reason: Option<String>,
    /// Epoch milliseconds, regenerated per chunk
    pub created: i64,
    pub choices: Vec<ChunkChoice>,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    pub content: String,
}

impl CompletionChunk {
    /// Build a chunk stamped with the current time.
    pub fn new(model: &str, index: usize, content: String, finish_reason: Option<&str>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: completion_id(),
            model: model.to_string(),
            object: CHUNK_OBJECT.to_string(),
            index,
            finish_reason: finish_reason.map(str::to_string),
            created: now.timestamp_millis(),
            choices: vec![ChunkChoice {
                delta: ChunkDelta { content },
            }],
            done: true,
        }
    }

    /// Content of the first choice's delta.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|choice| choice.delta.content.as_str())
            .unwrap_or("")
    }
}

/// # Buffered Reply
///
/// The raw value the producer hands to the buffered transport. It carries
/// the reply in chat shape; reshaping for prompt mode happens when the
/// document is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedReply {
    pub choices: Vec<ReplyChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyChoice {
    pub message: ReplyMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub role: String,
    pub content: String,
}

impl BufferedReply {
    /// A single assistant choice holding `content`.
    pub fn assistant(content: String) -> Self {
        Self {
            choices: vec![ReplyChoice {
                message: ReplyMessage {
                    role: ASSISTANT_ROLE.to_string(),
                    content,
                },
            }],
        }
    }
}

/// # Completion Document
///
/// The single JSON body returned in buffered mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionDocument {
    pub id: String,
    /// Always "chat.completion"
    pub object: String,
    /// Epoch seconds
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChoiceView>,
}

/// A buffered choice in either chat or legacy prompt shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceView {
    Chat {
        index: usize,
        message: ReplyMessage,
        finish_reason: String,
    },
    Prompt {
        index: usize,
        role: String,
        text: String,
        finish_reason: String,
    },
}

impl ChoiceView {
    /// Reshape a reply choice; `prompt_mode` flattens the message into `role`/`text`.
    pub fn from_reply(index: usize, choice: ReplyChoice, prompt_mode: bool) -> Self {
        let ReplyMessage { role, content } = choice.message;
        if prompt_mode {
            ChoiceView::Prompt {
                index,
                role,
                text: content,
                finish_reason: DOCUMENT_FINISH_REASON.to_string(),
            }
        } else {
            ChoiceView::Chat {
                index,
                message: ReplyMessage { role, content },
                finish_reason: DOCUMENT_FINISH_REASON.to_string(),
            }
        }
    }
}

/// `{"success": false, "error": "..."}`, shared with the CRUD routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Error event body sent inside an already started stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingError {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

/// `chatcmpl-<epoch millis>`.
pub fn completion_id() -> String {
    format!("{}{}", COMPLETION_ID_PREFIX, chrono::Utc::now().timestamp_millis())
}
