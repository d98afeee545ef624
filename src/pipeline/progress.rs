//! Typed progress event stream.
//!
//! The pipeline emits [`ProgressEvent`]s through a [`ProgressSink`]; any
//! listener drains the receiving end on its own schedule. The producer
//! never blocks, and a pipeline with no listener attached works the same
//! way with events dropped at the sink.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc;

/// Pipeline stage identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PassOne,
    PassTwo,
    PassThree,
}

/// One observation from the running pipeline. Append-only; never read back
/// as state by the producer.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,

    /// Documents processed so far in the current pass.
    pub scanned_count: usize,
    /// Total candidates, once known.
    pub total_candidates: Option<usize>,

    /// Primary category of the document just classified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Running per-category totals.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub bucket_totals: HashMap<String, usize>,

    /// Identifier of the document currently being processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<String>,
    /// 0-100 sub-progress within the current document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_progress_percent: Option<u8>,
    /// Named sub-step, e.g. "Extracting text content".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_progress_step: Option<String>,

    /// Whether tags were verified on the document, when tagging ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finder_tagged: Option<bool>,

    /// Error text when this event marks a per-document failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Estimated seconds remaining; absent until one document completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
}

impl ProgressEvent {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            scanned_count: 0,
            total_candidates: None,
            bucket: None,
            bucket_totals: HashMap::new(),
            current_document: None,
            file_progress_percent: None,
            file_progress_step: None,
            finder_tagged: None,
            error: None,
            eta_seconds: None,
        }
    }
}

/// Non-blocking sender side of the progress stream.
#[derive(Clone)]
pub struct ProgressSink {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// Sink that discards every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Sink plus the receiver a listener drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Emit one event. A closed or absent receiver is not an error.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
