//! Scripted `ChatModel` double shared by pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, ChatModel, LlmError};

/// Replays queued replies in order and records every transcript it was sent.
/// An exhausted script answers with `LlmError::EmptyContent`.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn transcript(&self, call: usize) -> Vec<ChatMessage> {
        self.calls.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}
