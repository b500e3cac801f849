//! Scripted in-memory backend
//!
//! Replays canned replies and records every request it receives. Used to
//! exercise agents and networks deterministically without a model server.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::core::{EnsembleError, Result};
use crate::llm::traits::{
    GenerateRequest, LanguageModel, ObjectResult, StreamResult, TextResult,
};

#[derive(Debug, Clone)]
enum Reply {
    Fragments(Vec<String>),
    Error(String),
}

/// Backend that answers from a script
///
/// Replies routed to a model name are reused for every request to that model.
/// Other requests consume queued replies in order.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    queue: Mutex<VecDeque<Reply>>,
    routes: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedModel {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_fragments(vec![text.into()])
    }

    /// Queue a reply delivered as the given fragments when streamed
    pub fn with_fragments<S: Into<String>>(mut self, fragments: Vec<S>) -> Self {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.queue
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Reply::Fragments(fragments));
        self
    }

    /// Queue a structured reply
    pub fn with_object(self, object: serde_json::Value) -> Self {
        self.with_text(object.to_string())
    }

    /// Answer every request for `model` with `text`
    pub fn route_text(self, model: impl Into<String>, text: impl Into<String>) -> Self {
        self.route_fragments(model, vec![text.into()])
    }

    /// Answer every request for `model` with the given fragments
    pub fn route_fragments<S: Into<String>>(
        mut self,
        model: impl Into<String>,
        fragments: Vec<S>,
    ) -> Self {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.routes
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.into(), Reply::Fragments(fragments));
        self
    }

    /// Fail every request for `model`
    pub fn route_error(mut self, model: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.into(), Reply::Error(message.into()));
        self
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<GenerateRequest> {
        lock(&self.requests).clone()
    }

    fn reply(&self, request: &GenerateRequest) -> Result<Vec<String>> {
        lock(&self.requests).push(request.clone());

        let reply = lock(&self.routes)
            .get(&request.model)
            .cloned()
            .or_else(|| lock(&self.queue).pop_front());

        match reply {
            Some(Reply::Fragments(fragments)) => Ok(fragments),
            Some(Reply::Error(message)) => Err(EnsembleError::provider(message)),
            None => Err(EnsembleError::provider(format!(
                "No scripted reply for model '{}'",
                request.model
            ))),
        }
    }

    fn text_result(request: &GenerateRequest, fragments: Vec<String>) -> TextResult {
        TextResult {
            text: fragments.concat(),
            tool_calls: Vec::new(),
            usage: None,
            model: request.model.clone(),
        }
    }

    fn stream(fragments: Vec<String>) -> StreamResult {
        StreamResult::new(Box::pin(tokio_stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate_text(&self, request: &GenerateRequest) -> Result<TextResult> {
        let fragments = self.reply(request)?;
        Ok(Self::text_result(request, fragments))
    }

    async fn stream_text(&self, request: &GenerateRequest) -> Result<StreamResult> {
        Ok(Self::stream(self.reply(request)?))
    }

    async fn generate_object(&self, request: &GenerateRequest) -> Result<ObjectResult> {
        let text = self.reply(request)?.concat();
        Ok(ObjectResult {
            object: serde_json::from_str(&text)?,
            usage: None,
            model: request.model.clone(),
        })
    }

    async fn stream_object(&self, request: &GenerateRequest) -> Result<StreamResult> {
        Ok(Self::stream(self.reply(request)?))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
