//! Test doubles for the agent loop.

use super::message::Message;
use super::model::{ChatModel, ModelReply};
use super::tools::ToolSpec;
use crate::error::{LuchError, Result};
use crate::knowledge::{KnowledgeStore, KnowledgeText, ProductRecord};
use crate::notify::Notifier;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Knowledge store with the two catalog rows used across tests.
pub fn sample_knowledge() -> Arc<KnowledgeStore> {
    Arc::new(KnowledgeStore::from_parts(
        vec![
            ProductRecord::new("Test Widget", 20.0),
            ProductRecord::new("Gadget", 50.0),
        ],
        KnowledgeText {
            document_text: "Widgets and gadgets for every workshop.".to_string(),
            narrative_text: "Acme has served customers since 1990.".to_string(),
        },
    ))
}

/// Notifier that records what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, message: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        !self.fail
    }
}

/// One scripted step of a [`ScriptedModel`].
pub enum Step {
    Reply(ModelReply),
    Fail(String),
    Hang,
}

/// Chat model that plays back a fixed script and records every request.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Step>>,
    /// Reply used once the script runs out.
    fallback: Option<ModelReply>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(replies: Vec<ModelReply>) -> Self {
        Self::new(replies.into_iter().map(Step::Reply).collect())
    }

    /// Model that answers every request with the same reply.
    pub fn repeating(reply: ModelReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Message sequences the model was called with, in order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[Message], _tools: &[ToolSpec]) -> Result<ModelReply> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(reason)) => Err(LuchError::ModelUnavailable(reason)),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LuchError::ModelUnavailable("hung".to_string()))
            }
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LuchError::ModelUnavailable("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
