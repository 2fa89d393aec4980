//! Wiring for Luch.
//!
//! Builds the knowledge store, notifier, tools, model and agent from the
//! settings once at startup and hands out the pieces the commands need.

use crate::agent::{Agent, AgentResponse, ChatModel, Message, ToolRegistry};
use crate::config::{Settings, SystemPrompt};
use crate::error::Result;
use crate::knowledge::KnowledgeStore;
use crate::notify::{Notifier, NtfyNotifier};
use crate::openai::OpenAIChatModel;
use std::sync::Arc;
use tracing::{info, instrument};

/// Owns the long-lived components shared by every conversation.
pub struct Orchestrator {
    settings: Settings,
    knowledge: Arc<KnowledgeStore>,
    agent: Agent,
}

impl Orchestrator {
    /// Create an orchestrator from validated settings.
    ///
    /// Loads every knowledge source before returning, so the first
    /// conversation does not pay for it.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let knowledge = Arc::new(KnowledgeStore::new(settings.sources.clone()));
        knowledge.load();
        info!(
            "Loaded {} products from knowledge sources",
            knowledge.get_all_products().len()
        );

        let notifier: Arc<dyn Notifier> = Arc::new(NtfyNotifier::from_settings(&settings.notify)?);
        let model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(&settings.model)?);

        Self::with_components(settings, knowledge, notifier, model)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        knowledge: Arc<KnowledgeStore>,
        notifier: Arc<dyn Notifier>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let system_prompt = SystemPrompt::load(&settings)?.assemble(&settings.agent, knowledge.text());
        let tools = Arc::new(ToolRegistry::new(knowledge.clone(), notifier));

        info!("Agent {} ready with model {}", settings.agent.name, model.name());

        let agent = Agent::new(model, tools, system_prompt)
            .with_max_rounds(settings.model.max_rounds)
            .with_round_timeout(settings.model.round_timeout());

        Ok(Self {
            settings,
            knowledge,
            agent,
        })
    }

    /// Answer one user message given the prior conversation.
    #[instrument(skip(self, history), fields(history = history.len()))]
    pub async fn respond(&self, user_message: &str, history: &[Message]) -> Result<AgentResponse> {
        self.agent.respond(user_message, history).await
    }

    /// Get the knowledge store.
    pub fn knowledge(&self) -> Arc<KnowledgeStore> {
        self.knowledge.clone()
    }

    /// Get the agent.
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{sample_knowledge, RecordingNotifier, ScriptedModel};
    use crate::agent::{ModelReply, ToolCall};

    #[test]
    fn test_system_prompt_is_assembled_from_settings_and_knowledge() {
        let mut settings = Settings::default();
        settings.agent.name = "Nova".to_string();
        settings.agent.company = "Acme".to_string();

        let orchestrator = Orchestrator::with_components(
            settings,
            sample_knowledge(),
            Arc::new(RecordingNotifier::default()),
            Arc::new(ScriptedModel::replies(vec![])),
        )
        .unwrap();

        let prompt = orchestrator.agent().system_prompt();
        assert!(prompt.contains("Nova"));
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("Acme has served customers since 1990."));
        assert!(prompt.contains("Widgets and gadgets for every workshop."));
        assert!(!prompt.contains("{{agent_name}}"));
    }

    #[test]
    fn test_new_rejects_incomplete_settings() {
        let mut settings = Settings::default();
        settings.model.api_key = None;
        assert!(Orchestrator::new(settings).is_err());
    }

    #[tokio::test]
    async fn test_respond_uses_shared_tools() {
        let notifier = Arc::new(RecordingNotifier::default());
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_calls(vec![ToolCall::new(
                "call_1",
                "send_notification",
                r#"{"title": "Lead", "message": "Jane, jane@example.com"}"#,
            )]),
            ModelReply::text("Thanks Jane, the team will reach out."),
        ]));

        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            sample_knowledge(),
            notifier.clone(),
            model,
        )
        .unwrap();

        let response = orchestrator
            .respond("Please contact me at jane@example.com", &[])
            .await
            .unwrap();

        assert_eq!(response.content, "Thanks Jane, the team will reach out.");
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(orchestrator.knowledge().get_all_products().len(), 2);
    }
}
