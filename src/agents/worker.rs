use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::errors::{AgentError, AgentResult};
use super::prompts::{agent_system_prompt, task_prompt};
use super::types::{Agent, Persona, TaskOutput};
use crate::llm::{CompletionRequest, LlmProvider, Message};

/// Executes single tasks on behalf of an agent against an LLM provider
#[derive(Clone)]
pub struct TaskWorker {
    provider: Arc<dyn LlmProvider>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl TaskWorker {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Run one task with the given agent
    ///
    /// `description` must already be interpolated. `context` carries the
    /// outputs of earlier tasks in the run. `persona` extends the agent's
    /// system prompt when set.
    ///
    /// # Errors
    /// * `AgentError::Llm` - the provider call failed
    /// * `AgentError::TaskExecutionFailed` - the provider returned no text
    pub async fn execute(
        &self,
        agent: &Agent,
        description: &str,
        expected_output: Option<&str>,
        context: Option<&str>,
        persona: Option<Persona>,
    ) -> AgentResult<TaskOutput> {
        let prompt = task_prompt(description, expected_output, context);

        if agent.verbose {
            info!(agent = %agent.role, prompt = %prompt, "Agent working on task");
        } else {
            debug!(agent = %agent.role, prompt = %prompt, "Agent working on task");
        }

        let request = CompletionRequest {
            messages: vec![Message::system(agent_system_prompt(agent, persona)), Message::user(prompt)],
            model: agent.model.clone().unwrap_or_else(|| self.model.clone()),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let response = self.provider.complete(request).await?;
        let raw = response.content.trim().to_string();

        if raw.is_empty() {
            return Err(AgentError::TaskExecutionFailed(format!(
                "Agent '{}' returned an empty answer",
                agent.role
            )));
        }

        if agent.verbose {
            info!(agent = %agent.role, output = %raw, "Agent finished task");
        } else {
            debug!(agent = %agent.role, output = %raw, "Agent finished task");
        }

        Ok(TaskOutput {
            description: description.to_string(),
            agent: agent.role.clone(),
            raw,
            usage: response.usage,
            completed_at: Utc::now(),
        })
    }
}
