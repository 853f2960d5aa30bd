use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::errors::{AgentError, AgentResult};
use super::pipeline::{Pipeline, MODE_KEY};
use super::prompts::{interpolate, placeholders};
use super::types::{Agent, CrewOutput, Persona, Process, Task, TaskOutput};
use super::worker::TaskWorker;
use crate::llm::TokenUsage;

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

fn default_crew_name() -> String {
    "crew".to_string()
}

/// Declarative description of a crew: who is in it and what they do
///
/// This is the shape of the optional crew definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewDefinition {
    #[serde(default = "default_crew_name")]
    pub name: String,
    #[serde(default)]
    pub process: Process,
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
}

impl CrewDefinition {
    /// The two-agent crew the bot ships with
    pub fn singularity() -> Self {
        let architect = Agent::new(
            "Elite Software Architect",
            "Write production-ready, self-healing code.",
            "You solve, execute, and dominate technical tasks.",
        )
        .with_delegation(false)
        .with_verbose(true);

        let wordsmith = Agent::new(
            "Master Wordsmith",
            "Write high-impact, anti-fluff copy.",
            "You use NLP triggers and match user vibe perfectly.",
        )
        .with_verbose(true);

        let analysis = Task::new("Analyze the user request: {user_input}", &architect.role);

        Self {
            name: "singularity".to_string(),
            process: Process::Sequential,
            agents: vec![architect, wordsmith],
            tasks: vec![analysis],
        }
    }

    /// Checks the structural invariants of the definition
    ///
    /// # Business Rules Enforced
    /// - At least one agent and one task
    /// - Agent roles are unique
    /// - Every task is bound to a declared agent
    pub fn validate(&self) -> AgentResult<()> {
        if self.agents.is_empty() {
            return Err(AgentError::EmptyCrew("agent"));
        }

        if self.tasks.is_empty() {
            return Err(AgentError::EmptyCrew("task"));
        }

        let mut roles = HashSet::new();
        for agent in &self.agents {
            if !roles.insert(agent.role.as_str()) {
                return Err(AgentError::DuplicateAgent(agent.role.clone()));
            }
        }

        if let Some(task) = self.tasks.iter().find(|t| !roles.contains(t.agent.as_str())) {
            return Err(AgentError::UnknownAgent(task.agent.clone()));
        }

        Ok(())
    }
}

/// A validated, immutable crew bound to a task worker
///
/// Built once at startup and shared across requests; `kickoff` takes `&self`
/// so concurrent runs need no locking.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use singularity_api::agents::{Crew, CrewDefinition, TaskWorker};
/// use singularity_api::testing::ScriptedProvider;
///
/// let provider = Arc::new(ScriptedProvider::new(vec![]));
/// let crew = Crew::new(CrewDefinition::singularity(), TaskWorker::new(provider, "gpt-4o-mini"))
///     .expect("valid crew");
///
/// assert_eq!(crew.input_names(), vec!["user_input".to_string()]);
/// ```
pub struct Crew {
    definition: CrewDefinition,
    worker: TaskWorker,
}

impl Crew {
    pub fn new(definition: CrewDefinition, worker: TaskWorker) -> AgentResult<Self> {
        definition.validate()?;
        Ok(Self { definition, worker })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn process(&self) -> Process {
        self.definition.process
    }

    pub fn agents(&self) -> &[Agent] {
        &self.definition.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.definition.tasks
    }

    pub fn definition(&self) -> &CrewDefinition {
        &self.definition
    }

    /// Input variables referenced by the crew's tasks
    pub fn input_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for task in self.tasks() {
            let mut found = placeholders(&task.description);
            if let Some(expected) = &task.expected_output {
                found.extend(placeholders(expected));
            }
            for name in found {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn agent(&self, role: &str) -> AgentResult<&Agent> {
        self.agents()
            .iter()
            .find(|a| a.role == role)
            .ok_or_else(|| AgentError::UnknownAgent(role.to_string()))
    }

    /// Run every task with the given inputs and return the crew output
    ///
    /// All task descriptions are interpolated before the first LLM call, so
    /// an unresolved placeholder fails the run without any network traffic.
    /// A `mode` input selects the persona preset for every agent in the run.
    pub async fn kickoff(&self, inputs: &HashMap<String, String>) -> AgentResult<CrewOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!("crew_run", %run_id, crew = %self.name(), process = %self.process());

        async move {
            let rendered = self
                .tasks()
                .iter()
                .map(|task| render_task(task, inputs))
                .collect::<AgentResult<Vec<_>>>()?;
            let persona = inputs
                .get(MODE_KEY)
                .map(|mode| mode.parse::<Persona>())
                .transpose()?;

            let started_at = Utc::now();
            info!(tasks = rendered.len(), mode = ?persona, "Crew kickoff");

            let outputs = match self.process() {
                Process::Sequential => self.run_sequential(rendered, persona).await?,
            };

            let token_usage = outputs
                .iter()
                .fold(TokenUsage::default(), |acc, o| acc + o.usage);
            let raw = outputs
                .last()
                .map(|o| o.raw.clone())
                .ok_or_else(|| AgentError::TaskExecutionFailed("Crew produced no output".to_string()))?;

            info!(total_tokens = token_usage.total_tokens, "Crew finished");

            Ok(CrewOutput {
                run_id,
                raw,
                tasks_output: outputs,
                token_usage,
                started_at,
                finished_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    async fn run_sequential(
        &self,
        rendered: Vec<(&Task, String, Option<String>)>,
        persona: Option<Persona>,
    ) -> AgentResult<Vec<TaskOutput>> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(rendered.len());

        for (index, (task, description, expected)) in rendered.into_iter().enumerate() {
            let agent = self.agent(&task.agent)?;

            let context = if outputs.is_empty() {
                None
            } else {
                Some(
                    outputs
                        .iter()
                        .map(|o| o.raw.as_str())
                        .collect::<Vec<_>>()
                        .join(CONTEXT_SEPARATOR),
                )
            };

            let output = self
                .worker
                .execute(
                    agent,
                    &description,
                    expected.as_deref(),
                    context.as_deref(),
                    persona,
                )
                .instrument(info_span!("task", index, agent = %agent.role))
                .await?;

            outputs.push(output);
        }

        Ok(outputs)
    }
}

/// Interpolates a task's description and expected output
fn render_task<'a>(
    task: &'a Task,
    inputs: &HashMap<String, String>,
) -> AgentResult<(&'a Task, String, Option<String>)> {
    let description = interpolate(&task.description, inputs)?;
    let expected = task
        .expected_output
        .as_deref()
        .map(|e| interpolate(e, inputs))
        .transpose()?;
    Ok((task, description, expected))
}

#[async_trait]
impl Pipeline for Crew {
    async fn invoke(&self, inputs: &HashMap<String, String>) -> AgentResult<String> {
        self.kickoff(inputs).await.map(|output| output.raw)
    }
}
