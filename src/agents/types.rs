use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::errors::AgentError;
use crate::llm::TokenUsage;

/// One participant in a crew
///
/// Agents are identified by their role inside the crew that declares them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub allow_delegation: bool,
    #[serde(default)]
    pub verbose: bool,
    /// Overrides the worker's default model for this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allow_delegation: false,
            verbose: false,
            model: None,
        }
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A unit of work bound to exactly one agent, referenced by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub agent: String,
}

impl Task {
    pub fn new(description: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: None,
            agent: agent.into(),
        }
    }

    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = Some(expected_output.into());
        self
    }
}

/// How a crew runs its tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Tasks run one after another, each seeing the previous outputs
    #[default]
    Sequential,
}

impl FromStr for Process {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Process::Sequential),
            _ => Err(AgentError::InvalidProcess(s.to_string())),
        }
    }
}

impl std::fmt::Display for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Process::Sequential => write!(f, "sequential"),
        }
    }
}

/// Persona preset layered over every agent's system prompt for one run
///
/// Selected per request through the `mode` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Omni,
    Analyst,
    Coder,
    Writer,
    Strategist,
    Researcher,
    Creative,
}

impl Persona {
    pub const ALL: [Persona; 7] = [
        Persona::Omni,
        Persona::Analyst,
        Persona::Coder,
        Persona::Writer,
        Persona::Strategist,
        Persona::Researcher,
        Persona::Creative,
    ];

    /// Short upper-case label shown in the prompt
    pub fn label(&self) -> &'static str {
        match self {
            Persona::Omni => "OMNI",
            Persona::Analyst => "ANALYST",
            Persona::Coder => "CODER",
            Persona::Writer => "WRITER",
            Persona::Strategist => "STRAT",
            Persona::Researcher => "RESEARCH",
            Persona::Creative => "CREATIVE",
        }
    }
}

impl FromStr for Persona {
    type Err = AgentError;

    /// Accepts the mode name or its label, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Persona::ALL
            .into_iter()
            .find(|p| p.to_string() == wanted || p.label().to_lowercase() == wanted)
            .ok_or_else(|| AgentError::InvalidPersona(s.to_string()))
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Persona::Omni => "omni",
            Persona::Analyst => "analyst",
            Persona::Coder => "coder",
            Persona::Writer => "writer",
            Persona::Strategist => "strategist",
            Persona::Researcher => "researcher",
            Persona::Creative => "creative",
        };
        write!(f, "{}", name)
    }
}

/// Output of one executed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub raw: String,
    pub usage: TokenUsage,
    pub completed_at: DateTime<Utc>,
}

/// Output of a whole crew run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    pub run_id: Uuid,
    /// Raw text of the last task
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: TokenUsage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
