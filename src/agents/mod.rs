// Agent system modules
//
// Agents, tasks and the crew that runs them sequentially against an LLM
// provider, exposed to the HTTP layer through the `Pipeline` trait.

pub mod crew;
pub mod errors;
pub mod pipeline;
pub mod prompts;
pub mod types;
pub mod worker;

// Re-export main types
pub use crew::{Crew, CrewDefinition};
pub use errors::{AgentError, AgentResult};
pub use pipeline::{Pipeline, MODE_KEY, USER_INPUT_KEY};
pub use types::{Agent, CrewOutput, Persona, Process, Task, TaskOutput};
pub use worker::TaskWorker;
