use async_trait::async_trait;
use std::collections::HashMap;

use super::errors::AgentResult;

/// Name of the input variable that carries the caller's free text
pub const USER_INPUT_KEY: &str = "user_input";

/// Optional input naming the persona preset for the run (see `Persona`)
pub const MODE_KEY: &str = "mode";

/// Runs a configured agent pipeline end to end
///
/// This is the only capability the HTTP layer depends on, so the concrete
/// engine can be replaced by a mock in tests.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Substitute `inputs` into the pipeline's tasks, run them, and return
    /// the final text artifact
    async fn invoke(&self, inputs: &HashMap<String, String>) -> AgentResult<String>;
}
