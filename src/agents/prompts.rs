// Prompt templates for LLM interactions
//
// Placeholders use the `{name}` form. Braces that don't wrap a plain
// identifier (JSON snippets, code) are left as they are.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::errors::{AgentError, AgentResult};
use super::types::{Agent, Persona};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_\-]*)\}").expect("placeholder pattern is valid")
});

/// Substitutes `{name}` placeholders with values from `variables`
///
/// Values are inserted verbatim and never re-scanned, so a value that itself
/// contains `{x}` stays literal. Variables with no matching placeholder are
/// ignored.
///
/// # Errors
/// * `AgentError::UnresolvedPlaceholder` - the first placeholder with no value
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use singularity_api::agents::prompts::interpolate;
///
/// let mut vars = HashMap::new();
/// vars.insert("user_input".to_string(), "Build a scraper".to_string());
///
/// let rendered = interpolate("Analyze the user request: {user_input}", &vars).unwrap();
/// assert_eq!(rendered, "Analyze the user request: Build a scraper");
/// ```
pub fn interpolate(template: &str, variables: &HashMap<String, String>) -> AgentResult<String> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .find(|name| !variables.contains_key(name))
    {
        return Err(AgentError::UnresolvedPlaceholder(missing));
    }

    let rendered = PLACEHOLDER.replace_all(template, |cap: &regex::Captures| {
        variables[&cap[1]].clone()
    });

    Ok(rendered.into_owned())
}

/// Lists the distinct placeholder names in a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in PLACEHOLDER.captures_iter(template) {
        if !names.iter().any(|n| n == &cap[1]) {
            names.push(cap[1].to_string());
        }
    }
    names
}

/// Behavioural directive for a persona preset
pub fn persona_directive(persona: Persona) -> &'static str {
    match persona {
        Persona::Omni => "Operate as OMNI, a maximally capable agent. Integrate analysis, synthesis, \
            creation, strategy, code and research. Think in systems and reason across disciplines. \
            Be direct and dense with insight. Never hedge unnecessarily.",
        Persona::Analyst => "Operate as ANALYST, a precision data intelligence agent. Decompose complex \
            data, surface non-obvious patterns and build statistical and logical inference chains. \
            Think quantitatively. Use tables, metrics and frameworks when they clarify. Never \
            speculate without flagging uncertainty.",
        Persona::Coder => "Operate as CODER, a master software architect. Write production-grade code, \
            architect systems and debug at depth. Default to clean, efficient, well-commented code \
            with error handling. Consider edge cases, performance and maintainability. Prefer \
            concrete implementations over abstract descriptions.",
        Persona::Writer => "Operate as WRITER, a master of language, rhetoric and narrative craft. \
            Produce text that is precise, evocative and structurally sound. Match register to \
            context. Every sentence should earn its place.",
        Persona::Strategist => "Operate as STRATEGIST, a systems-level thinker and decision architect. \
            Map second-order effects, model competitive dynamics and stress-test assumptions. \
            Produce strategic frameworks, not generic advice. Every recommendation must be \
            actionable.",
        Persona::Researcher => "Operate as RESEARCHER, a deep synthesis agent. Synthesize across \
            sources. Distinguish established consensus from emerging evidence and speculation. \
            Produce research briefs that are comprehensive and actionable.",
        Persona::Creative => "Operate as CREATIVE, an imagination engine. Generate ideas, concepts, \
            metaphors and narratives that surprise and resonate. Break conventional frames and \
            combine unexpected domains. Push beyond the expected.",
    }
}

/// System prompt describing who the agent is
///
/// With a persona, its directive and the current mode line follow the agent
/// description.
pub fn agent_system_prompt(agent: &Agent, persona: Option<Persona>) -> String {
    let mut prompt = format!(
        "You are {}. {}\nYour personal goal is: {}",
        agent.role, agent.backstory, agent.goal
    );

    if let Some(persona) = persona {
        prompt.push_str(&format!(
            "\n\n{}\n\nCurrent mode: {}. Date: {}.",
            persona_directive(persona),
            persona.label(),
            Utc::now().format("%Y-%m-%d")
        ));
    }

    prompt
}

/// User prompt for one task, with prior task outputs as context
pub fn task_prompt(description: &str, expected_output: Option<&str>, context: Option<&str>) -> String {
    let mut prompt = format!("Current Task: {}", description);

    if let Some(expected) = expected_output {
        prompt.push_str(&format!(
            "\n\nThis is the expected criteria for your final answer: {}",
            expected
        ));
    }

    if let Some(context) = context {
        prompt.push_str(&format!(
            "\n\nThis is the context you're working with:\n{}",
            context
        ));
    }

    prompt.push_str("\n\nBegin! Give your best, complete final answer.");
    prompt
}
