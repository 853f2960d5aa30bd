//! Singularity API Library
//!
//! An HTTP gateway in front of a small crew of LLM agents: the request
//! handlers, the crew engine and the LLM providers it runs on.

pub mod agents;
pub mod api;
pub mod config;
pub mod llm;
pub mod testing;
