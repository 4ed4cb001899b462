// Document-to-insight pipeline: prompt templates, prompt building,
// sequential generation, and the per-session result store.
// All LLM calls go through llm_client, never directly to the provider.

pub mod handlers;
pub mod kinds;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
pub mod store;
