// LLM evaluation of compressed applicant documents.
// All completion calls go through llm_client; no direct Gemini calls here.

pub mod evaluator;
pub mod parser;
pub mod prompts;
