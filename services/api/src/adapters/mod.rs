pub mod db;
pub mod edge_prompts;
pub mod prompt_llm;

pub use db::DbAdapter;
pub use edge_prompts::EdgePromptAdapter;
pub use prompt_llm::OpenAiPromptAdapter;
