pub mod ollama;

pub use ollama::{OllamaCapability, PromptStyle};
