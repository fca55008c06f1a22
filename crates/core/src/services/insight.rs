use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AnalysisSettings;

/// Errors a capability call (or its surrounding task) can end with.
///
/// All of these are task-local: the orchestrator logs them and carries on.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Insight transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Insight service error: {0}")]
    Service(String),
    #[error("Insight call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Insight call cancelled")]
    Cancelled,
    #[error("Insight response could not be parsed: {0}")]
    Unparseable(String),
    #[error("Unknown capability '{name}' (available: {})", available.join(", "))]
    UnknownCapability { name: String, available: Vec<String> },
    #[error("Invalid capability configuration: {0}")]
    Config(String),
}

/// Prompt-in/text-out analysis service.
///
/// Implementations that cannot serve overlapping `generate` calls must return `false`
/// from `is_reentrant`; the orchestrator then serializes calls behind a mutex.
#[async_trait]
pub trait InsightCapability: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;

    fn name(&self) -> &str;

    fn is_reentrant(&self) -> bool {
        true
    }
}

/// Builds a capability from settings.
pub type CapabilityFactory =
    Box<dyn Fn(&AnalysisSettings) -> Result<Arc<dyn InsightCapability>, InsightError> + Send + Sync>;

/// Registry of capability constructors; callers select by name.
#[derive(Default)]
pub struct CapabilityRegistry {
    factories: HashMap<String, CapabilityFactory>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&AnalysisSettings) -> Result<Arc<dyn InsightCapability>, InsightError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct the capability registered under `name`.
    pub fn build(
        &self,
        name: &str,
        settings: &AnalysisSettings,
    ) -> Result<Arc<dyn InsightCapability>, InsightError> {
        let factory = self.factories.get(name).ok_or_else(|| InsightError::UnknownCapability {
            name: name.to_string(),
            available: self.names(),
        })?;
        factory(settings)
    }

    /// Return a sorted list of registered names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with the Ollama-served models.
pub fn default_capability_registry() -> CapabilityRegistry {
    use crate::services::backends::ollama::{OllamaCapability, PromptStyle};

    let mut registry = CapabilityRegistry::new();
    registry.register("deepseek:8b", |settings| {
        Ok(Arc::new(OllamaCapability::from_settings("deepseek:8b", PromptStyle::Plain, settings)?)
            as Arc<dyn InsightCapability>)
    });
    registry.register("gemma3", |settings| {
        Ok(Arc::new(OllamaCapability::from_settings("gemma3", PromptStyle::GemmaTurns, settings)?)
            as Arc<dyn InsightCapability>)
    });
    registry
}
