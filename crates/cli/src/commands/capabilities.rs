use anyhow::Result;
use serde::Serialize;

use binsight_core::config::DEFAULT_MODEL;
use binsight_core::services::insight::default_capability_registry;

#[derive(Debug, Serialize)]
pub struct CapabilityInfo {
    pub name: String,
    pub description: String,
    pub default: bool,
}

/// List insight capabilities known to this binary.
pub fn list_capabilities_command(json: bool) -> Result<()> {
    let registry = default_capability_registry();
    let entries: Vec<CapabilityInfo> = registry
        .names()
        .into_iter()
        .map(|name| {
            let description = match name.as_str() {
                "deepseek:8b" => "DeepSeek 8B served by Ollama (plain prompts)".to_string(),
                "gemma3" => "Gemma 3 served by Ollama (chat turn framing)".to_string(),
                other => format!("Capability '{}'", other),
            };
            let default = name == DEFAULT_MODEL;
            CapabilityInfo { name, description, default }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Capabilities: (none)");
        return Ok(());
    }

    println!("Capabilities:");
    for entry in entries {
        let marker = if entry.default { " (default)" } else { "" };
        println!("- {}{}: {}", entry.name, marker, entry.description);
    }

    Ok(())
}
