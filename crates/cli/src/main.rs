use anyhow::Result;
use binsight::commands::{analyze_command, inspect_command, list_capabilities_command, AnalyzeArgs};
use binsight_core::logging::{init_tracing, init_tracing_json};
use clap::{Parser, Subcommand};

/// Binary artifact inspector with model-assisted analysis.
///
/// This CLI is a thin wrapper around `binsight-core` (exposed in code as `binsight_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "binsight",
    version,
    about = "Inspect binaries and analyze them with an insight model",
    long_about = None
)]
struct Cli {
    /// Log debug detail to stderr (`RUST_LOG` takes precedence).
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show structural facts about a file: format, architecture, sections, imports,
    /// exports and strings.
    ///
    /// No insight service is contacted.
    Inspect {
        /// File to inspect.
        #[arg(long)]
        path: String,

        /// Settings file (YAML or JSON).
        #[arg(long)]
        config: Option<String>,

        /// Use the builtin string scanner instead of the external `strings` tool.
        #[arg(long, default_value_t = false)]
        builtin_strings: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run extraction, vulnerability and summary tasks against an insight capability.
    ///
    /// Failed tasks are reported but do not fail the command; only unreadable or
    /// oversized files do.
    Analyze {
        /// File to analyze.
        #[arg(long)]
        path: String,

        /// Settings file (YAML or JSON). Flags below override it.
        #[arg(long)]
        config: Option<String>,

        /// Capability name (see `capabilities`).
        #[arg(long)]
        model: Option<String>,

        /// Base URL of the Ollama-style API, e.g. http://localhost:11434/api.
        #[arg(long)]
        endpoint: Option<String>,

        /// Per-task timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Use the builtin string scanner instead of the external `strings` tool.
        #[arg(long, default_value_t = false)]
        builtin_strings: bool,

        /// Emit the JSON report instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the JSON report to this path.
        #[arg(long)]
        out: Option<String>,
    },

    /// List available insight capabilities.
    Capabilities {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    if cli.log_json {
        init_tracing_json(level);
    } else {
        init_tracing(level);
    }

    match cli.command {
        Command::Inspect { path, config, builtin_strings, json } => {
            inspect_command(&path, config.as_deref(), builtin_strings, json)?
        }
        Command::Analyze {
            path,
            config,
            model,
            endpoint,
            timeout_secs,
            builtin_strings,
            json,
            out,
        } => {
            analyze_command(AnalyzeArgs {
                path,
                config,
                model,
                endpoint,
                timeout_secs,
                builtin_strings,
                json,
                out,
            })
            .await?
        }
        Command::Capabilities { json } => list_capabilities_command(json)?,
    }

    Ok(())
}
