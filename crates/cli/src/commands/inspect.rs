use std::path::Path;

use anyhow::{Context, Result};

use binsight_core::analysis::strings::StringExtractor;
use binsight_core::model::FileInfo;

use crate::resolve_settings;

/// Strings shown in the human-readable listing; JSON output carries all of them.
const STRING_PREVIEW: usize = 20;

/// Inspect a file without contacting any insight service.
pub fn inspect_command(
    path: &str,
    config: Option<&str>,
    builtin_strings: bool,
    json: bool,
) -> Result<()> {
    let settings = resolve_settings(config)?;
    let mut inspector = settings.inspector();
    if builtin_strings {
        inspector = inspector.with_strings(StringExtractor::builtin());
    }

    let info = inspector
        .inspect(Path::new(path))
        .with_context(|| format!("Failed to inspect {}", path))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    print_file_info(&info);
    Ok(())
}

pub fn print_file_info(info: &FileInfo) {
    println!("File: {} ({} bytes)", info.name, info.size);
    println!("Path: {}", info.path);
    println!("Format: {}", info.format);
    println!("Architecture: {}", info.arch_label());
    println!("Stripped: {}", if info.is_stripped { "yes" } else { "no" });

    if info.sections.is_empty() {
        println!("Sections: (none)");
    } else {
        println!("Sections:");
        for sec in &info.sections {
            println!(
                "- {:<16} addr=0x{:08x} size=0x{:x} offset=0x{:x} flags={}{}",
                sec.name,
                sec.address,
                sec.size,
                sec.offset,
                sec.flags_hex(),
                if sec.is_executable() { " [exec]" } else { "" }
            );
        }
    }

    print_list("Imports", &info.imports);
    print_list("Exports", &info.exports);

    println!("Strings: {}", info.strings.len());
    for s in info.strings.iter().take(STRING_PREVIEW) {
        println!("  {}", s);
    }
    if info.strings.len() > STRING_PREVIEW {
        println!("  ... ({} more)", info.strings.len() - STRING_PREVIEW);
    }
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        println!("{label}: (none)");
        return;
    }
    println!("{label}:");
    for item in items {
        println!("- {item}");
    }
}
