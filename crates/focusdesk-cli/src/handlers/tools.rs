//! `tools` command handler.

use std::path::Path;

use focusdesk_core::ToolDirectory;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{print_separator, truncate_string};

/// Connect to `script`, print its tool directory, and disconnect.
pub async fn execute(ctx: &CliContext, script: &Path, json: bool) -> Result<(), CliError> {
    let directory = ctx.client.connect(script).await?;
    ctx.client.disconnect().await;

    if json {
        println!("{}", serde_json::to_string_pretty(directory.tools())?);
    } else {
        print_table(&directory);
    }
    Ok(())
}

fn print_table(directory: &ToolDirectory) {
    if directory.is_empty() {
        println!("The server exposes no tools.");
        return;
    }

    println!("Found {} tool(s):\n", directory.len());
    println!("{:<32} Description", "Name");
    print_separator(80);
    for tool in directory.tools() {
        println!(
            "{:<32} {}",
            truncate_string(&tool.name, 31),
            truncate_string(tool.description.as_deref().unwrap_or("--"), 47)
        );
    }
}
