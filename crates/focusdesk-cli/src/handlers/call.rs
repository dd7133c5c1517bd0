//! `call` command handler.

use std::path::Path;

use focusdesk_core::{ToolCallResult, ToolContent};
use serde_json::{Map, Value};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Connect to `script`, invoke `tool` with the JSON `args`, print the
/// result, and disconnect.
///
/// A result the tool itself marked as an error is printed and then
/// reported as [`CliError::ToolReported`].
pub async fn execute(
    ctx: &CliContext,
    script: &Path,
    tool: &str,
    args: Option<&str>,
) -> Result<(), CliError> {
    let arguments = parse_arguments(args)?;

    ctx.client.connect(script).await?;
    let result = ctx.client.invoke(tool, arguments).await;
    ctx.client.disconnect().await;
    let result = result?;

    print_result(&result)?;
    if result.is_error {
        return Err(CliError::ToolReported(tool.to_string()));
    }
    Ok(())
}

/// Parse `--args`, which must be a JSON object when given.
pub fn parse_arguments(args: Option<&str>) -> Result<Map<String, Value>, CliError> {
    let Some(raw) = args else {
        return Ok(Map::new());
    };

    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::Arguments(format!(
            "--args must be a JSON object, got {other}"
        ))),
    }
}

fn print_result(result: &ToolCallResult) -> Result<(), CliError> {
    if result.content.is_empty() {
        if let Some(ref structured) = result.structured_content {
            println!("{}", serde_json::to_string_pretty(structured)?);
        }
        return Ok(());
    }

    for item in &result.content {
        match item {
            ToolContent::Text { text } => println!("{text}"),
            ToolContent::Image { mime_type, data } => {
                println!("[image {mime_type}, {} base64 chars]", data.len());
            }
            ToolContent::Other(value) => println!("{}", serde_json::to_string_pretty(value)?),
        }
    }
    Ok(())
}
