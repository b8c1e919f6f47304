//! Interactive annotation entry through `$VISUAL` / `$EDITOR`

use sot_core::errors::{ExError, ExErrorKind};
use std::io::Write;
use std::process::Command;

const DEFAULT_EDITOR: &str = "vi";

fn editor_error(message: String) -> ExError {
    ExError::new(ExErrorKind::Editor)
        .with_op("edit_annotation")
        .with_message(message)
}

/// The editor command line: `$VISUAL`, then `$EDITOR`, then `vi`
fn editor_command() -> Vec<String> {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .find(|words| !words.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_EDITOR.to_string()])
}

/// Open the editor on a scratch file holding `initial` and return what the
/// user saved.
pub fn edit(initial: &str) -> Result<String, ExError> {
    let mut file = tempfile::Builder::new()
        .prefix("sot-annotation-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| editor_error(format!("cannot create scratch file: {}", e)))?;
    file.write_all(initial.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| editor_error(format!("cannot write scratch file: {}", e)))?;

    let command = editor_command();
    let (program, args) = command
        .split_first()
        .ok_or_else(|| editor_error("no editor configured".to_string()))?;
    tracing::debug!(editor = %program, "launching editor");
    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .map_err(|e| editor_error(format!("cannot run '{}': {}", program, e)))?;
    if !status.success() {
        return Err(editor_error(format!("'{}' exited with {}", program, status)));
    }

    std::fs::read_to_string(file.path())
        .map_err(|e| editor_error(format!("cannot read scratch file: {}", e)))
}
