//! External editor integration
//!
//! Opens the user's `$EDITOR` on a temp file seeded with the current text and
//! returns the edited result, or `None` when nothing changed.

use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::NamedTempFile;

pub fn edit_text(initial: &str) -> Result<Option<String>, Box<dyn Error>> {
    let editor = match std::env::var("EDITOR") {
        Ok(editor) if !editor.trim().is_empty() => editor,
        _ => {
            return Err(
                "No EDITOR environment variable set. Please set EDITOR to your preferred text editor (e.g., export EDITOR=nano)."
                    .into(),
            )
        }
    };

    let temp_file = NamedTempFile::new()?;
    let temp_path = temp_file.path().to_path_buf();
    fs::write(&temp_path, initial)?;

    let status = Command::new(&editor).arg(&temp_path).status()?;
    if !status.success() {
        return Err(format!("Editor exited with non-zero status: {status}").into());
    }

    let content = fs::read_to_string(&temp_path)?;
    if content == initial {
        Ok(None)
    } else {
        Ok(Some(content))
    }

    // Temp file is cleaned up when it goes out of scope
}
