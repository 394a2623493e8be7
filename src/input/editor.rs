use anyhow::Result;
use inquire::Editor;

use crate::ui::handle_prompt_cancellation;

/// Opens `$EDITOR` to enter the value of `key`, prefilled with `current`.
///
/// Returns `None` when the prompt is cancelled or the text is empty.
pub fn edit_value(key: &str, current: Option<&str>) -> Result<Option<String>> {
    let predefined = current.map(decode_newlines).unwrap_or_default();

    let text = handle_prompt_cancellation(|| {
        Ok(Editor::new(&format!("Value for {key} (opens editor):"))
            .with_help_message("Save and close the editor when done. Leave empty to abort.")
            .with_predefined_text(&predefined)
            .with_file_extension(".txt")
            .prompt()?)
    })?;

    Ok(text
        .map(|text| encode_newlines(&text))
        .filter(|value| !value.is_empty()))
}

/// Trims `text` and turns line breaks into `\n` tokens.
pub fn encode_newlines(text: &str) -> String {
    text.trim().replace("\r\n", "\n").replace('\n', "\\n")
}

/// Expands `\n` tokens back into line breaks for editing.
pub fn decode_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}
