//! Escaping of translated text before it is stored in `strings.xml`.

/// Escapes apostrophes with a backslash and encodes newlines as the `\n` token.
///
/// An apostrophe that is already preceded by a backslash is left as is, so
/// `\'` stays `\'`. The function is not guaranteed to be idempotent; apply it
/// once to each raw value before storing it.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'\'') => {
                chars.next();
                escaped.push_str("\\'");
            }
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }

    escaped
}
