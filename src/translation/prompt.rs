pub const SYSTEM_PROMPT_TEMPLATE: &str = "You translate string resources of a mobile app. \
     Translate the values (not including the keys) of the JSON object to values-{target_language}. \
     Always preserve new line tokens like \\n, escaped apostrophes like \\' \
     and format placeholders such as %s, %d or %1$s. \
     Output the result as a JSON object with exactly the same keys.";

#[allow(clippy::literal_string_with_formatting_args)]
pub fn build_system_prompt(target_language: &str) -> String {
    // {target_language} is a placeholder for string replacement, not a format argument
    SYSTEM_PROMPT_TEMPLATE.replace("{target_language}", target_language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_prompt() {
        let prompt = build_system_prompt("zh-CN");
        assert!(prompt.contains("values-zh-CN"));
        assert!(prompt.contains("not including the keys"));
    }

    #[test]
    fn test_system_prompt_template_has_placeholder() {
        assert!(SYSTEM_PROMPT_TEMPLATE.contains("{target_language}"));
    }

    #[test]
    fn test_system_prompt_mentions_newline_tokens() {
        assert!(SYSTEM_PROMPT_TEMPLATE.contains("\\n"));
    }
}
