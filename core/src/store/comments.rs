//! Strips `#`-prefixed line comments from JSON text, outside of string
//! literals, before handing the result to `serde_json`.

/// Removes everything from an unquoted `#` to the end of its line.
///
/// A minimal hand-rolled scanner: tracks whether we're inside a JSON
/// string (honoring backslash escapes) and only treats `#` as a comment
/// marker outside of one.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '#' => {
                // Skip to end of line, but keep the newline itself so
                // downstream line/column error reporting stays sane.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push(next);
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment() {
        let input = "{\n  \"a\": 1 # trailing note\n}";
        let stripped = strip_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn strips_whole_line_comment() {
        let input = "# header comment\n{\"a\": 1}";
        let stripped = strip_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn does_not_strip_hash_inside_string() {
        let input = r#"{"a": "value # not a comment"}"#;
        let stripped = strip_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed["a"], "value # not a comment");
    }

    #[test]
    fn honors_escaped_quotes_inside_strings() {
        let input = r#"{"a": "she said \"hi # there\""}"#;
        let stripped = strip_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed["a"], "she said \"hi # there\"");
    }
}
