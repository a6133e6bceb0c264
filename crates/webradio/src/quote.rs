//! Quoting shared by the backend's config file and control protocol, which
//! use the same tokenizer.

/// Wraps `value` in double quotes, escaping `\` and `"`.
pub(crate) fn quoted(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for character in value.chars() {
        if matches!(character, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(character);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://radio.example/live", "\"http://radio.example/live\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("C:\\music", "\"C:\\\\music\"")]
    #[case("", "\"\"")]
    fn escapes_quotes_and_backslashes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quoted(input), expected);
    }
}
