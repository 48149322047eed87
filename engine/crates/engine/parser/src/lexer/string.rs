use std::borrow::Cow;

use super::TokenKind;

/// Builds the token for the content of a `"..."` string.
pub(super) fn string_token(content: &str) -> (TokenKind, Cow<'_, str>) {
    if !content.contains('\\') {
        return (TokenKind::String, Cow::Borrowed(content));
    }

    match unescape(content) {
        Some(value) => (TokenKind::String, Cow::Owned(value)),
        None => (TokenKind::BadUnicodeEscape, Cow::Borrowed(content)),
    }
}

/// Builds the token for the content of a `"""..."""` string. Indentation is removed before
/// escapes are resolved.
pub(super) fn block_string_token(content: &str) -> (TokenKind, Cow<'_, str>) {
    let dedented = dedent(content);

    match unescape(&dedented) {
        Some(value) => (TokenKind::String, Cow::Owned(value)),
        None => (TokenKind::BadUnicodeEscape, Cow::Owned(dedented)),
    }
}

/// Resolves backslash escapes. Returns `None` if any escape is invalid.
fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let unescaped = match chars.next()? {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let hex = chars.by_ref().take(4).collect::<String>();
                if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return None;
                }
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            _ => return None,
        };
        out.push(unescaped);
    }

    Some(out)
}

/// Removes the indentation shared by every non-blank line but the first one, then drops leading
/// and trailing blank lines.
fn dedent(raw: &str) -> String {
    let lines = split_lines(raw);

    let common_indent = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let indent = leading_whitespace(line);
            (indent < line.len()).then_some(indent)
        })
        .min()
        .unwrap_or(0);

    let mut lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| if i == 0 { line } else { line.get(common_indent..).unwrap_or("") })
        .collect::<Vec<_>>();

    while lines.first().is_some_and(|line| is_blank(line)) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| is_blank(line)) {
        lines.pop();
    }

    lines.join("\n")
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn is_blank(line: &str) -> bool {
    leading_whitespace(line) == line.len()
}

fn split_lines(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut lines = Vec::new();
    let (mut start, mut i) = (0, 0);

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&s[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&s[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&s[start..]);

    lines
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dedent_keeps_first_line() {
        assert_eq!(dedent("  first\n    second\n      third"), "  first\nsecond\n  third");
    }

    #[test]
    fn dedent_ignores_blank_lines_for_indentation() {
        assert_eq!(dedent("\n\n    a\n\n      b\n   \n"), "a\n\n  b");
        assert_eq!(dedent("\r\n  a\r  b\r\n"), "a\nb");
    }

    #[test]
    fn surrogate_escape_is_invalid() {
        assert_eq!(unescape(r"\uD800"), None);
        assert_eq!(unescape(r"\u00"), None);
        assert_eq!(unescape(r"tail\"), None);
    }
}
