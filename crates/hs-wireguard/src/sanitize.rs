//! Sanitization of free text bound for config files
//!
//! WireGuard configs are INI-like: a stray newline, `[` or `#` in a value can
//! open a new section or turn the rest of a line into a comment. Values are
//! also handed to shell tooling such as `wg-quick`, so shell metacharacters
//! are removed too.

/// Characters with syntactic meaning in the config format or the shell
const FORBIDDEN: &[char] = &['\n', '\r', '[', ']', '#', '=', ';', '|', '&', '`', '$', '\\'];

/// Strip config and shell metacharacters and control characters
pub fn sanitize_value(input: &str) -> String {
    input
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Reduce a peer name to `[A-Za-z0-9._-]`
///
/// Whitespace runs become a single `-` and leading dots are dropped so the
/// name is also a safe file name component.
pub fn sanitize_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in sanitize_value(input).chars() {
        if c.is_whitespace() {
            pending_dash = !out.is_empty();
            continue;
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.push(c);
    }

    out.trim_start_matches('.').to_string()
}
