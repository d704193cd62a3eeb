//! HTML output helpers.

use view_expr::Value;

/// Escape HTML-special characters into `out`.
pub fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
}

/// Escape HTML-special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

/// Write a value for escaped output. HTML-tagged values pass through.
pub fn push_escaped(value: &Value, out: &mut String) {
    match value {
        Value::Html(markup) => out.push_str(markup),
        other => escape_into(&other.to_string(), out),
    }
}

/// Write literal attribute text inside double quotes.
pub fn push_attribute_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Convert kebab-case to camelCase.
pub fn camelize(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '-' {
            capitalize_next = !result.is_empty();
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Check whether a name can be written as `$name` in an expression.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
