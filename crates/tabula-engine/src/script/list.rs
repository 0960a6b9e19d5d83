//! List values: whitespace-separated words, with braces or backslashes
//! protecting elements that contain special characters.

use super::token::{TokenKind, Tokenizer};
use super::ScriptError;

/// Split a list into its elements. No substitution is performed: `$x`
/// and `[cmd]` come back as literal text.
pub fn parse_list(text: &str) -> Result<Vec<String>, ScriptError> {
    let mut tokenizer = Tokenizer::without_comments(text);
    let mut items: Vec<String> = Vec::new();
    let mut word_start = true;

    loop {
        let tok = tokenizer.next_token();
        let piece = match tok.kind {
            TokenKind::EndOfFile => return Ok(items),
            TokenKind::Separator | TokenKind::EndOfLine => {
                word_start = true;
                continue;
            }
            TokenKind::Error => return Err(ScriptError::Lex(tok.text.into_owned())),
            TokenKind::Variable => format!("${}", tok.text),
            TokenKind::Command => format!("[{}]", tok.text),
            TokenKind::String | TokenKind::Escaped => tok.text.into_owned(),
        };
        match items.last_mut() {
            Some(last) if !word_start => last.push_str(&piece),
            _ => items.push(piece),
        }
        word_start = false;
    }
}

fn needs_quoting(item: &str) -> bool {
    item.is_empty()
        || item.starts_with('#')
        || item
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '"' | '$' | '[' | ']' | '{' | '}' | '\\'))
}

fn braces_balanced(item: &str) -> bool {
    let mut depth = 0i64;
    for c in item.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !item.contains('\\')
}

/// Join elements into a list that [`parse_list`] splits back apart.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let item = item.as_ref();
        if i > 0 {
            out.push(' ');
        }
        if !needs_quoting(item) {
            out.push_str(item);
        } else if braces_balanced(item) {
            out.push('{');
            out.push_str(item);
            out.push('}');
        } else {
            for c in item.chars() {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    _ if c.is_whitespace()
                        || matches!(c, ';' | '"' | '$' | '[' | ']' | '{' | '}' | '\\' | '#') =>
                    {
                        out.push('\\');
                        out.push(c);
                    }
                    _ => out.push(c),
                }
            }
        }
    }
    out
}
