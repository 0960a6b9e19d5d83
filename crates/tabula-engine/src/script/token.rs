//! Command tokenizer.
//!
//! Produces one token per call. Words are built from one or more tokens:
//! tokens that follow each other without a `Separator` or `EndOfLine`
//! between them belong to the same word, which is how `prefix$var` and
//! quoted strings with substitutions come together.
//!
//! Quoting rules:
//! - `{...}` at the start of a word is taken verbatim (braces stripped,
//!   nesting balanced, `\` protects the next character from counting).
//! - `"..."` at the start of a word allows `$var` and `[cmd]` inside and
//!   resolves backslash escapes.
//! - `[...]` is a nested command; brackets inside braces are not counted.
//! - `$name` names a variable (`name` is a run of alphanumerics, `_` and `:`);
//!   a `$` with no name after it is a literal `$`.
//! - `#` at the start of a command comments out the rest of the line.
//!
//! An unterminated `"`, `{` or `[` at end of input yields an `Error` token.

use std::borrow::Cow;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    EndOfLine,
    EndOfFile,
    Separator,
    /// Verbatim text from a braced word.
    String,
    /// Variable name, without the `$`.
    Variable,
    /// Literal text with backslash escapes resolved.
    Escaped,
    /// Nested command text, without the brackets.
    Command,
    /// Malformed input; the text is a description of the problem.
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: Cow<'a, str>,
}

pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    prev: TokenKind,
    at_command_start: bool,
    inside_quote: bool,
    quote_has_part: bool,
    comments: bool,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Tokenizer {
            src,
            pos: 0,
            prev: TokenKind::EndOfLine,
            at_command_start: true,
            inside_quote: false,
            quote_has_part: false,
            comments: true,
        }
    }

    /// A tokenizer for substitution passes, where `#` is ordinary text.
    pub fn without_comments(src: &'a str) -> Self {
        Tokenizer {
            comments: false,
            ..Tokenizer::new(src)
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_word_start(&self) -> bool {
        matches!(self.prev, TokenKind::Separator | TokenKind::EndOfLine)
    }

    fn emit(&mut self, kind: TokenKind, text: Cow<'a, str>) -> Token<'a> {
        match kind {
            TokenKind::EndOfLine => self.at_command_start = true,
            TokenKind::Separator => {}
            _ => self.at_command_start = false,
        }
        self.prev = kind;
        Token { kind, text }
    }

    fn error(&mut self, message: &str) -> Token<'a> {
        self.pos = self.src.len();
        self.inside_quote = false;
        self.emit(TokenKind::Error, Cow::Owned(message.to_string()))
    }

    pub fn next_token(&mut self) -> Token<'a> {
        loop {
            if self.inside_quote {
                if let Some(tok) = self.quoted_part() {
                    return tok;
                }
                continue;
            }

            let rest = self.rest();
            let Some(c) = rest.chars().next() else {
                return self.emit(TokenKind::EndOfFile, Cow::Borrowed(""));
            };
            return match c {
                _ if is_space(c) || rest.starts_with("\\\n") => self.separator(),
                '\n' | ';' => self.end_of_line(),
                '#' if self.comments && self.at_command_start => {
                    self.pos += rest.find('\n').unwrap_or(rest.len());
                    continue;
                }
                '{' if self.at_word_start() => self.brace(),
                '"' if self.at_word_start() => {
                    self.pos += 1;
                    self.inside_quote = true;
                    self.quote_has_part = false;
                    continue;
                }
                '[' => self.command(),
                '$' => self.variable(),
                _ => self.bare_word(),
            };
        }
    }

    fn separator(&mut self) -> Token<'a> {
        let start = self.pos;
        loop {
            let rest = self.rest();
            if rest.starts_with("\\\n") {
                self.pos += 2;
            } else if rest.starts_with(is_space) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.emit(TokenKind::Separator, Cow::Borrowed(&self.src[start..self.pos]))
    }

    fn end_of_line(&mut self) -> Token<'a> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(is_space(c) || c == '\n' || c == ';'))
            .unwrap_or(rest.len());
        self.pos += len;
        self.emit(TokenKind::EndOfLine, Cow::Borrowed(&rest[..len]))
    }

    fn brace(&mut self) -> Token<'a> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut depth = 0usize;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += i + 1;
                        return self.emit(TokenKind::String, Cow::Borrowed(&rest[1..i]));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        self.error("missing close-brace")
    }

    fn command(&mut self) -> Token<'a> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut brackets = 0usize;
        let mut braces = 0usize;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'{' => braces += 1,
                b'}' => braces = braces.saturating_sub(1),
                b'[' if braces == 0 => brackets += 1,
                b']' if braces == 0 => {
                    brackets -= 1;
                    if brackets == 0 {
                        self.pos += i + 1;
                        return self.emit(TokenKind::Command, Cow::Borrowed(&rest[1..i]));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        self.error("missing close-bracket")
    }

    fn variable(&mut self) -> Token<'a> {
        let rest = &self.rest()[1..];
        let len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        self.pos += 1 + len;
        if len == 0 {
            return self.emit(TokenKind::String, Cow::Borrowed("$"));
        }
        self.emit(TokenKind::Variable, Cow::Borrowed(&rest[..len]))
    }

    fn bare_word(&mut self) -> Token<'a> {
        let rest = self.rest();
        let mut chars = rest.char_indices().peekable();
        let mut end = rest.len();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if matches!(chars.peek(), Some((_, '\n'))) {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                '\n' | ';' | '[' | '$' => {
                    end = i;
                    break;
                }
                _ if is_space(c) => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        self.pos += end;
        self.emit(TokenKind::Escaped, unescape(&rest[..end]))
    }

    /// Next piece of a quoted word. Returns None after consuming the closing
    /// quote of a word that already produced a token.
    fn quoted_part(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        let tok = match rest.chars().next() {
            None => return Some(self.error("missing close-quote")),
            Some('"') => {
                self.pos += 1;
                self.inside_quote = false;
                if self.quote_has_part {
                    return None;
                }
                self.emit(TokenKind::Escaped, Cow::Borrowed(""))
            }
            Some('[') => self.command(),
            Some('$') => self.variable(),
            Some(_) => {
                let mut chars = rest.char_indices();
                let mut end = rest.len();
                while let Some((i, c)) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' | '[' | '$' => {
                            end = i;
                            break;
                        }
                        _ => {}
                    }
                }
                self.pos += end;
                self.emit(TokenKind::Escaped, unescape(&rest[..end]))
            }
        };
        self.quote_has_part = true;
        Some(tok)
    }
}

/// Resolve backslash escapes (`\n`, `\t`, `\r`; any other character stands
/// for itself).
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\n') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}
