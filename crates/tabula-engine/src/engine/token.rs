//! Formula tokenizer.
//!
//! Splits formula text into numbers, cell references, single-character
//! operators, function names, parentheses and commas. Whitespace between
//! tokens is skipped. A `-` directly followed by a digit folds into the
//! number when no operand precedes it, so `-3+A1` starts with a negative
//! constant while `A1-3` stays a subtraction.

use super::OperatorKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Number,
    Cell,
    Operator,
    Identifier,
    LeftParenthesis,
    RightParenthesis,
    Comma,
    EndOfFile,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of `text` within the formula.
    pub offset: usize,
}

pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    prev: Option<TokenKind>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Tokenizer {
            src,
            pos: 0,
            prev: None,
        }
    }

    fn peek_at(&self, pos: usize) -> Option<char> {
        self.src[pos..].chars().next()
    }

    fn follows_operand(&self) -> bool {
        matches!(
            self.prev,
            Some(TokenKind::Number | TokenKind::Cell | TokenKind::RightParenthesis)
        )
    }

    fn take_while(&self, start: usize, pred: impl Fn(char) -> bool) -> usize {
        self.src[start..]
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map(|(i, _)| start + i)
            .unwrap_or(self.src.len())
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        self.pos = end;
        self.prev = Some(kind);
        Token {
            kind,
            text: &self.src[start..end],
            offset: start,
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.pos = self.take_while(self.pos, char::is_whitespace);
        let start = self.pos;
        let Some(c) = self.peek_at(start) else {
            return self.emit(TokenKind::EndOfFile, start, start);
        };
        let next = self.peek_at(start + c.len_utf8());

        let negative_number =
            c == '-' && next.is_some_and(|n| n.is_ascii_digit()) && !self.follows_operand();
        if c.is_ascii_digit() || negative_number {
            let end = self.take_while(start + 1, |c| c.is_ascii_digit() || c == '.');
            let dots = self.src[start..end].matches('.').count();
            let kind = if dots > 1 {
                TokenKind::Error
            } else {
                TokenKind::Number
            };
            return self.emit(kind, start, end);
        }

        if c.is_ascii_alphabetic() {
            let end = self.take_while(start, |c| c.is_ascii_alphanumeric() || c == '_');
            let kind = if is_cell_name(&self.src[start..end]) {
                TokenKind::Cell
            } else {
                TokenKind::Identifier
            };
            return self.emit(kind, start, end);
        }

        let end = start + c.len_utf8();
        match c {
            '(' => self.emit(TokenKind::LeftParenthesis, start, end),
            ')' => self.emit(TokenKind::RightParenthesis, start, end),
            ',' => self.emit(TokenKind::Comma, start, end),
            _ if OperatorKind::from_char(c).is_some() => {
                let recognised = next.is_some_and(|n| {
                    n.is_whitespace() || n.is_ascii_alphanumeric() || matches!(n, '(' | '.' | '-')
                });
                if recognised {
                    self.emit(TokenKind::Operator, start, end)
                } else {
                    self.emit(TokenKind::Error, start, end)
                }
            }
            _ => self.emit(TokenKind::Error, start, end),
        }
    }
}

/// Uppercase column letters followed by row digits, e.g. `B12`.
fn is_cell_name(text: &str) -> bool {
    let letters = text.bytes().take_while(|b| b.is_ascii_uppercase()).count();
    letters > 0
        && letters < text.len()
        && text[letters..].bytes().all(|b| b.is_ascii_digit())
        && super::CellRef::parse(text).is_some()
}

/// Tokenize a whole formula, including the trailing `EndOfFile` token.
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut tokenizer = Tokenizer::new(src);
    let mut tokens = Vec::new();
    loop {
        let tok = tokenizer.next_token();
        let done = matches!(tok.kind, TokenKind::EndOfFile);
        tokens.push(tok);
        if done {
            return tokens;
        }
    }
}
