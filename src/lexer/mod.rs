//! Lexical analysis for SPL.
//!
//! A hand-written, line-tracked scanner. Unlike an error-tolerant lexer
//! that keeps scanning past bad input, SPL's diagnostic model is
//! fatal-first: the first illegal character or stray apostrophe halts
//! scanning immediately (exit code 99).

pub mod token;

use crate::diag::{CompileError, CompileResult};
use smol_str::SmolStr;
use token::{Token, TokenKind};

/// Scans `source` into a token stream terminated by `Eof`.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> CompileResult<Vec<Token>> {
        loop {
            self.skip_whitespace_and_comments();
            if self.is_at_end() {
                break;
            }
            self.scan_token()?;
        }
        self.tokens.push(Token::new(TokenKind::Eof, self.line));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> CompileResult<()> {
        let line = self.line;
        let ch = self.advance();

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => TokenKind::Eq,
            '#' => TokenKind::Neq,
            '<' => {
                if self.match_char('=') {
                    TokenKind::Lse
                } else {
                    TokenKind::Lst
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::Gre
                } else {
                    TokenKind::Grt
                }
            }
            ':' => {
                if self.match_char('=') {
                    TokenKind::Assign
                } else {
                    TokenKind::Colon
                }
            }
            '\'' => {
                return Err(CompileError::lexical(line, "stray apostrophe in program"));
            }
            '0'..='9' => return self.scan_number(line),
            c if c.is_ascii_alphabetic() || c == '_' => return self.scan_ident_or_keyword(line),
            c => {
                return Err(CompileError::lexical(
                    line,
                    format!("illegal character '{c}'"),
                ));
            }
        };

        self.tokens.push(Token::new(kind, line));
        Ok(())
    }

    fn scan_number(&mut self, line: u32) -> CompileResult<()> {
        let start = self.pos - 1;
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        let value: i64 = text
            .parse()
            .map_err(|_| CompileError::lexical(line, format!("illegal number '{text}'")))?;
        if value > i64::from(i32::MAX) {
            return Err(CompileError::lexical(
                line,
                format!("number '{text}' is out of range"),
            ));
        }
        self.tokens.push(Token::new(TokenKind::IntLit(value), line));
        Ok(())
    }

    fn scan_ident_or_keyword(&mut self, line: u32) -> CompileResult<()> {
        let start = self.pos - 1;
        while self.is_ident_continue(self.peek()) {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        let kind = match text {
            "type" => TokenKind::Type,
            "proc" => TokenKind::Proc,
            "var" => TokenKind::Var,
            "ref" => TokenKind::Ref,
            "array" => TokenKind::Array,
            "of" => TokenKind::Of,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            _ => TokenKind::Ident(SmolStr::new(text)),
        };
        self.tokens.push(Token::new(kind, line));
        Ok(())
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '/' if self.peek_next() == '/' => {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn is_ident_continue(&self, ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_'
    }

    fn peek(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        if ch != '\0' {
            self.pos += ch.len_utf8();
        }
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_only_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = tokenize("type proc var ref array of if else while foo").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert_eq!(kinds[0], &TokenKind::Type);
        assert_eq!(kinds[8], &TokenKind::While);
        assert_eq!(kinds[9], &TokenKind::Ident(SmolStr::new("foo")));
    }

    #[test]
    fn line_tracking_counts_newlines() {
        let tokens = tokenize("proc\nmain").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn assign_vs_colon() {
        let tokens = tokenize(": :=").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Colon);
        assert_eq!(tokens[1].kind, TokenKind::Assign);
    }

    #[test]
    fn comment_is_skipped() {
        let tokens = tokenize("proc // a comment\nmain").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn illegal_character_is_fatal() {
        let err = tokenize("@").unwrap_err();
        assert_eq!(err.code.code(), 99);
    }

    #[test]
    fn stray_apostrophe_is_fatal() {
        let err = tokenize("'").unwrap_err();
        assert_eq!(err.code.code(), 99);
    }

    #[test]
    fn integer_literal() {
        let tokens = tokenize("12345").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLit(12345));
    }
}
