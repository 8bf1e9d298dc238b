// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

use core::iter::Peekable;
use core::str::CharIndices;

use tracing::trace;

/// Token kinds recognized by the core grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    /// The two-character `=>`.
    Arrow,
    Function,
    Return,
    /// Also produced for any unrecognized byte; the compiler treats it
    /// as an error in context rather than the scanner failing outright.
    Eof,
}

/// A scanned token: a kind, a line number, and a borrowed slice back into
/// the source buffer (no string copying).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub line: u16,
    pub text: &'a str,
}

/// Produces tokens on demand from a source buffer.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    start: usize,
    line: u16,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

fn is_name_continue(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '.'
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            start: 0,
            line: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn current_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn make(&mut self, kind: TokenKind) -> Token<'a> {
        let end = self.current_offset();
        Token {
            kind,
            line: self.line,
            text: &self.source[self.start..end],
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\r' | '\t') => {
                    self.advance();
                }
                Some('\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some(&(_, '/')) => {
                            while !matches!(self.peek(), Some('\n') | None) {
                                self.advance();
                            }
                        }
                        Some(&(_, '*')) => {
                            self.advance();
                            self.advance();
                            loop {
                                match (self.peek(), {
                                    let mut after = self.chars.clone();
                                    after.next();
                                    after.peek().map(|&(_, c)| c)
                                }) {
                                    (None, _) => break,
                                    (Some('*'), Some('/')) => {
                                        self.advance();
                                        self.advance();
                                        break;
                                    }
                                    (Some('\n'), _) => {
                                        self.line += 1;
                                        self.advance();
                                    }
                                    _ => {
                                        self.advance();
                                    }
                                }
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn decide_name_kind(text: &str) -> TokenKind {
        match text {
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            _ => TokenKind::Name,
        }
    }

    /// Produce the next token. Infallible: an unrecognized byte yields
    /// an `Eof` token rather than an error (see [`TokenKind::Eof`]).
    pub fn scan_token(&mut self) -> Token<'a> {
        let token = self.scan_token_inner();
        trace!(kind = ?token.kind, line = token.line, text = token.text, "scanned token");
        token
    }

    fn scan_token_inner(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.start = self.current_offset();

        let Some(c) = self.advance() else {
            return self.make(TokenKind::Eof);
        };

        if is_name_start(c) {
            while matches!(self.peek(), Some(c) if is_name_continue(c)) {
                self.advance();
            }
            let end = self.current_offset();
            let kind = Self::decide_name_kind(&self.source[self.start..end]);
            return self.make(kind);
        }

        match c {
            '(' => self.make(TokenKind::LeftParen),
            ')' => self.make(TokenKind::RightParen),
            '{' => self.make(TokenKind::LeftBrace),
            '}' => self.make(TokenKind::RightBrace),
            ',' => self.make(TokenKind::Comma),
            '=' if self.peek() == Some('>') => {
                self.advance();
                self.make(TokenKind::Arrow)
            }
            _ => self.make(TokenKind::Eof),
        }
    }
}
