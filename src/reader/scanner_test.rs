// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

use super::{Scanner, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(source);
    let mut kinds = Vec::new();
    loop {
        let token = scanner.scan_token();
        if token.kind == TokenKind::Eof {
            kinds.push(token.kind);
            break;
        }
        kinds.push(token.kind);
    }
    kinds
}

#[test]
fn scans_a_function_declaration() {
    let kinds = kinds("function foo(x, y) { return x }");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Function,
            TokenKind::Name,
            TokenKind::LeftParen,
            TokenKind::Name,
            TokenKind::Comma,
            TokenKind::Name,
            TokenKind::RightParen,
            TokenKind::LeftBrace,
            TokenKind::Return,
            TokenKind::Name,
            TokenKind::RightBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn name_may_contain_hyphens_and_continue_with_digits_and_dots() {
    let mut scanner = Scanner::new("less-equal XIV.V");
    let first = scanner.scan_token();
    assert_eq!(first.kind, TokenKind::Name);
    assert_eq!(first.text, "less-equal");

    let second = scanner.scan_token();
    assert_eq!(second.kind, TokenKind::Name);
    assert_eq!(second.text, "XIV.V");
}

#[test]
fn arrow_requires_both_characters() {
    let mut scanner = Scanner::new("=>");
    let token = scanner.scan_token();
    assert_eq!(token.kind, TokenKind::Arrow);
    assert_eq!(token.text, "=>");
}

#[test]
fn lone_equals_falls_through_to_eof() {
    let mut scanner = Scanner::new("=");
    let token = scanner.scan_token();
    assert_eq!(token.kind, TokenKind::Eof);
}

#[test]
fn line_comments_and_block_comments_are_skipped() {
    let kinds = kinds("// a comment\nfoo /* block \n comment */ bar");
    assert_eq!(kinds, vec![TokenKind::Name, TokenKind::Name, TokenKind::Eof]);
}

#[test]
fn line_numbers_advance_past_newlines() {
    let mut scanner = Scanner::new("foo\n\nbar");
    let first = scanner.scan_token();
    assert_eq!(first.line, 1);
    let second = scanner.scan_token();
    assert_eq!(second.line, 3);
}
