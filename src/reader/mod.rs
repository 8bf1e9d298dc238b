// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! Scanner (C3): turns source text into a lazy stream of tokens.

#[cfg(test)]
mod scanner_test;

mod scanner;

pub use scanner::{Scanner, Token, TokenKind};
