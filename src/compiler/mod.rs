// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! Single-pass, one-token-lookahead compiler (C4).
//!
//! Targets a *current basic function*; nested function definitions and
//! lambdas temporarily swap a new function in, emit its body, then
//! restore the outer one — mirroring `compile_function` in the
//! reference implementation this grammar was distilled from.


use tracing::{debug, trace};

use crate::bytecode::op;
use crate::object::{BasicFunction, Object};
use crate::reader::{Scanner, Token, TokenKind};
use crate::types::ObjectId;
use crate::vm::Vm;

/// Argument lists are capped at 255 entries (`CALL`'s argc operand, and
/// a `BasicFunction`'s argument-name list, are both a single byte).
pub const MAX_PARAMS: usize = 255;

/// Compile `source` into a top-level `BasicFunction` named `name`.
///
/// Returns `None` if any syntax error was reported; compilation
/// continues past the first error so later ones can surface too (see
/// spec §7's "Compilation error" recovery).
pub fn compile_string(vm: &mut Vm, name: &str, source: &str) -> Option<ObjectId> {
    let name_id = vm.arena.intern(name);
    let function = vm.arena.alloc_basic_function(BasicFunction::new(name_id));

    let placeholder = Token {
        kind: TokenKind::Eof,
        line: 0,
        text: "",
    };

    let mut compiler = Compiler {
        vm,
        scanner: Scanner::new(source),
        previous: placeholder,
        current: placeholder,
        function,
        had_error: false,
    };

    compiler.advance();
    while compiler.current.kind != TokenKind::Eof {
        compiler.declaration();
    }
    compiler.emit_u8(op::RETURN);

    debug!(name, had_error = compiler.had_error, "compiled top-level function");
    if let Object::Basic(f) = compiler.vm.arena.get(function) {
        trace!(disassembly = %f.chunk.disassemble(), "top-level chunk");
    }
    let had_error = compiler.had_error;
    if had_error { None } else { Some(function) }
}

struct Compiler<'vm, 'src> {
    vm: &'vm mut Vm,
    scanner: Scanner<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    function: ObjectId,
    had_error: bool,
}

impl<'vm, 'src> Compiler<'vm, 'src> {
    fn advance(&mut self) {
        self.previous = self.current;
        self.current = self.scanner.scan_token();
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error(message);
        }
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.current.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, message: &str) {
        self.vm.report_error(message);
        self.had_error = true;
    }

    fn emit_u8(&mut self, byte: u8) {
        let Object::Basic(f) = self.vm.arena.get_mut(self.function) else {
            unreachable!("compiler target is always a BasicFunction")
        };
        f.chunk.emit_u8(byte);
    }

    fn emit_u16(&mut self, value: u16) {
        let Object::Basic(f) = self.vm.arena.get_mut(self.function) else {
            unreachable!("compiler target is always a BasicFunction")
        };
        f.chunk.emit_u16(value);
    }

    fn add_constant(&mut self, constant: ObjectId) -> u16 {
        let Object::Basic(f) = self.vm.arena.get_mut(self.function) else {
            unreachable!("compiler target is always a BasicFunction")
        };
        f.chunk.add_constant(constant)
    }

    fn intern_string_constant(&mut self, text: &str) -> u16 {
        let id = self.vm.arena.intern(text);
        self.add_constant(id)
    }

    fn enclosing_function_name(&self) -> String {
        let Object::Basic(f) = self.vm.arena.get(self.function) else {
            unreachable!("compiler target is always a BasicFunction")
        };
        let Object::Str(name) = self.vm.arena.get(f.name) else {
            unreachable!("function name is always interned")
        };
        name.as_str().to_owned()
    }

    /// Compile a `(params?) [=> expr|block | block]` function body,
    /// returning the id of the newly compiled `BasicFunction`. Swaps
    /// `self.function` in for the duration, then restores it.
    fn function_body(&mut self, name: ObjectId, lambda: bool) -> ObjectId {
        let outer = self.function;
        self.function = self.vm.arena.alloc_basic_function(BasicFunction::new(name));

        self.consume(TokenKind::LeftParen, "Expected '(' after function name");

        if !self.match_token(TokenKind::RightParen) {
            let mut arg_names = Vec::new();
            loop {
                self.consume(TokenKind::Name, "Expected argument name");
                if arg_names.len() < MAX_PARAMS {
                    let id = self.vm.arena.intern(self.previous.text);
                    arg_names.push(id);
                } else {
                    self.error("Too many arguments");
                }
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RightParen, "Expected ')' after function arguments");

            let Object::Basic(f) = self.vm.arena.get_mut(self.function) else {
                unreachable!("compiler target is always a BasicFunction")
            };
            f.arg_names = arg_names;
        }

        let mut compiled_body = false;

        if lambda {
            self.consume(TokenKind::Arrow, "Expected '=>' after function arguments");

            if self.current.kind != TokenKind::LeftBrace {
                self.expression();
                self.emit_u8(op::RETURN);
                compiled_body = true;
            }
        }

        if !compiled_body {
            self.consume(TokenKind::LeftBrace, "Expected '{' after function arguments");

            while !self.match_token(TokenKind::RightBrace) {
                self.declaration();
            }

            self.emit_u8(op::PUSH_NULL);
            self.emit_u8(op::RETURN);
        }

        let compiled = self.function;
        self.function = outer;
        compiled
    }

    /// `expression := 'return' expression | lambda | call`
    fn expression(&mut self) {
        if self.match_token(TokenKind::Return) {
            self.expression();
            self.emit_u8(op::RETURN);
            return;
        }

        if self.current.kind == TokenKind::LeftParen {
            let enclosing = self.enclosing_function_name();
            let synthetic = format!("lambda {enclosing} {}", self.previous.line);
            let name = self.vm.arena.intern(&synthetic);

            let lambda = self.function_body(name, true);

            self.emit_u8(op::PUSH_CONSTANT);
            let index = self.add_constant(lambda);
            self.emit_u16(index);
            return;
        }

        self.call();
    }

    /// `call := NAME ( '(' args? ')' )*`
    ///
    /// `GET` vs `GET_STRING` preserves the rule that a bare identifier in
    /// value position may denote either an existing binding or a literal
    /// string (its own name); chained calls `f()()()` are parsed with a
    /// `while` loop (see spec.md §9's resolved Open Question).
    fn call(&mut self) {
        self.consume(TokenKind::Name, "Function name expected");

        let name_index = self.intern_string_constant(self.previous.text);
        let mut is_a_call = self.match_token(TokenKind::LeftParen);

        self.emit_u8(if is_a_call { op::GET } else { op::GET_STRING });
        self.emit_u16(name_index);

        while is_a_call {
            let mut argument_count: u8 = 0;

            if !self.match_token(TokenKind::RightParen) {
                loop {
                    self.expression();
                    argument_count += 1;
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RightParen, "')' expected after function arguments");
            }

            self.emit_u8(op::CALL);
            self.emit_u8(argument_count);

            is_a_call = self.match_token(TokenKind::LeftParen);
        }
    }

    /// `declaration := 'function' NAME function-body | expression`
    fn declaration(&mut self) {
        if self.match_token(TokenKind::Function) {
            self.consume(TokenKind::Name, "Expected function name");
            let name = self.vm.arena.intern(self.previous.text);

            let function = self.function_body(name, false);

            self.emit_u8(op::DEFINE);
            let index = self.add_constant(function);
            self.emit_u16(index);
            return;
        }

        self.expression();
        self.emit_u8(op::POP);
    }
}
