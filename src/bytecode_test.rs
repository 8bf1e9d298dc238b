// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

use super::{op, Chunk};
use crate::types::ObjectId;

#[test]
fn u16_operands_round_trip_big_endian() {
    let mut chunk = Chunk::new();
    chunk.emit_u16(0x1234);
    assert_eq!(chunk.code, vec![0x12, 0x34]);
    assert_eq!(chunk.read_u16(0), 0x1234);
}

#[test]
fn constants_are_deduplicated_by_identity() {
    let mut chunk = Chunk::new();
    let a = ObjectId::new(0);
    let b = ObjectId::new(1);

    let first = chunk.add_constant(a);
    let second = chunk.add_constant(a);
    let third = chunk.add_constant(b);

    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(chunk.constants.len(), 2);
}

#[test]
fn disassemble_prints_one_line_per_instruction_with_its_operand() {
    let mut chunk = Chunk::new();
    let name = chunk.add_constant(ObjectId::new(0));
    chunk.emit_u8(op::GET_STRING);
    chunk.emit_u16(name);
    chunk.emit_u8(op::POP);
    chunk.emit_u8(op::RETURN);

    let text = chunk.disassemble();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("GET_STRING") && lines[0].ends_with(" 0"));
    assert!(lines[1].ends_with("POP"));
    assert!(lines[2].ends_with("RETURN"));
}
