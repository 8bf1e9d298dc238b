// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! A minimal sample standard library (SUPPLEMENT, spec §14).
//!
//! `print` and `set` mirror `original_source/src/funk_std.c` directly;
//! `add`/`equal`/`lessEqual`/`if`/`while` exist only so the end-to-end
//! scenarios in spec §8 have something to run against — this is not a
//! general-purpose prelude.

use crate::types::FuncRef;
use crate::vm::Vm;

fn boolean(vm: &mut Vm, value: bool) -> FuncRef {
    let name = if value { "true" } else { "false" };
    Some(vm.create_empty_function(name))
}

fn print(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    for &arg in args {
        println!("{}", vm.to_string(arg));
    }
    None
}

fn set(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    if args.len() != 2 {
        vm.error("Expected 2 arguments");
        return None;
    }
    let name = vm.to_string(args[0]);
    vm.set_variable(&name, args[1]);
    None
}

fn add(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    let sum: f64 = args.iter().map(|&a| vm.to_number(a)).sum();
    Some(vm.number_to_string(sum))
}

fn equal(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    if args.len() != 2 {
        vm.error("Expected 2 arguments");
        return None;
    }
    let result = vm.to_string(args[0]) == vm.to_string(args[1]);
    boolean(vm, result)
}

fn less_equal(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    if args.len() != 2 {
        vm.error("Expected 2 arguments");
        return None;
    }
    let result = vm.to_number(args[0]) <= vm.to_number(args[1]);
    boolean(vm, result)
}

fn if_native(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    if args.is_empty() {
        vm.error("Expected at least 1 argument");
        return None;
    }

    if vm.is_true(args[0]) {
        args.get(1).and_then(|&then_fn| vm.run(then_fn, &[]))
    } else {
        args.get(2).and_then(|&else_fn| vm.run(else_fn, &[]))
    }
}

fn while_native(vm: &mut Vm, args: &[FuncRef]) -> FuncRef {
    if args.len() != 2 {
        vm.error("Expected 2 arguments");
        return None;
    }
    let (condition, body) = (args[0], args[1]);

    loop {
        let test = vm.run(condition, &[]);
        if !vm.is_true(test) {
            return None;
        }
        vm.run(body, &[]);
    }
}

/// Register the sample standard library's natives into `vm`'s globals.
pub fn open(vm: &mut Vm) {
    vm.define_native("print", print);
    vm.define_native("set", set);
    vm.define_native("add", add);
    vm.define_native("equal", equal);
    vm.define_native("lessEqual", less_equal);
    vm.define_native("if", if_native);
    vm.define_native("while", while_native);
}
