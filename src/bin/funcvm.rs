// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! `funcvm <file>`: compile and run a source file, printing a stack
//! trace to stderr on error.

use std::env;
use std::process::ExitCode;

use funcvm::Vm;

fn print_error(message: &str) {
    eprintln!("{message}");
}

fn run_file(path: &str) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new(print_error);
    funcvm::stdlib::open(&mut vm);
    vm.run_string(path, &source, &[]);

    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    match args.as_slice() {
        [_, file] => run_file(file),
        _ => {
            println!("funcvm [file]");
            ExitCode::SUCCESS
        }
    }
}
