// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! Bytecode virtual machine (C5) and the embedding surface (spec §6).
//!
//! `CALL` is lifted onto an explicit frame stack rather than recursing
//! host-stack-bound calls into `run` (see spec.md §9's "nested
//! interpreter recursion" design note, which permits either approach).
//! An error inside a frame aborts only that frame: its caller simply
//! receives a null result and keeps running, matching the single-level,
//! no-unwinding error model of spec §7.
//!
//! Natives are still free to call back into [`Vm::run`] themselves (the
//! sample `if`/`while` do, to invoke their lambda arguments) — that path
//! does recurse on the host stack. `dispatch` takes the frame-stack depth
//! it started at as its `baseline` and only returns once the frame it
//! was asked to run has completed, so a re-entrant call can never be
//! mistaken for the return of an unrelated, still-running outer call.


use tracing::trace;

use crate::arena::Arena;
use crate::bytecode::op;
use crate::numeric;
use crate::object::{BasicFunction, NativeFunction, Object};
use crate::table::Table;
use crate::types::{FuncRef, ObjectId};

/// Fixed operand-stack capacity (spec §3: "256 function slots").
pub const STACK_CAPACITY: usize = 256;
/// Recursion guard for nested `CALL`s (spec §5's "stack-overflow guard").
pub const MAX_CALL_DEPTH: usize = 256;

struct Frame {
    function: ObjectId,
    ip: usize,
    variables: Table,
    /// Operand stack length to restore when this frame completes.
    return_base: usize,
}

/// Process-wide VM state: the object arena, globals, the operand stack,
/// and the current chain of call frames.
pub struct Vm {
    pub(crate) arena: Arena,
    globals: Table,
    stack: Vec<FuncRef>,
    frames: Vec<Frame>,
    error_fn: Box<dyn FnMut(&str)>,
}

impl Vm {
    /// Build a VM with the given error callback.
    ///
    /// The original embedding surface also takes `alloc`/`free`
    /// callbacks; Rust's ownership model already gives every object a
    /// single deterministic owner (the arena's `Vec`), so there is
    /// nothing left for a host allocator to do here.
    #[must_use]
    pub fn new(error_fn: impl FnMut(&str) + 'static) -> Self {
        Self {
            arena: Arena::new(),
            globals: Table::new(),
            stack: Vec::new(),
            frames: Vec::new(),
            error_fn: Box::new(error_fn),
        }
    }

    pub(crate) fn report_error(&mut self, message: &str) {
        (self.error_fn)(message);
    }

    fn hash_of(&self, id: ObjectId) -> u32 {
        match self.arena.get(id) {
            Object::Str(s) => s.hash,
            _ => unreachable!("table keys are always interned strings"),
        }
    }

    fn name_str(&self, id: ObjectId) -> &str {
        match self.arena.get(id) {
            Object::Str(s) => s.as_str(),
            Object::Basic(f) => self.name_str(f.name),
            Object::Native(f) => self.name_str(f.name),
        }
    }

    // ---- compile / run -----------------------------------------------

    /// Compile `source` into a top-level `BasicFunction`; `None` on any
    /// syntax error (spec §6: `compile`).
    pub fn compile(&mut self, name: &str, source: &str) -> FuncRef {
        crate::compiler::compile_string(self, name, source)
    }

    /// Execute `function` with `args`, returning its result (spec §6:
    /// `run`). This folds the original ABI's `run`/`run_arged` split
    /// into one call — the host always supplies its arguments as a
    /// slice rather than pre-pushing them onto an internal stack.
    pub fn run(&mut self, function: FuncRef, args: &[FuncRef]) -> FuncRef {
        let Some(id) = function else {
            return None;
        };

        match self.arena.get(id) {
            Object::Native(_) => self.call_native(id, args),
            Object::Basic(_) => {
                // Natives (e.g. `if`/`while`) call back into `run`, so
                // `dispatch` must be re-entrant: it only returns once the
                // one frame pushed *here* completes, not whenever the
                // frame stack happens to empty out globally.
                let baseline = self.frames.len();
                let frame = self.bind_frame(id, args);
                self.frames.push(frame);
                self.dispatch(baseline)
            }
            Object::Str(_) => None,
        }
    }

    /// Compile then run (spec §6: `runString`).
    pub fn run_string(&mut self, name: &str, source: &str, args: &[FuncRef]) -> FuncRef {
        let function = self.compile(name, source);
        self.run(function, args)
    }

    fn bind_frame(&mut self, function: ObjectId, args: &[FuncRef]) -> Frame {
        let arg_names = match self.arena.get(function) {
            Object::Basic(f) => f.arg_names.clone(),
            _ => unreachable!("bind_frame is only called for BasicFunction callees"),
        };

        let mut variables = Table::new();
        for (i, &name) in arg_names.iter().enumerate() {
            let hash = self.hash_of(name);
            let value = args.get(i).copied().unwrap_or(None);
            variables.set(name, hash, value);
        }

        trace!(depth = self.frames.len() + 1, "pushing call frame");
        Frame {
            function,
            ip: 0,
            variables,
            return_base: self.stack.len(),
        }
    }

    fn call_native(&mut self, id: ObjectId, args: &[FuncRef]) -> FuncRef {
        let Object::Native(nf) = self.arena.get_mut(id) else {
            unreachable!("call_native is only called for NativeFunction callees")
        };
        let mut func = std::mem::replace(&mut nf.func, Box::new(|_, _| None));
        let result = func(self, args);
        if let Object::Native(nf) = self.arena.get_mut(id) {
            nf.func = func;
        }
        result
    }

    /// Push a value, or — on overflow — abort the current frame instead.
    /// `Some(result)` means the abort unwound all the way back to
    /// `baseline`, so the enclosing `dispatch` call must return it
    /// immediately; `None` means either the push succeeded, or an abort
    /// happened but left frames above `baseline` still active (the
    /// dispatch loop should just `continue`).
    fn push(&mut self, value: FuncRef, baseline: usize) -> Option<FuncRef> {
        if self.stack.len() >= STACK_CAPACITY {
            self.report_error("Operand stack overflow");
            return self.complete_current_frame(None, baseline);
        }
        self.stack.push(value);
        None
    }

    fn pop(&mut self) -> FuncRef {
        self.stack.pop().unwrap_or(None)
    }

    /// Complete the current (topmost) frame with `value`, resetting the
    /// stack to that frame's entry point. If the completed frame is the
    /// one `dispatch(baseline)` itself pushed, returns `Some(value)` so
    /// the caller returns it; otherwise the completed frame was pushed
    /// by a `CALL` earlier in this same dispatch loop, so `value` is
    /// pushed as that call's result and the loop keeps going.
    fn complete_current_frame(&mut self, value: FuncRef, baseline: usize) -> Option<FuncRef> {
        let frame = self.frames.pop().expect("complete_current_frame needs an active frame");
        trace!(depth = self.frames.len() + 1, "popping call frame");
        self.stack.truncate(frame.return_base);

        if self.frames.len() == baseline {
            Some(value)
        } else {
            self.stack.push(value);
            None
        }
    }

    fn read_u8(&mut self) -> u8 {
        let frame = self.frames.last_mut().expect("dispatch always has a frame");
        let Object::Basic(f) = self.arena.get(frame.function) else {
            unreachable!("frame.function is always a BasicFunction")
        };
        let byte = f.chunk.code[frame.ip];
        frame.ip += 1;
        byte
    }

    fn read_u16(&mut self) -> u16 {
        (u16::from(self.read_u8()) << 8) | u16::from(self.read_u8())
    }

    fn read_constant(&mut self) -> ObjectId {
        let index = self.read_u16();
        let frame = self.frames.last().expect("dispatch always has a frame");
        let Object::Basic(f) = self.arena.get(frame.function) else {
            unreachable!("frame.function is always a BasicFunction")
        };
        f.chunk.constants[index as usize]
    }

    /// Look up `name` walking the frame chain innermost-first, then
    /// globals. `Some(value)` means the name is bound (`value` may
    /// itself be null); `None` means no binding exists anywhere — the
    /// distinction `GET_STRING` needs to decide whether to materialize
    /// a literal (`funk_run_function`'s `hadResult` flag).
    fn lookup_found(&self, name: ObjectId, hash: u32) -> Option<FuncRef> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.variables.get(name, hash) {
                return Some(value);
            }
        }
        self.globals.get(name, hash)
    }

    fn lookup(&self, name: ObjectId, hash: u32) -> FuncRef {
        self.lookup_found(name, hash).unwrap_or(None)
    }

    /// The dispatch loop: runs until the frame it was entered with (the
    /// one at `baseline`) completes. A native callback may re-enter
    /// `run` (and so `dispatch`) while outer frames are still active;
    /// `baseline` is what lets this call return only its own frame's
    /// result instead of racing the outer call over the same frames.
    fn dispatch(&mut self, baseline: usize) -> FuncRef {
        loop {
            let opcode = self.read_u8();

            match opcode {
                op::RETURN => {
                    let value = self.pop();
                    if let Some(result) = self.complete_current_frame(value, baseline) {
                        return result;
                    }
                }

                op::CALL => {
                    let argc = usize::from(self.read_u8());
                    let base = self.stack.len() - argc - 1;
                    let callee = self.stack[base];

                    let Some(callee_id) = callee else {
                        self.report_error("Attempt to call a null value");
                        if let Some(result) = self.complete_current_frame(None, baseline) {
                            return result;
                        }
                        continue;
                    };

                    match self.arena.get(callee_id) {
                        Object::Native(_) => {
                            let args: Vec<FuncRef> = self.stack[base + 1..base + 1 + argc].to_vec();
                            let result = self.call_native(callee_id, &args);
                            self.stack.truncate(base);
                            if let Some(result) = self.push(result, baseline) {
                                return result;
                            }
                        }
                        Object::Basic(_) => {
                            if self.frames.len() >= MAX_CALL_DEPTH {
                                self.report_error("Call depth exceeded");
                                self.stack.truncate(base);
                                if let Some(result) = self.push(None, baseline) {
                                    return result;
                                }
                                continue;
                            }

                            let args: Vec<FuncRef> =
                                self.stack[base + 1..base + 1 + argc].to_vec();
                            self.stack.truncate(base);
                            let frame = self.bind_frame(callee_id, &args);
                            self.frames.push(frame);
                        }
                        Object::Str(_) => {
                            self.report_error("Attempt to call a string value");
                            self.stack.truncate(base);
                            if let Some(result) = self.push(None, baseline) {
                                return result;
                            }
                        }
                    }
                }

                op::GET => {
                    let name = self.read_constant();
                    let hash = self.hash_of(name);
                    let value = self.lookup(name, hash);
                    if let Some(result) = self.push(value, baseline) {
                        return result;
                    }
                }

                op::GET_STRING => {
                    let name = self.read_constant();
                    let hash = self.hash_of(name);
                    let value = self.lookup_found(name, hash).unwrap_or_else(|| {
                        Some(self.arena.alloc_basic_function(BasicFunction::new(name)))
                    });
                    if let Some(result) = self.push(value, baseline) {
                        return result;
                    }
                }

                op::POP => {
                    self.pop();
                }

                op::DEFINE => {
                    let constant = self.read_constant();
                    let name = match self.arena.get(constant) {
                        Object::Basic(f) => f.name,
                        _ => unreachable!("DEFINE's constant is always a BasicFunction"),
                    };
                    let hash = self.hash_of(name);
                    let frame = self.frames.last_mut().expect("dispatch always has a frame");
                    frame.variables.set(name, hash, Some(constant));
                }

                op::PUSH_NULL => {
                    if let Some(result) = self.push(None, baseline) {
                        return result;
                    }
                }

                op::PUSH_CONSTANT => {
                    let constant = self.read_constant();
                    if let Some(result) = self.push(Some(constant), baseline) {
                        return result;
                    }
                }

                _ => {
                    self.report_error("Unknown instruction");
                    if let Some(result) = self.complete_current_frame(None, baseline) {
                        return result;
                    }
                }
            }
        }
    }

    // ---- variables -----------------------------------------------------

    /// Install a native function in globals (spec §6: `defineNative`).
    pub fn define_native(
        &mut self,
        name: &str,
        func: impl FnMut(&mut Self, &[FuncRef]) -> FuncRef + 'static,
    ) {
        let name_id = self.arena.intern(name);
        let hash = self.hash_of(name_id);
        let function = self.arena.alloc_native_function(NativeFunction {
            name: name_id,
            func: Box::new(func),
        });
        self.globals.set(name_id, hash, Some(function));
    }

    pub fn set_global(&mut self, name: &str, value: FuncRef) {
        let name_id = self.arena.intern(name);
        let hash = self.hash_of(name_id);
        self.globals.set(name_id, hash, value);
    }

    #[must_use]
    pub fn get_global(&mut self, name: &str) -> FuncRef {
        let name_id = self.arena.intern(name);
        let hash = self.hash_of(name_id);
        self.globals.get(name_id, hash).unwrap_or(None)
    }

    /// Walk frames inner→outer; if a frame already has the binding,
    /// update it there and stop. If the walk exhausts frames and the
    /// name was not found in globals either, bind it in the innermost
    /// frame (spec §4.5's "variable write discipline").
    pub fn set_variable(&mut self, name: &str, value: FuncRef) {
        if self.frames.is_empty() {
            self.set_global(name, value);
            return;
        }

        let name_id = self.arena.intern(name);
        let hash = self.hash_of(name_id);

        for frame in self.frames.iter_mut().rev() {
            if frame.variables.get(name_id, hash).is_some() {
                frame.variables.set(name_id, hash, value);
                return;
            }
        }

        if self.globals.get(name_id, hash).is_some() {
            self.globals.set(name_id, hash, value);
            return;
        }

        let frame = self.frames.last_mut().expect("checked non-empty above");
        frame.variables.set(name_id, hash, value);
    }

    #[must_use]
    pub fn get_variable(&mut self, name: &str) -> FuncRef {
        let name_id = self.arena.intern(name);
        let hash = self.hash_of(name_id);
        self.lookup(name_id, hash)
    }

    // ---- factories -------------------------------------------------------

    pub fn create_string(&mut self, chars: &str) -> ObjectId {
        self.arena.intern(chars)
    }

    pub fn create_empty_function(&mut self, name: &str) -> ObjectId {
        let name_id = self.arena.intern(name);
        self.arena.alloc_basic_function(BasicFunction::new(name_id))
    }

    pub fn create_native_function(
        &mut self,
        name: &str,
        func: impl FnMut(&mut Self, &[FuncRef]) -> FuncRef + 'static,
    ) -> ObjectId {
        let name_id = self.arena.intern(name);
        self.arena.alloc_native_function(NativeFunction {
            name: name_id,
            func: Box::new(func),
        })
    }

    // ---- helpers -----------------------------------------------------

    /// If `function` carries bytecode (or is a native callable), invoke
    /// it with zero arguments and use the result; otherwise pass it
    /// through unchanged (spec §4.6: `toNumber`/`isTrue`'s shared rule).
    fn maybe_invoke(&mut self, function: FuncRef) -> FuncRef {
        let Some(id) = function else { return None };
        let has_code = match self.arena.get(id) {
            Object::Basic(f) => f.has_code(),
            Object::Native(_) => true,
            Object::Str(_) => false,
        };
        if has_code { self.run(Some(id), &[]) } else { Some(id) }
    }

    #[must_use]
    pub fn function_has_code(&self, function: FuncRef) -> bool {
        match function.map(|id| self.arena.get(id)) {
            Some(Object::Basic(f)) => f.has_code(),
            Some(Object::Native(_)) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_true(&mut self, function: FuncRef) -> bool {
        match self.maybe_invoke(function) {
            Some(id) => self.name_str(id) == "true",
            None => false,
        }
    }

    #[must_use]
    pub fn to_number(&mut self, function: FuncRef) -> f64 {
        match self.maybe_invoke(function) {
            Some(id) => numeric::parse(self.name_str(id)),
            None => 0.0,
        }
    }

    pub fn number_to_string(&mut self, value: f64) -> ObjectId {
        let text = numeric::format(value);
        self.create_empty_function(&text)
    }

    /// Render `function`'s name (spec §6: `toString`). `"null"` for the
    /// null reference.
    #[must_use]
    pub fn to_string(&self, function: FuncRef) -> String {
        match function {
            Some(id) => self.name_str(id).to_owned(),
            None => "null".to_owned(),
        }
    }

    pub fn error(&mut self, message: &str) {
        self.report_error(message);
    }
}
