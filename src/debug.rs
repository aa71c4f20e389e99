//! # Debugging and Diagnostic Utilities
//!
//! Two things live here: the bytecode disassembler (used by both
//! `--print-code` and `--trace`) and conditional logging gated by
//! environment variables (runtime toggles rather than compile-time `cfg`s,
//! so a release build can still be asked to trace or print code).

use std::time::Instant;

use crate::chunk::{Chunk, OpCode};
use crate::object::ObjectHeap;
use crate::value::Value;

/// General debug logging is enabled if `RLOX_DEBUG` is set, or in debug
/// builds by default.
pub fn is_debug_enabled() -> bool {
    std::env::var("RLOX_DEBUG").is_ok() || cfg!(debug_assertions)
}

/// Performance-timer output is enabled only if `RLOX_VERBOSE` is set.
pub fn is_perf_enabled() -> bool {
    std::env::var("RLOX_VERBOSE").is_ok()
}

pub fn log_scanner(msg: &str) {
    if is_debug_enabled() {
        eprintln!("[scanner] {msg}");
    }
}

pub fn log_compiler(msg: &str) {
    if is_debug_enabled() {
        eprintln!("[compiler] {msg}");
    }
}

pub fn log_vm(msg: &str) {
    if is_debug_enabled() {
        eprintln!("[vm] {msg}");
    }
}

/// A simple structure for timing the duration of specific operations.
///
/// Usage: `let timer = PerfTimer::new("compile"); ... timer.finish();`
pub struct PerfTimer {
    start: Instant,
    label: String,
}

impl PerfTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn finish(self) {
        if is_perf_enabled() {
            let duration = self.start.elapsed();
            eprintln!("[perf] {}: {:?}", self.label, duration);
        }
    }
}

// --- Disassembler -------------------------------------------------------

/// Prints every instruction in `chunk` under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, heap: &ObjectHeap, name: &str) {
    println!("== {name} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, heap, offset);
    }
}

/// Disassembles the single instruction at `offset`, returning the offset of
/// the next one. The line column prints `|` when it repeats the previous
/// instruction's line, collapsing runs of identical line numbers visually
/// without changing the one-to-one `lines` lookup underneath.
pub fn disassemble_instruction(chunk: &Chunk, heap: &ObjectHeap, offset: usize) -> usize {
    print!("{offset:04} ");
    if offset > 0 && chunk.line_at(offset) == chunk.line_at(offset - 1) {
        print!("   | ");
    } else {
        print!("{:4} ", chunk.line_at(offset));
    }

    let instruction = OpCode::from_byte(chunk.byte_at(offset));
    match instruction {
        OpCode::Constant => constant_instruction(chunk, heap, offset),
        OpCode::Nil
        | OpCode::True
        | OpCode::False
        | OpCode::Equal
        | OpCode::Greater
        | OpCode::Less
        | OpCode::Add
        | OpCode::Subtract
        | OpCode::Multiply
        | OpCode::Divide
        | OpCode::Not
        | OpCode::Negate
        | OpCode::Return => simple_instruction(instruction.name(), offset),
    }
}

fn simple_instruction(name: &str, offset: usize) -> usize {
    println!("{name}");
    offset + 1
}

fn constant_instruction(chunk: &Chunk, heap: &ObjectHeap, offset: usize) -> usize {
    let index = chunk.byte_at(offset + 1);
    let value = chunk.constant_at(index as usize);
    println!(
        "{:<16} {:4} '{}'",
        OpCode::Constant.name(),
        index,
        value.display(heap)
    );
    offset + 2
}

/// Prints the live portion of the value stack, bottom to top, bracketing
/// each slot as `[ v ]`.
pub fn trace_stack(stack: &[Value], heap: &ObjectHeap) {
    print!("          ");
    for value in stack {
        print!("[ {} ]", value.display(heap));
    }
    println!();
}

// --- Structured disassembly (feature "json") ----------------------------

#[cfg(feature = "json")]
mod json_dump {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    pub struct InstructionDump {
        pub offset: usize,
        pub line: u32,
        pub opcode: &'static str,
        pub operand: Option<u8>,
        pub constant: Option<String>,
    }

    #[derive(Serialize)]
    pub struct ChunkDump {
        pub instructions: Vec<InstructionDump>,
        pub constants: Vec<String>,
    }

    /// Walks `chunk` the same way [`super::disassemble_chunk`] does, but
    /// collects each instruction into a serializable record instead of
    /// printing it, for tooling that wants the chunk's shape without
    /// parsing the human-readable disassembly text.
    pub fn dump(chunk: &Chunk, heap: &ObjectHeap) -> ChunkDump {
        let mut instructions = Vec::new();
        let mut offset = 0;
        while offset < chunk.len() {
            let line = chunk.line_at(offset);
            let op = OpCode::from_byte(chunk.byte_at(offset));
            let (operand, constant, next) = match op {
                OpCode::Constant => {
                    let index = chunk.byte_at(offset + 1);
                    let value = chunk.constant_at(index as usize);
                    (Some(index), Some(value.display(heap)), offset + 2)
                }
                _ => (None, None, offset + 1),
            };
            instructions.push(InstructionDump {
                offset,
                line,
                opcode: op.name(),
                operand,
                constant,
            });
            offset = next;
        }
        let constants = chunk
            .constants()
            .iter()
            .map(|v| v.display(heap))
            .collect();
        ChunkDump {
            instructions,
            constants,
        }
    }
}

#[cfg(feature = "json")]
pub use json_dump::{dump, ChunkDump};

/// Serializes `chunk`'s structure to a pretty-printed JSON string.
#[cfg(feature = "json")]
pub fn dump_json(chunk: &Chunk, heap: &ObjectHeap) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&dump(chunk, heap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn disassemble_instruction_advances_past_operand_bytes() {
        let mut chunk = Chunk::new();
        let heap = ObjectHeap::new();
        let idx = chunk.add_constant(Value::Number(1.0));
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(idx as u8, 1);
        chunk.write_op(OpCode::Return, 1);

        let next = disassemble_instruction(&chunk, &heap, 0);
        assert_eq!(next, 2);
        let next = disassemble_instruction(&chunk, &heap, next);
        assert_eq!(next, 3);
    }
}
