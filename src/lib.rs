//! # rlox
//!
//! A stack-based bytecode interpreter for a small dynamically-typed
//! expression language: a single-pass Pratt-precedence compiler emits
//! bytecode into a [`chunk::Chunk`], and a [`vm::VM`] decodes and dispatches
//! it against a fixed-capacity value stack. There are no statements,
//! variables, control flow, or functions. A `compile`/`interpret` call
//! handles exactly one expression, prints its value, and halts.

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod object;
pub mod value;
pub mod vm;

pub use chunk::Chunk;
pub use compiler::compile;
pub use object::ObjectHeap;
pub use value::Value;
pub use vm::{InterpretResult, VmOptions, VM};
