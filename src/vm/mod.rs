//! # VM
//!
//! The stack machine that decodes and dispatches a compiled [`Chunk`]. Owns
//! the fixed-capacity value stack, the instruction pointer, and the
//! [`ObjectHeap`] every string constant and concatenation result is allocated
//! into. A `VM` is reusable across multiple [`VM::interpret`] calls; each
//! call resets the stack but keeps the heap (and therefore every string ever
//! allocated) alive until the `VM` itself is dropped.

mod error;

use crate::chunk::{Chunk, OpCode};
use crate::compiler::compile;
use crate::debug::{disassemble_instruction, trace_stack};
use crate::object::ObjectHeap;
use crate::value::Value;

pub use error::RuntimeErrorKind;

/// Fixed value-stack capacity. The language's grammar only ever pushes one
/// net value per binary/unary operator, so expressions the compiler accepts
/// never approach this in practice. Exceeding it is not defended against:
/// push/pop index the backing array directly, so an expression that did
/// overflow it would panic on the out-of-bounds write rather than silently
/// corrupting memory.
const STACK_MAX: usize = 256;

/// The three terminal outcomes of an `interpret*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

/// Runtime-tunable diagnostics, exposed as plain fields instead of
/// compile-time `cfg`s so they can be toggled without a rebuild.
#[derive(Debug, Clone, Copy, Default)]
pub struct VmOptions {
    /// Print the stack and the next instruction before every dispatch.
    pub trace_execution: bool,
    /// Print the disassembled chunk once, right after a successful compile.
    pub print_code: bool,
}

pub struct VM {
    heap: ObjectHeap,
    stack: [Value; STACK_MAX],
    stack_top: usize,
    options: VmOptions,
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl VM {
    pub fn new() -> Self {
        Self::with_options(VmOptions::default())
    }

    pub fn with_options(options: VmOptions) -> Self {
        Self {
            heap: ObjectHeap::new(),
            stack: [Value::Nil; STACK_MAX],
            stack_top: 0,
            options,
        }
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    fn reset_stack(&mut self) {
        self.stack_top = 0;
    }

    fn push(&mut self, value: Value) {
        self.stack[self.stack_top] = value;
        self.stack_top += 1;
    }

    fn pop(&mut self) -> Value {
        self.stack_top -= 1;
        self.stack[self.stack_top]
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack_top - 1 - distance]
    }

    /// Compiles `source` into a fresh chunk and runs it. Returns
    /// `CompileError` without touching the stack if compilation fails.
    pub fn interpret(&mut self, source: &[u8]) -> InterpretResult {
        let mut chunk = Chunk::new();
        if !compile(source, &mut chunk, &mut self.heap) {
            return InterpretResult::CompileError;
        }
        if self.options.print_code {
            crate::debug::disassemble_chunk(&chunk, &self.heap, "code");
        }
        self.run(&chunk)
    }

    /// Runs an already-compiled chunk directly, skipping compilation. Used
    /// for direct VM testing; `CompileError` is unreachable on this path.
    pub fn interpret_chunk(&mut self, chunk: &Chunk) -> InterpretResult {
        self.run(chunk)
    }

    fn runtime_error(&mut self, chunk: &Chunk, ip: usize, kind: RuntimeErrorKind) {
        eprintln!("{kind}");
        let faulting_instruction = ip - 1;
        let line = chunk.line_at(faulting_instruction);
        eprintln!("[line {line}] in script");
        self.reset_stack();
    }

    fn run(&mut self, chunk: &Chunk) -> InterpretResult {
        let mut ip = 0usize;

        macro_rules! numeric_binary_op {
            ($self:ident, $chunk:ident, $ip:ident, $make:expr) => {{
                if !$self.peek(0).is_number() || !$self.peek(1).is_number() {
                    $self.runtime_error($chunk, $ip, RuntimeErrorKind::OperandsMustBeNumbers);
                    return InterpretResult::RuntimeError;
                }
                let b = $self.pop().as_number().unwrap();
                let a = $self.pop().as_number().unwrap();
                $self.push($make(a, b));
            }};
        }

        loop {
            if self.options.trace_execution {
                trace_stack(&self.stack[..self.stack_top], &self.heap);
                disassemble_instruction(chunk, &self.heap, ip);
            }

            let instruction = chunk.byte_at(ip);
            ip += 1;

            match OpCode::from_byte(instruction) {
                OpCode::Constant => {
                    let index = chunk.byte_at(ip);
                    ip += 1;
                    self.push(chunk.constant_at(index as usize));
                }
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(Value::values_equal(a, b, &self.heap)));
                }
                OpCode::Greater => {
                    numeric_binary_op!(self, chunk, ip, |a, b| Value::Bool(a > b));
                }
                OpCode::Less => {
                    numeric_binary_op!(self, chunk, ip, |a, b| Value::Bool(a < b));
                }
                OpCode::Add => {
                    if self.peek(0).is_string() && self.peek(1).is_string() {
                        self.concatenate();
                    } else if self.peek(0).is_number() && self.peek(1).is_number() {
                        let b = self.pop().as_number().unwrap();
                        let a = self.pop().as_number().unwrap();
                        self.push(Value::Number(a + b));
                    } else {
                        self.runtime_error(
                            chunk,
                            ip,
                            RuntimeErrorKind::OperandsMustBeTwoNumbersOrStrings,
                        );
                        return InterpretResult::RuntimeError;
                    }
                }
                OpCode::Subtract => {
                    numeric_binary_op!(self, chunk, ip, |a, b| Value::Number(a - b));
                }
                OpCode::Multiply => {
                    numeric_binary_op!(self, chunk, ip, |a, b| Value::Number(a * b));
                }
                OpCode::Divide => {
                    numeric_binary_op!(self, chunk, ip, |a, b| Value::Number(a / b));
                }
                OpCode::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()));
                }
                OpCode::Negate => {
                    if !self.peek(0).is_number() {
                        self.runtime_error(chunk, ip, RuntimeErrorKind::OperandMustBeNumber);
                        return InterpretResult::RuntimeError;
                    }
                    let value = self.pop().as_number().unwrap();
                    self.push(Value::Number(-value));
                }
                OpCode::Return => {
                    let value = self.pop();
                    println!("{}", value.display(&self.heap));
                    return InterpretResult::Ok;
                }
            }
        }
    }

    /// `ADD` on two strings: builds the concatenated buffer, takes ownership
    /// of it into a fresh heap string, and pushes the result. The operands
    /// are popped right-then-left to match push order (left was pushed
    /// first, so it sits deeper on the stack).
    fn concatenate(&mut self) {
        let b = self.pop().as_object().expect("peeked as string above");
        let a = self.pop().as_object().expect("peeked as string above");
        let mut bytes = Vec::with_capacity(self.heap.get(a).len() + self.heap.get(b).len());
        bytes.extend_from_slice(self.heap.get(a).as_bytes());
        bytes.extend_from_slice(self.heap.get(b).as_bytes());
        let handle = self.heap.take_string(bytes);
        self.push(Value::Object(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> (InterpretResult, VM) {
        let mut vm = VM::new();
        let result = vm.interpret(src.as_bytes());
        (result, vm)
    }

    #[test]
    fn arithmetic_expression_ok() {
        let (result, _vm) = run("1 + 2");
        assert_eq!(result, InterpretResult::Ok);
    }

    #[test]
    fn nested_arithmetic_grouping_and_unary() {
        let (result, _vm) = run("(-1 + 2) * 3 - -4");
        assert_eq!(result, InterpretResult::Ok);
    }

    #[test]
    fn boolean_and_comparison_chain() {
        let (result, _vm) = run("!(5 - 4 > 3 * 2 == !nil)");
        assert_eq!(result, InterpretResult::Ok);
    }

    #[test]
    fn string_concatenation_ok() {
        let (result, _vm) = run("\"foo\" + \"bar\"");
        assert_eq!(result, InterpretResult::Ok);
    }

    #[test]
    fn string_equality_by_content() {
        let (result, _vm) = run("\"abc\" == \"abc\"");
        assert_eq!(result, InterpretResult::Ok);
    }

    #[test]
    fn string_number_equality_is_false_not_an_error() {
        let (result, _vm) = run("\"1\" == 1");
        assert_eq!(result, InterpretResult::Ok);
    }

    #[test]
    fn negating_a_bool_is_a_runtime_error() {
        let (result, _vm) = run("-true");
        assert_eq!(result, InterpretResult::RuntimeError);
    }

    #[test]
    fn adding_bools_is_a_runtime_error() {
        let (result, _vm) = run("true + false");
        assert_eq!(result, InterpretResult::RuntimeError);
    }

    #[test]
    fn empty_source_is_a_compile_error() {
        let (result, _vm) = run("");
        assert_eq!(result, InterpretResult::CompileError);
    }

    #[test]
    fn unterminated_string_is_a_compile_error() {
        let (result, _vm) = run("\"oops");
        assert_eq!(result, InterpretResult::CompileError);
    }

    #[test]
    fn stack_is_empty_after_any_terminal_result() {
        for src in ["1 + 2", "-true", "\"oops", "true + false"] {
            let mut vm = VM::new();
            vm.interpret(src.as_bytes());
            assert_eq!(vm.stack_top, 0, "source: {src}");
        }
    }

    #[test]
    fn vm_is_reusable_across_interpret_calls() {
        let mut vm = VM::new();
        assert_eq!(vm.interpret(b"1 + 1"), InterpretResult::Ok);
        assert_eq!(vm.interpret(b"2 + 2"), InterpretResult::Ok);
        assert_eq!(vm.stack_top, 0);
    }

    #[test]
    fn division_by_zero_yields_infinity_not_an_error() {
        let mut vm = VM::new();
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Value::Number(1.0));
        let b = chunk.add_constant(Value::Number(0.0));
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(a as u8, 1);
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(b as u8, 1);
        chunk.write_op(OpCode::Divide, 1);
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(vm.interpret_chunk(&chunk), InterpretResult::Ok);
    }
}
