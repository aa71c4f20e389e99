//! # Runtime Error Definitions
//!
//! The fixed set of diagnostics the VM can raise while dispatching bytecode.
//! As with [`crate::compiler::error::CompileErrorKind`], these exist to
//! centralize message text; the VM reports through stderr in the fixed
//! `MSG\n[line K] in script\n` format and surfaces only the three-valued
//! [`super::InterpretResult`] to callers.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,

    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,

    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeTwoNumbersOrStrings,
}
