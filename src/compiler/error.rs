//! # Compiler Error Definitions
//!
//! Centralizes the fixed diagnostic messages the compiler can produce (the
//! lexical errors folded into compile errors, and the syntax errors reported
//! by `error_at`). Keeping each message's text behind a `thiserror` variant
//! means the wording lives in one place instead of being duplicated across
//! call sites. The public `compile` entry point still reports through
//! stderr in the fixed `[line K] Error ...: MSG` wire format and returns a
//! plain `bool`; these variants are not threaded through it as a `Result`,
//! because by the time one is produced the diagnostic has already been
//! printed; there is nothing left to propagate except "compilation failed",
//! which `had_error` already tracks.

use thiserror::Error;

/// The fixed set of syntax/lexical diagnostics this compiler can report.
///
/// Each variant's `Display` is exactly the `MSG` fragment that follows
/// `[line K] Error at 'LEX': ` (or ` at end: `).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("Unterminated string.")]
    UnterminatedString,

    #[error("Unexpected character.")]
    UnexpectedCharacter,

    #[error("Expect expression.")]
    ExpectExpression,

    #[error("Expect ')' after expression.")]
    ExpectRightParenAfterExpression,

    #[error("Expect end of expression.")]
    ExpectEndOfExpression,

    #[error("Too many constants in one chunk.")]
    TooManyConstants,
}
