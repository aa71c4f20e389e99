//! # Compiler
//!
//! Drives a Pratt (operator-precedence) parser over tokens pulled one at a
//! time from a [`Scanner`], emitting bytecode and constants directly into a
//! [`Chunk`] as it goes; there is no intermediate AST. This is the classic
//! single-pass design: by the time an operator is recognized, its operands
//! have already been compiled, so emission happens inline with parsing.

pub mod error;
pub mod scanner;

use crate::chunk::{Chunk, MAX_CONSTANTS, OpCode};
use crate::object::ObjectHeap;
use crate::value::Value;
use error::CompileErrorKind;
use scanner::{Scanner, Token, TokenKind};

/// Operator-precedence ladder, low to high. Comparing two `Precedence`
/// values by their `u8` rank drives `parse_precedence`'s "keep consuming
/// infix operators at least this tight" loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One step tighter than `self`, used when parsing the right operand of
    /// a left-associative binary operator (the classic `rule.precedence + 1`
    /// from the parsing-expressions-by-precedence-climbing algorithm).
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

type ParseFn = fn(&mut Compiler<'_, '_>);

#[derive(Clone, Copy)]
struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

const fn rule(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

/// Looks up the prefix/infix actions and binding precedence for a token
/// kind. A `match` in place of a static table of function pointers indexed
/// by token discriminant, functionally identical, but it sidesteps any
/// forward-declaration dance a table referencing functions defined later in
/// the file would otherwise need.
fn get_rule(kind: TokenKind) -> ParseRule {
    use TokenKind::*;
    match kind {
        LeftParen => rule(Some(Compiler::grouping), None, Precedence::None),
        Minus => rule(Some(Compiler::unary), Some(Compiler::binary), Precedence::Term),
        Plus => rule(None, Some(Compiler::binary), Precedence::Term),
        Slash | Star => rule(None, Some(Compiler::binary), Precedence::Factor),
        Bang => rule(Some(Compiler::unary), None, Precedence::None),
        BangEqual | EqualEqual => rule(None, Some(Compiler::binary), Precedence::Equality),
        Greater | GreaterEqual | Less | LessEqual => {
            rule(None, Some(Compiler::binary), Precedence::Comparison)
        }
        Number => rule(Some(Compiler::number), None, Precedence::None),
        String => rule(Some(Compiler::string), None, Precedence::None),
        False | Nil | True => rule(Some(Compiler::literal), None, Precedence::None),
        _ => rule(None, None, Precedence::None),
    }
}

/// Parser state plus the borrowed output sink (`chunk`, `heap`) it emits
/// into. Lives for exactly one `compile` call.
struct Compiler<'src, 'out> {
    scanner: Scanner<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    chunk: &'out mut Chunk,
    heap: &'out mut ObjectHeap,
    had_error: bool,
    panic_mode: bool,
}

impl<'src, 'out> Compiler<'src, 'out> {
    fn new(source: &'src [u8], chunk: &'out mut Chunk, heap: &'out mut ObjectHeap) -> Self {
        let eof_placeholder = Token {
            kind: TokenKind::Eof,
            lexeme: &[],
            line: 0,
        };
        Self {
            scanner: Scanner::new(source),
            previous: eof_placeholder,
            current: eof_placeholder,
            chunk,
            heap,
            had_error: false,
            panic_mode: false,
        }
    }

    // --- Token stream primitives ---------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = String::from_utf8_lossy(self.current.lexeme).into_owned();
            self.error_at_current(&message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    /// Reports `message` at `token`'s position in the fixed
    /// `[line K] Error at 'LEX': MSG` wire format, then enters panic mode so
    /// cascading errors from the same expression are suppressed until the
    /// caller gives up at end-of-file.
    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        eprint!("[line {}] Error", token.line);
        match token.kind {
            TokenKind::Eof => eprint!(" at end"),
            TokenKind::Error => {}
            _ => eprint!(" at '{}'", token.lexeme_str()),
        }
        eprintln!(": {message}");
        self.had_error = true;
    }

    // --- Emitters ---------------------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.into());
    }

    fn emit_bytes(&mut self, a: u8, b: u8) {
        self.emit_byte(a);
        self.emit_byte(b);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Return);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        if index >= MAX_CONSTANTS {
            self.error(&CompileErrorKind::TooManyConstants.to_string());
            return 0;
        }
        index as u8
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_bytes(OpCode::Constant.into(), index);
    }

    // --- Pratt driver -------------------------------------------------

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = get_rule(self.previous.kind).prefix else {
            self.error(&CompileErrorKind::ExpectExpression.to_string());
            return;
        };
        prefix(self);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix = get_rule(self.previous.kind)
                .infix
                .expect("infix rule must exist whenever the loop condition admitted this token");
            infix(self);
        }
    }

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    // --- Prefix/infix actions -------------------------------------------

    fn number(&mut self) {
        let text = self.previous.lexeme_str();
        let value: f64 = text
            .parse()
            .expect("scanner only ever produces well-formed numeric lexemes");
        self.emit_constant(Value::Number(value));
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => unreachable!("literal() only dispatched for False/Nil/True"),
        }
    }

    fn string(&mut self) {
        // Strip the surrounding quote bytes before interning the contents.
        let lexeme = self.previous.lexeme;
        let interior = &lexeme[1..lexeme.len() - 1];
        let handle = self.heap.copy_string(interior);
        self.emit_constant(Value::Object(handle));
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(
            TokenKind::RightParen,
            &CompileErrorKind::ExpectRightParenAfterExpression.to_string(),
        );
    }

    fn unary(&mut self) {
        let operator_kind = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator_kind {
            TokenKind::Bang => self.emit_op(OpCode::Not),
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            _ => unreachable!("unary() only dispatched for Bang/Minus"),
        }
    }

    fn binary(&mut self) {
        let operator_kind = self.previous.kind;
        let rule = get_rule(operator_kind);
        self.parse_precedence(rule.precedence.next());

        match operator_kind {
            TokenKind::BangEqual => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
            }
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => unreachable!("binary() only dispatched for the operators matched above"),
        }
    }
}

/// Compiles `source` into `chunk`, interning any string constants into
/// `heap`. Returns `true` on success; on failure, diagnostics have already
/// been printed to stderr and `chunk` holds whatever (possibly meaningless)
/// bytes were emitted before the error; callers must discard it.
///
/// `heap` is threaded through explicitly rather than reached via a
/// process-wide "current VM" pointer: the compiler simply borrows the heap
/// for the call, so there is no global to install before compiling.
pub fn compile(source: &[u8], chunk: &mut Chunk, heap: &mut ObjectHeap) -> bool {
    let mut compiler = Compiler::new(source, chunk, heap);
    compiler.advance();
    compiler.expression();
    compiler.consume(
        TokenKind::Eof,
        &CompileErrorKind::ExpectEndOfExpression.to_string(),
    );
    compiler.emit_return();
    !compiler.had_error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::OpCode as Op;

    fn compiled(src: &str) -> (Chunk, ObjectHeap, bool) {
        let mut chunk = Chunk::new();
        let mut heap = ObjectHeap::new();
        let ok = compile(src.as_bytes(), &mut chunk, &mut heap);
        (chunk, heap, ok)
    }

    #[test]
    fn number_literal_compiles_to_constant_then_return() {
        let (chunk, _heap, ok) = compiled("123");
        assert!(ok);
        assert_eq!(chunk.code(), &[Op::Constant as u8, 0, Op::Return as u8]);
        assert_eq!(chunk.constant_at(0), Value::Number(123.0));
    }

    #[test]
    fn boolean_and_nil_literals_skip_the_constant_pool() {
        for (src, op) in [("true", Op::True), ("false", Op::False), ("nil", Op::Nil)] {
            let (chunk, _heap, ok) = compiled(src);
            assert!(ok);
            assert_eq!(chunk.code(), &[op as u8, Op::Return as u8]);
        }
    }

    #[test]
    fn addition_pushes_both_operands_then_adds() {
        let (chunk, _heap, ok) = compiled("1 + 2");
        assert!(ok);
        assert_eq!(
            chunk.code(),
            &[
                Op::Constant as u8,
                0,
                Op::Constant as u8,
                1,
                Op::Add as u8,
                Op::Return as u8
            ]
        );
        assert_eq!(chunk.constant_at(0), Value::Number(1.0));
        assert_eq!(chunk.constant_at(1), Value::Number(2.0));
    }

    #[test]
    fn unary_negate_compiles_operand_then_negate() {
        let (chunk, _heap, ok) = compiled("-5");
        assert!(ok);
        assert_eq!(
            chunk.code(),
            &[Op::Constant as u8, 0, Op::Negate as u8, Op::Return as u8]
        );
    }

    #[test]
    fn bang_not_equal_expands_to_equal_then_not() {
        let (chunk, _heap, ok) = compiled("1 != 2");
        assert!(ok);
        assert_eq!(chunk.code()[4], Op::Equal as u8);
        assert_eq!(chunk.code()[5], Op::Not as u8);
    }

    #[test]
    fn less_equal_expands_to_greater_then_not() {
        let (chunk, _heap, ok) = compiled("1 <= 2");
        assert!(ok);
        assert_eq!(chunk.code()[4], Op::Greater as u8);
        assert_eq!(chunk.code()[5], Op::Not as u8);
    }

    #[test]
    fn greater_equal_expands_to_less_then_not() {
        let (chunk, _heap, ok) = compiled("1 >= 2");
        assert!(ok);
        assert_eq!(chunk.code()[4], Op::Less as u8);
        assert_eq!(chunk.code()[5], Op::Not as u8);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (chunk, _heap, ok) = compiled("2 + 3 * 4");
        assert!(ok);
        // [CONST 0][CONST 1][CONST 2][MUL][ADD][RETURN]
        assert_eq!(chunk.code()[6], Op::Multiply as u8);
        assert_eq!(chunk.code()[7], Op::Add as u8);
    }

    #[test]
    fn empty_source_fails_to_compile() {
        let (_chunk, _heap, ok) = compiled("");
        assert!(!ok);
    }

    #[test]
    fn unclosed_group_fails_to_compile() {
        let (_chunk, _heap, ok) = compiled("(1 + 2");
        assert!(!ok);
    }

    #[test]
    fn stray_token_after_expression_fails_to_compile() {
        let (_chunk, _heap, ok) = compiled("1 1");
        assert!(!ok);
    }

    #[test]
    fn too_many_constants_is_reported_once_past_the_255_limit() {
        let mut src = String::new();
        for i in 0..256 {
            src.push_str(&format!("{i}.0 + "));
        }
        src.push_str("0.0");
        // 257 numeric constants: the first 256 succeed, the 257th trips the
        // one-byte constant-index limit.
        let (_chunk, _heap, ok) = compiled(&src);
        assert!(!ok);
    }

    #[test]
    fn exactly_256_constants_still_compiles() {
        let mut src = String::new();
        for i in 0..255 {
            src.push_str(&format!("{i}.0 + "));
        }
        src.push_str("255.0");
        let (chunk, _heap, ok) = compiled(&src);
        assert!(ok);
        assert_eq!(chunk.constants().len(), 256);
    }

    #[test]
    fn string_literal_strips_quotes_and_interns_content() {
        let (chunk, heap, ok) = compiled("\"foo\"");
        assert!(ok);
        let Value::Object(handle) = chunk.constant_at(0) else {
            panic!("expected a string constant");
        };
        assert_eq!(heap.get(handle).as_bytes(), b"foo");
    }
}
