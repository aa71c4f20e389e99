//! # Scanner
//!
//! A single-pass, non-allocating, byte-oriented lexer. `next_token` is pulled
//! on demand by the compiler; the scanner never looks ahead further than one
//! byte past `current` and never buffers more than the token it is currently
//! building. Lexemes are byte-range views into the caller-owned source, not
//! copies.
//!
//! The input is treated as a byte sequence with ASCII lexical rules; there
//! is no Unicode-aware scanning.

/// The kind of a [`Token`]. Partitions into single/double-char punctuation,
/// literal kinds, reserved words, and the two sentinel kinds `Error` and `Eof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character punctuation.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One-or-two character punctuation.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    String,
    Number,

    // Reserved words.
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Error,
    Eof,
}

/// `{kind, lexeme, line}`. `lexeme` is a byte-range view into the source the
/// scanner was constructed with (or, for [`TokenKind::Error`], a view into a
/// static diagnostic string, not a position in the source).
#[derive(Debug, Clone, Copy)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src [u8],
    pub line: u32,
}

impl<'src> Token<'src> {
    pub fn lexeme_str(&self) -> std::borrow::Cow<'src, str> {
        String::from_utf8_lossy(self.lexeme)
    }
}

pub struct Scanner<'src> {
    source: &'src [u8],
    start: usize,
    current: usize,
    line: u32,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src [u8]) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Produces the next token, skipping leading whitespace and comments.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof);
        }

        let c = self.advance();

        if is_alpha(c) {
            return self.identifier();
        }
        if is_digit(c) {
            return self.number();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => {
                let kind = if self.matches(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.matches(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.matches(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.matches(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.make_token(kind)
            }
            b'"' => self.string(),
            _ => self.error_token("Unexpected character."),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token {
            kind,
            lexeme: &self.source[self.start..self.current],
            line: self.line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token {
            kind: TokenKind::Error,
            lexeme: message.as_bytes(),
            line: self.line,
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn identifier(&mut self) -> Token<'src> {
        while is_alpha(self.peek()) || is_digit(self.peek()) {
            self.advance();
        }
        self.make_token(self.identifier_kind())
    }

    /// Classifies `self.source[self.start..self.current]` as a keyword or a
    /// plain `Identifier` by branching on the first character and, where
    /// more than one keyword shares it, a second character (a keyword trie,
    /// not a hash table or regex).
    fn identifier_kind(&self) -> TokenKind {
        let lexeme = &self.source[self.start..self.current];
        match lexeme.first() {
            Some(b'a') => self.check_keyword(1, b"nd", TokenKind::And),
            Some(b'c') => self.check_keyword(1, b"lass", TokenKind::Class),
            Some(b'e') => self.check_keyword(1, b"lse", TokenKind::Else),
            Some(b'f') if lexeme.len() > 1 => match lexeme[1] {
                b'a' => self.check_keyword(2, b"lse", TokenKind::False),
                b'o' => self.check_keyword(2, b"r", TokenKind::For),
                b'u' => self.check_keyword(2, b"n", TokenKind::Fun),
                _ => TokenKind::Identifier,
            },
            Some(b'i') => self.check_keyword(1, b"f", TokenKind::If),
            Some(b'n') => self.check_keyword(1, b"il", TokenKind::Nil),
            Some(b'o') => self.check_keyword(1, b"r", TokenKind::Or),
            Some(b'p') => self.check_keyword(1, b"rint", TokenKind::Print),
            Some(b'r') => self.check_keyword(1, b"eturn", TokenKind::Return),
            Some(b's') => self.check_keyword(1, b"uper", TokenKind::Super),
            Some(b't') if lexeme.len() > 1 => match lexeme[1] {
                b'h' => self.check_keyword(2, b"is", TokenKind::This),
                b'r' => self.check_keyword(2, b"ue", TokenKind::True),
                _ => TokenKind::Identifier,
            },
            Some(b'v') => self.check_keyword(1, b"ar", TokenKind::Var),
            Some(b'w') => self.check_keyword(1, b"hile", TokenKind::While),
            _ => TokenKind::Identifier,
        }
    }

    fn check_keyword(&self, start: usize, rest: &[u8], kind: TokenKind) -> TokenKind {
        let lexeme = &self.source[self.start..self.current];
        if lexeme.len() == start + rest.len() && &lexeme[start..] == rest {
            kind
        } else {
            TokenKind::Identifier
        }
    }

    /// Consumes `[0-9]+ (\.[0-9]+)?`. A leading `.` never starts a number and
    /// a trailing `.` is never consumed (so `123.` scans as `NUMBER(123)`
    /// then `DOT`, and `.5` scans as `DOT` then `NUMBER(5)`).
    fn number(&mut self) -> Token<'src> {
        while is_digit(self.peek()) {
            self.advance();
        }
        if self.peek() == b'.' && is_digit(self.peek_next()) {
            self.advance();
            while is_digit(self.peek()) {
                self.advance();
            }
        }
        self.make_token(TokenKind::Number)
    }

    /// Consumes a `"`-delimited string, including embedded newlines (which
    /// still advance `line`). The lexeme includes both quote bytes; the
    /// compiler strips them before interning the content.
    fn string(&mut self) -> Token<'src> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return self.error_token("Unterminated string.");
        }

        self.advance(); // the closing quote
        self.make_token(TokenKind::String)
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(src.as_bytes());
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn keyword_prefixed_identifiers_stay_identifiers() {
        for word in ["andy", "classy", "orchid", "forall"] {
            let mut scanner = Scanner::new(word.as_bytes());
            assert_eq!(scanner.next_token().kind, TokenKind::Identifier, "{word}");
        }
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        assert_eq!(
            kinds("123."),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Eof]
        );
    }

    #[test]
    fn lone_dot_does_not_start_a_number() {
        assert_eq!(
            kinds(".5"),
            vec![TokenKind::Dot, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn string_spanning_newline_bumps_line_counter_and_keeps_opening_line() {
        let mut scanner = Scanner::new(b"\"a\nb\"");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.line, 1);
        let eof = scanner.next_token();
        assert_eq!(eof.line, 2);
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let mut scanner = Scanner::new(b"\"oops");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, TokenKind::Error);
        assert_eq!(tok.lexeme, b"Unterminated string.");
    }

    #[test]
    fn unexpected_character_is_an_error_token() {
        let mut scanner = Scanner::new(b"@");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, TokenKind::Error);
        assert_eq!(tok.lexeme, b"Unexpected character.");
    }

    #[test]
    fn two_char_operators_fall_back_to_one_char() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_runs_to_end_of_line() {
        assert_eq!(
            kinds("1 // comment\n2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }
}
