//! Diagnostic emitter (spec.md §4.4, §7, §9).
//!
//! `ParseError` cannot be constructed directly outside this module — every
//! diagnostic in the lexer, trivia computer, and parser must be produced by
//! one of the sanitizing factory methods on [`DiagnosticEmitter`]. This is
//! the same discipline the source repository enforces with an in-house lint
//! rule (spec.md §9); here it is enforced structurally, by making the plain
//! constructor private to this module.

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// The closed set of stable diagnostic codes (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    ParseError,
    ParseExpectedToken,
    ParseUnclosedBlock,
    ParseAlOnlySyntax,
    ParseErrorRecovery,
    ParsePropertyValue,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "parse-error",
            ErrorCode::ParseExpectedToken => "parse-expected-token",
            ErrorCode::ParseUnclosedBlock => "parse-unclosed-block",
            ErrorCode::ParseAlOnlySyntax => "parse-al-only-syntax",
            ErrorCode::ParseErrorRecovery => "parse-error-recovery",
            ErrorCode::ParsePropertyValue => "parse-property-value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Error
    }
}

/// A single diagnostic anchored at a token. The plain constructor is
/// intentionally private; obtain instances via [`DiagnosticEmitter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub code: ErrorCode,
    pub token: Token,
    #[serde(default)]
    pub severity: Severity,
}

impl ParseError {
    fn new(message: String, code: ErrorCode, token: Token, severity: Severity) -> Self {
        Self {
            message,
            code,
            token,
            severity,
        }
    }

    /// Display range per spec.md §6: `[line, col) .. [line, col + len)`.
    /// Both ends are zero-based here; the token's own `line`/`column` are 1-based.
    pub fn display_range(&self) -> ((u32, u32), (u32, u32)) {
        let start = (self.token.line - 1, self.token.column - 1);
        let len = (self.token.end_offset - self.token.start_offset) as u32;
        let end = (self.token.line - 1, self.token.column - 1 + len);
        (start, end)
    }
}

/// Truncate/sanitize interpolated content before it reaches a diagnostic
/// message. Fixed error text (the parts the factory methods write literally)
/// is never passed through here.
pub fn sanitize(input: &str) -> String {
    const MAX_LEN: usize = 30;
    let mut out = String::new();
    for ch in input.chars() {
        if out.chars().count() >= MAX_LEN {
            out.push('…');
            return out;
        }
        if ch.is_control() {
            continue;
        }
        if (ch as u32) > 0x2FFFF || !is_printable(ch) {
            out.push_str(&format!("[char sanitized: {}]", ch as u32));
            continue;
        }
        out.push(ch);
    }
    out
}

fn is_printable(ch: char) -> bool {
    !ch.is_control()
}

/// The sole facility that may construct [`ParseError`] values. Every
/// internal parsing/lexing/trivia code path routes diagnostics through this.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticEmitter {
    diagnostics: Vec<ParseError>,
}

impl DiagnosticEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_diagnostics(self) -> Vec<ParseError> {
        self.diagnostics
    }

    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    /// Generic unmapped parse failure.
    pub fn create_generic_error(&mut self, message: impl Into<String>, token: Token) {
        self.push(ParseError::new(message.into(), ErrorCode::ParseError, token, Severity::Error));
    }

    /// `OBJECT` keyword followed by a token that isn't a recognized object kind.
    pub fn create_invalid_object_kind_error(&mut self, token: Token) {
        let message = format!(
            "'{}' is not a valid object type",
            sanitize(&token.text)
        );
        self.push(ParseError::new(message, ErrorCode::ParseError, token, Severity::Error));
    }

    /// A required token (`;`, `:`, `END`, etc.) is missing.
    pub fn create_expected_token_error(&mut self, expected: &str, token: Token) -> ParseErrorHandle {
        let message = format!("Expected {}", sanitize(expected));
        self.push(ParseError::new(message, ErrorCode::ParseExpectedToken, token, Severity::Error));
        ParseErrorHandle
    }

    /// An opening delimiter never found its matching closer.
    pub fn create_unclosed_block_error(&mut self, description: &str, opening_token: Token) {
        let message = format!("Expected {} to close {}", "}", sanitize(description));
        self.push(ParseError::new(message, ErrorCode::ParseUnclosedBlock, opening_token, Severity::Error));
    }

    /// An AL-only construct (keyword, access modifier, `??`, `#directive`, `VAR` parameter).
    pub fn create_al_only_syntax_error(&mut self, construct: &str, token: Token) {
        let message = format!("'{}' is AL-only syntax and is not supported in C/AL", sanitize(construct));
        self.push(ParseError::new(message, ErrorCode::ParseAlOnlySyntax, token, Severity::Error));
    }

    /// The parser discarded one or more tokens to resynchronize.
    pub fn create_error_recovery_diagnostic(&mut self, first_skipped_token: Token) {
        let message = "Unexpected input was skipped while recovering from a parse error".to_string();
        self.push(ParseError::new(message, ErrorCode::ParseErrorRecovery, first_skipped_token, Severity::Error));
    }

    /// `=}` with no intervening trivia on a property value.
    pub fn create_empty_property_value_error(&mut self, token: Token) {
        let message = "Property value is empty; use '= }' with a space or provide a value".to_string();
        self.push(ParseError::new(message, ErrorCode::ParsePropertyValue, token, Severity::Error));
    }

    fn push(&mut self, error: ParseError) {
        self.diagnostics.push(error);
    }
}

/// A marker returned by factories whose callers need to know a diagnostic was
/// recorded without holding onto the diagnostic itself (keeps call sites from
/// accidentally discarding the `ParseError` and reconstructing one by hand).
#[must_use]
pub struct ParseErrorHandle;
