//! The error-recovering recursive-descent parser (spec.md §4.3). Never
//! throws: `parse()` always returns a `(CALDocument, Vec<ParseError>)` pair.

mod code;
mod expr;
mod fields;
mod keys;
mod object;
mod properties;
mod stmt;

use crate::ast::{CALDocument, NodeSpan};
use crate::diagnostics::DiagnosticEmitter;
use crate::token::{Token, TokenKind};

/// The set of section keywords the object body dispatches on (spec.md §4.3).
pub(crate) const SECTION_KEYWORDS: &[TokenKind] = &[
    TokenKind::Properties,
    TokenKind::ObjectProperties,
    TokenKind::Fields,
    TokenKind::Keys,
    TokenKind::FieldGroups,
    TokenKind::Code,
    TokenKind::Controls,
    TokenKind::Actions,
    TokenKind::DataItems,
    TokenKind::RequestForm,
    TokenKind::Elements,
];

/// Bound on expression/statement nesting depth (spec.md §4.3: the parser
/// must tolerate at least 100 levels without overflowing).
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub max_expression_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_expression_depth: 256 }
    }
}

/// Parse a complete token vector (as produced by [`crate::lexer::lex`]) into
/// an AST plus diagnostics.
pub fn parse(tokens: &[Token]) -> (CALDocument, Vec<crate::diagnostics::ParseError>) {
    parse_with_options(tokens, ParseOptions::default())
}

pub fn parse_with_options(
    tokens: &[Token],
    options: ParseOptions,
) -> (CALDocument, Vec<crate::diagnostics::ParseError>) {
    let mut parser = Parser::new(tokens, options);
    let document = parser.parse_document();
    (document, parser.diagnostics.into_diagnostics())
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    pub(crate) diagnostics: DiagnosticEmitter,
    pub(crate) options: ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], options: ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: DiagnosticEmitter::new(),
            options,
        }
    }

    // ---- cursor -----------------------------------------------------

    pub(crate) fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().expect("token vector always has EOF"))
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().expect("token vector always has EOF"))
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    /// Consume and return the current token, unless already at EOF.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Consume `kind` if present; otherwise emit `parse-expected-token`
    /// anchored at the current token and return a synthetic token of the
    /// expected kind with zero width so callers can keep building spans.
    pub(crate) fn expect(&mut self, kind: TokenKind, description: &str) -> Token {
        if let Some(token) = self.eat(kind) {
            return token;
        }
        let anchor = self.current().clone();
        let _ = self.diagnostics.create_expected_token_error(description, anchor.clone());
        Token::new(kind, "", anchor.line, anchor.column, anchor.start_offset, anchor.start_offset)
    }

    pub(crate) fn span_from(&self, start: Token) -> NodeSpan {
        let end = if self.pos == 0 {
            self.current().clone()
        } else {
            self.tokens[self.pos - 1].clone()
        };
        NodeSpan::new(start, end)
    }

    pub(crate) fn is_section_keyword(&self, kind: TokenKind) -> bool {
        SECTION_KEYWORDS.contains(&kind)
    }

    // ---- resync strategies (spec.md §4.3) -----------------------------

    /// Strategy 1, statement level: skip to the next `;` at the current
    /// brace-depth (braces opened *during the skip* are tracked so a `;`
    /// nested inside, e.g., a property trigger body is not mistaken for the
    /// statement terminator), then continue past it.
    pub(crate) fn resync_statement(&mut self) {
        let first = self.current().clone();
        let mut skipped_any = false;
        let mut depth = 0i32;
        loop {
            if self.is_eof() {
                break;
            }
            match self.current().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth > 0 => depth -= 1,
                TokenKind::RightBrace => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.bump();
                    skipped_any = true;
                    break;
                }
                _ => {}
            }
            self.bump();
            skipped_any = true;
        }
        if skipped_any {
            self.diagnostics.create_error_recovery_diagnostic(first);
        }
    }

    /// Strategy 2, section level: skip to the next `}` at the current
    /// brace-depth, or to the next known section keyword, whichever comes
    /// first.
    pub(crate) fn resync_section(&mut self) {
        let first = self.current().clone();
        let mut skipped_any = false;
        let mut depth = 0i32;
        loop {
            if self.is_eof() {
                break;
            }
            if depth == 0 && self.is_section_keyword(self.current().kind) {
                break;
            }
            match self.current().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
            skipped_any = true;
        }
        if skipped_any {
            self.diagnostics.create_error_recovery_diagnostic(first);
        }
    }

    /// Strategy 3, field/control level: skip to the next `}` at one deeper
    /// brace-depth than we started (i.e. the closer of the element we were
    /// trying to parse, not the enclosing section).
    pub(crate) fn resync_field(&mut self) {
        let first = self.current().clone();
        if self.is_eof() {
            return;
        }
        self.consume_balanced_block();
        self.diagnostics.create_error_recovery_diagnostic(first);
    }

    /// Consume tokens assuming we are positioned just after an opening `{`
    /// (brace-depth already at 1), returning the matching closing token if
    /// found before EOF.
    pub(crate) fn consume_balanced_block(&mut self) -> Option<Token> {
        let mut depth = 1i32;
        loop {
            if self.is_eof() {
                return None;
            }
            match self.current().kind {
                TokenKind::LeftBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RightBrace => {
                    depth -= 1;
                    let token = self.bump();
                    if depth == 0 {
                        return Some(token);
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Strategy 5, top level: skip everything up to EOF.
    pub(crate) fn resync_top_level(&mut self) {
        let first = self.current().clone();
        let mut skipped_any = false;
        while !self.is_eof() {
            self.bump();
            skipped_any = true;
        }
        if skipped_any {
            self.diagnostics.create_error_recovery_diagnostic(first);
        }
    }

    // ---- entry point --------------------------------------------------

    fn parse_document(&mut self) -> CALDocument {
        tracing::debug!(token_count = self.tokens.len(), "parsing C/AL document");

        // Skip leading stray tokens until a plausible anchor.
        let mut skipped_leading = false;
        let leading_start = self.current().clone();
        while !self.is_eof()
            && !matches!(self.current().kind, TokenKind::Object | TokenKind::ObjectProperties)
        {
            self.bump();
            skipped_leading = true;
        }
        if skipped_leading {
            self.diagnostics.create_error_recovery_diagnostic(leading_start);
        }

        let object = if self.is_eof() {
            None
        } else {
            Some(object::parse_object_declaration(self))
        };

        // Trailing recovery noise.
        if !self.is_eof() {
            let trailing_start = self.current().clone();
            let mut any = false;
            while !self.is_eof() {
                self.bump();
                any = true;
            }
            if any {
                self.diagnostics.create_error_recovery_diagnostic(trailing_start);
            }
        }

        CALDocument { object }
    }
}
