//! The C/AL source front-end: a context-aware lexer, a lazy trivia
//! computer, and an error-recovering recursive-descent parser.
//!
//! ```text
//! source buffer -> lexer -> token vector -> parser -> (AST, diagnostics)
//!                                  \-> trivia computer (on demand)
//! ```
//!
//! The parser never looks back at the source buffer, and the trivia
//! computer never looks at the AST; the token vector is the only thing
//! they share.
//!
//! This crate does not install a global `tracing` subscriber; callers wire
//! up their own (see the integration tests for an example using
//! `tracing-subscriber`).

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod trivia;

pub use ast::CALDocument;
pub use diagnostics::{ErrorCode, ParseError, Severity};
pub use lexer::{lex, SourceError};
pub use parser::{parse, parse_with_options, ParseOptions};
pub use token::{Token, TokenKind};

/// Lexes and parses a source buffer in one call, the common entry point for
/// consumers that don't need to inspect the token vector directly. Trivia
/// is intentionally not computed here; call [`trivia::trivia_between`] (or
/// [`trivia::trailing_trivia`]) against the returned tokens on demand.
pub fn parse_source(source: &str) -> Result<(Vec<Token>, CALDocument, Vec<ParseError>), SourceError> {
    let tokens = lex(source)?;
    let (document, diagnostics) = parse(&tokens);
    Ok((tokens, document, diagnostics))
}

/// Same as [`parse_source`] but with explicit [`ParseOptions`] (e.g. a
/// non-default `max_expression_depth`).
pub fn parse_source_with_options(
    source: &str,
    options: ParseOptions,
) -> Result<(Vec<Token>, CALDocument, Vec<ParseError>), SourceError> {
    let tokens = lex(source)?;
    let (document, diagnostics) = parse_with_options(&tokens, options);
    Ok((tokens, document, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_never_panics_on_empty_input() {
        let (tokens, document, diagnostics) = parse_source("").expect("empty source is well within the size limit");
        assert_eq!(tokens.len(), 1, "only the EOF sentinel");
        assert!(document.object.is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn end_to_end_invalid_object_kind_reports_parse_error() {
        let (_, _, diagnostics) = parse_source("OBJECT InvalidType 18 Test { }").unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::ParseError && d.message.contains("object type")));
    }

    /// Tokens and diagnostics are handed off to the surrounding
    /// language-server layer as JSON (see `SPEC_FULL.md` §3); this pins
    /// that both directions of the round trip actually work.
    #[test]
    fn tokens_and_diagnostics_round_trip_through_json() {
        let (tokens, _, diagnostics) =
            parse_source("OBJECT InvalidType 18 Test { }").unwrap();

        let token_json = serde_json::to_string(&tokens[0]).unwrap();
        let restored: Token = serde_json::from_str(&token_json).unwrap();
        assert_eq!(restored, tokens[0]);

        let error_json = serde_json::to_string(&diagnostics[0]).unwrap();
        let restored_error: ParseError = serde_json::from_str(&error_json).unwrap();
        assert_eq!(restored_error, diagnostics[0]);
    }
}
