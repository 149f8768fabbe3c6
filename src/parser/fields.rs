//! FIELDS section and field declarations (spec.md §4.3 "Field declarations").

use super::{properties, Parser};
use crate::ast::{FieldDeclaration, FieldSection, NodeSpan};
use crate::diagnostics::sanitize;
use crate::token::{Token, TokenKind};

pub(crate) fn parse_field_section(p: &mut Parser, keyword: Token) -> FieldSection {
    let open = p.expect(TokenKind::LeftBrace, "{ to open FIELDS section");
    let mut fields = Vec::new();
    loop {
        while p.eat(TokenKind::Semicolon).is_some() {}
        if p.is_eof() || p.at(TokenKind::RightBrace) {
            break;
        }
        if p.is_section_keyword(p.current().kind) {
            break;
        }
        if !p.at(TokenKind::LeftBrace) {
            let bad = p.current().clone();
            p.diagnostics.create_generic_error(
                format!("Expected '{{' to start field declaration, found '{}'", sanitize(&bad.text)),
                bad,
            );
            p.resync_field();
            continue;
        }
        fields.push(parse_field_declaration(p));
    }
    let close = p.eat(TokenKind::RightBrace);
    if close.is_none() {
        p.diagnostics.create_unclosed_block_error("FIELDS section", open);
    }
    let end = close.unwrap_or_else(|| p.current().clone());
    FieldSection { span: Some(NodeSpan::new(keyword, end)), fields }
}

fn parse_field_declaration(p: &mut Parser) -> FieldDeclaration {
    let open = p.bump(); // '{'

    let id_token = p.bump();
    let id = match id_token.text.parse::<i64>() {
        Ok(value) if id_token.kind == TokenKind::Integer => Some(value),
        _ => {
            p.diagnostics.create_generic_error(
                format!("'{}' is not a valid field id", sanitize(&id_token.text)),
                id_token,
            );
            None
        }
    };
    p.expect(TokenKind::Semicolon, ";");

    let class = if p.at(TokenKind::Semicolon) { String::new() } else { p.bump().text };
    p.expect(TokenKind::Semicolon, ";");

    let name = parse_field_name(p);
    p.expect(TokenKind::Semicolon, ";");

    let datatype = Some(properties::parse_type_reference_expr(p));

    let tail = if p.eat(TokenKind::Semicolon).is_some() {
        properties::parse_property_list_body(p)
    } else {
        Default::default()
    };

    let close = p.eat(TokenKind::RightBrace);
    if close.is_none() {
        p.diagnostics.create_unclosed_block_error("field declaration", open.clone());
    }

    FieldDeclaration {
        span: p.span_from(open),
        id,
        class,
        name,
        datatype,
        properties: tail,
    }
}

/// A field name is a quoted identifier, or a run of identifier-or-digit
/// tokens up to the next `;`, preserved verbatim and joined with single
/// spaces (spec.md §4.3).
fn parse_field_name(p: &mut Parser) -> String {
    if p.at(TokenKind::QuotedIdentifier) {
        return p.bump().unquoted_text();
    }
    let mut parts = Vec::new();
    while !p.is_eof() && !p.at(TokenKind::Semicolon) && !p.at(TokenKind::RightBrace) {
        parts.push(p.bump().text);
    }
    if parts.is_empty() {
        let bad = p.current().clone();
        let _ = p.diagnostics.create_expected_token_error("field name", bad);
    }
    parts.join(" ")
}
