//! KEYS section and key declarations (spec.md §3: "KeySection ... list of
//! KeyDeclaration (key-fields list, properties)").

use super::{properties, Parser};
use crate::ast::{KeyDeclaration, KeySection, NodeSpan};
use crate::diagnostics::sanitize;
use crate::token::{Token, TokenKind};

pub(crate) fn parse_key_section(p: &mut Parser, keyword: Token) -> KeySection {
    let open = p.expect(TokenKind::LeftBrace, "{ to open KEYS section");
    let mut keys = Vec::new();
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
                format!("Expected '{{' to start key declaration, found '{}'", sanitize(&bad.text)),
                bad,
            );
            p.resync_field();
            continue;
        }
        keys.push(parse_key_declaration(p));
    }
    let close = p.eat(TokenKind::RightBrace);
    if close.is_none() {
        p.diagnostics.create_unclosed_block_error("KEYS section", open);
    }
    let end = close.unwrap_or_else(|| p.current().clone());
    KeySection { span: Some(NodeSpan::new(keyword, end)), keys }
}

fn parse_key_declaration(p: &mut Parser) -> KeyDeclaration {
    let open = p.bump(); // '{'
    while p.eat(TokenKind::Semicolon).is_some() {}

    let mut key_fields = Vec::new();
    while !p.is_eof() && !p.at(TokenKind::Semicolon) && !p.at(TokenKind::RightBrace) {
        let token = p.bump();
        let text = if token.kind == TokenKind::QuotedIdentifier { token.unquoted_text() } else { token.text };
        key_fields.push(text);
        if p.eat(TokenKind::Comma).is_none() && !p.at(TokenKind::Semicolon) && !p.at(TokenKind::RightBrace) {
            // unexpected separator between field names; keep scanning the
            // run as one name list regardless
            continue;
        }
    }

    let tail = if p.eat(TokenKind::Semicolon).is_some() {
        properties::parse_property_list_body(p)
    } else {
        Default::default()
    };

    let close = p.eat(TokenKind::RightBrace);
    if close.is_none() {
        p.diagnostics.create_unclosed_block_error("key declaration", open.clone());
    }

    KeyDeclaration {
        span: p.span_from(open),
        key_fields,
        properties: tail,
    }
}
