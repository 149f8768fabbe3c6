//! CODE section: VAR block, procedures/functions/triggers, and the trailing
//! documentation body (spec.md §4.3 "CODE section", "Parameter list").

use super::{properties, stmt, Parser};
use crate::ast::{
    CodeSection, NodeSpan, Parameter, ProcedureDeclaration, ProcedureKind, ProcedureKindAndModifiers,
};
use crate::diagnostics::sanitize;
use crate::token::{Token, TokenKind};

pub(crate) fn parse_code_section(p: &mut Parser, keyword: Token) -> CodeSection {
    let open = p.expect(TokenKind::LeftBrace, "{ to open CODE section");
    let mut variables = Vec::new();
    let mut procedures = Vec::new();
    let mut documentation_body = None;

    loop {
        while p.eat(TokenKind::Semicolon).is_some() {}
        if p.is_eof() || p.at(TokenKind::RightBrace) {
            break;
        }
        match p.current().kind {
            TokenKind::Var => {
                p.bump();
                variables.extend(properties::parse_var_block(p));
            }
            TokenKind::Local | TokenKind::Procedure | TokenKind::Function | TokenKind::Trigger => {
                procedures.push(parse_procedure(p));
            }
            TokenKind::Begin => {
                p.bump();
                let statements = stmt::parse_statement_list(p, &[TokenKind::End]);
                p.expect(TokenKind::End, "END");
                p.expect(TokenKind::Dot, ".");
                documentation_body = Some(statements);
            }
            _ if p.is_section_keyword(p.current().kind) => break,
            _ => {
                let bad = p.current().clone();
                p.diagnostics.create_generic_error(
                    format!("Unexpected token '{}' in CODE section", sanitize(&bad.text)),
                    bad,
                );
                p.resync_section();
            }
        }
    }

    let close = p.eat(TokenKind::RightBrace);
    if close.is_none() {
        p.diagnostics.create_unclosed_block_error("CODE section", open);
    }
    let end = close.unwrap_or_else(|| p.current().clone());
    CodeSection {
        span: Some(NodeSpan::new(keyword, end)),
        variables,
        procedures,
        documentation_body,
    }
}

fn parse_procedure(p: &mut Parser) -> ProcedureDeclaration {
    let start = p.current().clone();
    let is_local = p.eat(TokenKind::Local).is_some();

    let kind = match p.current().kind {
        TokenKind::Procedure => {
            p.bump();
            ProcedureKind::Procedure
        }
        TokenKind::Function => {
            p.bump();
            ProcedureKind::Function
        }
        TokenKind::Trigger => {
            p.bump();
            ProcedureKind::Trigger
        }
        _ => {
            let bad = p.current().clone();
            let _ = p.diagnostics.create_expected_token_error("PROCEDURE, FUNCTION, or TRIGGER", bad);
            ProcedureKind::Procedure
        }
    };

    let name_token = p.bump();
    let name = if name_token.kind == TokenKind::QuotedIdentifier {
        name_token.unquoted_text()
    } else {
        name_token.text.clone()
    };

    if p.eat(TokenKind::At).is_some() {
        // Variable/procedure-id suffix; not modeled on ProcedureDeclaration
        // (spec.md's ProcedureDeclaration attribute list has no slot for it).
        p.bump();
    }

    p.expect(TokenKind::LeftParen, "(");
    let parameters = parse_parameter_list(p);
    p.expect(TokenKind::RightParen, ")");

    let return_type = if p.eat(TokenKind::Colon).is_some() {
        Some(properties::parse_type_reference_expr(p))
    } else {
        None
    };
    p.expect(TokenKind::Semicolon, ";");

    let mut variables = Vec::new();
    if p.eat(TokenKind::Var).is_some() {
        variables.extend(properties::parse_var_block(p));
    }

    p.expect(TokenKind::Begin, "BEGIN");
    let body = stmt::parse_statement_list(p, &[TokenKind::End]);
    p.expect(TokenKind::End, "END");
    p.expect(TokenKind::Semicolon, ";");

    ProcedureDeclaration {
        span: p.span_from(start),
        name,
        modifiers: ProcedureKindAndModifiers { is_local, kind },
        parameters,
        return_type,
        variables,
        body,
    }
}

fn parse_parameter_list(p: &mut Parser) -> Vec<Parameter> {
    let mut params = Vec::new();
    if p.at(TokenKind::RightParen) {
        return params;
    }
    loop {
        let by_ref = if p.at(TokenKind::Var) {
            let var_token = p.bump();
            p.diagnostics.create_al_only_syntax_error("VAR", var_token);
            true
        } else {
            false
        };
        let name_token = p.bump();
        let name = if name_token.kind == TokenKind::QuotedIdentifier {
            name_token.unquoted_text()
        } else {
            name_token.text.clone()
        };
        let datatype = if p.eat(TokenKind::Colon).is_some() {
            Some(properties::parse_type_reference_expr(p))
        } else {
            None
        };
        params.push(Parameter { name, by_ref, datatype });
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    params
}
