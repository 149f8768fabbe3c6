//! Property-and-trigger tails, VAR blocks, and variable declarations
//! (spec.md §4.3 "Property-and-trigger tail", "VAR blocks", "Variable
//! declaration").

use super::{expr, stmt, Parser};
use crate::ast::{
    ArrayDim, NodeSpan, Property, PropertyList, PropertyValue, TriggerBody, VariableDeclaration,
    VariableTypeRef,
};
use crate::ast::expr::Expr;
use crate::diagnostics::sanitize;
use crate::token::{Token, TokenKind};

pub(crate) fn parse_property_list_section(p: &mut Parser, label: &str) -> PropertyList {
    let open = p.expect(TokenKind::LeftBrace, &format!("{{ to open {} section", label));
    let list = parse_property_list_body(p);
    if p.eat(TokenKind::RightBrace).is_none() {
        p.diagnostics.create_unclosed_block_error(&format!("{} section", label), open);
    }
    list
}

/// Parses a semicolon-separated list of properties/triggers until the
/// enclosing `}` (not consumed here), EOF, or a section keyword.
pub(crate) fn parse_property_list_body(p: &mut Parser) -> PropertyList {
    let mut properties = Vec::new();
    loop {
        while p.eat(TokenKind::Semicolon).is_some() {}
        if p.is_eof() || p.at(TokenKind::RightBrace) {
            break;
        }
        if p.is_section_keyword(p.current().kind) {
            break;
        }
        properties.push(parse_single_property(p));
    }
    PropertyList { properties }
}

fn parse_single_property(p: &mut Parser) -> Property {
    let name_token = p.bump();
    let name = if name_token.kind == TokenKind::QuotedIdentifier {
        name_token.unquoted_text()
    } else {
        name_token.text.clone()
    };

    let value = if let Some(assign_token) = p.eat(TokenKind::Assign) {
        if p.at(TokenKind::Var) || p.at(TokenKind::Begin) {
            Some(PropertyValue::Trigger(Box::new(parse_trigger_body(p, name.clone(), name_token.clone()))))
        } else if p.at(TokenKind::RightBrace) {
            let closer = p.current().clone();
            if assign_token.end_offset == closer.start_offset {
                p.diagnostics.create_empty_property_value_error(closer);
            }
            Some(PropertyValue::Empty)
        } else {
            let value_expr = expr::parse_expression(p);
            // The value production is "everything up to the next ; or }";
            // anything the expression grammar didn't absorb is discarded
            // silently rather than re-diagnosed (the expression parser
            // already reported what it couldn't make sense of).
            while !p.is_eof() && !p.at(TokenKind::Semicolon) && !p.at(TokenKind::RightBrace) {
                p.bump();
            }
            Some(PropertyValue::Expression(value_expr))
        }
    } else {
        None
    };

    Property {
        span: p.span_from(name_token.clone()),
        name,
        name_token,
        value,
    }
}

fn parse_trigger_body(p: &mut Parser, name: String, name_token: Token) -> TriggerBody {
    let variables = if p.eat(TokenKind::Var).is_some() { parse_var_block(p) } else { Vec::new() };
    p.expect(TokenKind::Begin, "BEGIN");
    let statements = stmt::parse_statement_list(p, &[TokenKind::End]);
    p.expect(TokenKind::End, "END");
    TriggerBody {
        span: p.span_from(name_token),
        name,
        variables,
        statements,
    }
}

fn at_var_block_terminator(p: &Parser) -> bool {
    p.is_eof()
        || p.at(TokenKind::Begin)
        || p.at(TokenKind::Procedure)
        || p.at(TokenKind::Local)
        || p.at(TokenKind::Trigger)
        || p.at(TokenKind::RightBrace)
        || p.is_section_keyword(p.current().kind)
}

/// VAR block body: declarations separated by `;`, with stray `;` tokens
/// (leading, trailing, between declarations) skipped silently. Terminates
/// at `BEGIN`, `PROCEDURE`, `LOCAL`, `TRIGGER`, the enclosing `}`, or any
/// section keyword. A declaration not followed by `;` before one of those
/// terminators is a genuine missing-separator error (spec.md §8 scenario 2).
pub(crate) fn parse_var_block(p: &mut Parser) -> Vec<VariableDeclaration> {
    let mut variables = Vec::new();
    loop {
        while p.eat(TokenKind::Semicolon).is_some() {}
        if at_var_block_terminator(p) {
            break;
        }
        variables.push(parse_variable_declaration(p));
        if p.eat(TokenKind::Semicolon).is_none() && at_var_block_terminator(p) {
            let anchor = p.current().clone();
            let _ = p.diagnostics.create_expected_token_error(";", anchor);
            break;
        }
    }
    variables
}

fn parse_variable_declaration(p: &mut Parser) -> VariableDeclaration {
    let start = p.current().clone();
    let name_token = p.bump();
    let name = if name_token.kind == TokenKind::QuotedIdentifier {
        name_token.unquoted_text()
    } else {
        name_token.text.clone()
    };

    let mut variable_id = None;
    if p.eat(TokenKind::At).is_some() {
        let id_token = p.bump();
        match id_token.text.parse::<i64>() {
            Ok(value) => variable_id = Some(value),
            Err(_) => p.diagnostics.create_generic_error(
                format!("'{}' is not a valid variable id", sanitize(&id_token.text)),
                id_token,
            ),
        }
    }

    if p.eat(TokenKind::Colon).is_none() {
        // A partially written declaration (spec.md §4.3 "Variable
        // declaration"): report the missing `:` and resync at the next `;`
        // rather than guessing at a type.
        let anchor = p.current().clone();
        let _ = p.diagnostics.create_expected_token_error(":", anchor);
        p.resync_statement();
        return VariableDeclaration {
            span: p.span_from(start),
            name,
            variable_id,
            is_temporary: false,
            is_in_dataset: false,
            datatype: None,
            length: None,
        };
    }

    let is_temporary = if p.current().is_soft_keyword("TEMPORARY") {
        p.bump();
        true
    } else {
        false
    };

    let datatype = Some(parse_variable_type(p));

    let is_in_dataset = if p.current().is_soft_keyword("INDATASET") {
        p.bump();
        true
    } else {
        false
    };

    VariableDeclaration {
        span: p.span_from(start),
        name,
        variable_id,
        is_temporary,
        is_in_dataset,
        datatype,
        length: None,
    }
}

fn parse_variable_type(p: &mut Parser) -> VariableTypeRef {
    if p.current().is_soft_keyword("ARRAY") {
        p.bump();
        p.expect(TokenKind::LeftBracket, "[");
        let mut bounds = Vec::new();
        loop {
            let bound_token = p.bump();
            match bound_token.text.parse::<i64>() {
                Ok(value) => bounds.push(value),
                Err(_) => p.diagnostics.create_generic_error(
                    format!("'{}' is not a valid array bound", sanitize(&bound_token.text)),
                    bound_token,
                ),
            }
            if p.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        p.expect(TokenKind::RightBracket, "]");
        p.expect(TokenKind::Of, "OF");
        let element_type = Box::new(parse_variable_type(p));
        VariableTypeRef::Array(ArrayDim { bounds, element_type })
    } else {
        VariableTypeRef::Named(parse_type_reference_expr(p))
    }
}

/// Parses a datatype reference as an expression: a bare keyword/identifier
/// (`Integer`, `MyCodeunit`), a `Record` reference with an optional table id
/// or name (`Record 50000`, `Record Customer`), and/or a trailing length
/// (`Text[30]`) represented as an `Index` expression wrapping the base type.
/// Shared between VAR declarations, field datatypes, parameter types, and
/// return types (spec.md: "The datatype ... [is] parsed by the property
/// parser").
pub(crate) fn parse_type_reference_expr(p: &mut Parser) -> Expr {
    let head = p.bump();
    let mut result = leaf_expr(head.clone());

    if head.kind == TokenKind::Record
        && matches!(p.current().kind, TokenKind::Integer | TokenKind::Identifier | TokenKind::QuotedIdentifier)
        && !p.current().is_soft_keyword("INDATASET")
        && !p.current().is_soft_keyword("TEMPORARY")
    {
        let arg_token = p.bump();
        let span = NodeSpan::new(head.clone(), arg_token.clone());
        result = Expr::Call {
            span,
            callee: Box::new(result),
            arguments: vec![leaf_expr(arg_token)],
        };
    }

    if p.eat(TokenKind::LeftBracket).is_some() {
        let length_token = p.bump();
        match length_token.text.parse::<i64>() {
            Ok(_) => {}
            Err(_) => p.diagnostics.create_generic_error(
                format!("'{}' is not a valid length", sanitize(&length_token.text)),
                length_token.clone(),
            ),
        }
        let close = p.expect(TokenKind::RightBracket, "]");
        let span = NodeSpan::new(head, close);
        result = Expr::Index {
            span,
            target: Box::new(result),
            indices: vec![leaf_expr(length_token)],
        };
    }

    result
}

fn leaf_expr(token: Token) -> Expr {
    match token.kind {
        TokenKind::QuotedIdentifier => Expr::Identifier {
            span: NodeSpan::new(token.clone(), token.clone()),
            name: token.unquoted_text(),
            token,
        },
        TokenKind::Identifier => Expr::Identifier {
            span: NodeSpan::new(token.clone(), token.clone()),
            name: token.text.clone(),
            token,
        },
        _ => Expr::Literal {
            span: NodeSpan::new(token.clone(), token.clone()),
            token,
        },
    }
}
