//! Expression grammar (spec.md §4.3 "Statements and expressions", §9
//! "Iterative precedence parsing").
//!
//! Precedence, lowest to highest: OR/XOR, AND, NOT, comparison, additive,
//! multiplicative, unary, postfix, primary. Parenthesized primaries are
//! flattened iteratively (all leading `(` consumed before a single descent
//! into the inner expression, then all matching `)` consumed on the way
//! back out) so that deep parenthesis nesting costs one stack frame, not
//! one frame per level, satisfying the 100-level nesting requirement
//! without a full shunting-yard rewrite.

use super::Parser;
use crate::ast::expr::{BinaryOp, Expr, UnaryOp};
use crate::ast::NodeSpan;
use crate::diagnostics::sanitize;
use crate::token::{Token, TokenKind};

pub(crate) fn parse_expression(p: &mut Parser) -> Expr {
    parse_null_coalesce(p)
}

/// `??` is AL-only (spec.md §4.3); recognized here as two adjacent
/// `TernaryOperator` tokens since the lexer has no dedicated two-char kind
/// for it (spec.md §6 lists only the single-`?` `TernaryOperator`).
fn parse_null_coalesce(p: &mut Parser) -> Expr {
    let mut left = parse_or(p);
    while p.at(TokenKind::TernaryOperator) && p.peek(1).kind == TokenKind::TernaryOperator {
        let first = p.bump();
        let _second = p.bump();
        p.diagnostics.create_al_only_syntax_error("??", first.clone());
        let right = parse_or(p);
        let span = NodeSpan::new(left.span().start_token.clone(), right.span().end_token.clone());
        left = Expr::Call {
            span,
            callee: Box::new(Expr::Identifier {
                span: NodeSpan::new(first.clone(), first.clone()),
                name: "??".to_string(),
                token: first,
            }),
            arguments: vec![left, right],
        };
    }
    left
}

fn parse_or(p: &mut Parser) -> Expr {
    let mut left = parse_and(p);
    loop {
        let op = match p.current().kind {
            TokenKind::Or => BinaryOp::Or,
            TokenKind::Xor => BinaryOp::Xor,
            _ => break,
        };
        p.bump();
        let right = parse_and(p);
        left = binary(op, left, right);
    }
    left
}

fn parse_and(p: &mut Parser) -> Expr {
    let mut left = parse_not(p);
    while p.at(TokenKind::And) {
        p.bump();
        let right = parse_not(p);
        left = binary(BinaryOp::And, left, right);
    }
    left
}

fn parse_not(p: &mut Parser) -> Expr {
    if p.at(TokenKind::Not) {
        let start = p.bump();
        let operand = Box::new(parse_not(p));
        let span = NodeSpan::new(start, operand.span().end_token.clone());
        return Expr::Unary { span, op: UnaryOp::Not, operand };
    }
    parse_comparison(p)
}

fn parse_comparison(p: &mut Parser) -> Expr {
    let left = parse_additive(p);
    let op = match p.current().kind {
        TokenKind::Equal => BinaryOp::Eq,
        TokenKind::NotEqual => BinaryOp::NotEq,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::LtEq,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::GtEq,
        TokenKind::In => BinaryOp::In,
        _ => return left,
    };
    p.bump();
    let right = parse_additive(p);
    binary(op, left, right)
}

fn parse_additive(p: &mut Parser) -> Expr {
    let mut left = parse_multiplicative(p);
    loop {
        let op = match p.current().kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => break,
        };
        p.bump();
        let right = parse_multiplicative(p);
        left = binary(op, left, right);
    }
    left
}

fn parse_multiplicative(p: &mut Parser) -> Expr {
    let mut left = parse_unary(p);
    loop {
        let op = match p.current().kind {
            TokenKind::Multiply => BinaryOp::Mul,
            TokenKind::Divide => BinaryOp::Div,
            TokenKind::Div => BinaryOp::IntDiv,
            TokenKind::Mod => BinaryOp::Mod,
            _ => break,
        };
        p.bump();
        let right = parse_unary(p);
        left = binary(op, left, right);
    }
    left
}

fn parse_unary(p: &mut Parser) -> Expr {
    let op = match p.current().kind {
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Minus => UnaryOp::Neg,
        _ => return parse_postfix(p),
    };
    let start = p.bump();
    let operand = Box::new(parse_unary(p));
    let span = NodeSpan::new(start, operand.span().end_token.clone());
    Expr::Unary { span, op, operand }
}

fn parse_postfix(p: &mut Parser) -> Expr {
    let start = p.current().clone();
    let mut result = parse_primary(p);
    loop {
        match p.current().kind {
            TokenKind::Dot => {
                p.bump();
                let member_token = p.bump();
                let member = if member_token.kind == TokenKind::QuotedIdentifier {
                    member_token.unquoted_text()
                } else {
                    member_token.text.clone()
                };
                let span = p.span_from(start.clone());
                result = Expr::MemberAccess {
                    span,
                    target: Box::new(result),
                    member,
                    member_token,
                };
            }
            TokenKind::LeftParen => {
                p.bump();
                let arguments = parse_argument_list(p, TokenKind::RightParen);
                p.expect(TokenKind::RightParen, ")");
                let span = p.span_from(start.clone());
                result = Expr::Call { span, callee: Box::new(result), arguments };
            }
            TokenKind::LeftBracket => {
                p.bump();
                let indices = parse_argument_list(p, TokenKind::RightBracket);
                p.expect(TokenKind::RightBracket, "]");
                let span = p.span_from(start.clone());
                result = Expr::Index { span, target: Box::new(result), indices };
            }
            _ => break,
        }
    }
    result
}

fn parse_argument_list(p: &mut Parser, terminator: TokenKind) -> Vec<Expr> {
    let mut args = Vec::new();
    if p.at(terminator) {
        return args;
    }
    loop {
        args.push(parse_expression(p));
        if p.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    args
}

fn parse_primary(p: &mut Parser) -> Expr {
    match p.current().kind {
        TokenKind::Integer
        | TokenKind::Decimal
        | TokenKind::String
        | TokenKind::Date
        | TokenKind::Time
        | TokenKind::DateTime => {
            let token = p.bump();
            Expr::Literal { span: NodeSpan::new(token.clone(), token.clone()), token }
        }
        TokenKind::QuotedIdentifier => {
            let token = p.bump();
            let name = token.unquoted_text();
            Expr::Identifier { span: NodeSpan::new(token.clone(), token.clone()), name, token }
        }
        TokenKind::Identifier => {
            let token = p.bump();
            let name = token.text.clone();
            Expr::Identifier { span: NodeSpan::new(token.clone(), token.clone()), name, token }
        }
        TokenKind::LeftParen => parse_parenthesized(p),
        TokenKind::PreprocessorDirective => {
            let token = p.bump();
            p.diagnostics.create_al_only_syntax_error(&token.text.clone(), token.clone());
            Expr::Error { span: NodeSpan::new(token.clone(), token) }
        }
        TokenKind::AlOnlyKeyword | TokenKind::AlOnlyAccessModifier => {
            let token = p.bump();
            p.diagnostics.create_al_only_syntax_error(&token.text.clone(), token.clone());
            Expr::Error { span: NodeSpan::new(token.clone(), token) }
        }
        k if k.is_data_type_keyword() => {
            // Data-type keyword used in identifier position (spec.md §9:
            // the parser tolerates this rather than duplicating
            // reclassification logic).
            let token = p.bump();
            let name = token.text.clone();
            Expr::Identifier { span: NodeSpan::new(token.clone(), token.clone()), name, token }
        }
        _ => {
            let token = p.current().clone();
            p.diagnostics.create_generic_error(
                format!("Unexpected token '{}' in expression", sanitize(&token.text)),
                token.clone(),
            );
            if !p.is_eof() {
                p.bump();
            }
            Expr::Error { span: NodeSpan::new(token.clone(), token) }
        }
    }
}

/// Flattens a run of leading `(` into a single descent so that `n` levels
/// of pure paren-nesting cost O(1) native stack frames instead of O(n).
fn parse_parenthesized(p: &mut Parser) -> Expr {
    let mut opens: Vec<Token> = Vec::new();
    while p.at(TokenKind::LeftParen) {
        opens.push(p.bump());
        if opens.len() >= p.options.max_expression_depth {
            break;
        }
    }

    let mut result = parse_null_coalesce(p);

    while let Some(open) = opens.pop() {
        let close = p.expect(TokenKind::RightParen, ")");
        let span = NodeSpan::new(open, close);
        result = Expr::Parenthesized { span, inner: Box::new(result) };
    }
    result
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = NodeSpan::new(left.span().start_token.clone(), right.span().end_token.clone());
    Expr::Binary { span, op, left: Box::new(left), right: Box::new(right) }
}
