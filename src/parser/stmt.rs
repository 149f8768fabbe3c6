//! Statement grammar (spec.md §4.3 "Statements and expressions").

use super::{expr, Parser};
use crate::ast::expr::{BinaryOp, Expr};
use crate::ast::stmt::{CaseBranch, Stmt};
use crate::ast::NodeSpan;
use crate::token::TokenKind;

/// Parses statements until a terminator in `terminators` is seen (without
/// consuming it) or EOF is reached.
pub(crate) fn parse_statement_list(p: &mut Parser, terminators: &[TokenKind]) -> Vec<Stmt> {
    let mut statements = Vec::new();
    loop {
        while p.eat(TokenKind::Semicolon).is_some() {}
        if p.is_eof() || terminators.contains(&p.current().kind) {
            break;
        }
        statements.push(parse_statement(p));
    }
    statements
}

fn parse_statement(p: &mut Parser) -> Stmt {
    match p.current().kind {
        TokenKind::Begin => parse_block(p),
        TokenKind::If => parse_if(p),
        TokenKind::Case => parse_case(p),
        TokenKind::For => parse_for(p),
        TokenKind::While => parse_while(p),
        TokenKind::Repeat => parse_repeat(p),
        TokenKind::With => parse_with(p),
        TokenKind::Exit => parse_exit(p),
        TokenKind::Break => {
            let start = p.bump();
            let stmt = Stmt::Break { span: p.span_from(start) };
            eat_statement_terminator(p);
            stmt
        }
        _ => parse_expression_or_assignment(p),
    }
}

/// A `THEN`/`ELSE`/`CASE`-branch body that may be empty (`IF x THEN ;`).
fn parse_branch_body(p: &mut Parser) -> Stmt {
    if p.at(TokenKind::Semicolon) {
        let token = p.current().clone();
        Stmt::Empty { span: NodeSpan::new(token.clone(), token) }
    } else {
        parse_statement(p)
    }
}

fn eat_statement_terminator(p: &mut Parser) {
    let _ = p.eat(TokenKind::Semicolon);
}

fn parse_block(p: &mut Parser) -> Stmt {
    let start = p.bump(); // BEGIN
    let statements = parse_statement_list(p, &[TokenKind::End]);
    p.expect(TokenKind::End, "END");
    eat_statement_terminator(p);
    Stmt::Block { span: p.span_from(start), statements }
}

fn parse_if(p: &mut Parser) -> Stmt {
    let start = p.bump(); // IF
    let condition = expr::parse_expression(p);
    p.expect(TokenKind::Then, "THEN");
    let then_branch = Box::new(parse_branch_body(p));
    let _ = p.eat(TokenKind::Semicolon);
    let else_branch = if p.eat(TokenKind::Else).is_some() {
        Some(Box::new(parse_branch_body(p)))
    } else {
        None
    };
    Stmt::If {
        span: p.span_from(start),
        condition,
        then_branch,
        else_branch,
    }
}

fn parse_case(p: &mut Parser) -> Stmt {
    let start = p.bump(); // CASE
    let subject = expr::parse_expression(p);
    p.expect(TokenKind::Of, "OF");

    let mut branches = Vec::new();
    let mut else_branch = None;
    loop {
        while p.eat(TokenKind::Semicolon).is_some() {}
        if p.is_eof() || p.at(TokenKind::End) {
            break;
        }
        if p.eat(TokenKind::Else).is_some() {
            else_branch = Some(parse_statement_list(p, &[TokenKind::End]));
            break;
        }
        let mut labels = vec![expr::parse_expression(p)];
        while p.eat(TokenKind::Comma).is_some() {
            labels.push(expr::parse_expression(p));
        }
        p.expect(TokenKind::Colon, ":");
        let body = Box::new(parse_branch_body(p));
        let _ = p.eat(TokenKind::Semicolon);
        branches.push(CaseBranch { labels, body });
    }
    p.expect(TokenKind::End, "END");
    eat_statement_terminator(p);

    Stmt::Case {
        span: p.span_from(start),
        subject,
        branches,
        else_branch,
    }
}

fn parse_for(p: &mut Parser) -> Stmt {
    let start = p.bump(); // FOR
    let variable_token = p.bump();
    let variable = variable_token.text;
    p.expect(TokenKind::Assign, ":=");
    let from = expr::parse_expression(p);
    let downto = if p.eat(TokenKind::Downto).is_some() {
        true
    } else {
        p.expect(TokenKind::To, "TO");
        false
    };
    let to = expr::parse_expression(p);
    p.expect(TokenKind::Do, "DO");
    let body = Box::new(parse_statement(p));
    Stmt::For {
        span: p.span_from(start),
        variable,
        from,
        to,
        downto,
        body,
    }
}

fn parse_while(p: &mut Parser) -> Stmt {
    let start = p.bump(); // WHILE
    let condition = expr::parse_expression(p);
    p.expect(TokenKind::Do, "DO");
    let body = Box::new(parse_statement(p));
    Stmt::While { span: p.span_from(start), condition, body }
}

fn parse_repeat(p: &mut Parser) -> Stmt {
    let start = p.bump(); // REPEAT
    let body = parse_statement_list(p, &[TokenKind::Until]);
    p.expect(TokenKind::Until, "UNTIL");
    let condition = expr::parse_expression(p);
    eat_statement_terminator(p);
    Stmt::Repeat { span: p.span_from(start), body, condition }
}

fn parse_with(p: &mut Parser) -> Stmt {
    let start = p.bump(); // WITH
    let record = expr::parse_expression(p);
    p.expect(TokenKind::Do, "DO");
    let body = Box::new(parse_statement(p));
    Stmt::With { span: p.span_from(start), record, body }
}

fn parse_exit(p: &mut Parser) -> Stmt {
    let start = p.bump(); // EXIT
    let value = if p.eat(TokenKind::LeftParen).is_some() {
        let value_expr = expr::parse_expression(p);
        p.expect(TokenKind::RightParen, ")");
        Some(value_expr)
    } else {
        None
    };
    let stmt = Stmt::Exit { span: p.span_from(start), value };
    eat_statement_terminator(p);
    stmt
}

fn parse_expression_or_assignment(p: &mut Parser) -> Stmt {
    let start = p.current().clone();
    let target = expr::parse_expression(p);

    let stmt = match p.current().kind {
        TokenKind::Assign => {
            p.bump();
            let value = expr::parse_expression(p);
            Stmt::Assignment { span: p.span_from(start), target, value }
        }
        TokenKind::PlusAssign | TokenKind::MinusAssign | TokenKind::MultiplyAssign | TokenKind::DivideAssign => {
            let op_token = p.bump();
            let rhs = expr::parse_expression(p);
            let op = match op_token.kind {
                TokenKind::PlusAssign => BinaryOp::Add,
                TokenKind::MinusAssign => BinaryOp::Sub,
                TokenKind::MultiplyAssign => BinaryOp::Mul,
                TokenKind::DivideAssign => BinaryOp::Div,
                _ => unreachable!(),
            };
            let span = NodeSpan::new(target.span().start_token.clone(), rhs.span().end_token.clone());
            let value = Expr::Binary {
                span,
                op,
                left: Box::new(target.clone()),
                right: Box::new(rhs),
            };
            Stmt::Assignment { span: p.span_from(start), target, value }
        }
        _ => Stmt::Expression { span: p.span_from(start), expr: target },
    };
    eat_statement_terminator(p);
    stmt
}
