use cal_front::{ast::Expr, ErrorCode};

mod harness;

use harness::{find_diagnostic, parse};

#[test]
fn invalid_object_kind_reports_parse_error() {
    let (_, _, diagnostics) = parse("OBJECT InvalidType 18 Test { }");
    let error = find_diagnostic(&diagnostics, "object type").expect("no diagnostic mentioned the object type");
    assert_eq!(error.code, ErrorCode::ParseError);
    assert_eq!(error.token.text, "InvalidType");
    assert_eq!(error.token.line, 1);
}

#[test]
fn missing_semicolon_in_var_reports_expected_token() {
    let source = "OBJECT Codeunit 50000 Test\n\
                  {\n\
                  CODE\n\
                  {\n\
                  PROCEDURE TestProc();\n\
                  VAR\n\
                  x : Integer\n\
                  BEGIN\n\
                  EXIT;\n\
                  END;\n\
                  }\n\
                  }\n";
    let (_, _, diagnostics) = parse(source);
    let error = find_diagnostic(&diagnostics, "Expected ;").expect("no `Expected ;` diagnostic");
    assert_eq!(error.code, ErrorCode::ParseExpectedToken);
    assert_eq!(error.token.text, "BEGIN");
}

#[test]
fn empty_var_semicolons_parse_cleanly() {
    let source = "OBJECT Codeunit 50000 Test\n\
                  {\n\
                  CODE\n\
                  {\n\
                  PROCEDURE TestProc();\n\
                  VAR\n\
                  ;\n\
                  ;\n\
                  ;\n\
                  BEGIN\n\
                  EXIT;\n\
                  END;\n\
                  }\n\
                  }\n";
    let (_, document, diagnostics) = parse(source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let code = document.object.unwrap().code.expect("no CODE section");
    let proc = &code.procedures[0];
    assert!(proc.variables.is_empty());
    assert_eq!(proc.body.len(), 1, "only the EXIT statement");
}

#[test]
fn unclosed_fields_section_reports_unclosed_block() {
    let source = "OBJECT Table 50000 Test\n\
                  {\n\
                  FIELDS\n\
                  {\n\
                  { 1 ; ; Code1 ; Code20 }\n\
                  KEYS\n\
                  {\n\
                  }\n\
                  }\n";
    let (_, _, diagnostics) = parse(source);
    let error =
        find_diagnostic(&diagnostics, "Expected } to close FIELDS section").expect("no unclosed-block diagnostic");
    assert_eq!(error.code, ErrorCode::ParseUnclosedBlock);
}

#[test]
fn al_null_coalescing_reports_al_only_syntax() {
    let source = "OBJECT Codeunit 50000 Test\n\
                  {\n\
                  CODE\n\
                  {\n\
                  PROCEDURE TestProc();\n\
                  VAR\n\
                  x : Integer;\n\
                  y : Integer;\n\
                  z : Integer;\n\
                  BEGIN\n\
                  z := x ?? y;\n\
                  END;\n\
                  }\n\
                  }\n";
    let (_, _, diagnostics) = parse(source);
    let error = diagnostics
        .iter()
        .find(|d| d.code == ErrorCode::ParseAlOnlySyntax)
        .expect("no `parse-al-only-syntax` diagnostic");
    assert_eq!(error.token.text, "?");
}

#[test]
fn empty_property_value_with_trailing_space_is_silent() {
    let source = "OBJECT Table 50000 Test\n\
                  {\n\
                  PROPERTIES\n\
                  {\n\
                  Description= }\n\
                  }\n";
    let (_, document, diagnostics) = parse(source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let properties = document.object.unwrap().properties.unwrap();
    let description = &properties.properties[0];
    assert_eq!(description.name, "Description");
    assert!(matches!(description.value, Some(cal_front::ast::PropertyValue::Empty)));
}

#[test]
fn empty_property_value_without_gap_reports_property_value_error() {
    let source = "OBJECT Table 50000 Test\n\
                  {\n\
                  PROPERTIES\n\
                  {\n\
                  Description=}\n\
                  }\n";
    let (_, _, diagnostics) = parse(source);
    let error = diagnostics
        .iter()
        .find(|d| d.code == ErrorCode::ParsePropertyValue)
        .expect("no `parse-property-value` diagnostic");
    assert_eq!(error.token.text, "}");
}

#[test]
fn trivia_between_reconstructs_whitespace_gap() {
    let source = "BEGIN   END;";
    let tokens = cal_front::lex(source).unwrap();
    assert_eq!(cal_front::trivia::trivia_text(source, &tokens, 1), "   ");

    let result = cal_front::trivia::trivia_between(source, &tokens, 1);
    assert_eq!(result.spans.len(), 1);
    assert_eq!(result.spans[0].kind, cal_front::trivia::TriviaKind::Whitespace);
    assert_eq!(result.spans[0].start_offset, 5);
    assert_eq!(result.spans[0].end_offset, 8);
}

#[test]
fn brace_comment_looking_like_code_is_flagged() {
    let source = "OBJECT Codeunit 50000 Test\n\
                  {\n\
                  CODE\n\
                  {\n\
                  PROCEDURE TestProc();\n\
                  BEGIN\n\
                  { x := 5; }\n\
                  END;\n\
                  }\n\
                  }\n";
    let (tokens, _, _) = parse(source);
    let end_idx = tokens
        .iter()
        .position(|t| t.text == "END")
        .expect("no END token in source");
    let trivia = cal_front::trivia::trivia_between(source, &tokens, end_idx);

    let comment = trivia
        .spans
        .iter()
        .find(|s| s.kind == cal_front::trivia::TriviaKind::BlockComment)
        .expect("no block-comment span found");
    assert!(comment.text.starts_with('{') && comment.text.ends_with('}'));

    let warning = trivia
        .warnings
        .iter()
        .find(|w| w.contains("looks like code"))
        .expect("no 'looks like code' warning");
    assert!(warning.chars().all(|c| !c.is_control()));
}

#[test]
fn record_table_reference_parses_as_a_call_expression() {
    let source = "OBJECT Table 50000 Test\n\
                  {\n\
                  CODE\n\
                  {\n\
                  VAR\n\
                  Rec : Record 18;\n\
                  }\n\
                  }\n";
    let (_, document, diagnostics) = parse(source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let code = document.object.unwrap().code.unwrap();
    let var = &code.variables[0];
    match var.datatype.as_ref().unwrap() {
        cal_front::ast::VariableTypeRef::Named(Expr::Call { .. }) => {}
        other => panic!("expected a Record table reference as a Call expression, got {other:?}"),
    }
}
