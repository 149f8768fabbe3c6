use cal_front::{lex, TokenKind};
use test_case::test_case;

fn first_kind(source: &str) -> TokenKind {
    lex(source).unwrap()[0].kind
}

#[test_case("TABLE", TokenKind::Identifier; "table_is_not_a_keyword")]
#[test_case("OBJECT", TokenKind::Object; "object_keyword")]
#[test_case("FIELDS", TokenKind::Fields; "fields_keyword")]
#[test_case("KEYS", TokenKind::Keys; "keys_keyword")]
#[test_case("BEGIN", TokenKind::Begin; "begin_keyword")]
#[test_case("PROCEDURE", TokenKind::Procedure; "procedure_keyword")]
#[test_case("Integer", TokenKind::IntegerType; "integer_type_keyword")]
#[test_case("Boolean", TokenKind::Boolean; "boolean_type_keyword")]
#[test_case("Code", TokenKind::Code; "code_shared_keyword")]
#[test_case("interface", TokenKind::AlOnlyKeyword; "al_only_keyword")]
#[test_case("internal", TokenKind::AlOnlyAccessModifier; "al_only_access_modifier")]
#[test_case("#define", TokenKind::PreprocessorDirective; "preprocessor_directive")]
fn leading_token_classifies_as(source: &str, expected: TokenKind) {
    assert_eq!(first_kind(source), expected);
}
