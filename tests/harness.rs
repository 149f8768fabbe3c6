use cal_front::{parse_source, CALDocument, ParseError, Token};

/// Lexes and parses `source`, panicking (like the library's own doctests)
/// if the source trips the lexer's size guard — every scenario here is
/// well within it.
pub fn parse(source: &str) -> (Vec<Token>, CALDocument, Vec<ParseError>) {
    parse_source(source).expect("scenario sources are well within the size limit")
}

/// Finds the first diagnostic whose message contains `needle`.
#[allow(unused)]
pub fn find_diagnostic<'a>(diagnostics: &'a [ParseError], needle: &str) -> Option<&'a ParseError> {
    diagnostics.iter().find(|d| d.message.contains(needle))
}
