//! The trivia computer (spec.md §4.2). A pure, stateless function of the
//! source buffer and the already-produced token vector; it never mutates
//! either and is never consulted by the parser.

use serde::Serialize;

use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriviaKind {
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriviaSpan {
    pub kind: TriviaKind,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl TriviaSpan {
    fn new(kind: TriviaKind, text: &str, start_offset: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            start_offset,
            end_offset: start_offset + text.len(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TriviaResult {
    pub spans: Vec<TriviaSpan>,
    pub warnings: Vec<String>,
}

impl TriviaResult {
    /// Concatenation of every span's text, i.e. the entire gap.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Trivia occupying the gap immediately before `tokens[index]`. For
/// `index == 0` the gap is `[0, tokens[0].start_offset)`. Out-of-range
/// `index` returns an empty result.
pub fn trivia_between(source: &str, tokens: &[Token], index: usize) -> TriviaResult {
    if index >= tokens.len() {
        return TriviaResult::default();
    }
    let gap_start = if index == 0 {
        0
    } else {
        tokens[index - 1].end_offset
    };
    let gap_end = tokens[index].start_offset;
    classify_gap(source, gap_start, gap_end)
}

/// Raw gap substring before `tokens[index]`, following the same bounds rules
/// as [`trivia_between`].
pub fn trivia_text<'a>(source: &'a str, tokens: &[Token], index: usize) -> &'a str {
    if index >= tokens.len() {
        return "";
    }
    let gap_start = if index == 0 {
        0
    } else {
        tokens[index - 1].end_offset
    };
    let gap_end = tokens[index].start_offset;
    &source[gap_start..gap_end]
}

/// Trivia before the EOF token. Empty if there's no EOF, or EOF is the first
/// token, or there is no gap.
pub fn trailing_trivia(source: &str, tokens: &[Token]) -> TriviaResult {
    match tokens.last() {
        Some(last) if last.is_eof() && tokens.len() > 1 => {
            trivia_between(source, tokens, tokens.len() - 1)
        }
        _ => TriviaResult::default(),
    }
}

/// Scan `source[gap_start..gap_end]` left to right, producing contiguous,
/// non-overlapping trivia spans (spec.md §4.2 classification rules).
///
/// Matches on `char`/`.is_whitespace()` rather than raw ASCII bytes so that
/// Unicode whitespace (NBSP, vertical tab, form feed, NEL, ...) is captured
/// in a span instead of falling through to the unrecognized-trivia warning,
/// mirroring the lexer's own `is_whitespace()` trivia skip.
fn classify_gap(source: &str, gap_start: usize, gap_end: usize) -> TriviaResult {
    let gap = &source[gap_start..gap_end];
    let bytes = gap.as_bytes();
    let mut spans = Vec::new();
    let mut warnings = Vec::new();
    let mut pos = 0usize;

    while pos < gap.len() {
        let abs_start = gap_start + pos;
        let ch = gap[pos..].chars().next().expect("pos is on a char boundary");
        match ch {
            '/' if bytes.get(pos + 1) == Some(&b'/') => {
                let end = memchr::memchr2(b'\n', b'\r', &bytes[pos..]).map(|i| pos + i).unwrap_or(bytes.len());
                spans.push(TriviaSpan::new(TriviaKind::LineComment, &gap[pos..end], abs_start));
                pos = end;
            }
            '/' if bytes.get(pos + 1) == Some(&b'*') => {
                let close = gap[pos + 2..].find("*/").map(|i| pos + 2 + i + 2);
                let end = close.unwrap_or(bytes.len());
                spans.push(TriviaSpan::new(TriviaKind::BlockComment, &gap[pos..end], abs_start));
                pos = end;
            }
            '{' => {
                let close = memchr::memchr(b'}', &bytes[pos + 1..]).map(|i| pos + 1 + i + 1);
                let end = close.unwrap_or(bytes.len());
                let content_end = if close.is_some() { end - 1 } else { end };
                let content = &gap[pos + 1..content_end];
                if looks_like_code(content) {
                    warnings.push(format!(
                        "brace comment looks like code: {}",
                        crate::diagnostics::sanitize(content)
                    ));
                }
                spans.push(TriviaSpan::new(TriviaKind::BlockComment, &gap[pos..end], abs_start));
                pos = end;
            }
            '\r' if bytes.get(pos + 1) == Some(&b'\n') => {
                spans.push(TriviaSpan::new(TriviaKind::Newline, &gap[pos..pos + 2], abs_start));
                pos += 2;
            }
            '\r' | '\n' => {
                spans.push(TriviaSpan::new(TriviaKind::Newline, &gap[pos..pos + 1], abs_start));
                pos += 1;
            }
            c if c.is_whitespace() => {
                let mut end = pos + c.len_utf8();
                while end < gap.len() {
                    let next = gap[end..].chars().next().expect("end is on a char boundary");
                    if next.is_whitespace() && next != '\r' && next != '\n' {
                        end += next.len_utf8();
                    } else {
                        break;
                    }
                }
                spans.push(TriviaSpan::new(TriviaKind::Whitespace, &gap[pos..end], abs_start));
                pos = end;
            }
            other => {
                warnings.push(format!("unrecognized trivia byte: [char sanitized: {}]", crate::diagnostics::sanitize(&other.to_string())));
                pos += other.len_utf8();
            }
        }
    }

    TriviaResult { spans, warnings }
}

/// Score-based heuristic (spec.md §4.2) deciding whether brace-delimited
/// content reads like executable C/AL rather than prose.
fn looks_like_code(content: &str) -> bool {
    let trimmed_len = content.chars().filter(|c| !c.is_whitespace()).count();
    if trimmed_len < 3 {
        return false;
    }

    let upper = content.to_ascii_uppercase();
    let mut score = 0i32;

    if has_assign_to_identifier(content) {
        score += 2;
    }
    if has_statement_terminating_semicolon(content) {
        score += 2;
    }
    if upper.contains("BEGIN") {
        score += 2;
    }
    if upper.contains("END;") {
        score += 2;
    }
    if upper.contains("IF") && upper.contains("THEN") {
        score += 2;
    }
    if upper.contains("FOR") && upper.contains(" TO ") {
        score += 2;
    }
    if upper.contains("WHILE") && upper.contains(" DO") {
        score += 2;
    }
    if upper.contains("CASE") && upper.contains(" OF") {
        score += 2;
    }
    for one_point in ["REPEAT", "UNTIL", "WITH", "EXIT"] {
        if upper.contains(one_point) {
            score += 1;
        }
    }

    score >= 2
}

fn has_assign_to_identifier(content: &str) -> bool {
    if let Some(idx) = content.find(":=") {
        let after = content[idx + 2..].trim_start();
        after.chars().next().map_or(false, |c| c.is_alphabetic() || c == '_')
    } else {
        false
    }
}

fn has_statement_terminating_semicolon(content: &str) -> bool {
    content.lines().any(|line| line.trim_end().ends_with(';'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn whitespace_gap_is_reconstructed() {
        let source = "BEGIN   END;";
        let tokens = lex(source).unwrap();
        assert_eq!(trivia_text(source, &tokens, 1), "   ");
        let result = trivia_between(source, &tokens, 1);
        assert_eq!(result.spans.len(), 1);
        assert_eq!(result.spans[0].kind, TriviaKind::Whitespace);
        assert_eq!(result.spans[0].start_offset, 5);
        assert_eq!(result.spans[0].end_offset, 8);
    }

    #[test]
    fn round_trip_concatenation_equals_source() {
        let source = "OBJECT Table 50000 Customer\n{\n  // a line comment\n  FIELDS { }\n}\n";
        let tokens = lex(source).unwrap();
        let mut rebuilt = String::new();
        rebuilt.push_str(&trivia_text(source, &tokens, 0));
        for i in 1..tokens.len() {
            rebuilt.push_str(&tokens[i - 1].text);
            rebuilt.push_str(&trivia_text(source, &tokens, i));
        }
        if let Some(last) = tokens.last() {
            if !last.is_eof() {
                rebuilt.push_str(&last.text);
            }
        }
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn brace_comment_that_looks_like_code_warns() {
        let source = "BEGIN { x := 5; } END;";
        let tokens = lex(source).unwrap();
        let idx = tokens.iter().position(|t| t.text == "END").unwrap();
        let result = trivia_between(source, &tokens, idx);
        assert_eq!(result.spans.len(), 2);
        assert!(result.warnings.iter().any(|w| w.contains("looks like code")));
    }
}
