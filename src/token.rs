use std::ops::Range;

use serde::{Deserialize, Serialize};

/// The closed set of token classes the lexer ever produces. See spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum TokenKind {
    // Punctuation
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Colon,
    DoubleColon,
    Dot,
    DotDot,
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    TernaryOperator,
    At,

    // Literals
    Integer,
    Decimal,
    String,
    Date,
    Time,
    DateTime,
    QuotedIdentifier,

    // Identifier-like
    Identifier,
    PreprocessorDirective,

    // Structural keywords
    Object,
    Properties,
    Fields,
    Keys,
    FieldGroups,
    Code,
    Controls,
    Actions,
    DataItems,
    Elements,
    RequestForm,
    Begin,
    End,
    Procedure,
    Function,
    Trigger,
    Var,
    Local,
    If,
    Then,
    Else,
    Case,
    Of,
    For,
    To,
    Downto,
    While,
    Do,
    Repeat,
    Until,
    With,
    Exit,
    Break,
    And,
    Or,
    Xor,
    Not,
    Mod,
    Div,
    In,

    // Data-type keywords. `Code` is shared with the structural CODE section
    // keyword (spec.md §6 lists plain `Code`/`Text` alongside `Date_Type` etc.,
    // the latter suffixed only where they would otherwise collide with the
    // literal token kinds of the same name).
    Text,
    DateType,
    TimeType,
    DateTimeType,
    IntegerType,
    DecimalType,
    Boolean,
    BigInteger,
    BigText,
    Blob,
    Guid,
    Duration,
    Option,
    Char,
    Byte,
    Record,
    RecordId,
    RecordRef,
    FieldRef,
    TextConst,

    // AL-only (recognized, never accepted)
    AlOnlyKeyword,
    AlOnlyAccessModifier,

    // Sentinels
    ObjectProperties,
    Unknown,
    Eof,
}

impl TokenKind {
    /// The fourteen "data-type" keywords from spec.md §4.1, subject to
    /// context-dependent reclassification into `Identifier`.
    pub fn is_data_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Code
                | TokenKind::Text
                | TokenKind::DateType
                | TokenKind::TimeType
                | TokenKind::DateTimeType
                | TokenKind::IntegerType
                | TokenKind::DecimalType
                | TokenKind::Boolean
                | TokenKind::BigInteger
                | TokenKind::BigText
                | TokenKind::Blob
                | TokenKind::Guid
                | TokenKind::Duration
                | TokenKind::Option
                | TokenKind::Char
                | TokenKind::Byte
                | TokenKind::Record
                | TokenKind::RecordId
                | TokenKind::RecordRef
                | TokenKind::FieldRef
                | TokenKind::TextConst
        )
    }

    pub fn is_al_only(self) -> bool {
        matches!(self, TokenKind::AlOnlyKeyword | TokenKind::AlOnlyAccessModifier)
    }

    pub fn is_structural_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Object
                | TokenKind::Properties
                | TokenKind::Fields
                | TokenKind::Keys
                | TokenKind::FieldGroups
                | TokenKind::Code
                | TokenKind::Controls
                | TokenKind::Actions
                | TokenKind::DataItems
                | TokenKind::Elements
                | TokenKind::RequestForm
        )
    }

    /// Whether a token of this kind may stand in for an identifier in a
    /// position where one is expected. Centralizes the "is this token usable
    /// as an identifier here?" question spec.md §9 asks implementers to
    /// provide, rather than duplicating reclassification ad hoc.
    pub fn usable_as_identifier(self) -> bool {
        self == TokenKind::Identifier || self == TokenKind::QuotedIdentifier || self.is_data_type_keyword()
    }
}

/// A single lexed token: its kind, verbatim source text, and position.
///
/// Invariant (spec.md §3): for adjacent tokens `t_i`, `t_{i+1}` produced by
/// the lexer, `t_i.end_offset <= t_{i+1}.start_offset`. `line`/`column` are
/// 1-based; `start_offset`/`end_offset` are 0-based half-open byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: u32,
        column: u32,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            start_offset,
            end_offset,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }

    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// True if this token lexed as a plain identifier whose text matches
    /// `word` case-insensitively. Used for the handful of contextual
    /// ("soft") keywords spec.md's closed token enumeration (§6) does not
    /// grant a dedicated kind — `TEMPORARY`, `ARRAY`, and `INDATASET` —
    /// which the parser recognizes positionally rather than lexically.
    pub fn is_soft_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(word)
    }

    /// The token's text with surrounding quotes stripped, for `QuotedIdentifier`.
    /// Embedded `""` escapes are unescaped to a single `"`. For any other kind
    /// this is identical to `text`.
    pub fn unquoted_text(&self) -> String {
        if self.kind != TokenKind::QuotedIdentifier {
            return self.text.clone();
        }
        let inner = self.text.strip_prefix('"').and_then(|s| s.strip_suffix('"'));
        match inner {
            Some(inner) => inner.replace("\"\"", "\""),
            None => self.text.clone(),
        }
    }
}
