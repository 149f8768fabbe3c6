//! The AST (spec.md §3): a tagged tree rooted at `CALDocument`. Every node
//! carries a `start_token`/`end_token` pair (via [`NodeSpan`]) so consumers
//! can derive ranges without re-tokenizing. Nodes reference tokens only by
//! value; there are no back-edges from tokens to the tree.

pub mod expr;
pub mod stmt;

pub use expr::Expr;
pub use stmt::Stmt;

use crate::token::Token;

/// The shared `startToken`/`endToken` pair every AST node carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpan {
    pub start_token: Token,
    pub end_token: Token,
}

impl NodeSpan {
    pub fn new(start_token: Token, end_token: Token) -> Self {
        Self { start_token, end_token }
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_token.start_offset..self.end_token.end_offset
    }
}

#[derive(Debug, Clone, Default)]
pub struct CALDocument {
    pub object: Option<ObjectDeclaration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Codeunit,
    Page,
    Report,
    XmlPort,
    Query,
    MenuSuite,
    Dataport,
}

impl ObjectKind {
    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match text.to_ascii_uppercase().as_str() {
            "TABLE" => ObjectKind::Table,
            "CODEUNIT" => ObjectKind::Codeunit,
            "PAGE" => ObjectKind::Page,
            "REPORT" => ObjectKind::Report,
            "XMLPORT" => ObjectKind::XmlPort,
            "QUERY" => ObjectKind::Query,
            "MENUSUITE" => ObjectKind::MenuSuite,
            "DATAPORT" => ObjectKind::Dataport,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ObjectDeclaration {
    pub span: NodeSpan,
    pub object_kind: Option<ObjectKind>,
    pub object_id: Option<i64>,
    pub object_name: String,
    pub object_properties: Option<PropertyList>,
    pub properties: Option<PropertyList>,
    pub fields: Option<FieldSection>,
    pub keys: Option<KeySection>,
    pub field_groups: Option<GenericSection>,
    pub controls: Option<GenericSection>,
    pub elements: Option<GenericSection>,
    pub actions: Option<GenericSection>,
    pub data_items: Option<GenericSection>,
    pub request_form: Option<GenericSection>,
    pub code: Option<CodeSection>,
}

/// A section this crate dispatches to (spec.md §4.3's Section dispatch) but
/// whose internal grammar spec.md does not elaborate beyond "brace-delimited,
/// nests to a balanced close" (CONTROLS, ELEMENTS, ACTIONS, DATAITEMS,
/// REQUESTFORM, and any unrecognized section name). Its raw extent is kept so
/// round-tripping and trivia reconstruction are unaffected by not modeling
/// its interior.
#[derive(Debug, Clone)]
pub struct GenericSection {
    pub span: NodeSpan,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// `Name = <tokens>` with concrete content.
    Expression(Expr),
    /// `Name= }` — a deliberate empty value, no diagnostic (spec.md §4.3).
    Empty,
    /// A trigger body, `Name = [VAR ...] BEGIN ... END`.
    Trigger(Box<TriggerBody>),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub span: NodeSpan,
    pub name: String,
    pub name_token: Token,
    /// `None` for a bare flag property (`PropertyName` with no `=`).
    pub value: Option<PropertyValue>,
}

#[derive(Debug, Clone)]
pub struct TriggerBody {
    pub span: NodeSpan,
    pub name: String,
    pub variables: Vec<VariableDeclaration>,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldSection {
    pub span: Option<NodeSpan>,
    pub fields: Vec<FieldDeclaration>,
}

#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub span: NodeSpan,
    pub id: Option<i64>,
    pub class: String,
    pub name: String,
    pub datatype: Option<Expr>,
    pub properties: PropertyList,
}

#[derive(Debug, Clone, Default)]
pub struct KeySection {
    pub span: Option<NodeSpan>,
    pub keys: Vec<KeyDeclaration>,
}

#[derive(Debug, Clone)]
pub struct KeyDeclaration {
    pub span: NodeSpan,
    pub key_fields: Vec<String>,
    pub properties: PropertyList,
}

#[derive(Debug, Clone, Default)]
pub struct CodeSection {
    pub span: Option<NodeSpan>,
    pub variables: Vec<VariableDeclaration>,
    pub procedures: Vec<ProcedureDeclaration>,
    /// The trailing documentation trigger `BEGIN ... END.` (spec.md glossary).
    pub documentation_body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct ProcedureKindAndModifiers {
    pub is_local: bool,
    pub kind: ProcedureKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Procedure,
    Function,
    Trigger,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub by_ref: bool,
    pub datatype: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ProcedureDeclaration {
    pub span: NodeSpan,
    pub name: String,
    pub modifiers: ProcedureKindAndModifiers,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<Expr>,
    pub variables: Vec<VariableDeclaration>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct ArrayDim {
    pub bounds: Vec<i64>,
    pub element_type: Box<VariableTypeRef>,
}

/// The datatype portion of a variable declaration, separated from the
/// variable's name/modifiers so `ARRAY [..] OF <type>` can recurse.
#[derive(Debug, Clone)]
pub enum VariableTypeRef {
    Named(Expr),
    Array(ArrayDim),
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub span: NodeSpan,
    pub name: String,
    pub variable_id: Option<i64>,
    pub is_temporary: bool,
    pub is_in_dataset: bool,
    pub datatype: Option<VariableTypeRef>,
    pub length: Option<i64>,
}
