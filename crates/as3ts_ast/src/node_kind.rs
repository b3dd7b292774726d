//! NodeKind enum - every node kind the parser produces.

use serde::Serialize;
use std::fmt;

/// The kind of a node in the AST.
///
/// Binary operator kinds (`Or` through `Multiplication`) hold a flat child
/// list `[operand, Op, operand, Op, operand, ...]` for one precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    // ========================================================================
    // Declarations and directives
    // ========================================================================
    CompilationUnit,
    Package,
    Content,
    Import,
    Use,
    Include,
    Class,
    Interface,
    Extends,
    ImplementsList,
    MetaList,
    Meta,
    ModList,
    Modifier,
    Function,
    Get,
    Set,
    Lambda,
    ParameterList,
    Parameter,
    Rest,
    Type,
    Vector,
    ShortVector,
    VarList,
    ConstList,
    NameTypeInit,
    Name,
    Init,

    // ========================================================================
    // Statements
    // ========================================================================
    Block,
    If,
    Condition,
    For,
    ForIn,
    ForEach,
    In,
    Iter,
    While,
    Do,
    Switch,
    SwitchBlock,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Return,
    Throw,
    Break,
    Continue,
    Label,
    EmptyStatement,
    ConditionalCompilation,

    // ========================================================================
    // Expressions
    // ========================================================================
    ExprList,
    Assign,
    Op,
    Conditional,
    Or,
    And,
    BOr,
    BXor,
    BAnd,
    Equality,
    Relation,
    Shift,
    Add,
    Multiplication,
    Minus,
    Plus,
    Not,
    BNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Delete,
    TypeOf,
    Void,
    Call,
    Arguments,
    New,
    Dot,
    ArrayAccessor,
    E4xAttr,
    E4xFilter,
    E4xStar,
    E4xDescendant,
    NamespaceAccess,
    Encapsulated,
    Array,
    Object,
    Prop,
    Value,
    Identifier,
    Literal,
    RegExp,
    XmlLiteral,

    // ========================================================================
    // Comments
    // ========================================================================
    MultiLineComment,
    DocComment,
}

impl NodeKind {
    /// Whether this kind is a comment node dropped by `filter_ast`.
    #[inline]
    pub fn is_comment(self) -> bool {
        matches!(self, NodeKind::MultiLineComment | NodeKind::DocComment)
    }

    /// Whether this kind is a variable declaration list.
    pub fn is_var_list(self) -> bool {
        matches!(self, NodeKind::VarList | NodeKind::ConstList)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
