//! Host-language surface syntax consumed by the front end.
//!
//! The external host parser delivers this tree; it covers only the
//! restricted statement/expression vocabulary the DSL recognizes, and
//! keeps the host's own node names (`AugAssign`, `IfExp`, `Mult`, ...)
//! so the parser contract stays obvious. Every statement and expression
//! carries a [`Span`].
//!
//! Two pieces here exist for the passes rather than for the parser:
//! the `decl` slot on [`ExprKind::Name`], filled by symbol resolution,
//! and the post-order walkers used by resolution and constant folding.

use std::fmt;

use crate::builtins::Builtin;

// ── Source locations ────────────────────────────────────────────────

/// A source range. Lines are 1-based, columns 0-based, per the host
/// parser's convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(line: u32, col: u32, end_line: u32, end_col: u32) -> Span {
        Span { line, col, end_line, end_col }
    }

    /// The end does not precede the start.
    pub fn is_well_formed(&self) -> bool {
        self.end_line > self.line || (self.end_line == self.line && self.end_col >= self.col)
    }
}

// ── Module and stencil definitions ──────────────────────────────────

/// One source module as delivered by the host parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub filename: String,
    pub stmts: Vec<Stmt>,
}

/// A function-like definition. Stencils are the ones carrying exactly
/// one recognized marker decorator.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub span: Span,
}

/// A parameter: a field name plus its type annotation expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Expr,
    pub span: Span,
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Stmt {
        Stmt { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    FunctionDef(FunctionDef),
    Assign {
        target: Expr,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOpKind,
        value: Expr,
    },
    /// An annotated declaration; bare ones (no value) at the top of a
    /// stencil body declare temporary fields.
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
    },
    Pass,
}

/// One `with` item: the context expression and the optional `as` name.
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub alias: Option<String>,
}

// ── Expressions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Expr {
        Expr { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant {
        value: Literal,
        origin: ConstOrigin,
    },
    Name {
        id: String,
        /// Filled by symbol resolution; `None` only before that pass.
        decl: Option<Decl>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Tuple {
        elements: Vec<Expr>,
    },
    List {
        elements: Vec<Expr>,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOpKind,
        right: Box<Expr>,
    },
    BoolOp {
        op: BoolOpKind,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CompareOpKind>,
        comparators: Vec<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
}

/// A keyword argument in a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

/// Host literal kinds. Translation accepts only `Bool`/`Int`/`Float`;
/// the rest exist so that rejecting them is a real code path.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Distinguishes parser-written literals from ones the constant folder
/// inlined or computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstOrigin {
    Source,
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    UAdd,
    USub,
    Not,
    Invert,
}

impl fmt::Display for UnaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOpKind::UAdd => "+",
            UnaryOpKind::USub => "-",
            UnaryOpKind::Not => "not",
            UnaryOpKind::Invert => "~",
        };
        write!(f, "{symbol}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
    MatMult,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mult => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
            BinOpKind::Pow => "**",
            BinOpKind::LShift => "<<",
            BinOpKind::RShift => ">>",
            BinOpKind::BitOr => "|",
            BinOpKind::BitXor => "^",
            BinOpKind::BitAnd => "&",
            BinOpKind::FloorDiv => "//",
            BinOpKind::MatMult => "@",
        };
        write!(f, "{symbol}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOpKind {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOpKind {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

impl fmt::Display for CompareOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOpKind::Eq => "==",
            CompareOpKind::NotEq => "!=",
            CompareOpKind::Lt => "<",
            CompareOpKind::LtE => "<=",
            CompareOpKind::Gt => ">",
            CompareOpKind::GtE => ">=",
        };
        write!(f, "{symbol}")
    }
}

// ── Resolved declarations ───────────────────────────────────────────

/// What a name reference resolved to. Stored on the `Name` node by the
/// resolution pass; later passes dispatch on it instead of re-walking
/// any scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Builtin(Builtin),
    /// A captured global; the payload is its declared name, which may
    /// differ from the binding the reference went through.
    Global(String),
    /// A captured compile-time constant, inlined by the folder.
    Const(Literal),
    /// An API or temporary field declared in this stencil.
    Field,
    /// The active vertical region's iteration variable.
    IterationVar,
}

// ── Walkers ─────────────────────────────────────────────────────────

impl Expr {
    /// Post-order mutable walk: children first, then the node itself,
    /// so `f` may replace `*self` after its children were processed.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::Constant { .. } | ExprKind::Name { .. } => {}
            ExprKind::Subscript { value, index } => {
                value.walk_mut(f);
                index.walk_mut(f);
            }
            ExprKind::Slice { lower, upper, step } => {
                for part in [lower, upper, step].into_iter().flatten() {
                    part.walk_mut(f);
                }
            }
            ExprKind::Tuple { elements } | ExprKind::List { elements } => {
                for element in elements {
                    element.walk_mut(f);
                }
            }
            ExprKind::UnaryOp { operand, .. } => operand.walk_mut(f),
            ExprKind::BinOp { left, right, .. } => {
                left.walk_mut(f);
                right.walk_mut(f);
            }
            ExprKind::BoolOp { values, .. } => {
                for value in values {
                    value.walk_mut(f);
                }
            }
            ExprKind::Compare { left, comparators, .. } => {
                left.walk_mut(f);
                for comparator in comparators {
                    comparator.walk_mut(f);
                }
            }
            ExprKind::IfExp { test, body, orelse } => {
                test.walk_mut(f);
                body.walk_mut(f);
                orelse.walk_mut(f);
            }
            ExprKind::Call { func, args, keywords } => {
                func.walk_mut(f);
                for arg in args {
                    arg.walk_mut(f);
                }
                for keyword in keywords {
                    keyword.value.walk_mut(f);
                }
            }
        }
        f(self);
    }

    /// Post-order immutable walk.
    pub fn walk(&self, f: &mut dyn FnMut(&Expr)) {
        match &self.kind {
            ExprKind::Constant { .. } | ExprKind::Name { .. } => {}
            ExprKind::Subscript { value, index } => {
                value.walk(f);
                index.walk(f);
            }
            ExprKind::Slice { lower, upper, step } => {
                for part in [lower, upper, step].iter().filter_map(|p| p.as_ref()) {
                    part.walk(f);
                }
            }
            ExprKind::Tuple { elements } | ExprKind::List { elements } => {
                for element in elements {
                    element.walk(f);
                }
            }
            ExprKind::UnaryOp { operand, .. } => operand.walk(f),
            ExprKind::BinOp { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            ExprKind::BoolOp { values, .. } => {
                for value in values {
                    value.walk(f);
                }
            }
            ExprKind::Compare { left, comparators, .. } => {
                left.walk(f);
                for comparator in comparators {
                    comparator.walk(f);
                }
            }
            ExprKind::IfExp { test, body, orelse } => {
                test.walk(f);
                body.walk(f);
                orelse.walk(f);
            }
            ExprKind::Call { func, args, keywords } => {
                func.walk(f);
                for arg in args {
                    arg.walk(f);
                }
                for keyword in keywords {
                    keyword.value.walk(f);
                }
            }
        }
        f(self);
    }
}

impl Stmt {
    /// Visits every expression in this statement subtree, including
    /// nested statement bodies, post-order within each expression.
    pub fn walk_exprs_mut(&mut self, f: &mut dyn FnMut(&mut Expr)) {
        match &mut self.kind {
            StmtKind::FunctionDef(def) => {
                for param in &mut def.params {
                    param.annotation.walk_mut(f);
                }
                for stmt in &mut def.body {
                    stmt.walk_exprs_mut(f);
                }
            }
            StmtKind::Assign { target, value } => {
                target.walk_mut(f);
                value.walk_mut(f);
            }
            StmtKind::AugAssign { target, value, .. } => {
                target.walk_mut(f);
                value.walk_mut(f);
            }
            StmtKind::AnnAssign { target, annotation, value } => {
                target.walk_mut(f);
                annotation.walk_mut(f);
                if let Some(value) = value {
                    value.walk_mut(f);
                }
            }
            StmtKind::If { test, body, orelse } => {
                test.walk_mut(f);
                for stmt in body.iter_mut().chain(orelse.iter_mut()) {
                    stmt.walk_exprs_mut(f);
                }
            }
            StmtKind::With { items, body } => {
                for item in items {
                    item.context.walk_mut(f);
                }
                for stmt in body {
                    stmt.walk_exprs_mut(f);
                }
            }
            StmtKind::Pass => {}
        }
    }

    /// Immutable counterpart of [`Stmt::walk_exprs_mut`].
    pub fn walk_exprs(&self, f: &mut dyn FnMut(&Expr)) {
        match &self.kind {
            StmtKind::FunctionDef(def) => def.walk_exprs(f),
            StmtKind::Assign { target, value } => {
                target.walk(f);
                value.walk(f);
            }
            StmtKind::AugAssign { target, value, .. } => {
                target.walk(f);
                value.walk(f);
            }
            StmtKind::AnnAssign { target, annotation, value } => {
                target.walk(f);
                annotation.walk(f);
                if let Some(value) = value {
                    value.walk(f);
                }
            }
            StmtKind::If { test, body, orelse } => {
                test.walk(f);
                for stmt in body.iter().chain(orelse.iter()) {
                    stmt.walk_exprs(f);
                }
            }
            StmtKind::With { items, body } => {
                for item in items {
                    item.context.walk(f);
                }
                for stmt in body {
                    stmt.walk_exprs(f);
                }
            }
            StmtKind::Pass => {}
        }
    }
}

impl FunctionDef {
    /// Visits every expression of the definition's params and body.
    /// Decorators are excluded: they are recognition markers, never
    /// resolved or translated.
    pub fn walk_exprs(&self, f: &mut dyn FnMut(&Expr)) {
        for param in &self.params {
            param.annotation.walk(f);
        }
        for stmt in &self.body {
            stmt.walk_exprs(f);
        }
    }
}
