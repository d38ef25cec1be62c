//! Shared AST builders for the integration suites. Each builder mirrors
//! one structural shape the host parser can deliver; the suites compose
//! them instead of depending on a parser.

#![allow(dead_code)]

use sirocco_core::ast::{
    BinOpKind, CompareOpKind, ConstOrigin, Expr, ExprKind, FunctionDef, Keyword, Literal, Module,
    Param, Span, Stmt, StmtKind, WithItem,
};
use sirocco_core::{translate_stencil, CapturedValue, Externals, TranslationError};
use sirocco_ir as ir;

pub fn span() -> Span {
    Span::new(1, 0, 1, 8)
}

// ── Expressions ─────────────────────────────────────────────────────

pub fn name(id: &str) -> Expr {
    Expr::new(ExprKind::Name { id: id.to_string(), decl: None }, span())
}

pub fn int(value: i64) -> Expr {
    Expr::new(
        ExprKind::Constant { value: Literal::Int(value), origin: ConstOrigin::Source },
        span(),
    )
}

pub fn float(value: f64) -> Expr {
    Expr::new(
        ExprKind::Constant { value: Literal::Float(value), origin: ConstOrigin::Source },
        span(),
    )
}

pub fn boolean(value: bool) -> Expr {
    Expr::new(
        ExprKind::Constant { value: Literal::Bool(value), origin: ConstOrigin::Source },
        span(),
    )
}

pub fn string(value: &str) -> Expr {
    Expr::new(
        ExprKind::Constant { value: Literal::Str(value.to_string()), origin: ConstOrigin::Source },
        span(),
    )
}

pub fn binop(left: Expr, op: BinOpKind, right: Expr) -> Expr {
    Expr::new(ExprKind::BinOp { left: Box::new(left), op, right: Box::new(right) }, span())
}

pub fn compare(left: Expr, ops: Vec<CompareOpKind>, comparators: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Compare { left: Box::new(left), ops, comparators }, span())
}

/// `first > rest[0] > rest[1] > ...`, the location chain shape.
pub fn chain(first: &str, rest: &[&str]) -> Expr {
    compare(
        name(first),
        vec![CompareOpKind::Gt; rest.len()],
        rest.iter().map(|id| name(id)).collect(),
    )
}

pub fn ternary(test: Expr, body: Expr, orelse: Expr) -> Expr {
    Expr::new(
        ExprKind::IfExp { test: Box::new(test), body: Box::new(body), orelse: Box::new(orelse) },
        span(),
    )
}

pub fn tuple(elements: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Tuple { elements }, span())
}

pub fn list(elements: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::List { elements }, span())
}

pub fn subscript(value: Expr, index: Expr) -> Expr {
    Expr::new(ExprKind::Subscript { value: Box::new(value), index: Box::new(index) }, span())
}

pub fn slice(lower: Option<Expr>, upper: Option<Expr>, step: Option<Expr>) -> Expr {
    Expr::new(
        ExprKind::Slice {
            lower: lower.map(Box::new),
            upper: upper.map(Box::new),
            step: step.map(Box::new),
        },
        span(),
    )
}

pub fn call(func: &str, args: Vec<Expr>) -> Expr {
    call_kw(func, args, vec![])
}

pub fn call_kw(func: &str, args: Vec<Expr>, kwargs: Vec<(&str, Expr)>) -> Expr {
    Expr::new(
        ExprKind::Call {
            func: Box::new(name(func)),
            args,
            keywords: kwargs
                .into_iter()
                .map(|(name, value)| Keyword { name: name.to_string(), value })
                .collect(),
        },
        span(),
    )
}

// ── Statements ──────────────────────────────────────────────────────

pub fn assign(target: Expr, value: Expr) -> Stmt {
    Stmt::new(StmtKind::Assign { target, value }, span())
}

pub fn aug_assign(target: Expr, op: BinOpKind, value: Expr) -> Stmt {
    Stmt::new(StmtKind::AugAssign { target, op, value }, span())
}

/// A bare annotated declaration, the temporary-field form.
pub fn field_decl(id: &str, annotation: Expr) -> Stmt {
    Stmt::new(
        StmtKind::AnnAssign { target: name(id), annotation, value: None },
        span(),
    )
}

pub fn if_stmt(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::If { test, body, orelse }, span())
}

pub fn with_stmt(context: Expr, alias: Option<&str>, body: Vec<Stmt>) -> Stmt {
    Stmt::new(
        StmtKind::With {
            items: vec![WithItem { context, alias: alias.map(str::to_string) }],
            body,
        },
        span(),
    )
}

pub fn pass_stmt() -> Stmt {
    Stmt::new(StmtKind::Pass, span())
}

/// `with levels_upward as k:` over the whole column.
pub fn upward_region(body: Vec<Stmt>) -> Stmt {
    with_stmt(name("levels_upward"), Some("k"), body)
}

pub fn downward_region(body: Vec<Stmt>) -> Stmt {
    with_stmt(name("levels_downward"), Some("k"), body)
}

/// `with levels_upward[lower:upper] as k:`.
pub fn bounded_region(lower: Option<Expr>, upper: Option<Expr>, body: Vec<Stmt>) -> Stmt {
    with_stmt(subscript(name("levels_upward"), slice(lower, upper, None)), Some("k"), body)
}

/// `with sparse[chain]:`.
pub fn sparse_fill(chain: Expr, body: Vec<Stmt>) -> Stmt {
    with_stmt(subscript(name("sparse"), chain), None, body)
}

// ── Annotations and parameters ──────────────────────────────────────

pub fn param(id: &str, annotation: Expr) -> Param {
    Param { name: id.to_string(), annotation, span: span() }
}

/// `Field[Location, K]`.
pub fn dense_param(id: &str, location: &str) -> Param {
    param(id, subscript(name("Field"), tuple(vec![name(location), name("K")])))
}

/// `Field[First > rest..., K]`.
pub fn sparse_param(id: &str, first: &str, rest: &[&str]) -> Param {
    param(id, subscript(name("Field"), tuple(vec![chain(first, rest), name("K")])))
}

/// `Field[K]`.
pub fn vertical_param(id: &str) -> Param {
    param(id, subscript(name("Field"), name("K")))
}

/// `Field[Location]`.
pub fn horizontal_param(id: &str, location: &str) -> Param {
    param(id, subscript(name("Field"), name(location)))
}

/// `IndexField[Location, K]`.
pub fn index_param(id: &str, location: &str) -> Param {
    param(id, subscript(name("IndexField"), tuple(vec![name(location), name("K")])))
}

// ── Definitions and drivers ─────────────────────────────────────────

pub fn stencil(id: &str, params: Vec<Param>, body: Vec<Stmt>) -> FunctionDef {
    FunctionDef {
        name: id.to_string(),
        params,
        body,
        decorators: vec![name("stencil")],
        span: span(),
    }
}

pub fn module(defs: Vec<FunctionDef>) -> Module {
    Module {
        filename: "stencils.py".to_string(),
        stmts: defs
            .into_iter()
            .map(|def| Stmt::new(StmtKind::FunctionDef(def), span()))
            .collect(),
    }
}

pub fn translate(
    def: &FunctionDef,
) -> Result<(ir::Stencil, ir::GlobalVariableMap), TranslationError> {
    translate_stencil(def, &Externals::new())
}

/// Translates and panics on failure, returning the stencil alone.
pub fn translated(def: &FunctionDef) -> ir::Stencil {
    match translate(def) {
        Ok((stencil, _)) => stencil,
        Err(error) => panic!("'{}' failed to translate: {error}", def.name),
    }
}

pub fn const_externals(id: &str, value: Literal) -> Externals {
    let mut externals = Externals::new();
    externals.closure.insert(id.to_string(), CapturedValue::Const(value));
    externals
}

/// Binds `(local, declared)` global pairs.
pub fn global_externals(pairs: &[(&str, &str)]) -> Externals {
    let mut externals = Externals::new();
    for (local, declared) in pairs {
        externals
            .globals
            .insert(local.to_string(), CapturedValue::Global(declared.to_string()));
    }
    externals
}

// ── Error assertions ────────────────────────────────────────────────

pub fn assert_syntax(error: &TranslationError, fragment: &str) {
    assert!(
        matches!(error, TranslationError::Syntax { .. }),
        "expected a syntax error, got: {error:?}"
    );
    assert_contains(error, fragment);
}

pub fn assert_semantic(error: &TranslationError, fragment: &str) {
    assert!(
        matches!(error, TranslationError::Semantic { .. }),
        "expected a semantic error, got: {error:?}"
    );
    assert_contains(error, fragment);
}

pub fn assert_internal(error: &TranslationError, fragment: &str) {
    assert!(
        matches!(error, TranslationError::Internal { .. }),
        "expected an internal error, got: {error:?}"
    );
    assert_contains(error, fragment);
}

fn assert_contains(error: &TranslationError, fragment: &str) {
    assert!(
        error.to_string().contains(fragment),
        "error does not mention '{fragment}': {error}"
    );
}
