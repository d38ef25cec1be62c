//! Name resolution for one stencil definition.
//!
//! Builds the six-level scope chain (builtins, captured globals,
//! captured closure values, API fields, temporary fields, per-region
//! iteration variables) and annotates every `Name` node with the
//! declaration it resolved to. Later passes dispatch on that
//! annotation and never consult a scope again.

use indexmap::IndexMap;

use crate::ast::{
    Decl, Expr, ExprKind, FunctionDef, Literal, Param, Span, Stmt, StmtKind, WithItem,
};
use crate::builtins::{self, Builtin};
use crate::error::TranslationError;
use crate::matcher::located;
use crate::scope::{ScopeChain, ScopeKind};

/// Values the embedding context makes visible to a stencil, split the
/// way the host splits them: the definition's enclosing globals and
/// its lexical closure. Insertion order is preserved so diagnostics
/// and resolution are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Externals {
    pub globals: IndexMap<String, CapturedValue>,
    pub closure: IndexMap<String, CapturedValue>,
}

impl Externals {
    pub fn new() -> Externals {
        Externals::default()
    }
}

/// One captured binding, already classified by the embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedValue {
    /// An externally supplied scalar. The payload is the *declared*
    /// name, which may differ from the binding the stencil spells.
    Global(String),
    /// A compile-time constant; the folder inlines these.
    Const(Literal),
    /// Language vocabulary rebound under another name.
    Builtin(Builtin),
}

impl CapturedValue {
    fn to_decl(&self) -> Decl {
        match self {
            CapturedValue::Global(name) => Decl::Global(name.clone()),
            CapturedValue::Const(value) => Decl::Const(value.clone()),
            CapturedValue::Builtin(builtin) => Decl::Builtin(*builtin),
        }
    }
}

/// Resolves every name in `def`, filling the `decl` slot of each
/// `Name` node in place.
pub fn resolve_symbols(
    def: &mut FunctionDef,
    externals: &Externals,
) -> Result<(), TranslationError> {
    SymbolResolver::new(externals).stencil(def)
}

struct SymbolResolver {
    scopes: ScopeChain<Decl>,
}

impl SymbolResolver {
    fn new(externals: &Externals) -> SymbolResolver {
        let mut scopes = ScopeChain::new();
        scopes.push_with(ScopeKind::Builtin, builtins::scope_symbols());
        scopes.push_with(ScopeKind::Captured, captured_frame(&externals.globals));
        scopes.push_with(ScopeKind::Captured, captured_frame(&externals.closure));
        SymbolResolver { scopes }
    }

    fn stencil(&mut self, def: &mut FunctionDef) -> Result<(), TranslationError> {
        self.scopes.push(ScopeKind::Declaration);
        for param in &mut def.params {
            self.api_field(param)?;
        }

        self.scopes.push(ScopeKind::Declaration);
        let mut leading_decls = true;
        for stmt in &mut def.body {
            if leading_decls {
                if let StmtKind::AnnAssign { target, annotation, value: None } = &mut stmt.kind {
                    if let ExprKind::Name { id, .. } = &target.kind {
                        let declared = id.clone();
                        self.resolve_in(annotation)?;
                        located(self.scopes.try_add(&declared, Decl::Field), stmt.span)?;
                        continue;
                    }
                }
                leading_decls = false;
            }
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn api_field(&mut self, param: &mut Param) -> Result<(), TranslationError> {
        self.resolve_in(&mut param.annotation)?;
        located(self.scopes.try_add(&param.name, Decl::Field), param.span)
    }

    fn stmt(&mut self, stmt: &mut Stmt) -> Result<(), TranslationError> {
        match &mut stmt.kind {
            StmtKind::FunctionDef(_) => Err(TranslationError::syntax_at(
                "nested definitions are not allowed in stencils",
                stmt.span,
            )),
            StmtKind::If { test, body, orelse } => {
                self.resolve_in(test)?;
                for stmt in body.iter_mut().chain(orelse.iter_mut()) {
                    self.stmt(stmt)?;
                }
                Ok(())
            }
            StmtKind::With { items, body } => self.with_stmt(items, body, stmt.span),
            StmtKind::Assign { target, value } | StmtKind::AugAssign { target, value, .. } => {
                self.resolve_in(target)?;
                self.resolve_in(value)
            }
            StmtKind::AnnAssign { target, annotation, value } => {
                self.resolve_in(target)?;
                self.resolve_in(annotation)?;
                match value {
                    Some(value) => self.resolve_in(value),
                    None => Ok(()),
                }
            }
            StmtKind::Pass => Ok(()),
        }
    }

    /// A `with` block opens a fresh region scope; the `as` name, when
    /// present, is the iteration variable bound for the block's extent.
    fn with_stmt(
        &mut self,
        items: &mut [WithItem],
        body: &mut [Stmt],
        span: Span,
    ) -> Result<(), TranslationError> {
        for item in items.iter_mut() {
            self.resolve_in(&mut item.context)?;
        }

        self.scopes.push(ScopeKind::BlockLocal);
        let result = (|| -> Result<(), TranslationError> {
            for item in items.iter() {
                if let Some(alias) = &item.alias {
                    located(self.scopes.try_add(alias, Decl::IterationVar), span)?;
                }
            }
            for stmt in body.iter_mut() {
                self.stmt(stmt)?;
            }
            Ok(())
        })();
        self.scopes.pop();
        result
    }

    fn resolve_in(&self, expr: &mut Expr) -> Result<(), TranslationError> {
        let mut error = None;
        let scopes = &self.scopes;
        expr.walk_mut(&mut |node| {
            if error.is_some() {
                return;
            }
            if let ExprKind::Name { id, decl } = &mut node.kind {
                match scopes.fetch(id) {
                    Some(found) => *decl = Some(found.clone()),
                    None => {
                        error = Some(TranslationError::semantic_at(
                            format!("undeclared variable '{id}'"),
                            node.span,
                        ));
                    }
                }
            }
        });
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn captured_frame(values: &IndexMap<String, CapturedValue>) -> IndexMap<String, Decl> {
    values.iter().map(|(name, value)| (name.clone(), value.to_decl())).collect()
}
