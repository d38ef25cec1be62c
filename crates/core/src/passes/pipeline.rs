//! Pass orchestration: host definition -> validated stencil IR.
//!
//! This is a thin driver that calls each pass in its required order.
//! [`translate_stencil`] is the single-stencil entry; [`translate_unit`]
//! filters a module down to its marked definitions, translates each on
//! a cloned tree, and keeps going past per-stencil failures so one bad
//! stencil cannot sink the unit.

use sirocco_ir::{self as ir, GlobalVariableMap};

use crate::ast::{Expr, ExprKind, FunctionDef, Module, Stmt, StmtKind};
use crate::error::TranslationError;
use crate::grammar::Grammar;
use crate::passes::constant_folder::constant_fold;
use crate::passes::resolve_globals::resolve_globals;
use crate::passes::symbol_resolution::{resolve_symbols, Externals};

/// Per-stencil pipeline state: the cloned definition the passes mutate
/// in place, the embedder's captured bindings, and the globals the
/// stencil turns out to read.
struct StencilState<'a> {
    def: FunctionDef,
    externals: &'a Externals,
    globals: GlobalVariableMap,
}

/// Translates one definition: resolve, fold, then translate. The input
/// tree is cloned; the caller's definition is left untouched.
pub fn translate_stencil(
    def: &FunctionDef,
    externals: &Externals,
) -> Result<(ir::Stencil, GlobalVariableMap), TranslationError> {
    let mut state =
        StencilState { def: def.clone(), externals, globals: GlobalVariableMap::new() };

    check_spans(&state.def)?;

    // Symbol resolution: annotate every name with its declaration.
    resolve_symbols(&mut state.def, state.externals)?;
    check_resolved(&state.def)?;

    // Constant folding: inline captured constants, collapse literal
    // subtrees. Must not drop any resolution annotation.
    constant_fold(&mut state.def)?;
    check_resolved(&state.def)?;

    // Globals: establish the key set of externally supplied scalars.
    resolve_globals(&state.def, &mut state.globals);

    // Grammar: structural translation into the IR.
    let stencil = Grammar::new().stencil(&state.def)?;
    Ok((stencil, state.globals))
}

/// Translates every marked definition of a module. Errors are collected
/// per stencil; a failed stencil contributes no IR.
pub fn translate_unit(
    module: &Module,
    externals: &Externals,
) -> (ir::TranslationUnit, Vec<TranslationError>) {
    let mut stencils = Vec::new();
    let mut globals = GlobalVariableMap::new();
    let mut errors = Vec::new();

    for def in module.stmts.iter().filter_map(as_stencil_def) {
        match translate_stencil(def, externals) {
            Ok((stencil, read_globals)) => {
                stencils.push(stencil);
                globals.extend(read_globals);
            }
            Err(error) => errors.push(error),
        }
    }

    let unit = ir::TranslationUnit {
        filename: module.filename.clone(),
        grid_type: ir::GridType::Unstructured,
        stencils,
        globals,
    };
    (unit, errors)
}

/// A stencil is a module-level definition carrying exactly one
/// decorator, the bare name `stencil`. Decorators are recognition
/// markers matched by spelling; they are never resolved.
fn as_stencil_def(stmt: &Stmt) -> Option<&FunctionDef> {
    let StmtKind::FunctionDef(def) = &stmt.kind else {
        return None;
    };
    match def.decorators.as_slice() {
        [Expr { kind: ExprKind::Name { id, .. }, .. }] if id == "stencil" => Some(def),
        _ => None,
    }
}

/// The host parser owes every node a well-formed span; a violation can
/// only be an embedding bug, not bad user input.
fn check_spans(def: &FunctionDef) -> Result<(), TranslationError> {
    let mut well_formed = def.span.is_well_formed()
        && def.params.iter().all(|param| param.span.is_well_formed());
    def.walk_exprs(&mut |expr| well_formed &= expr.span.is_well_formed());
    well_formed &= stmt_spans_well_formed(&def.body);

    if well_formed {
        Ok(())
    } else {
        Err(TranslationError::internal(format!(
            "the host parser delivered an ill-formed span in '{}'",
            def.name
        )))
    }
}

fn stmt_spans_well_formed(stmts: &[Stmt]) -> bool {
    stmts.iter().all(|stmt| {
        stmt.span.is_well_formed()
            && match &stmt.kind {
                StmtKind::FunctionDef(def) => stmt_spans_well_formed(&def.body),
                StmtKind::If { body, orelse, .. } => {
                    stmt_spans_well_formed(body) && stmt_spans_well_formed(orelse)
                }
                StmtKind::With { body, .. } => stmt_spans_well_formed(body),
                _ => true,
            }
    })
}

/// After resolution (and again after folding) no name may be left
/// without a declaration.
fn check_resolved(def: &FunctionDef) -> Result<(), TranslationError> {
    let mut unresolved: Option<String> = None;
    def.walk_exprs(&mut |expr| {
        if let ExprKind::Name { id, decl: None } = &expr.kind {
            unresolved.get_or_insert_with(|| id.clone());
        }
    });
    match unresolved {
        None => Ok(()),
        Some(id) => Err(TranslationError::internal(format!(
            "'{id}' left the resolver without a declaration"
        ))),
    }
}
