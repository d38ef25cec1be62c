//! Translation of resolved, folded stencil definitions into IR.
//!
//! The grammar is the last pass: it recognizes the restricted statement
//! and expression vocabulary, drives the iteration context while doing
//! so, and emits `sirocco_ir` nodes. Recognition goes through the
//! resolved [`Decl`] on every name, never through spellings, so aliased
//! vocabulary translates and shadowed vocabulary does not.
//!
//! One [`Grammar`] instance translates one stencil; the embedded scope
//! chain and iteration context are not reusable across definitions.

mod expr;
mod stmt;

use sirocco_ir::{
    self as ir, Field, FieldDimensions, FieldKind, LocationChain, LocationType,
};

use crate::ast::{CompareOpKind, Decl, Expr, ExprKind, FunctionDef, Param, Span, StmtKind};
use crate::builtins::Builtin;
use crate::context::IterationContext;
use crate::error::TranslationError;
use crate::matcher::{exact, located, repeat};
use crate::scope::{ScopeChain, ScopeKind};

/// Translator state for a single stencil: the declared fields (API
/// frame, then temporaries frame) and the iteration context.
#[derive(Debug, Default)]
pub struct Grammar {
    fields: ScopeChain<Field>,
    context: IterationContext,
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Translates one stencil definition. The definition must have been
    /// symbol-resolved and constant-folded; decorators are recognition
    /// markers for the unit driver and are ignored here.
    pub fn stencil(mut self, def: &FunctionDef) -> Result<ir::Stencil, TranslationError> {
        self.fields.push(ScopeKind::Declaration);
        for param in &def.params {
            self.api_field(param)?;
        }

        self.fields.push(ScopeKind::Declaration);
        let mut statements = Vec::new();
        let mut leading_decls = true;
        for stmt in &def.body {
            if leading_decls {
                if let StmtKind::AnnAssign { target, annotation, value: None } = &stmt.kind {
                    if let ExprKind::Name { id, .. } = &target.kind {
                        self.temp_field(id, annotation, stmt.span)?;
                        continue;
                    }
                }
                leading_decls = false;
            }
            if let Some(translated) = self.statement(stmt)? {
                statements.push(translated);
            }
        }

        let fields = self
            .fields
            .frames()
            .iter()
            .flat_map(|frame| frame.locals())
            .map(|(_, field)| field.clone())
            .collect();
        Ok(ir::Stencil { name: def.name.clone(), fields, body: ir::BlockStmt::new(statements) })
    }

    fn api_field(&mut self, param: &Param) -> Result<(), TranslationError> {
        let (dimensions, kind) = field_type(&param.annotation)?;
        let field =
            Field { name: param.name.clone(), dimensions, is_temporary: false, kind };
        located(self.fields.try_add(&param.name, field), param.span)
    }

    fn temp_field(
        &mut self,
        name: &str,
        annotation: &Expr,
        span: Span,
    ) -> Result<(), TranslationError> {
        let (dimensions, kind) = field_type(annotation)?;
        let field = Field { name: name.to_string(), dimensions, is_temporary: true, kind };
        located(self.fields.try_add(name, field), span)
    }

    /// The registered field behind a resolved `Decl::Field` reference.
    fn field(&self, name: &str) -> Result<&Field, TranslationError> {
        self.fields
            .fetch(name)
            .ok_or_else(|| TranslationError::internal(format!("field '{name}' is not registered")))
    }
}

/// The declaration a resolved name carries, or the internal error that
/// means a pass was skipped.
fn require_decl<'a>(decl: &'a Option<Decl>, id: &str) -> Result<&'a Decl, TranslationError> {
    decl.as_ref().ok_or_else(|| {
        TranslationError::internal(format!("unresolved name '{id}' reached translation"))
    })
}

fn resolved_builtin(expr: &Expr) -> Option<Builtin> {
    match &expr.kind {
        ExprKind::Name { decl: Some(Decl::Builtin(builtin)), .. } => Some(*builtin),
        _ => None,
    }
}

/// Parses `Field[...]`/`IndexField[...]` annotations. The subscript is
/// `[Chain]`, `[K]` or `[Chain, K]`.
fn field_type(annotation: &Expr) -> Result<(FieldDimensions, FieldKind), TranslationError> {
    let result = (|| -> Result<(FieldDimensions, FieldKind), TranslationError> {
        let ExprKind::Subscript { value, index } = &annotation.kind else {
            return Err(invalid_annotation());
        };
        let kind = match resolved_builtin(value) {
            Some(Builtin::Field) => FieldKind::Data,
            Some(Builtin::IndexField) => FieldKind::Index,
            _ => return Err(invalid_annotation()),
        };
        Ok((field_dimensions(index)?, kind))
    })();
    located(result, annotation.span)
}

fn invalid_annotation() -> TranslationError {
    TranslationError::syntax("a field annotation must subscript 'Field' or 'IndexField'")
}

fn field_dimensions(index: &Expr) -> Result<FieldDimensions, TranslationError> {
    match &index.kind {
        ExprKind::Tuple { elements } => {
            let [horizontal, vertical] = elements.as_slice() else {
                return Err(TranslationError::syntax_at(
                    "a field annotation takes '[Chain]', '[K]' or '[Chain, K]'",
                    index.span,
                ));
            };
            if resolved_builtin(vertical) != Some(Builtin::K) {
                return Err(TranslationError::syntax_at(
                    "the vertical dimension of a field annotation must be 'K'",
                    vertical.span,
                ));
            }
            Ok(FieldDimensions { horizontal: Some(location_chain(horizontal)?), vertical: true })
        }
        _ if resolved_builtin(index) == Some(Builtin::K) => {
            Ok(FieldDimensions { horizontal: None, vertical: true })
        }
        _ => Ok(FieldDimensions { horizontal: Some(location_chain(index)?), vertical: false }),
    }
}

/// A location chain: one location name, or locations joined by `>`.
fn location_chain(expr: &Expr) -> Result<LocationChain, TranslationError> {
    let result = match &expr.kind {
        ExprKind::Compare { left, ops, comparators } => {
            repeat(ops, Some(comparators.len()), |op| exact(&CompareOpKind::Gt, op))
                .map_err(|_| TranslationError::syntax("location chains are joined with '>'"))?;
            let mut chain = vec![single_location(left)?];
            for comparator in comparators {
                chain.push(single_location(comparator)?);
            }
            Ok(chain)
        }
        _ => Ok(vec![single_location(expr)?]),
    };
    located(result, expr.span)
}

fn single_location(expr: &Expr) -> Result<LocationType, TranslationError> {
    let result = match &expr.kind {
        ExprKind::Name { id, decl } => match require_decl(decl, id)? {
            Decl::Builtin(Builtin::Location(location)) => Ok(*location),
            _ => Err(TranslationError::syntax(format!("invalid location type '{id}'"))),
        },
        _ => Err(TranslationError::syntax("expected a location type")),
    };
    located(result, expr.span)
}
