//! Statement translation.
//!
//! First structural match wins. Compound assignments desugar into a
//! plain assignment of an explicit binary operation (`**=` into the
//! `pow` intrinsic), `elif` arrives from the parser as a nested else
//! block, and `with` statements are dispatched on their head's resolved
//! declaration into vertical regions or sparse fills.

use sirocco_ir::{
    self as ir, Bound, Interval, LevelAnchor, LoopStmt, VerticalOrder, VerticalRegionStmt,
};

use crate::ast::{
    BinOpKind, Decl, Expr, ExprKind, Literal, Span, Stmt, StmtKind, UnaryOpKind, WithItem,
};
use crate::builtins::Builtin;
use crate::error::TranslationError;
use crate::matcher::{absent, located};

use super::{location_chain, require_decl, Grammar};

impl Grammar {
    pub(super) fn statement(&mut self, stmt: &Stmt) -> Result<Option<ir::Stmt>, TranslationError> {
        match &stmt.kind {
            StmtKind::FunctionDef(_) => Err(TranslationError::syntax_at(
                "nested definitions are not allowed in stencils",
                stmt.span,
            )),
            StmtKind::Assign { target, value } => self.assignment(target, value).map(Some),
            StmtKind::AugAssign { target, op, value } => {
                self.compound_assignment(target, *op, value, stmt.span).map(Some)
            }
            StmtKind::AnnAssign { value: Some(_), .. } => Err(TranslationError::syntax_at(
                "annotated assignments are not allowed in stencils",
                stmt.span,
            )),
            StmtKind::AnnAssign { value: None, .. } => Err(TranslationError::syntax_at(
                "field declarations must precede all statements",
                stmt.span,
            )),
            StmtKind::If { test, body, orelse } => self.if_stmt(test, body, orelse).map(Some),
            StmtKind::With { items, body } => self.with_stmt(items, body, stmt.span).map(Some),
            StmtKind::Pass => Ok(None),
        }
    }

    pub(super) fn block(&mut self, stmts: &[Stmt]) -> Result<ir::BlockStmt, TranslationError> {
        let mut statements = Vec::new();
        for stmt in stmts {
            if let Some(translated) = self.statement(stmt)? {
                statements.push(translated);
            }
        }
        Ok(ir::BlockStmt::new(statements))
    }

    fn assignment(&mut self, target: &Expr, value: &Expr) -> Result<ir::Stmt, TranslationError> {
        let target = self.write_target(target)?;
        let value = self.expression(value)?;
        Ok(ir::Stmt::Assignment { target, value })
    }

    fn compound_assignment(
        &mut self,
        target: &Expr,
        op: BinOpKind,
        value: &Expr,
        span: Span,
    ) -> Result<ir::Stmt, TranslationError> {
        let written = self.write_target(target)?;
        let read = self.expression(target)?;
        let value = self.expression(value)?;
        let combined = located(super::expr::combine(op, read, value), span)?;
        Ok(ir::Stmt::Assignment { target: written, value: combined })
    }

    /// Assignment targets are fields or field subscripts. Globals,
    /// captured constants and the iteration variable are readable but
    /// never writable.
    fn write_target(&mut self, target: &Expr) -> Result<ir::Expr, TranslationError> {
        match &target.kind {
            ExprKind::Name { id, decl } => {
                let result = match require_decl(decl, id)? {
                    Decl::Field => return self.expression(target),
                    Decl::Global(_) => Err(TranslationError::semantic(format!(
                        "cannot assign to the global '{id}'"
                    ))),
                    Decl::Const(_) => Err(TranslationError::semantic(format!(
                        "cannot assign to the compile-time constant '{id}'"
                    ))),
                    Decl::IterationVar => Err(TranslationError::semantic(format!(
                        "cannot assign to the iteration variable '{id}'"
                    ))),
                    Decl::Builtin(_) => Err(TranslationError::syntax(format!(
                        "'{id}' is vocabulary, not an assignable field"
                    ))),
                };
                located(result, target.span)
            }
            ExprKind::Subscript { .. } => self.expression(target),
            _ => Err(TranslationError::syntax_at(
                "only a field or a field subscript can be assigned to",
                target.span,
            )),
        }
    }

    fn if_stmt(
        &mut self,
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
    ) -> Result<ir::Stmt, TranslationError> {
        let condition = self.expression(test)?;
        let then_body = self.block(body)?;
        let else_body = if orelse.is_empty() { None } else { Some(self.block(orelse)?) };
        Ok(ir::Stmt::If { condition, then_body, else_body })
    }

    fn with_stmt(
        &mut self,
        items: &[WithItem],
        body: &[Stmt],
        span: Span,
    ) -> Result<ir::Stmt, TranslationError> {
        let [item] = items else {
            return Err(TranslationError::syntax_at(
                "a 'with' statement takes exactly one context",
                span,
            ));
        };
        let (head, index) = match &item.context.kind {
            ExprKind::Subscript { value, index } => (value.as_ref(), Some(index.as_ref())),
            _ => (&item.context, None),
        };
        let ExprKind::Name { id, decl } = &head.kind else {
            return Err(TranslationError::syntax_at(
                "a 'with' head must name a vertical region or a sparse fill",
                span,
            ));
        };
        match require_decl(decl, id)? {
            Decl::Builtin(Builtin::LevelsUpward) => {
                self.vertical_region(VerticalOrder::Forward, index, body, span)
            }
            Decl::Builtin(Builtin::LevelsDownward) => {
                self.vertical_region(VerticalOrder::Backward, index, body, span)
            }
            Decl::Builtin(Builtin::Sparse) => {
                located(absent(item.alias.as_ref(), "an 'as' variable"), span)?;
                self.loop_stmt(index, body, span)
            }
            _ => Err(TranslationError::syntax_at(
                format!("'{id}' cannot head a 'with' statement"),
                span,
            )),
        }
    }

    fn vertical_region(
        &mut self,
        order: VerticalOrder,
        index: Option<&Expr>,
        body: &[Stmt],
        span: Span,
    ) -> Result<ir::Stmt, TranslationError> {
        let interval = match index {
            None => Interval::full(),
            Some(index) => vertical_interval(index)?,
        };
        located(self.context.enter_vertical_region(), span)?;
        let body = self.block(body);
        self.context.exit_vertical_region();
        Ok(ir::Stmt::VerticalRegion(VerticalRegionStmt { interval, order, body: body? }))
    }

    fn loop_stmt(
        &mut self,
        index: Option<&Expr>,
        body: &[Stmt],
        span: Span,
    ) -> Result<ir::Stmt, TranslationError> {
        let Some(index) = index else {
            return Err(TranslationError::syntax_at(
                "a sparse fill names its neighbor chain in '[...]'",
                span,
            ));
        };
        let chain = location_chain(index)?;
        located(self.context.enter_loop_stmt(chain.clone()), span)?;
        let body = self.block(body);
        self.context.exit_loop_stmt();
        Ok(ir::Stmt::Loop(LoopStmt { chain, body: body? }))
    }
}

fn vertical_interval(index: &Expr) -> Result<Interval, TranslationError> {
    let ExprKind::Slice { lower, upper, step } = &index.kind else {
        return Err(TranslationError::syntax_at(
            "a vertical region takes '[lower:upper]' bounds",
            index.span,
        ));
    };
    located(absent(step.as_deref(), "a slice step"), index.span)?;
    let lower = match lower {
        Some(bound) => vertical_interval_bound(bound)?,
        None => Bound { anchor: LevelAnchor::Start, offset: 0 },
    };
    let upper = match upper {
        Some(bound) => vertical_interval_bound(bound)?,
        None => Bound { anchor: LevelAnchor::End, offset: 0 },
    };
    Ok(Interval { lower, upper })
}

/// A non-negative bound anchors at the column start, a negated one at
/// the end; the stored offset is always a magnitude toward the
/// interior.
fn vertical_interval_bound(bound: &Expr) -> Result<Bound, TranslationError> {
    let result = match &bound.kind {
        ExprKind::Constant { value: Literal::Int(offset), .. } => {
            if *offset >= 0 {
                Ok(Bound { anchor: LevelAnchor::Start, offset: *offset })
            } else {
                match offset.checked_neg() {
                    Some(magnitude) => Ok(Bound { anchor: LevelAnchor::End, offset: magnitude }),
                    None => Err(TranslationError::syntax("vertical bound is out of range")),
                }
            }
        }
        ExprKind::UnaryOp { op: UnaryOpKind::USub, operand } => match &operand.kind {
            ExprKind::Constant { value: Literal::Int(offset), .. } if *offset >= 0 => {
                Ok(Bound { anchor: LevelAnchor::End, offset: *offset })
            }
            _ => Err(invalid_bound()),
        },
        _ => Err(invalid_bound()),
    };
    located(result, bound.span)
}

fn invalid_bound() -> TranslationError {
    TranslationError::syntax("a vertical bound must be an integer literal")
}
