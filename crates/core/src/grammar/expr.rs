//! Expression translation.
//!
//! Name references dispatch on their resolved declaration, subscripts
//! go through field-index resolution against the iteration context, and
//! calls split by callee declaration into math intrinsics and
//! reductions. A reduction translates its initial value in the
//! enclosing context, then opens its own chain for the reduced
//! expression and the weights.

use sirocco_ir::{
    self as ir, FieldAccessExpr, FieldKind, MathFunction, ReductionExpr, ReductionOp,
};

use crate::ast::{
    BinOpKind, BoolOpKind, CompareOpKind, Decl, Expr, ExprKind, Keyword, Literal, Span,
    UnaryOpKind,
};
use crate::builtins::Builtin;
use crate::error::TranslationError;
use crate::matcher::located;

use super::{location_chain, require_decl, resolved_builtin, Grammar};

impl Grammar {
    pub(super) fn expression(&mut self, expr: &Expr) -> Result<ir::Expr, TranslationError> {
        match &expr.kind {
            ExprKind::Constant { value, .. } => located(literal(value), expr.span),
            ExprKind::Name { id, decl } => self.name_access(id, decl, expr.span),
            ExprKind::Subscript { value, index } => self.field_access(value, index, expr.span),
            ExprKind::UnaryOp { op, operand } => self.unary(*op, operand, expr.span),
            ExprKind::BinOp { left, op, right } => {
                let left = self.expression(left)?;
                let right = self.expression(right)?;
                located(combine(*op, left, right), expr.span)
            }
            ExprKind::BoolOp { op, values } => self.boolean(*op, values),
            ExprKind::Compare { left, ops, comparators } => {
                self.comparison(left, ops, comparators, expr.span)
            }
            ExprKind::IfExp { test, body, orelse } => Ok(ir::Expr::Ternary {
                condition: Box::new(self.expression(test)?),
                then_value: Box::new(self.expression(body)?),
                else_value: Box::new(self.expression(orelse)?),
            }),
            ExprKind::Call { func, args, keywords } => {
                self.call(func, args, keywords, expr.span)
            }
            ExprKind::List { .. } => Err(TranslationError::syntax_at(
                "a list is only valid as reduction weights",
                expr.span,
            )),
            ExprKind::Tuple { .. } => {
                Err(TranslationError::syntax_at("tuple expressions are not supported", expr.span))
            }
            ExprKind::Slice { .. } => Err(TranslationError::syntax_at(
                "a slice is only valid as vertical region bounds",
                expr.span,
            )),
        }
    }

    fn name_access(
        &mut self,
        id: &str,
        decl: &Option<Decl>,
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        let result = match require_decl(decl, id)? {
            Decl::Field => {
                let declared = self.field(id)?.dimensions.horizontal.clone();
                let horizontal = self.context.horizontal_offset(declared.as_deref(), None)?;
                Ok(ir::Expr::FieldAccess(FieldAccessExpr {
                    name: id.to_string(),
                    horizontal,
                    vertical_offset: 0,
                    vertical_indirection: None,
                }))
            }
            Decl::Global(declared) => {
                Ok(ir::Expr::VarAccess { name: declared.clone(), is_external: true })
            }
            Decl::Const(_) => Err(TranslationError::internal(format!(
                "captured constant '{id}' survived folding"
            ))),
            Decl::IterationVar => Err(TranslationError::semantic(format!(
                "the iteration variable '{id}' is only valid inside a subscript"
            ))),
            Decl::Builtin(_) => {
                Err(TranslationError::syntax(format!("'{id}' is vocabulary, not a value")))
            }
        };
        located(result, span)
    }

    /// Field subscripts: `f[vertical]`, `f[chain]` or `f[chain, vertical]`,
    /// where the vertical part is the iteration variable or an index
    /// field, optionally offset by an integer literal.
    fn field_access(
        &mut self,
        base: &Expr,
        index: &Expr,
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        let ExprKind::Name { id, decl } = &base.kind else {
            return Err(TranslationError::syntax_at("only fields can be subscripted", base.span));
        };
        if !matches!(require_decl(decl, id)?, Decl::Field) {
            return Err(TranslationError::syntax_at(
                format!("'{id}' is not a subscriptable field"),
                base.span,
            ));
        }
        let declared = self.field(id)?.dimensions.horizontal.clone();

        let (qualifier, vertical) = match &index.kind {
            ExprKind::Tuple { elements } => {
                let [horizontal, vertical] = elements.as_slice() else {
                    return Err(TranslationError::syntax_at(
                        "a field subscript takes '[chain]', '[vertical]' or '[chain, vertical]'",
                        index.span,
                    ));
                };
                (Some(location_chain(horizontal)?), Some(vertical))
            }
            ExprKind::Compare { .. } => (Some(location_chain(index)?), None),
            _ if matches!(resolved_builtin(index), Some(Builtin::Location(_))) => {
                (Some(location_chain(index)?), None)
            }
            _ => (None, Some(index)),
        };
        let (vertical_offset, vertical_indirection) = match vertical {
            Some(expr) => self.vertical_subscript(expr)?,
            None => (0, None),
        };
        let horizontal = located(
            self.context.horizontal_offset(declared.as_deref(), qualifier.as_deref()),
            span,
        )?;
        Ok(ir::Expr::FieldAccess(FieldAccessExpr {
            name: id.to_string(),
            horizontal,
            vertical_offset,
            vertical_indirection,
        }))
    }

    fn vertical_subscript(&self, expr: &Expr) -> Result<(i64, Option<String>), TranslationError> {
        let result = match &expr.kind {
            ExprKind::Name { .. } => {
                self.vertical_base(expr).map(|indirection| (0, indirection))
            }
            ExprKind::BinOp { left, op: BinOpKind::Add, right } => {
                let indirection = self.vertical_base(left)?;
                Ok((integer_offset(right)?, indirection))
            }
            ExprKind::BinOp { left, op: BinOpKind::Sub, right } => {
                let indirection = self.vertical_base(left)?;
                match integer_offset(right)?.checked_neg() {
                    Some(offset) => Ok((offset, indirection)),
                    None => Err(TranslationError::semantic("vertical offset is out of range")),
                }
            }
            _ => Err(invalid_vertical_subscript()),
        };
        located(result, expr.span)
    }

    /// `None` for the iteration variable, the field name for an index
    /// field.
    fn vertical_base(&self, expr: &Expr) -> Result<Option<String>, TranslationError> {
        let result = match &expr.kind {
            ExprKind::Name { id, decl } => match require_decl(decl, id)? {
                Decl::IterationVar => Ok(None),
                Decl::Field => {
                    if self.field(id)?.kind == FieldKind::Index {
                        Ok(Some(id.clone()))
                    } else {
                        Err(TranslationError::semantic(format!("'{id}' is not an index field")))
                    }
                }
                _ => Err(invalid_vertical_subscript()),
            },
            _ => Err(invalid_vertical_subscript()),
        };
        located(result, expr.span)
    }

    fn unary(
        &mut self,
        op: UnaryOpKind,
        operand: &Expr,
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        let op = match op {
            UnaryOpKind::UAdd => ir::UnaryOp::Plus,
            UnaryOpKind::USub => ir::UnaryOp::Minus,
            UnaryOpKind::Not => ir::UnaryOp::Not,
            UnaryOpKind::Invert => {
                return Err(TranslationError::syntax_at(
                    "the bitwise-not operator '~' is not supported",
                    span,
                ))
            }
        };
        Ok(ir::Expr::Unary { op, operand: Box::new(self.expression(operand)?) })
    }

    fn boolean(
        &mut self,
        op: BoolOpKind,
        values: &[Expr],
    ) -> Result<ir::Expr, TranslationError> {
        let op = match op {
            BoolOpKind::And => ir::BinaryOp::And,
            BoolOpKind::Or => ir::BinaryOp::Or,
        };
        let mut translated = Vec::with_capacity(values.len());
        for value in values {
            translated.push(self.expression(value)?);
        }
        let mut operands = translated.into_iter();
        let Some(first) = operands.next() else {
            return Err(TranslationError::internal("a boolean operator without operands"));
        };
        Ok(operands.fold(first, |left, right| ir::Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }))
    }

    fn comparison(
        &mut self,
        left: &Expr,
        ops: &[CompareOpKind],
        comparators: &[Expr],
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        let (op, right) = match (ops, comparators) {
            ([op], [right]) => (*op, right),
            _ => {
                return Err(TranslationError::syntax_at(
                    "comparison chains cannot be translated",
                    span,
                ))
            }
        };
        let op = match op {
            CompareOpKind::Eq => ir::BinaryOp::Eq,
            CompareOpKind::NotEq => ir::BinaryOp::Ne,
            CompareOpKind::Lt => ir::BinaryOp::Lt,
            CompareOpKind::LtE => ir::BinaryOp::Le,
            CompareOpKind::Gt => ir::BinaryOp::Gt,
            CompareOpKind::GtE => ir::BinaryOp::Ge,
        };
        Ok(ir::Expr::Binary {
            left: Box::new(self.expression(left)?),
            op,
            right: Box::new(self.expression(right)?),
        })
    }

    fn call(
        &mut self,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        let ExprKind::Name { id, decl } = &func.kind else {
            return Err(TranslationError::syntax_at("only named functions can be called", span));
        };
        match require_decl(decl, id)? {
            Decl::Builtin(Builtin::Math(function)) => {
                self.math_call(*function, args, keywords, span)
            }
            Decl::Builtin(Builtin::ReduceOver) => self.reduction(id, None, args, keywords, span),
            Decl::Builtin(Builtin::SumOver) => {
                self.reduction(id, Some(ReductionOp::Sum), args, keywords, span)
            }
            Decl::Builtin(Builtin::MinOver) => {
                self.reduction(id, Some(ReductionOp::Min), args, keywords, span)
            }
            Decl::Builtin(Builtin::MaxOver) => {
                self.reduction(id, Some(ReductionOp::Max), args, keywords, span)
            }
            _ => Err(TranslationError::syntax_at(format!("'{id}' is not callable"), span)),
        }
    }

    fn math_call(
        &mut self,
        function: MathFunction,
        args: &[Expr],
        keywords: &[Keyword],
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        if !keywords.is_empty() {
            return Err(TranslationError::syntax_at(
                format!("'{function}' takes no keyword arguments"),
                span,
            ));
        }
        if args.len() != function.arity() {
            return Err(TranslationError::syntax_at(
                format!(
                    "'{}' takes {} argument(s), found {}",
                    function,
                    function.arity(),
                    args.len()
                ),
                span,
            ));
        }
        let mut translated = Vec::with_capacity(args.len());
        for arg in args {
            translated.push(self.expression(arg)?);
        }
        Ok(ir::Expr::MathCall { function, args: translated })
    }

    fn reduction(
        &mut self,
        callee: &str,
        implied: Option<ReductionOp>,
        args: &[Expr],
        keywords: &[Keyword],
        span: Span,
    ) -> Result<ir::Expr, TranslationError> {
        let (chain_expr, body_expr, op) = match implied {
            Some(op) => match args {
                [chain, body] => (chain, body, op),
                _ => {
                    return Err(TranslationError::syntax_at(
                        format!(
                            "'{callee}' takes 2 positional arguments, found {}",
                            args.len()
                        ),
                        span,
                    ))
                }
            },
            None => match args {
                [chain, body, op] => (chain, body, reduction_op(op)?),
                _ => {
                    return Err(TranslationError::syntax_at(
                        format!(
                            "'{callee}' takes 3 positional arguments, found {}",
                            args.len()
                        ),
                        span,
                    ))
                }
            },
        };
        let chain = location_chain(chain_expr)?;

        let mut init_expr = None;
        let mut weights_expr = None;
        for keyword in keywords {
            match keyword.name.as_str() {
                "init" => init_expr = Some(&keyword.value),
                "weights" => weights_expr = Some(&keyword.value),
                other => {
                    return Err(TranslationError::syntax_at(
                        format!("unknown keyword argument '{other}'"),
                        keyword.value.span,
                    ))
                }
            }
        }

        // The initial value belongs to the surrounding iteration, so it
        // is translated before the reduction's chain becomes active.
        let init = match init_expr {
            Some(expr) => self.expression(expr)?,
            None => default_init(op),
        };

        let token = located(self.context.enter_reduction(chain.clone()), span)?;
        let inner = (|| -> Result<(ir::Expr, Option<Vec<ir::Expr>>), TranslationError> {
            let body = self.expression(body_expr)?;
            let weights = match weights_expr {
                Some(expr) => Some(self.weights(expr)?),
                None => None,
            };
            Ok((body, weights))
        })();
        self.context.exit_reduction(token);
        let (body, weights) = inner?;

        Ok(ir::Expr::Reduction(ReductionExpr {
            op,
            expr: Box::new(body),
            init: Box::new(init),
            chain,
            weights,
        }))
    }

    fn weights(&mut self, expr: &Expr) -> Result<Vec<ir::Expr>, TranslationError> {
        let ExprKind::List { elements } = &expr.kind else {
            return Err(TranslationError::syntax_at(
                "'weights' takes a list of expressions",
                expr.span,
            ));
        };
        elements.iter().map(|element| self.expression(element)).collect()
    }
}

fn literal(value: &Literal) -> Result<ir::Expr, TranslationError> {
    match value {
        Literal::Bool(value) => Ok(ir::Expr::boolean(*value)),
        Literal::Int(value) => Ok(ir::Expr::integer(*value)),
        Literal::Float(value) => Ok(ir::Expr::double(*value)),
        Literal::None => Err(TranslationError::syntax("'None' has no translation")),
        Literal::Str(_) => Err(TranslationError::syntax("string literals have no translation")),
    }
}

/// Maps a host binary operator onto the IR, desugaring `**` into the
/// `pow` intrinsic.
pub(super) fn combine(
    op: BinOpKind,
    left: ir::Expr,
    right: ir::Expr,
) -> Result<ir::Expr, TranslationError> {
    let op = match op {
        BinOpKind::Add => ir::BinaryOp::Add,
        BinOpKind::Sub => ir::BinaryOp::Sub,
        BinOpKind::Mult => ir::BinaryOp::Mul,
        BinOpKind::Div => ir::BinaryOp::Div,
        BinOpKind::Mod => ir::BinaryOp::Rem,
        BinOpKind::LShift => ir::BinaryOp::Shl,
        BinOpKind::RShift => ir::BinaryOp::Shr,
        BinOpKind::BitOr => ir::BinaryOp::BitOr,
        BinOpKind::BitXor => ir::BinaryOp::BitXor,
        BinOpKind::BitAnd => ir::BinaryOp::BitAnd,
        BinOpKind::Pow => {
            return Ok(ir::Expr::MathCall {
                function: MathFunction::Pow,
                args: vec![left, right],
            })
        }
        BinOpKind::FloorDiv => {
            return Err(TranslationError::syntax(
                "the floor-division operator '//' is not supported",
            ))
        }
        BinOpKind::MatMult => {
            return Err(TranslationError::syntax(
                "the matrix-multiplication operator '@' is not supported",
            ))
        }
    };
    Ok(ir::Expr::Binary { left: Box::new(left), op, right: Box::new(right) })
}

fn reduction_op(expr: &Expr) -> Result<ReductionOp, TranslationError> {
    let result = match &expr.kind {
        ExprKind::Name { id, decl } => match require_decl(decl, id)? {
            Decl::Builtin(Builtin::Sum) => Ok(ReductionOp::Sum),
            Decl::Builtin(Builtin::Mul) => Ok(ReductionOp::Mul),
            Decl::Builtin(Builtin::Math(MathFunction::Min)) => Ok(ReductionOp::Min),
            Decl::Builtin(Builtin::Math(MathFunction::Max)) => Ok(ReductionOp::Max),
            _ => Err(invalid_reduction_op()),
        },
        _ => Err(invalid_reduction_op()),
    };
    located(result, expr.span)
}

fn invalid_reduction_op() -> TranslationError {
    TranslationError::syntax("a reduction operator must be one of 'sum', 'mul', 'min', 'max'")
}

/// Identity elements for sum/mul. The min/max sentinels are double
/// literals; an integer-typed reduction needs an explicit `init`.
fn default_init(op: ReductionOp) -> ir::Expr {
    match op {
        ReductionOp::Sum => ir::Expr::double(0.0),
        ReductionOp::Mul => ir::Expr::double(1.0),
        ReductionOp::Min => ir::Expr::double(f64::MAX),
        ReductionOp::Max => ir::Expr::double(-f64::MAX),
    }
}

fn integer_offset(expr: &Expr) -> Result<i64, TranslationError> {
    match &expr.kind {
        ExprKind::Constant { value: Literal::Int(offset), .. } => Ok(*offset),
        _ => Err(TranslationError::semantic_at(
            "a vertical offset must be an integer literal",
            expr.span,
        )),
    }
}

fn invalid_vertical_subscript() -> TranslationError {
    TranslationError::semantic(
        "a vertical subscript must be the iteration variable or an index field, \
         optionally offset by an integer",
    )
}
