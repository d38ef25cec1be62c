//! Compile-time constant inlining and folding.
//!
//! Two sub-passes over a resolved stencil body, in order. The first
//! replaces every load of a captured constant with an inlined literal
//! marked [`ConstOrigin::Folded`]. The second is one bottom-up sweep
//! that evaluates every operator or ternary node whose immediate
//! expression children are all literals; because children fold before
//! parents, a whole constant subtree collapses within the single
//! sweep. The pass is deliberately not a fixpoint: one sweep's worth
//! of collapsing is the contract.
//!
//! Evaluation follows the host's numeric model: booleans count as
//! integers, mixed arithmetic promotes to double, true division always
//! yields a double, and shifts and bitwise operators take integers
//! only. Division by zero or an operand kind an operator cannot take
//! makes the constant expression unevaluable, a semantic error.

use crate::ast::{
    BinOpKind, BoolOpKind, CompareOpKind, ConstOrigin, Decl, Expr, ExprKind, FunctionDef,
    Literal, Stmt, StmtKind, UnaryOpKind,
};
use crate::error::TranslationError;

pub fn constant_fold(def: &mut FunctionDef) -> Result<(), TranslationError> {
    inline_constants(def);
    fold_expressions(def)
}

// ── Sub-pass 1: inlining ────────────────────────────────────────────

fn inline_constants(def: &mut FunctionDef) {
    for stmt in &mut def.body {
        inline_in_stmt(stmt);
    }
}

fn inline_in_stmt(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Assign { target, value } => {
            inline_in_target(target);
            inline_in_expr(value);
        }
        StmtKind::AugAssign { target, value, .. } => {
            inline_in_target(target);
            inline_in_expr(value);
        }
        StmtKind::AnnAssign { target, annotation, value } => {
            inline_in_target(target);
            inline_in_expr(annotation);
            if let Some(value) = value {
                inline_in_expr(value);
            }
        }
        StmtKind::If { test, body, orelse } => {
            inline_in_expr(test);
            for stmt in body.iter_mut().chain(orelse.iter_mut()) {
                inline_in_stmt(stmt);
            }
        }
        StmtKind::With { items, body } => {
            for item in items {
                inline_in_expr(&mut item.context);
            }
            for stmt in body {
                inline_in_stmt(stmt);
            }
        }
        StmtKind::FunctionDef(_) | StmtKind::Pass => {}
    }
}

/// A bare name as assignment target is a store, not a read; it keeps
/// its resolved declaration so the translator can report the write.
/// Subscripted targets still get their index expressions inlined.
fn inline_in_target(target: &mut Expr) {
    if matches!(target.kind, ExprKind::Name { .. }) {
        return;
    }
    inline_in_expr(target);
}

fn inline_in_expr(expr: &mut Expr) {
    expr.walk_mut(&mut |node| {
        if let ExprKind::Name { decl: Some(Decl::Const(value)), .. } = &node.kind {
            let value = value.clone();
            node.kind = ExprKind::Constant { value, origin: ConstOrigin::Folded };
        }
    });
}

// ── Sub-pass 2: folding ─────────────────────────────────────────────

fn fold_expressions(def: &mut FunctionDef) -> Result<(), TranslationError> {
    let mut error = None;
    for stmt in &mut def.body {
        stmt.walk_exprs_mut(&mut |node| {
            if error.is_some() {
                return;
            }
            match try_fold(node) {
                Ok(Some(value)) => {
                    node.kind = ExprKind::Constant { value, origin: ConstOrigin::Folded };
                }
                Ok(None) => {}
                Err(err) => error = Some(err.with_span(node.span)),
            }
        });
    }
    match error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Evaluates one node if all of its expression children are literals.
/// `Ok(None)` means the node is not foldable; containers, calls and
/// subscripts never are.
fn try_fold(expr: &Expr) -> Result<Option<Literal>, TranslationError> {
    match &expr.kind {
        ExprKind::UnaryOp { op, operand } => {
            let Some(value) = constant_value(operand) else {
                return Ok(None);
            };
            unary(*op, value).map(Some)
        }
        ExprKind::BinOp { left, op, right } => {
            let (Some(left), Some(right)) = (constant_value(left), constant_value(right))
            else {
                return Ok(None);
            };
            binary(left, *op, right).map(Some)
        }
        ExprKind::BoolOp { op, values } => {
            let Some(values) = all_constant(values) else {
                return Ok(None);
            };
            Ok(bool_chain(*op, &values))
        }
        ExprKind::Compare { left, ops, comparators } => {
            let Some(left) = constant_value(left) else {
                return Ok(None);
            };
            let Some(comparators) = all_constant(comparators) else {
                return Ok(None);
            };
            compare_chain(left, ops, &comparators).map(Some)
        }
        ExprKind::IfExp { test, body, orelse } => {
            let (Some(test), Some(body), Some(orelse)) =
                (constant_value(test), constant_value(body), constant_value(orelse))
            else {
                return Ok(None);
            };
            Ok(Some(if truthy(test) { body.clone() } else { orelse.clone() }))
        }
        _ => Ok(None),
    }
}

fn constant_value(expr: &Expr) -> Option<&Literal> {
    match &expr.kind {
        ExprKind::Constant { value, .. } => Some(value),
        _ => None,
    }
}

fn all_constant(exprs: &[Expr]) -> Option<Vec<&Literal>> {
    exprs.iter().map(constant_value).collect()
}

// ── Evaluation ──────────────────────────────────────────────────────

/// Numeric view of a literal; booleans count as integers.
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(value: &Literal) -> Option<Num> {
    match value {
        Literal::Bool(b) => Some(Num::Int(i64::from(*b))),
        Literal::Int(n) => Some(Num::Int(*n)),
        Literal::Float(f) => Some(Num::Float(*f)),
        Literal::None | Literal::Str(_) => None,
    }
}

fn as_int(value: &Literal) -> Option<i64> {
    match value {
        Literal::Bool(b) => Some(i64::from(*b)),
        Literal::Int(n) => Some(*n),
        _ => None,
    }
}

fn truthy(value: &Literal) -> bool {
    match value {
        Literal::None => false,
        Literal::Bool(b) => *b,
        Literal::Int(n) => *n != 0,
        Literal::Float(f) => *f != 0.0,
        Literal::Str(s) => !s.is_empty(),
    }
}

fn unevaluable(detail: impl Into<String>) -> TranslationError {
    TranslationError::semantic(format!(
        "cannot evaluate constant expression: {}",
        detail.into()
    ))
}

fn overflow() -> TranslationError {
    unevaluable("integer overflow")
}

fn unary(op: UnaryOpKind, value: &Literal) -> Result<Literal, TranslationError> {
    match op {
        UnaryOpKind::Not => Ok(Literal::Bool(!truthy(value))),
        UnaryOpKind::Invert => match as_int(value) {
            Some(n) => n
                .checked_add(1)
                .and_then(i64::checked_neg)
                .map(Literal::Int)
                .ok_or_else(overflow),
            None => Err(unevaluable("'~' takes an integer")),
        },
        UnaryOpKind::UAdd | UnaryOpKind::USub => match as_num(value) {
            Some(Num::Int(n)) => {
                if op == UnaryOpKind::UAdd {
                    Ok(Literal::Int(n))
                } else {
                    n.checked_neg().map(Literal::Int).ok_or_else(overflow)
                }
            }
            Some(Num::Float(f)) => {
                Ok(Literal::Float(if op == UnaryOpKind::UAdd { f } else { -f }))
            }
            None => Err(unevaluable(format!("bad operand for unary '{op}'"))),
        },
    }
}

fn binary(left: &Literal, op: BinOpKind, right: &Literal) -> Result<Literal, TranslationError> {
    use BinOpKind::*;

    match op {
        Add | Sub | Mult | Div | FloorDiv | Mod | Pow => {
            let (Some(left), Some(right)) = (as_num(left), as_num(right)) else {
                return Err(unevaluable(format!("bad operands for '{op}'")));
            };
            arithmetic(left, op, right)
        }
        LShift | RShift | BitOr | BitXor | BitAnd => {
            let (Some(left), Some(right)) = (as_int(left), as_int(right)) else {
                return Err(unevaluable(format!("'{op}' takes integers")));
            };
            integer_op(left, op, right)
        }
        MatMult => Err(unevaluable("'@' has no scalar meaning")),
    }
}

fn arithmetic(left: Num, op: BinOpKind, right: Num) -> Result<Literal, TranslationError> {
    use BinOpKind::*;

    // True division always happens in doubles, whatever the operands.
    if op == Div {
        let (a, b) = (to_f64(left), to_f64(right));
        if b == 0.0 {
            return Err(unevaluable("division by zero"));
        }
        return Ok(Literal::Float(a / b));
    }

    if let (Num::Int(a), Num::Int(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        return match op {
            Add => a.checked_add(b).map(Literal::Int).ok_or_else(overflow),
            Sub => a.checked_sub(b).map(Literal::Int).ok_or_else(overflow),
            Mult => a.checked_mul(b).map(Literal::Int).ok_or_else(overflow),
            FloorDiv => floor_div(a, b).map(Literal::Int),
            Mod => floor_mod(a, b).map(Literal::Int),
            Pow => int_pow(a, b),
            _ => Err(TranslationError::internal(format!("'{op}' is not arithmetic"))),
        };
    }

    let (a, b) = (to_f64(left), to_f64(right));
    match op {
        Add => Ok(Literal::Float(a + b)),
        Sub => Ok(Literal::Float(a - b)),
        Mult => Ok(Literal::Float(a * b)),
        FloorDiv => {
            if b == 0.0 {
                return Err(unevaluable("division by zero"));
            }
            Ok(Literal::Float((a / b).floor()))
        }
        Mod => {
            if b == 0.0 {
                return Err(unevaluable("division by zero"));
            }
            Ok(Literal::Float(a - (a / b).floor() * b))
        }
        Pow => Ok(Literal::Float(a.powf(b))),
        _ => Err(TranslationError::internal(format!("'{op}' is not arithmetic"))),
    }
}

fn to_f64(value: Num) -> f64 {
    match value {
        Num::Int(n) => n as f64,
        Num::Float(f) => f,
    }
}

/// Floor division with the host's rounding: toward negative infinity.
fn floor_div(a: i64, b: i64) -> Result<i64, TranslationError> {
    if b == 0 {
        return Err(unevaluable("division by zero"));
    }
    let quotient = a.checked_div(b).ok_or_else(overflow)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// The remainder matching [`floor_div`]: its sign follows the divisor.
fn floor_mod(a: i64, b: i64) -> Result<i64, TranslationError> {
    let quotient = floor_div(a, b)?;
    quotient.checked_mul(b).and_then(|q| a.checked_sub(q)).ok_or_else(overflow)
}

fn int_pow(base: i64, exp: i64) -> Result<Literal, TranslationError> {
    if exp < 0 {
        if base == 0 {
            return Err(unevaluable("zero to a negative power"));
        }
        return Ok(Literal::Float((base as f64).powf(exp as f64)));
    }
    let exp = u32::try_from(exp).map_err(|_| overflow())?;
    base.checked_pow(exp).map(Literal::Int).ok_or_else(overflow)
}

fn integer_op(a: i64, op: BinOpKind, b: i64) -> Result<Literal, TranslationError> {
    let value = match op {
        BinOpKind::LShift => {
            if b < 0 {
                return Err(unevaluable("negative shift count"));
            }
            let count = u32::try_from(b).map_err(|_| overflow())?;
            let shifted = a.checked_shl(count).ok_or_else(overflow)?;
            // checked_shl only checks the count; catch dropped bits too.
            if shifted >> count != a {
                return Err(overflow());
            }
            shifted
        }
        BinOpKind::RShift => {
            if b < 0 {
                return Err(unevaluable("negative shift count"));
            }
            match u32::try_from(b).ok().and_then(|count| a.checked_shr(count)) {
                Some(shifted) => shifted,
                // Shifting everything out leaves the sign.
                None => {
                    if a < 0 {
                        -1
                    } else {
                        0
                    }
                }
            }
        }
        BinOpKind::BitOr => a | b,
        BinOpKind::BitXor => a ^ b,
        BinOpKind::BitAnd => a & b,
        _ => return Err(TranslationError::internal(format!("'{op}' is not an integer op"))),
    };
    Ok(Literal::Int(value))
}

/// `and`/`or` evaluate to the deciding operand, the host way. `None`
/// only for a degenerate empty operand list, which translation rejects
/// as a shape error anyway.
fn bool_chain(op: BoolOpKind, values: &[&Literal]) -> Option<Literal> {
    let decided = match op {
        BoolOpKind::And => values.iter().find(|value| !truthy(value)),
        BoolOpKind::Or => values.iter().find(|value| truthy(value)),
    };
    decided.or_else(|| values.last()).map(|value| (**value).clone())
}

fn compare_chain(
    left: &Literal,
    ops: &[CompareOpKind],
    comparators: &[&Literal],
) -> Result<Literal, TranslationError> {
    let mut previous = left;
    for (op, next) in ops.iter().zip(comparators.iter().copied()) {
        if !compare(previous, *op, next)? {
            return Ok(Literal::Bool(false));
        }
        previous = next;
    }
    Ok(Literal::Bool(true))
}

fn compare(left: &Literal, op: CompareOpKind, right: &Literal) -> Result<bool, TranslationError> {
    use CompareOpKind::*;

    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        let (a, b) = (to_f64(a), to_f64(b));
        return Ok(match op {
            Eq => a == b,
            NotEq => a != b,
            Lt => a < b,
            LtE => a <= b,
            Gt => a > b,
            GtE => a >= b,
        });
    }

    // Equality across non-numeric kinds follows the host: distinct
    // kinds are simply unequal.
    match op {
        Eq | NotEq => {
            let equal = match (left, right) {
                (Literal::Str(a), Literal::Str(b)) => a == b,
                (Literal::None, Literal::None) => true,
                _ => false,
            };
            Ok(if op == Eq { equal } else { !equal })
        }
        _ => Err(unevaluable(format!("'{op}' needs numeric operands"))),
    }
}
