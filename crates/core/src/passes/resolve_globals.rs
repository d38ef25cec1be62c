//! Collects the externally supplied scalars a stencil reads.

use sirocco_ir::{GlobalVariableMap, LiteralValue};

use crate::ast::{Decl, ExprKind, FunctionDef};

/// Records every referenced global under its *declared* name. The
/// placeholder value is overwritten by the embedder when it binds real
/// values; translation only establishes the key set.
pub fn resolve_globals(def: &FunctionDef, globals: &mut GlobalVariableMap) {
    def.walk_exprs(&mut |node| {
        if let ExprKind::Name { decl: Some(Decl::Global(declared)), .. } = &node.kind {
            globals.entry(declared.clone()).or_insert(LiteralValue::Double(0.0));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Span, Stmt, StmtKind};

    #[test]
    fn globals_are_collected_under_their_declared_names() {
        let global_ref = Expr::new(
            ExprKind::Name {
                id: "g".to_string(),
                decl: Some(Decl::Global("gravity".to_string())),
            },
            Span::default(),
        );
        let target = Expr::new(
            ExprKind::Name { id: "out".to_string(), decl: Some(Decl::Field) },
            Span::default(),
        );
        let def = FunctionDef {
            name: "uses_global".to_string(),
            params: vec![],
            body: vec![Stmt::new(
                StmtKind::Assign { target, value: global_ref },
                Span::default(),
            )],
            decorators: vec![],
            span: Span::default(),
        };

        let mut globals = GlobalVariableMap::new();
        resolve_globals(&def, &mut globals);
        assert_eq!(globals.get("gravity"), Some(&LiteralValue::Double(0.0)));
        assert!(!globals.contains_key("g"));
    }
}
