//! Neighbor-iteration translation: sparse fills, reductions, location
//! qualifiers and index fields, end to end through the pipeline.

mod common;

use common::*;
use sirocco_core::ast::BinOpKind;
use sirocco_ir as ir;
use sirocco_ir::{
    FieldAccessExpr, HorizontalOffset, LocationType::Cell, LocationType::Edge,
    LocationType::Vertex, ReductionOp,
};

fn only_region(stencil: &ir::Stencil) -> &ir::VerticalRegionStmt {
    let [ir::Stmt::VerticalRegion(region)] = stencil.body.statements.as_slice() else {
        panic!("expected one vertical region in '{}'", stencil.name);
    };
    region
}

fn only_assignment(block: &ir::BlockStmt) -> (&ir::Expr, &ir::Expr) {
    let [ir::Stmt::Assignment { target, value }] = block.statements.as_slice() else {
        panic!("expected one assignment, got {:?}", block.statements);
    };
    (target, value)
}

fn access(expr: &ir::Expr) -> &FieldAccessExpr {
    let ir::Expr::FieldAccess(access) = expr else {
        panic!("expected a field access, got {expr:?}");
    };
    access
}

fn reduction(expr: &ir::Expr) -> &ir::ReductionExpr {
    let ir::Expr::Reduction(reduction) = expr else {
        panic!("expected a reduction, got {expr:?}");
    };
    reduction
}

#[test]
fn sparse_fills_assign_every_neighbor_slot() {
    let def = stencil(
        "filled",
        vec![
            sparse_param("s", "Edge", &["Cell"]),
            dense_param("a", "Edge"),
            dense_param("v", "Cell"),
        ],
        vec![upward_region(vec![sparse_fill(
            chain("Edge", &["Cell"]),
            vec![assign(name("s"), binop(name("a"), BinOpKind::Mult, name("v")))],
        )])],
    );
    let stencil = translated(&def);

    let region = only_region(&stencil);
    let [ir::Stmt::Loop(fill)] = region.body.statements.as_slice() else {
        panic!("expected one sparse fill");
    };
    assert_eq!(fill.chain, vec![Edge, Cell]);

    let (target, value) = only_assignment(&fill.body);
    assert_eq!(access(target).horizontal, HorizontalOffset::Neighbor, "sparse write");
    let ir::Expr::Binary { left, right, .. } = value else { panic!("expected a product") };
    assert_eq!(access(left).horizontal, HorizontalOffset::Center, "'a' sits on the walk source");
    assert_eq!(access(right).horizontal, HorizontalOffset::Neighbor, "'v' ends the chain");
}

#[test]
fn reductions_default_to_a_double_zero_init() {
    let def = stencil(
        "summed",
        vec![dense_param("out", "Edge"), sparse_param("s", "Edge", &["Cell"])],
        vec![upward_region(vec![assign(
            name("out"),
            call("sum_over", vec![chain("Edge", &["Cell"]), name("s")]),
        )])],
    );
    let stencil = translated(&def);

    let (_, value) = only_assignment(&only_region(&stencil).body);
    let reduction = reduction(value);
    assert_eq!(reduction.op, ReductionOp::Sum);
    assert_eq!(reduction.chain, vec![Edge, Cell]);
    assert_eq!(*reduction.init, ir::Expr::double(0.0));
    assert_eq!(reduction.weights, None);
    assert_eq!(access(&reduction.expr).horizontal, HorizontalOffset::Neighbor);
}

#[test]
fn ambiguous_chains_demand_explicit_qualifiers() {
    let unqualified = stencil(
        "ambiguous",
        vec![dense_param("out", "Edge"), dense_param("a", "Edge")],
        vec![upward_region(vec![assign(
            name("out"),
            call("sum_over", vec![chain("Edge", &["Cell", "Edge"]), name("a")]),
        )])],
    );
    let error = translate(&unqualified).unwrap_err();
    assert_semantic(&error, "ambiguous");

    let qualified = stencil(
        "disambiguated",
        vec![dense_param("out", "Edge"), dense_param("a", "Edge")],
        vec![upward_region(vec![assign(
            name("out"),
            call(
                "sum_over",
                vec![chain("Edge", &["Cell", "Edge"]), subscript(name("a"), name("Edge"))],
            ),
        )])],
    );
    let stencil = translated(&qualified);
    let (_, value) = only_assignment(&only_region(&stencil).body);
    assert_eq!(access(&reduction(value).expr).horizontal, HorizontalOffset::Center);
}

#[test]
fn whole_chain_qualifiers_read_the_neighbor_slot() {
    let def = stencil(
        "walked",
        vec![dense_param("out", "Edge"), dense_param("b", "Edge")],
        vec![upward_region(vec![assign(
            name("out"),
            call(
                "sum_over",
                vec![
                    chain("Edge", &["Cell", "Edge"]),
                    subscript(
                        name("b"),
                        tuple(vec![
                            chain("Edge", &["Cell", "Edge"]),
                            binop(name("k"), BinOpKind::Add, int(1)),
                        ]),
                    ),
                ],
            ),
        )])],
    );
    let stencil = translated(&def);

    let (_, value) = only_assignment(&only_region(&stencil).body);
    let inner = access(&reduction(value).expr);
    assert_eq!(inner.horizontal, HorizontalOffset::Neighbor);
    assert_eq!(inner.vertical_offset, 1);
}

#[test]
fn index_fields_redirect_the_vertical_axis() {
    let def = stencil(
        "redirected",
        vec![
            dense_param("out", "Edge"),
            dense_param("b", "Edge"),
            index_param("idx", "Edge"),
        ],
        vec![upward_region(vec![assign(
            name("out"),
            subscript(name("b"), binop(name("idx"), BinOpKind::Sub, int(1))),
        )])],
    );
    let stencil = translated(&def);

    let idx = stencil.fields.iter().find(|f| f.name == "idx").expect("idx is registered");
    assert_eq!(idx.kind, ir::FieldKind::Index);

    let (_, value) = only_assignment(&only_region(&stencil).body);
    let access = access(value);
    assert_eq!(access.vertical_indirection.as_deref(), Some("idx"));
    assert_eq!(access.vertical_offset, -1);
}

#[test]
fn weighted_reductions_translate_init_and_weights() {
    let def = stencil(
        "weighted",
        vec![
            dense_param("out", "Edge"),
            sparse_param("s", "Edge", &["Cell"]),
            dense_param("b", "Edge"),
        ],
        vec![upward_region(vec![assign(
            name("out"),
            call_kw(
                "sum_over",
                vec![chain("Edge", &["Cell"]), name("s")],
                vec![("init", name("b")), ("weights", list(vec![name("s"), float(2.0)]))],
            ),
        )])],
    );
    let stencil = translated(&def);

    let (_, value) = only_assignment(&only_region(&stencil).body);
    let reduction = reduction(value);
    assert_eq!(access(&reduction.init).name, "b");
    let weights = reduction.weights.as_deref().expect("weights were given");
    assert_eq!(weights.len(), 2);
    assert_eq!(access(&weights[0]).horizontal, HorizontalOffset::Neighbor);
    assert_eq!(weights[1], ir::Expr::double(2.0));
}

#[test]
fn reduce_over_takes_its_operator_by_name() {
    for (op_name, expected) in
        [("sum", ReductionOp::Sum), ("mul", ReductionOp::Mul), ("min", ReductionOp::Min)]
    {
        let def = stencil(
            "reduced",
            vec![dense_param("out", "Edge"), sparse_param("s", "Edge", &["Cell"])],
            vec![upward_region(vec![assign(
                name("out"),
                call("reduce_over", vec![chain("Edge", &["Cell"]), name("s"), name(op_name)]),
            )])],
        );
        let stencil = translated(&def);
        let (_, value) = only_assignment(&only_region(&stencil).body);
        assert_eq!(reduction(value).op, expected, "operator '{op_name}'");
    }
}

#[test]
fn reductions_nest_inside_sparse_fills() {
    let def = stencil(
        "gathered",
        vec![
            sparse_param("s", "Edge", &["Cell"]),
            sparse_param("cv", "Cell", &["Vertex"]),
        ],
        vec![upward_region(vec![sparse_fill(
            chain("Edge", &["Cell"]),
            vec![assign(
                name("s"),
                call("max_over", vec![chain("Cell", &["Vertex"]), name("cv")]),
            )],
        )])],
    );
    let stencil = translated(&def);

    let region = only_region(&stencil);
    let [ir::Stmt::Loop(fill)] = region.body.statements.as_slice() else {
        panic!("expected one sparse fill");
    };
    let (target, value) = only_assignment(&fill.body);
    assert_eq!(access(target).horizontal, HorizontalOffset::Neighbor);
    let inner = reduction(value);
    assert_eq!(inner.chain, vec![Cell, Vertex]);
    assert_eq!(access(&inner.expr).horizontal, HorizontalOffset::Neighbor);
}

#[test]
fn neighbor_iterations_stay_inside_vertical_regions() {
    let top_level_fill = stencil(
        "loose_fill",
        vec![sparse_param("s", "Edge", &["Cell"])],
        vec![sparse_fill(chain("Edge", &["Cell"]), vec![assign(name("s"), float(0.0))])],
    );
    assert_semantic(&translate(&top_level_fill).unwrap_err(), "vertical region");

    let nested_fill = stencil(
        "double_fill",
        vec![sparse_param("s", "Edge", &["Cell"])],
        vec![upward_region(vec![sparse_fill(
            chain("Edge", &["Cell"]),
            vec![sparse_fill(
                chain("Cell", &["Vertex"]),
                vec![assign(name("s"), float(0.0))],
            )],
        )])],
    );
    assert_semantic(&translate(&nested_fill).unwrap_err(), "nested");

    let short_chain = stencil(
        "short_chain",
        vec![dense_param("out", "Edge"), sparse_param("s", "Edge", &["Cell"])],
        vec![upward_region(vec![assign(
            name("out"),
            call("sum_over", vec![name("Edge"), name("s")]),
        )])],
    );
    assert_semantic(&translate(&short_chain).unwrap_err(), "at least two locations");
}
