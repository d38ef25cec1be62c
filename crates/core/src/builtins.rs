//! The stencil language's built-in vocabulary.
//!
//! These names sit at the bottom of every scope chain, so stencil code
//! can shadow them and embedding code can rebind them under other
//! names. All dispatch on vocabulary goes through the resolved
//! [`Builtin`] value, never through the spelled identifier.

use indexmap::IndexMap;
use sirocco_ir::{LocationType, MathFunction};

use crate::ast::Decl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Data field type constructor, `Field[...]`.
    Field,
    /// Level-index field type constructor, `IndexField[...]`.
    IndexField,
    /// The vertical dimension marker inside field types.
    K,
    /// A mesh entity kind, usable in field types and neighbor chains.
    Location(LocationType),
    /// Vertical region head, bottom-up order.
    LevelsUpward,
    /// Vertical region head, top-down order.
    LevelsDownward,
    /// Sparse fill head.
    Sparse,
    /// General reduction, `reduce_over(chain, expr, op)`.
    ReduceOver,
    SumOver,
    MinOver,
    MaxOver,
    /// The host's summation name, valid as a reduction operator.
    Sum,
    /// Multiplication reduction operator.
    Mul,
    /// One of the math intrinsics, `sqrt` through `pow`.
    Math(MathFunction),
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Field => "Field",
            Builtin::IndexField => "IndexField",
            Builtin::K => "K",
            Builtin::Location(LocationType::Vertex) => "Vertex",
            Builtin::Location(LocationType::Edge) => "Edge",
            Builtin::Location(LocationType::Cell) => "Cell",
            Builtin::LevelsUpward => "levels_upward",
            Builtin::LevelsDownward => "levels_downward",
            Builtin::Sparse => "sparse",
            Builtin::ReduceOver => "reduce_over",
            Builtin::SumOver => "sum_over",
            Builtin::MinOver => "min_over",
            Builtin::MaxOver => "max_over",
            Builtin::Sum => "sum",
            Builtin::Mul => "mul",
            Builtin::Math(function) => function.name(),
        }
    }
}

const MATH_FUNCTIONS: [MathFunction; 17] = [
    MathFunction::Sqrt,
    MathFunction::Exp,
    MathFunction::Log,
    MathFunction::Sin,
    MathFunction::Cos,
    MathFunction::Tan,
    MathFunction::Arcsin,
    MathFunction::Arccos,
    MathFunction::Arctan,
    MathFunction::Abs,
    MathFunction::Floor,
    MathFunction::Ceil,
    MathFunction::Isinf,
    MathFunction::Isnan,
    MathFunction::Min,
    MathFunction::Max,
    MathFunction::Pow,
];

/// Every builtin, in a stable order.
pub fn vocabulary() -> impl Iterator<Item = Builtin> {
    const FIXED: [Builtin; 15] = [
        Builtin::Field,
        Builtin::IndexField,
        Builtin::K,
        Builtin::Location(LocationType::Vertex),
        Builtin::Location(LocationType::Edge),
        Builtin::Location(LocationType::Cell),
        Builtin::LevelsUpward,
        Builtin::LevelsDownward,
        Builtin::Sparse,
        Builtin::ReduceOver,
        Builtin::SumOver,
        Builtin::MinOver,
        Builtin::MaxOver,
        Builtin::Sum,
        Builtin::Mul,
    ];
    FIXED.into_iter().chain(MATH_FUNCTIONS.into_iter().map(Builtin::Math))
}

/// The symbol table of the scope chain's builtin frame.
pub fn scope_symbols() -> IndexMap<String, Decl> {
    vocabulary()
        .map(|builtin| (builtin.name().to_string(), Decl::Builtin(builtin)))
        .collect()
}
