//! Typed IR nodes produced by stencil translation.
//!
//! The node inventory is deliberately closed: a backend that matches on
//! these enums exhaustively is guaranteed to handle everything the front
//! end can emit. Structural well-formedness (offset flags, concrete
//! interval bounds, resolved names) is the front end's responsibility;
//! dimensionality checking between fields and neighbor chains is the
//! backend's.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Locations ───────────────────────────────────────────────────────

/// An unstructured-mesh entity kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocationType {
    Vertex,
    Edge,
    Cell,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::Vertex => write!(f, "Vertex"),
            LocationType::Edge => write!(f, "Edge"),
            LocationType::Cell => write!(f, "Cell"),
        }
    }
}

/// An ordered neighbor walk (length >1) or a dense horizontal shape
/// (length 1).
pub type LocationChain = Vec<LocationType>;

/// A chain whose first and last entries coincide is ambiguous: an
/// unqualified access to a dense field on that location could mean
/// either the walk's source entity or the current neighbor.
pub fn chain_is_ambiguous(chain: &[LocationType]) -> bool {
    chain.len() > 1 && chain.first() == chain.last()
}

/// Renders a chain the way the surface syntax spells it, e.g.
/// `Edge > Cell > Vertex`.
pub fn chain_to_string(chain: &[LocationType]) -> String {
    let parts: Vec<String> = chain.iter().map(|l| l.to_string()).collect();
    parts.join(" > ")
}

// ── Fields ──────────────────────────────────────────────────────────

/// Whether a field stores data values or integer level indices used for
/// vertical indirection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldKind {
    Data,
    Index,
}

/// Horizontal and vertical extent of a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDimensions {
    /// `None` for a purely vertical field.
    pub horizontal: Option<LocationChain>,
    /// Whether the field spans the column dimension.
    pub vertical: bool,
}

impl FieldDimensions {
    /// One value per neighbor slot rather than per entity.
    pub fn is_sparse(&self) -> bool {
        matches!(&self.horizontal, Some(chain) if chain.len() > 1)
    }
}

/// A stencil field: an API parameter or a translation-introduced
/// temporary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dimensions: FieldDimensions,
    pub is_temporary: bool,
    pub kind: FieldKind,
}

// ── Vertical intervals ──────────────────────────────────────────────

/// Which end of the column an interval bound is anchored at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LevelAnchor {
    Start,
    End,
}

/// One interval bound. `offset` is a non-negative magnitude measured
/// from the anchor toward the domain interior: `(Start, 5)` is five
/// levels above the bottom, `(End, 3)` three levels below the top.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bound {
    pub anchor: LevelAnchor,
    pub offset: i64,
}

/// An end-inclusive vertical iteration range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub lower: Bound,
    pub upper: Bound,
}

impl Interval {
    /// The whole column.
    pub fn full() -> Self {
        Interval {
            lower: Bound { anchor: LevelAnchor::Start, offset: 0 },
            upper: Bound { anchor: LevelAnchor::End, offset: 0 },
        }
    }
}

/// Column traversal direction of a vertical region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerticalOrder {
    Forward,
    Backward,
}

// ── Operators ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{symbol}")
    }
}

/// Arithmetic, shift, bitwise, boolean and comparison operators share
/// one binary node; the backend dispatches on the tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

/// The fixed math intrinsic vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MathFunction {
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    Abs,
    Floor,
    Ceil,
    Isinf,
    Isnan,
    Min,
    Max,
    Pow,
}

impl MathFunction {
    /// Number of arguments the intrinsic takes.
    pub fn arity(self) -> usize {
        match self {
            MathFunction::Min | MathFunction::Max | MathFunction::Pow => 2,
            _ => 1,
        }
    }

    /// The surface spelling, also used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            MathFunction::Sqrt => "sqrt",
            MathFunction::Exp => "exp",
            MathFunction::Log => "log",
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Arcsin => "arcsin",
            MathFunction::Arccos => "arccos",
            MathFunction::Arctan => "arctan",
            MathFunction::Abs => "abs",
            MathFunction::Floor => "floor",
            MathFunction::Ceil => "ceil",
            MathFunction::Isinf => "isinf",
            MathFunction::Isnan => "isnan",
            MathFunction::Min => "min",
            MathFunction::Max => "max",
            MathFunction::Pow => "pow",
        }
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Combining operator of a neighbor reduction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReductionOp {
    Sum,
    Mul,
    Min,
    Max,
}

// ── Expressions ─────────────────────────────────────────────────────

/// The three scalar kinds the language knows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
}

/// Whether a field access inside a neighbor iteration targets the
/// per-neighbor slot or the walk's source entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HorizontalOffset {
    Center,
    Neighbor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),
    /// A scalar variable; `is_external` marks a captured global.
    VarAccess { name: String, is_external: bool },
    FieldAccess(FieldAccessExpr),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    MathCall {
        function: MathFunction,
        args: Vec<Expr>,
    },
    Reduction(ReductionExpr),
}

/// A field read or write site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldAccessExpr {
    pub name: String,
    pub horizontal: HorizontalOffset,
    /// Relative level offset against the iteration variable, or against
    /// the indirection field's stored level when one is present.
    pub vertical_offset: i64,
    /// Name of the index field supplying the absolute level, if any.
    pub vertical_indirection: Option<String>,
}

/// A reduction over the neighbors reached by `chain`. `weights`, when
/// present, multiplies each neighbor's contribution; its length is not
/// checked against the chain here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReductionExpr {
    pub op: ReductionOp,
    pub expr: Box<Expr>,
    pub init: Box<Expr>,
    pub chain: LocationChain,
    pub weights: Option<Vec<Expr>>,
}

impl Expr {
    pub fn boolean(value: bool) -> Expr {
        Expr::Literal(LiteralValue::Boolean(value))
    }

    pub fn integer(value: i64) -> Expr {
        Expr::Literal(LiteralValue::Integer(value))
    }

    pub fn double(value: f64) -> Expr {
        Expr::Literal(LiteralValue::Double(value))
    }
}

// ── Statements ──────────────────────────────────────────────────────

/// An ordered statement body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
}

impl BlockStmt {
    pub fn new(statements: Vec<Stmt>) -> Self {
        BlockStmt { statements }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Stmt {
    Assignment {
        target: Expr,
        value: Expr,
    },
    If {
        condition: Expr,
        then_body: BlockStmt,
        else_body: Option<BlockStmt>,
    },
    VerticalRegion(VerticalRegionStmt),
    Loop(LoopStmt),
}

/// A bounded, ordered iteration over column levels. At most one is
/// active at a time; regions never nest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerticalRegionStmt {
    pub interval: Interval,
    pub order: VerticalOrder,
    pub body: BlockStmt,
}

/// A sparse fill: the body runs once per neighbor reached by `chain`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopStmt {
    pub chain: LocationChain,
    pub body: BlockStmt,
}

// ── Translation unit ────────────────────────────────────────────────

/// Mesh kind the unit was translated for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GridType {
    /// The only kind this front end emits.
    Unstructured,
    /// Reserved by the interchange format for regular-grid producers.
    Cartesian,
}

/// One translated stencil: name, declared fields in declaration order
/// (API parameters first, then temporaries), and the statement body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stencil {
    pub name: String,
    pub fields: Vec<Field>,
    pub body: BlockStmt,
}

/// Referenced globals, keyed by declared name. Values are placeholders
/// the embedding runtime fills in before execution.
pub type GlobalVariableMap = BTreeMap<String, LiteralValue>;

/// Everything the front end produces for one source module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationUnit {
    pub filename: String,
    pub grid_type: GridType,
    pub stencils: Vec<Stencil>,
    pub globals: GlobalVariableMap,
}
