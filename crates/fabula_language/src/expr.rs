//! Typed expression trees and the shared arithmetic they evaluate with.
//!
//! The compiler folds constants with the same [`apply_unary`] and
//! [`apply_binary`] used by the interpreter, so a folded expression can
//! never disagree with an evaluated one.

use fabula_foundation::{FuncId, GlobalId, MapId, PropId, TypeId, Value};

use crate::intrinsics::Intrinsic;

/// Prefix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation; any non-zero operand is true.
    Not,
    /// Arithmetic negation, wrapping.
    Neg,
}

impl UnaryOp {
    /// Source spelling.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// Infix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Source spelling.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// A compiled expression.
///
/// Every named constant the compiler resolves (enum members, item
/// references, function references, `null`, folded arithmetic) becomes
/// a [`Expr::Literal`] carrying its type, so the interpreter never sees
/// a name.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A known value of a known type.
    Literal { value: Value, ty: TypeId },
    /// A frame slot.
    Local { slot: usize, ty: TypeId, name: String },
    /// A mutable story global.
    Global { id: GlobalId, ty: TypeId },
    /// `target.property` on an item-typed expression.
    Property {
        target: Box<Expr>,
        prop: PropId,
        ty: TypeId,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `cond ? then : otherwise`, lazily evaluated.
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        ty: TypeId,
    },
    /// Direct call of a story function.
    Call {
        func: FuncId,
        args: Vec<Expr>,
        ty: TypeId,
    },
    /// Call through a delegate-typed value; the null delegate is a no-op.
    CallDelegate {
        target: Box<Expr>,
        args: Vec<Expr>,
        ty: TypeId,
    },
    /// Total lookup in a compiled `map` table.
    CallMap {
        map: MapId,
        arg: Box<Expr>,
        ty: TypeId,
    },
    /// Call of an engine-provided function.
    CallIntrinsic {
        intrinsic: Intrinsic,
        args: Vec<Expr>,
    },
    /// A text template; holes interpolate at evaluation time.
    Template { parts: Vec<TemplatePart> },
}

/// One piece of a text template.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplatePart {
    /// Literal text, escapes already decoded.
    Text(String),
    /// A `{...}` interpolation.
    Hole(Expr),
}

impl Expr {
    /// The static type of this expression.
    #[must_use]
    pub fn ty(&self) -> TypeId {
        match self {
            Expr::Literal { ty, .. }
            | Expr::Local { ty, .. }
            | Expr::Global { ty, .. }
            | Expr::Property { ty, .. }
            | Expr::Ternary { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::CallDelegate { ty, .. }
            | Expr::CallMap { ty, .. } => *ty,
            Expr::Unary { op: UnaryOp::Not, .. } => TypeId::BOOL,
            Expr::Unary { op: UnaryOp::Neg, .. } => TypeId::INT,
            Expr::Binary { op, .. } => match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                    TypeId::INT
                }
                _ => TypeId::BOOL,
            },
            Expr::CallIntrinsic { intrinsic, .. } => intrinsic.ret(),
            Expr::Template { .. } => TypeId::STRING,
        }
    }

    /// The folded value, when the compiler reduced this to a literal.
    #[must_use]
    pub fn as_constant(&self) -> Option<(Value, TypeId)> {
        match self {
            Expr::Literal { value, ty } => Some((*value, *ty)),
            _ => None,
        }
    }

    /// Whether assignment may target this expression.
    #[must_use]
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self,
            Expr::Local { .. } | Expr::Global { .. } | Expr::Property { .. }
        )
    }

    /// Whether evaluating this expression can change the world. Used to
    /// reject expression statements that compute and then discard.
    #[must_use]
    pub fn has_effect(&self) -> bool {
        match self {
            Expr::Call { .. } | Expr::CallDelegate { .. } => true,
            Expr::CallIntrinsic { intrinsic, .. } => intrinsic.has_effect(),
            Expr::Literal { .. } | Expr::Local { .. } | Expr::Global { .. } => false,
            Expr::Property { target, .. } => target.has_effect(),
            Expr::Unary { operand, .. } => operand.has_effect(),
            Expr::Binary { lhs, rhs, .. } => lhs.has_effect() || rhs.has_effect(),
            Expr::Ternary {
                cond,
                then,
                otherwise,
                ..
            } => cond.has_effect() || then.has_effect() || otherwise.has_effect(),
            Expr::CallMap { arg, .. } => arg.has_effect(),
            Expr::Template { parts } => parts
                .iter()
                .any(|part| matches!(part, TemplatePart::Hole(expr) if expr.has_effect())),
        }
    }
}

/// Applies a prefix operator. Negation wraps at the i64 boundary.
#[must_use]
pub fn apply_unary(op: UnaryOp, operand: Value) -> Value {
    match op {
        UnaryOp::Not => Value::from(!operand.truthy()),
        UnaryOp::Neg => Value::new(operand.raw().wrapping_neg()),
    }
}

/// Applies an infix operator. Total: arithmetic wraps, division and
/// remainder by zero yield 0.
#[must_use]
pub fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Value {
    let (a, b) = (lhs.raw(), rhs.raw());
    match op {
        BinaryOp::Add => Value::new(a.wrapping_add(b)),
        BinaryOp::Sub => Value::new(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::new(a.wrapping_mul(b)),
        BinaryOp::Div => Value::new(a.checked_div(b).unwrap_or(0)),
        BinaryOp::Rem => Value::new(a.checked_rem(b).unwrap_or(0)),
        BinaryOp::Eq => Value::from(a == b),
        BinaryOp::Ne => Value::from(a != b),
        BinaryOp::Lt => Value::from(a < b),
        BinaryOp::Le => Value::from(a <= b),
        BinaryOp::Gt => Value::from(a > b),
        BinaryOp::Ge => Value::from(a >= b),
        BinaryOp::And => Value::from(lhs.truthy() && rhs.truthy()),
        BinaryOp::Or => Value::from(lhs.truthy() || rhs.truthy()),
    }
}
