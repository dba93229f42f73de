//! Source expressions of connections.
//!
//! Every node carries its result width, computed once during elaboration so
//! consumers never need type inference.

use crate::signal::SignalRef;
use serde::{Deserialize, Serialize};

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT.
    Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition, one bit wider than the widest operand.
    Add,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Equality comparison, single bit result.
    Eq,
}

impl BinaryOp {
    /// The mnemonic used by the printer.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Eq => "eq",
        }
    }

    /// Result width for operands of the given widths.
    pub fn result_width(self, lhs: u32, rhs: u32) -> u32 {
        match self {
            BinaryOp::Add => lhs.max(rhs) + 1,
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => lhs.max(rhs),
            BinaryOp::Eq => 1,
        }
    }
}

/// An expression driving a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// An unsigned constant.
    Literal {
        /// The value; only the low `width` bits are meaningful.
        value: u128,
        /// The literal's width.
        width: u32,
    },
    /// A reference to a port, signal or instance port of the same module.
    Ref {
        /// The referenced signal.
        target: SignalRef,
        /// Width of the referenced signal.
        width: u32,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// The result width.
        width: u32,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left-hand side.
        lhs: Box<Expr>,
        /// The right-hand side.
        rhs: Box<Expr>,
        /// The result width.
        width: u32,
    },
    /// Two-way multiplexer.
    Mux {
        /// Single-bit select.
        cond: Box<Expr>,
        /// Value when `cond` is 1.
        then: Box<Expr>,
        /// Value when `cond` is 0.
        otherwise: Box<Expr>,
        /// The result width.
        width: u32,
    },
}

impl Expr {
    /// Creates a literal of an explicit width.
    pub fn literal(value: u128, width: u32) -> Self {
        Expr::Literal { value, width }
    }

    /// Returns the result width of this expression.
    pub fn width(&self) -> u32 {
        match self {
            Expr::Literal { width, .. }
            | Expr::Ref { width, .. }
            | Expr::Unary { width, .. }
            | Expr::Binary { width, .. }
            | Expr::Mux { width, .. } => *width,
        }
    }

    /// Visits every signal reference in the expression, left to right.
    pub fn for_each_ref(&self, f: &mut impl FnMut(&SignalRef)) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Ref { target, .. } => f(target),
            Expr::Unary { operand, .. } => operand.for_each_ref(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_ref(f);
                rhs.for_each_ref(f);
            }
            Expr::Mux {
                cond,
                then,
                otherwise,
                ..
            } => {
                cond.for_each_ref(f);
                then.for_each_ref(f);
                otherwise.for_each_ref(f);
            }
        }
    }
}
