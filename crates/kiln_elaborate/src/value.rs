//! Signal handles and the expression builder used as connection sources.
//!
//! A [`Value`] is built with ordinary Rust operators and only checked when
//! it is lowered to a [`kiln_ir::Expr`] by
//! [`connect`](crate::ElabContext::connect).

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not};

use kiln_ir::{BinaryOp, Expr, SignalRef, Type, UnaryOp};

use crate::errors::{ElabError, ElabResult};
use crate::record::ModuleHandle;

/// A port, wire, register or instance port of one specific module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalHandle {
    pub(crate) owner: ModuleHandle,
    pub(crate) target: SignalRef,
    pub(crate) ty: Type,
    pub(crate) name: String,
}

impl SignalHandle {
    /// The module the handle can be used in.
    pub fn owner(&self) -> ModuleHandle {
        self.owner
    }

    /// The referenced signal, relative to its owner.
    pub fn target(&self) -> SignalRef {
        self.target
    }

    /// The signal's type.
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// The signal's width in bits.
    pub fn width(&self) -> u32 {
        self.ty.width()
    }

    /// The signal's name; instance ports read `inst.port`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds an equality comparison.
    pub fn equals(&self, rhs: impl Into<Value>) -> Value {
        Value::from(self).equals(rhs)
    }
}

impl fmt::Display for SignalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An unchecked expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An unsigned constant of an explicit width.
    Lit {
        /// The value.
        value: u128,
        /// The width in bits.
        width: u32,
    },
    /// A signal reference.
    Signal(SignalHandle),
    /// Bitwise NOT.
    Not(Box<Value>),
    /// A binary operation.
    Binary(BinaryOp, Box<Value>, Box<Value>),
    /// `cond ? then : otherwise`.
    Mux(Box<Value>, Box<Value>, Box<Value>),
}

impl Value {
    /// A constant of an explicit width.
    ///
    /// The value must fit in `width` bits and `width` must be at least 1;
    /// both are checked when the value is connected.
    pub fn lit(value: u128, width: u32) -> Self {
        Value::Lit { value, width }
    }

    /// A constant of the smallest width that holds `value` (at least 1).
    pub fn uint(value: u128) -> Self {
        let width = (128 - value.leading_zeros()).max(1);
        Value::Lit { value, width }
    }

    /// Builds an equality comparison.
    pub fn equals(self, rhs: impl Into<Value>) -> Value {
        Value::Binary(BinaryOp::Eq, Box::new(self), Box::new(rhs.into()))
    }

    /// Builds a two-way multiplexer.
    pub fn mux(cond: impl Into<Value>, then: impl Into<Value>, otherwise: impl Into<Value>) -> Value {
        Value::Mux(
            Box::new(cond.into()),
            Box::new(then.into()),
            Box::new(otherwise.into()),
        )
    }

    /// Result width after lowering.
    pub fn width(&self) -> u32 {
        match self {
            Value::Lit { width, .. } => *width,
            Value::Signal(h) => h.width(),
            Value::Not(v) => v.width(),
            Value::Binary(op, lhs, rhs) => op.result_width(lhs.width(), rhs.width()),
            Value::Mux(_, then, otherwise) => then.width().max(otherwise.width()),
        }
    }

    /// Lowers the tree for use inside the module `owner` (named `module`),
    /// rejecting signals of any other module.
    pub(crate) fn lower(&self, owner: ModuleHandle, module: &str) -> ElabResult<Expr> {
        let expr = match self {
            Value::Lit { value, width } => {
                if *width == 0 || value.checked_shr(*width).unwrap_or(0) != 0 {
                    return Err(ElabError::LiteralWidth {
                        module: module.to_string(),
                        value: *value,
                        width: *width,
                    });
                }
                Expr::literal(*value, *width)
            }
            Value::Signal(h) => {
                if h.owner != owner {
                    return Err(ElabError::OutOfScope {
                        module: module.to_string(),
                        signal: h.name.clone(),
                    });
                }
                Expr::Ref {
                    target: h.target,
                    width: h.width(),
                }
            }
            Value::Not(v) => {
                let operand = v.lower(owner, module)?;
                let width = operand.width();
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    width,
                }
            }
            Value::Binary(op, lhs, rhs) => {
                let lhs = lhs.lower(owner, module)?;
                let rhs = rhs.lower(owner, module)?;
                let width = op.result_width(lhs.width(), rhs.width());
                Expr::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    width,
                }
            }
            Value::Mux(cond, then, otherwise) => {
                let cond = cond.lower(owner, module)?;
                let then = then.lower(owner, module)?;
                let otherwise = otherwise.lower(owner, module)?;
                let width = then.width().max(otherwise.width());
                Expr::Mux {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                    width,
                }
            }
        };
        Ok(expr)
    }
}

impl From<SignalHandle> for Value {
    fn from(h: SignalHandle) -> Self {
        Value::Signal(h)
    }
}

impl From<&SignalHandle> for Value {
    fn from(h: &SignalHandle) -> Self {
        Value::Signal(h.clone())
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Value {
        Value::Not(Box::new(self))
    }
}

impl Not for &SignalHandle {
    type Output = Value;

    fn not(self) -> Value {
        !Value::from(self)
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Value>> $trait<R> for Value {
            type Output = Value;

            fn $method(self, rhs: R) -> Value {
                Value::Binary($op, Box::new(self), Box::new(rhs.into()))
            }
        }

        impl<R: Into<Value>> $trait<R> for &SignalHandle {
            type Output = Value;

            fn $method(self, rhs: R) -> Value {
                Value::Binary($op, Box::new(Value::from(self)), Box::new(rhs.into()))
            }
        }
    };
}

binary_op!(Add, add, BinaryOp::Add);
binary_op!(BitAnd, bitand, BinaryOp::And);
binary_op!(BitOr, bitor, BinaryOp::Or);
binary_op!(BitXor, bitxor, BinaryOp::Xor);
