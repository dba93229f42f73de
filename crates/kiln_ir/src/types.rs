//! Hardware type descriptors for ports and signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a port or signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// An unsigned bit vector.
    UInt {
        /// Number of bits.
        width: u32,
    },
    /// A two's complement signed bit vector.
    SInt {
        /// Number of bits.
        width: u32,
    },
    /// A clock signal.
    Clock,
    /// A synchronous reset.
    Reset,
    /// An asynchronous reset.
    AsyncReset,
}

impl Type {
    /// Shorthand for an unsigned vector of `width` bits.
    pub const fn uint(width: u32) -> Self {
        Type::UInt { width }
    }

    /// Shorthand for a signed vector of `width` bits.
    pub const fn sint(width: u32) -> Self {
        Type::SInt { width }
    }

    /// A single-bit unsigned value.
    pub const BOOL: Type = Type::UInt { width: 1 };

    /// Returns the number of bits this type occupies.
    pub fn width(self) -> u32 {
        match self {
            Type::UInt { width } | Type::SInt { width } => width,
            Type::Clock | Type::Reset | Type::AsyncReset => 1,
        }
    }

    /// Returns `true` for [`Type::Clock`].
    pub fn is_clock(self) -> bool {
        self == Type::Clock
    }

    /// Returns `true` for anything that can reset a register: either reset
    /// type or a single-bit unsigned value.
    pub fn is_reset(self) -> bool {
        matches!(self, Type::Reset | Type::AsyncReset | Type::UInt { width: 1 })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::UInt { width } => write!(f, "UInt<{width}>"),
            Type::SInt { width } => write!(f, "SInt<{width}>"),
            Type::Clock => write!(f, "Clock"),
            Type::Reset => write!(f, "Reset"),
            Type::AsyncReset => write!(f, "AsyncReset"),
        }
    }
}
