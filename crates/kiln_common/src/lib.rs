//! Shared foundational types used across the Kiln elaboration workspace.
//!
//! This crate provides interned identifiers, content hashing for definition
//! keys, caller source locations, and the internal error type.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod loc;
pub mod result;

pub use hash::{ContentHash, ContentHasher};
pub use ident::{Ident, Interner};
pub use loc::SourceLoc;
pub use result::{InternalError, KilnResult};
