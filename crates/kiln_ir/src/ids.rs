//! Opaque ID newtypes for IR entities.
//!
//! Each ID is a `u32` position. Module IDs index the circuit; port, signal and
//! instance IDs are positions within their owning module.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` position.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// A completed module (definition) within a circuit.
    ModuleId
);

define_id!(
    /// A port's declaration position within its module.
    PortId
);

define_id!(
    /// A wire or register within a module.
    SignalId
);

define_id!(
    /// A child instance within its parent module.
    InstanceId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = ModuleId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(PortId::from_raw(1));
        set.insert(PortId::from_raw(2));
        set.insert(PortId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_ordering_follows_position() {
        assert!(InstanceId::from_raw(0) < InstanceId::from_raw(1));
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = SignalId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: SignalId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
