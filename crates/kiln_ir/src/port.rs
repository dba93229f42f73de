//! Port definitions for module interfaces.

use crate::ids::PortId;
use crate::types::Type;
use kiln_common::{Ident, SourceLoc};
use serde::{Deserialize, Serialize};

/// The direction of a port on a module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the module.
    Input,
    /// Data flows out of the module.
    Output,
}

impl PortDirection {
    /// The keyword used by the printer.
    pub fn keyword(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// A port in a module's external interface.
///
/// `id` is the port's declaration position; ports are never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// The declaration position of this port.
    pub id: PortId,
    /// The port name.
    pub name: Ident,
    /// The direction of data flow.
    pub direction: PortDirection,
    /// The type of the port.
    pub ty: Type,
    /// `true` for the clock and reset ports an implicit-clock module declares
    /// for itself.
    pub implicit: bool,
    /// Where the port was declared.
    pub loc: SourceLoc,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_port(dir: PortDirection) -> Port {
        Port {
            id: PortId::from_raw(0),
            name: Ident::from_raw(1),
            direction: dir,
            ty: Type::uint(8),
            implicit: false,
            loc: SourceLoc::UNKNOWN,
        }
    }

    #[test]
    fn keywords() {
        assert_eq!(PortDirection::Input.keyword(), "input");
        assert_eq!(PortDirection::Output.keyword(), "output");
    }

    #[test]
    fn port_serde_roundtrip() {
        let p = dummy_port(PortDirection::Output);
        let json = serde_json::to_string(&p).unwrap();
        let restored: Port = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, p);
    }
}
