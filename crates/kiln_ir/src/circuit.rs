//! The top-level output of an elaboration run.

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::CompletedModule;
use kiln_common::{Ident, Interner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Every module produced by one elaboration, in completion order.
///
/// Completion order puts each module after all modules it instantiates, so
/// consumers can emit definitions before their uses by iterating
/// [`modules`](Self::modules). The circuit keeps a handle on the interner so
/// names stay resolvable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedCircuit {
    /// The circuit name (the top module's name).
    pub name: Ident,
    /// The top-level module of the main elaboration.
    pub top: ModuleId,
    /// Independent top-level units: the main top first, then every unit
    /// built by a post-build hook, in build order.
    pub units: Vec<ModuleId>,
    /// All completed modules.
    pub modules: Arena<ModuleId, Arc<CompletedModule>>,
    /// Every interned name, so a deserialized circuit still resolves them.
    #[serde(rename = "names")]
    interner: Arc<Interner>,
}

impl CompletedCircuit {
    /// Assembles a circuit from its parts.
    pub fn new(
        name: Ident,
        top: ModuleId,
        units: Vec<ModuleId>,
        modules: Arena<ModuleId, Arc<CompletedModule>>,
        interner: Arc<Interner>,
    ) -> Self {
        Self {
            name,
            top,
            units,
            modules,
            interner,
        }
    }

    /// Returns the top-level module.
    pub fn top_module(&self) -> &CompletedModule {
        &self.modules[self.top]
    }

    /// Returns the module with the given ID, if it exists.
    pub fn module(&self, id: ModuleId) -> Option<&CompletedModule> {
        self.modules.get(id).map(Arc::as_ref)
    }

    /// Iterates over all modules in completion order.
    pub fn modules(&self) -> impl Iterator<Item = &CompletedModule> {
        self.modules.values().map(Arc::as_ref)
    }

    /// Returns the number of modules in the circuit.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Finds a module by its unique name.
    pub fn find_module(&self, name: &str) -> Option<&CompletedModule> {
        let ident = self.interner.get(name)?;
        self.modules().find(|m| m.name == ident)
    }

    /// Resolves an identifier to its string.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// Returns the port names of a module, in declaration order.
    pub fn port_names(&self, module: &CompletedModule) -> Vec<&str> {
        module.ports.iter().map(|p| self.resolve(p.name)).collect()
    }

    /// Returns the interner that owns every name in the circuit.
    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleClocking;
    use kiln_common::{ContentHash, SourceLoc};

    fn bare(interner: &Interner, id: u32, name: &str) -> Arc<CompletedModule> {
        let name = interner.get_or_intern(name);
        Arc::new(CompletedModule {
            id: ModuleId::from_raw(id),
            name,
            desired_name: name,
            key: ContentHash::from_bytes(&id.to_le_bytes()),
            clocking: ModuleClocking::Bare,
            ports: Vec::new(),
            signals: Arena::new(),
            instances: Arena::new(),
            connections: Vec::new(),
            loc: SourceLoc::UNKNOWN,
        })
    }

    fn make_circuit() -> CompletedCircuit {
        let interner = Arc::new(Interner::new());
        let mut modules = Arena::new();
        modules.alloc(bare(&interner, 0, "Leaf"));
        let top = modules.alloc(bare(&interner, 1, "Top"));
        let name = interner.get_or_intern("Top");
        CompletedCircuit::new(name, top, vec![top], modules, interner)
    }

    #[test]
    fn top_module_access() {
        let circuit = make_circuit();
        assert_eq!(circuit.module_count(), 2);
        assert_eq!(circuit.resolve(circuit.top_module().name), "Top");
    }

    #[test]
    fn find_by_name() {
        let circuit = make_circuit();
        assert_eq!(circuit.find_module("Leaf").unwrap().id.as_raw(), 0);
        assert!(circuit.find_module("Missing").is_none());
    }

    #[test]
    fn modules_in_completion_order() {
        let circuit = make_circuit();
        let names: Vec<_> = circuit.modules().map(|m| circuit.resolve(m.name)).collect();
        assert_eq!(names, vec!["Leaf", "Top"]);
    }

    #[test]
    fn serde_keeps_structure() {
        let circuit = make_circuit();
        let json = serde_json::to_string(&circuit).unwrap();
        let restored: CompletedCircuit = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.module_count(), 2);
        assert_eq!(restored.top, circuit.top);
        assert_eq!(restored.units, circuit.units);
    }

    #[test]
    fn serde_keeps_names() {
        let circuit = make_circuit();
        let json = serde_json::to_string(&circuit).unwrap();
        assert!(json.contains("\"Leaf\""));
        let restored: CompletedCircuit = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.resolve(restored.name), "Top");
        assert_eq!(restored.find_module("Leaf").map(|m| m.id.as_raw()), Some(0));
        assert_eq!(
            crate::printer::print_circuit(&restored),
            crate::printer::print_circuit(&circuit)
        );
    }
}
