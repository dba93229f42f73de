//! Instance hierarchy of a completed circuit as a directed graph.
//!
//! Nodes are modules, edges point from a parent to the definition of each of
//! its child instances (one edge per instance).

use crate::circuit::CompletedCircuit;
use crate::ids::{InstanceId, ModuleId};
use kiln_common::{InternalError, KilnResult};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Parent-to-child instance graph.
pub struct InstanceGraph {
    graph: DiGraph<ModuleId, InstanceId>,
    nodes: HashMap<ModuleId, NodeIndex>,
}

impl InstanceGraph {
    /// Builds the graph, failing if any instance references a module that is
    /// not part of the circuit.
    pub fn build(circuit: &CompletedCircuit) -> KilnResult<Self> {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for module in circuit.modules() {
            nodes.insert(module.id, graph.add_node(module.id));
        }
        for module in circuit.modules() {
            let parent = nodes[&module.id];
            for inst in module.instances.values() {
                let child = nodes.get(&inst.module).ok_or_else(|| {
                    InternalError::new(format!(
                        "instance `{}` in `{}` references unknown module #{}",
                        circuit.resolve(inst.name),
                        circuit.resolve(module.name),
                        inst.module.as_raw()
                    ))
                })?;
                graph.add_edge(parent, *child, inst.id);
            }
        }
        Ok(Self { graph, nodes })
    }

    /// Returns `true` if some module (transitively) instantiates itself.
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Modules that nothing instantiates, in module order.
    pub fn roots(&self) -> Vec<ModuleId> {
        let mut roots: Vec<_> = self
            .graph
            .node_indices()
            .filter(|&n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| self.graph[n])
            .collect();
        roots.sort();
        roots
    }

    /// Number of instance entries, across all parents, that reference `module`.
    pub fn instance_count(&self, module: ModuleId) -> usize {
        self.nodes.get(&module).map_or(0, |&n| {
            self.graph.edges_directed(n, Direction::Incoming).count()
        })
    }

    /// Modules ordered so every module comes after all modules it
    /// instantiates. `None` if the hierarchy is cyclic.
    pub fn children_first(&self) -> Option<Vec<ModuleId>> {
        let mut order = toposort(&self.graph, None).ok()?;
        order.reverse();
        Some(order.into_iter().map(|n| self.graph[n]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::instance::{ChildInstance, InstanceDomain};
    use crate::module::{CompletedModule, ModuleClocking};
    use kiln_common::{ContentHash, Interner, SourceLoc};
    use std::sync::Arc;

    fn module(interner: &Interner, id: u32, name: &str, children: &[u32]) -> Arc<CompletedModule> {
        let mut instances = Arena::new();
        for (i, child) in children.iter().enumerate() {
            instances.alloc(ChildInstance {
                id: InstanceId::from_raw(i as u32),
                name: interner.get_or_intern(&format!("u{i}")),
                module: ModuleId::from_raw(*child),
                domain: InstanceDomain::None,
                loc: SourceLoc::UNKNOWN,
            });
        }
        let name = interner.get_or_intern(name);
        Arc::new(CompletedModule {
            id: ModuleId::from_raw(id),
            name,
            desired_name: name,
            key: ContentHash::from_bytes(name.as_raw().to_le_bytes().as_slice()),
            clocking: ModuleClocking::Bare,
            ports: Vec::new(),
            signals: Arena::new(),
            instances,
            connections: Vec::new(),
            loc: SourceLoc::UNKNOWN,
        })
    }

    fn circuit(specs: &[(&str, &[u32])]) -> CompletedCircuit {
        let interner = Arc::new(Interner::new());
        let mut modules = Arena::new();
        for (i, (name, children)) in specs.iter().enumerate() {
            modules.alloc(module(&interner, i as u32, name, children));
        }
        let top = ModuleId::from_raw(specs.len() as u32 - 1);
        let name = modules[top].name;
        CompletedCircuit::new(name, top, vec![top], modules, interner)
    }

    #[test]
    fn shared_definition_counts_instances() {
        let c = circuit(&[("Leaf", &[]), ("Top", &[0, 0])]);
        let g = InstanceGraph::build(&c).unwrap();
        assert_eq!(g.instance_count(ModuleId::from_raw(0)), 2);
        assert_eq!(g.roots(), vec![ModuleId::from_raw(1)]);
        assert!(!g.is_cyclic());
    }

    #[test]
    fn children_first_order() {
        let c = circuit(&[("Leaf", &[]), ("Mid", &[0]), ("Top", &[1, 0])]);
        let g = InstanceGraph::build(&c).unwrap();
        let order = g.children_first().unwrap();
        let pos = |id: u32| order.iter().position(|m| m.as_raw() == id).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(1) < pos(2));
    }

    #[test]
    fn dangling_instance_is_internal_error() {
        let c = circuit(&[("Top", &[7])]);
        assert!(InstanceGraph::build(&c).is_err());
    }

    #[test]
    fn multiple_units_are_roots() {
        let c = circuit(&[("Leaf", &[]), ("Top", &[0]), ("Wrapper", &[0])]);
        let g = InstanceGraph::build(&c).unwrap();
        assert_eq!(
            g.roots(),
            vec![ModuleId::from_raw(1), ModuleId::from_raw(2)]
        );
    }
}
