//! Module records: the mutable form of a module while it is being built.
//!
//! A [`ModuleRecord`] is owned by the construction stack of the
//! [`ElabContext`](crate::ElabContext) from `enter` until `close`, at which
//! point it is frozen into a [`CompletedModule`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use kiln_common::{Ident, SourceLoc};
use kiln_ir::{
    Arena, ChildInstance, CompletedModule, Connection, Expr, InstanceDomain, InstanceId,
    ModuleClocking, ModuleId, Port, PortDirection, PortId, Signal, SignalId, SignalKind,
    SignalRef, Type,
};

use crate::definition::{Definition, DefinitionKey};
use crate::domain::ClockDomain;
use crate::errors::{ElabError, ElabResult};
use crate::lifecycle::LifecycleState;

/// Identifies a module from `enter` onwards, including after it closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleHandle(u32);

impl ModuleHandle {
    /// Creates a handle from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Whether a module declares its own implicit clock and reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// No implicit clock or reset.
    Bare,
    /// Declares implicit clock and reset ports, driven from the parent's
    /// domain wherever it is instantiated.
    ImplicitClock,
}

/// What to build when entering a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// The desired module name; may be suffixed to keep names unique.
    pub name: String,
    /// Bare or implicit-clock.
    pub kind: ModuleKind,
}

impl ModuleSpec {
    /// A module without an implicit clock domain.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ModuleKind::Bare,
        }
    }

    /// A module that declares its own implicit clock and reset.
    pub fn implicit_clock(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ModuleKind::ImplicitClock,
        }
    }

    /// Returns `true` for [`ModuleKind::ImplicitClock`].
    pub fn is_implicit_clock(&self) -> bool {
        self.kind == ModuleKind::ImplicitClock
    }
}

/// A module under construction.
#[derive(Debug)]
pub(crate) struct ModuleRecord {
    pub handle: ModuleHandle,
    pub desired_name: Ident,
    pub name: String,
    pub key: DefinitionKey,
    pub clocking: ModuleClocking,
    pub domain: ClockDomain,
    pub state: LifecycleState,
    pub ports: Vec<Port>,
    pub signals: Arena<SignalId, Signal>,
    pub instances: Arena<InstanceId, ChildInstance>,
    /// Definition of each instance, indexed by `InstanceId`.
    pub instance_defs: Vec<Arc<CompletedModule>>,
    pub connections: Vec<Connection>,
    names: HashSet<Ident>,
    driven: HashMap<SignalRef, u32>,
    pub loc: SourceLoc,
}

impl ModuleRecord {
    pub fn new(
        handle: ModuleHandle,
        desired_name: Ident,
        name: String,
        key: DefinitionKey,
        loc: SourceLoc,
    ) -> Self {
        Self {
            handle,
            desired_name,
            name,
            key,
            clocking: ModuleClocking::Bare,
            domain: ClockDomain::Bare,
            state: LifecycleState::Declaring,
            ports: Vec::new(),
            signals: Arena::new(),
            instances: Arena::new(),
            instance_defs: Vec::new(),
            connections: Vec::new(),
            names: HashSet::new(),
            driven: HashMap::new(),
            loc,
        }
    }

    /// Records a content operation, moving `Declaring` to `BodyRunning`.
    pub fn touch(&mut self, operation: &'static str) -> ElabResult<()> {
        self.state.begin_body().map_err(|e| ElabError::Lifecycle {
            module: self.name.clone(),
            state: e.from,
            operation,
        })
    }

    fn check_name(&self, name: Ident, label: &str) -> ElabResult<()> {
        if self.names.contains(&name) {
            return Err(ElabError::DuplicateName {
                module: self.name.clone(),
                name: label.to_string(),
            });
        }
        Ok(())
    }

    /// Appends a port. Implicit ports are engine-declared and leave the
    /// lifecycle state untouched.
    pub fn add_port(
        &mut self,
        name: Ident,
        label: &str,
        direction: PortDirection,
        ty: Type,
        implicit: bool,
        loc: SourceLoc,
    ) -> ElabResult<PortId> {
        if self.ports.iter().any(|p| p.name == name) {
            return Err(ElabError::DuplicatePort {
                module: self.name.clone(),
                port: label.to_string(),
            });
        }
        self.check_name(name, label)?;
        if !implicit {
            self.touch("add a port")?;
        }
        let id = PortId::from_raw(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            name,
            direction,
            ty,
            implicit,
            loc,
        });
        self.names.insert(name);
        Ok(id)
    }

    /// Appends a wire or register.
    pub fn add_signal(
        &mut self,
        name: Ident,
        label: &str,
        ty: Type,
        kind: SignalKind,
        loc: SourceLoc,
    ) -> ElabResult<SignalId> {
        self.check_name(name, label)?;
        self.touch("declare a signal")?;
        let id = self.signals.next_id();
        self.signals.alloc(Signal {
            id,
            name,
            ty,
            kind,
            loc,
        });
        self.names.insert(name);
        Ok(id)
    }

    /// Appends a child-instance entry referencing `definition`.
    pub fn add_instance(
        &mut self,
        name: Ident,
        label: &str,
        definition: &Definition,
        domain: InstanceDomain,
        loc: SourceLoc,
    ) -> ElabResult<InstanceId> {
        self.check_name(name, label)?;
        self.touch("instantiate a module")?;
        let id = self.instances.next_id();
        self.instances.alloc(ChildInstance {
            id,
            name,
            module: definition.id(),
            domain,
            loc,
        });
        self.instance_defs.push(Arc::clone(definition.body()));
        self.names.insert(name);
        Ok(id)
    }

    /// Appends a connection to the log and returns how many times `dest` has
    /// now been driven.
    pub fn push_connection(&mut self, dest: SignalRef, source: Expr, loc: SourceLoc) -> u32 {
        let position = self.connections.len() as u32;
        self.connections.push(Connection {
            position,
            dest,
            source,
            loc,
        });
        let count = self.driven.entry(dest).or_insert(0);
        *count += 1;
        *count
    }

    /// The definition-side port behind an instance port reference.
    pub fn instance_port(&self, instance: InstanceId, port: PortId) -> Option<&Port> {
        self.instance_defs
            .get(instance.index())
            .and_then(|def| def.ports.get(port.index()))
    }

    /// Freezes the record into its completed form.
    pub fn freeze(self, id: ModuleId, name: Ident) -> CompletedModule {
        CompletedModule {
            id,
            name,
            desired_name: self.desired_name,
            key: self.key.hash(),
            clocking: self.clocking,
            ports: self.ports,
            signals: self.signals,
            instances: self.instances,
            connections: self.connections,
            loc: self.loc,
        }
    }
}
