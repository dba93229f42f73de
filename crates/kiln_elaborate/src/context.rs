//! The elaboration context: construction stack, hook queues and definition
//! cache for one circuit.
//!
//! [`ElabContext`] is passed by `&mut` into every construction body and hook.
//! All state for one elaboration lives here; independent builds use
//! independent contexts.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use kiln_common::{Ident, InternalError, Interner, SourceLoc};
use kiln_config::{KilnConfig, ResetKind};
use kiln_diagnostics::{Diagnostic, DiagnosticSink};
use kiln_ir::{
    Arena, CompletedCircuit, CompletedModule, Expr, InstanceDomain, InstanceGraph, ModuleClocking,
    ModuleId, Port, PortDirection, RegReset, SignalKind, SignalRef, Type,
};
use log::{debug, trace};

use crate::definition::{ContextId, Definition, DefinitionCache, DefinitionKey, Instance};
use crate::domain::ClockDomain;
use crate::errors::{self, ElabError, ElabFailure, ElabResult};
use crate::hooks::{Hook, HookOwner, HookQueue};
use crate::lifecycle::LifecycleState;
use crate::namespace::ModuleNamespace;
use crate::record::{ModuleHandle, ModuleRecord, ModuleSpec};
use crate::value::{SignalHandle, Value};

/// Circuit-level progress of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No circuit started.
    Idle,
    /// Building the main top-level module.
    Building,
    /// Draining post-build hooks.
    PostBuild,
    /// The circuit has been returned.
    Finished,
}

/// Mutable state of one circuit elaboration.
pub struct ElabContext {
    id: ContextId,
    config: KilnConfig,
    interner: Arc<Interner>,
    sink: DiagnosticSink,
    phase: Phase,
    /// Open modules, outermost first.
    stack: Vec<ModuleRecord>,
    next_handle: u32,
    closed: HashMap<ModuleHandle, Definition>,
    modules: Arena<ModuleId, Arc<CompletedModule>>,
    namespace: ModuleNamespace,
    cache: DefinitionCache,
    body_end: HookQueue,
    post_build: HookQueue,
    top: Option<ModuleId>,
    units: Vec<ModuleId>,
    anon_serial: u64,
    last_loc: SourceLoc,
}

fn top_of<'a>(stack: &'a [ModuleRecord], operation: &'static str) -> ElabResult<&'a ModuleRecord> {
    stack.last().ok_or(ElabError::NoActiveModule { operation })
}

fn top_of_mut<'a>(
    stack: &'a mut [ModuleRecord],
    operation: &'static str,
) -> ElabResult<&'a mut ModuleRecord> {
    stack.last_mut().ok_or(ElabError::NoActiveModule { operation })
}

impl ElabContext {
    /// Creates a context with its own interner.
    pub fn new(config: KilnConfig) -> Self {
        Self::with_interner(config, Arc::new(Interner::new()))
    }

    /// Creates a context that interns names into `interner`.
    pub fn with_interner(config: KilnConfig, interner: Arc<Interner>) -> Self {
        Self {
            id: ContextId::next(),
            config,
            interner,
            sink: DiagnosticSink::new(),
            phase: Phase::Idle,
            stack: Vec::new(),
            next_handle: 0,
            closed: HashMap::new(),
            modules: Arena::new(),
            namespace: ModuleNamespace::new(),
            cache: DefinitionCache::new(),
            body_end: HookQueue::new(),
            post_build: HookQueue::new(),
            top: None,
            units: Vec::new(),
            anon_serial: 0,
            last_loc: SourceLoc::UNKNOWN,
        }
    }

    /// Tags every definition this context builds.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The configuration this context runs with.
    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    /// The interner owning every name of the circuit.
    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    /// Resolves an interned name.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// The definition cache, for inspection.
    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }

    /// Starts a circuit. The next module entered becomes its top level.
    pub fn begin_circuit(&mut self) -> ElabResult<()> {
        if self.phase != Phase::Idle {
            return Err(ElabError::nesting("a circuit has already been started in this context"));
        }
        debug!("begin circuit");
        self.phase = Phase::Building;
        Ok(())
    }

    pub(crate) fn next_unique_key(&mut self, name: &str) -> DefinitionKey {
        let key = DefinitionKey::unique(name, self.anon_serial);
        self.anon_serial += 1;
        key
    }

    fn module_name(&self, handle: ModuleHandle) -> String {
        if let Some(record) = self.stack.iter().find(|r| r.handle == handle) {
            return record.name.clone();
        }
        match self.closed.get(&handle) {
            Some(def) => self.resolve(def.module().name).to_string(),
            None => handle.to_string(),
        }
    }

    // ---- Module stack ----------------------------------------------------

    /// Pushes a new module onto the construction stack.
    ///
    /// A bare module starts with a [`ClockDomain::Bare`] tag. An
    /// implicit-clock module declares its clock and reset ports (named by
    /// the configuration) and starts with a [`ClockDomain::Implicit`] tag;
    /// its parent's domain reaches it through those ports when it is
    /// instantiated.
    #[track_caller]
    pub fn enter(&mut self, spec: ModuleSpec) -> ElabResult<ModuleHandle> {
        let loc = SourceLoc::caller();
        let key = self.next_unique_key(&spec.name);
        self.enter_at(spec, key, loc)
    }

    pub(crate) fn enter_at(&mut self, spec: ModuleSpec, key: DefinitionKey, loc: SourceLoc) -> ElabResult<ModuleHandle> {
        self.last_loc = loc.clone();
        match self.phase {
            Phase::Idle => {
                return Err(ElabError::nesting(format!(
                    "cannot enter `{}`: no circuit has been started",
                    spec.name
                )))
            }
            Phase::Finished => {
                return Err(ElabError::nesting(format!(
                    "cannot enter `{}`: the circuit has already finished",
                    spec.name
                )))
            }
            Phase::Building if self.stack.is_empty() && self.top.is_some() => {
                return Err(ElabError::nesting(format!(
                    "cannot enter `{}`: the top-level module already closed; \
                     build further units from a post-build hook",
                    spec.name
                )))
            }
            Phase::Building | Phase::PostBuild => {}
        }
        let max_depth = self.config.elaborate.max_depth;
        if self.stack.len() >= max_depth {
            return Err(ElabError::nesting(format!(
                "entering `{}` exceeds the maximum nesting depth of {max_depth}",
                spec.name
            )));
        }

        let handle = ModuleHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        let desired = self.interner.get_or_intern(&spec.name);
        let mut record = ModuleRecord::new(handle, desired, spec.name.clone(), key, loc.clone());

        if spec.is_implicit_clock() {
            let clock_name = self.config.elaborate.clock_port.clone();
            let reset_name = self.config.elaborate.reset_port.clone();
            let reset_ty = match self.config.elaborate.reset_kind {
                ResetKind::Sync => Type::Reset,
                ResetKind::Async => Type::AsyncReset,
            };
            let clock = record.add_port(
                self.interner.get_or_intern(&clock_name),
                &clock_name,
                PortDirection::Input,
                Type::Clock,
                true,
                loc.clone(),
            )?;
            let reset = record.add_port(
                self.interner.get_or_intern(&reset_name),
                &reset_name,
                PortDirection::Input,
                reset_ty,
                true,
                loc,
            )?;
            record.clocking = ModuleClocking::Implicit { clock, reset };
            record.domain = ClockDomain::for_module(record.clocking);
        }

        debug!(
            "enter `{}` as {handle} at depth {}",
            spec.name,
            self.stack.len()
        );
        self.stack.push(record);
        Ok(handle)
    }

    /// The innermost open module.
    pub fn current_module(&self) -> ElabResult<ModuleHandle> {
        top_of(&self.stack, "current_module").map(|r| r.handle)
    }

    /// Desired names of the open modules, outermost first.
    pub fn module_path(&self) -> Vec<String> {
        self.stack.iter().map(|r| r.name.clone()).collect()
    }

    /// Lifecycle state of an open or closed module.
    pub fn lifecycle_state(&self, module: ModuleHandle) -> Option<LifecycleState> {
        if let Some(record) = self.stack.iter().find(|r| r.handle == module) {
            return Some(record.state);
        }
        self.closed.get(&module).map(|_| LifecycleState::Closed)
    }

    /// The clock domain currently in effect in the innermost open module.
    pub fn clock_domain(&self) -> ElabResult<ClockDomain> {
        top_of(&self.stack, "clock_domain").map(|r| r.domain)
    }

    /// Closes `module`, which must be the innermost open module.
    ///
    /// Runs the module's body-end hooks in registration order until none are
    /// left, including hooks registered by hooks, then freezes the record
    /// and pops it.
    #[track_caller]
    pub fn close(&mut self, module: ModuleHandle) -> ElabResult<Definition> {
        self.close_at(module, SourceLoc::caller())
    }

    pub(crate) fn close_at(&mut self, module: ModuleHandle, loc: SourceLoc) -> ElabResult<Definition> {
        self.last_loc = loc;
        if self.closed.contains_key(&module) {
            return Err(ElabError::Lifecycle {
                module: self.module_name(module),
                state: LifecycleState::Closed,
                operation: "close",
            });
        }
        let Some(top) = self.stack.last_mut() else {
            return Err(ElabError::nesting(format!("cannot close {module}: no module is open")));
        };
        if top.handle != module {
            let inner = top.name.clone();
            return Err(match self.stack.iter().find(|r| r.handle == module) {
                Some(outer) => ElabError::nesting(format!(
                    "cannot close `{}` while `{inner}` is still open inside it",
                    outer.name
                )),
                None => ElabError::nesting(format!("cannot close {module}: it is not an open module")),
            });
        }
        top.state.begin_close().map_err(|e| ElabError::Lifecycle {
            module: top.name.clone(),
            state: e.from,
            operation: "close",
        })?;

        let limit = self.config.elaborate.hook_drain_limit;
        let mut fired = 0usize;
        while let Some(hook) = self.body_end.take_first_for(module) {
            if fired == limit {
                return Err(ElabError::HookDrainLimit {
                    module: self.module_name(module),
                    limit,
                });
            }
            fired += 1;
            self.last_loc = hook.loc.clone();
            (hook.action)(self)?;
            if self.stack.last().map(|r| r.handle) != Some(module) {
                return Err(ElabError::nesting(format!(
                    "a body-end hook of `{}` left the construction stack unbalanced",
                    self.module_name(module)
                )));
            }
        }

        let mut record = self
            .stack
            .pop()
            .ok_or_else(|| InternalError::new("construction stack emptied while closing"))?;
        record.state.finish_close().map_err(|e| ElabError::Lifecycle {
            module: record.name.clone(),
            state: e.from,
            operation: "close",
        })?;

        let unique = self.namespace.uniquify(&record.name);
        let name = self.interner.get_or_intern(&unique);
        let id = self.modules.next_id();
        let key = record.key.clone();
        let body = Arc::new(record.freeze(id, name));
        self.modules.alloc(Arc::clone(&body));
        let definition = Definition::new(self.id, key, body);
        self.closed.insert(module, definition.clone());

        if self.stack.is_empty() {
            match self.phase {
                Phase::Building if self.top.is_none() => {
                    self.top = Some(id);
                    self.units.push(id);
                }
                Phase::PostBuild => self.units.push(id),
                _ => {}
            }
        }
        debug!(
            "closed `{unique}` as module #{} after {fired} body-end hook(s)",
            id.as_raw()
        );
        Ok(definition)
    }

    // ---- Hooks -----------------------------------------------------------

    /// Queues `hook` to run while `module` closes, before it is frozen.
    ///
    /// The module must still be open. Hooks run with `module` as the
    /// innermost open module, so port and connection operations inside the
    /// hook apply to it.
    #[track_caller]
    pub fn register_body_end_hook(
        &mut self,
        module: ModuleHandle,
        hook: impl FnOnce(&mut ElabContext) -> ElabResult<()> + 'static,
    ) -> ElabResult<()> {
        let loc = SourceLoc::caller();
        self.last_loc = loc.clone();
        if !self.stack.iter().any(|r| r.handle == module) {
            return Err(ElabError::UnresolvedHook {
                module: self.module_name(module),
            });
        }
        self.body_end.push(Hook {
            owner: HookOwner::BodyEnd(module),
            action: Box::new(hook),
            loc,
        });
        Ok(())
    }

    /// Queues a body-end hook on the innermost open module.
    #[track_caller]
    pub fn on_body_end(&mut self, hook: impl FnOnce(&mut ElabContext) -> ElabResult<()> + 'static) -> ElabResult<()> {
        let module = top_of(&self.stack, "on_body_end")?.handle;
        self.register_body_end_hook(module, hook)
    }

    /// Queues `hook` to run after the whole top-level circuit closed.
    #[track_caller]
    pub fn register_post_build_hook(
        &mut self,
        hook: impl FnOnce(&mut ElabContext) -> ElabResult<()> + 'static,
    ) -> ElabResult<()> {
        let loc = SourceLoc::caller();
        self.last_loc = loc.clone();
        match self.phase {
            Phase::Building | Phase::PostBuild => {}
            Phase::Idle => return Err(ElabError::nesting("no circuit has been started")),
            Phase::Finished => return Err(ElabError::nesting("the circuit has already finished")),
        }
        self.post_build.push(Hook {
            owner: HookOwner::PostBuild,
            action: Box::new(hook),
            loc,
        });
        Ok(())
    }

    /// Runs every post-build hook and returns the completed circuit.
    ///
    /// Each hook runs with an empty construction stack, so modules it builds
    /// are independent top-level units.
    pub fn finish_circuit(&mut self) -> ElabResult<CompletedCircuit> {
        if self.phase != Phase::Building {
            return Err(ElabError::nesting("finish_circuit called outside of circuit construction"));
        }
        if !self.stack.is_empty() {
            return Err(ElabError::nesting(format!(
                "cannot finish the circuit while `{}` is open",
                self.module_path().join("/")
            )));
        }
        let Some(top) = self.top else {
            return Err(ElabError::nesting("cannot finish a circuit without a top-level module"));
        };

        self.phase = Phase::PostBuild;
        let mut fired = 0usize;
        while let Some(hook) = self.post_build.pop_front() {
            fired += 1;
            self.last_loc = hook.loc.clone();
            (hook.action)(self)?;
            if !self.stack.is_empty() {
                return Err(ElabError::nesting(format!(
                    "a post-build hook left `{}` open",
                    self.module_path().join("/")
                )));
            }
        }
        debug!("ran {fired} post-build hook(s)");
        self.phase = Phase::Finished;

        let warnings = self.sink.warning_count();
        if self.config.diagnostics.deny_warnings && warnings > 0 {
            return Err(ElabError::DeniedWarnings { count: warnings });
        }

        let name = self.modules[top].name;
        let circuit = CompletedCircuit::new(
            name,
            top,
            mem::take(&mut self.units),
            mem::take(&mut self.modules),
            Arc::clone(&self.interner),
        );
        let graph = InstanceGraph::build(&circuit)?;
        if graph.is_cyclic() {
            return Err(InternalError::new("instance hierarchy is cyclic").into());
        }
        debug!(
            "finished circuit `{}`: {} module(s), {} unit(s), cache {} hit(s) / {} miss(es)",
            circuit.resolve(name),
            circuit.module_count(),
            circuit.units.len(),
            self.cache.hits(),
            self.cache.misses()
        );
        Ok(circuit)
    }

    // ---- Definitions and instances -----------------------------------------

    /// Returns the definition cached under `key`, building it with `body`
    /// first if there is none.
    ///
    /// On a cache hit `body` is dropped without running. The new module is
    /// entered on top of the current stack and closed again before this
    /// returns; it is not instantiated.
    #[track_caller]
    pub fn define(
        &mut self,
        key: DefinitionKey,
        spec: ModuleSpec,
        body: impl FnOnce(&mut ElabContext) -> ElabResult<()>,
    ) -> ElabResult<Definition> {
        self.define_at(key, spec, body, SourceLoc::caller())
    }

    fn define_at(
        &mut self,
        key: DefinitionKey,
        spec: ModuleSpec,
        body: impl FnOnce(&mut ElabContext) -> ElabResult<()>,
        loc: SourceLoc,
    ) -> ElabResult<Definition> {
        if self.phase == Phase::Building && self.stack.is_empty() && self.top.is_none() {
            return Err(ElabError::nesting(format!(
                "cannot define `{key}` before the top-level module is entered"
            )));
        }
        let hash = key.hash();
        if let Some(definition) = self.cache.lookup(hash) {
            debug!("definition cache hit for `{key}`");
            return Ok(definition);
        }
        if !self.cache.begin(hash) {
            return Err(ElabError::nesting(format!(
                "`{key}` is defined in terms of itself"
            )));
        }
        debug!("definition cache miss for `{key}`, elaborating");
        let result = self
            .enter_at(spec, key, loc.clone())
            .and_then(|handle| {
                body(self)?;
                self.close_at(handle, loc)
            });
        match result {
            Ok(definition) => {
                self.cache.finish(hash, definition.clone());
                Ok(definition)
            }
            Err(error) => {
                self.cache.abandon(hash);
                Err(error)
            }
        }
    }

    /// Adds an instance of `definition` named `name` to the innermost open
    /// module.
    ///
    /// An implicit-clock definition needs a clock domain in scope; its
    /// implicit clock and reset ports are connected from that domain.
    #[track_caller]
    pub fn instantiate(&mut self, definition: &Definition, name: &str) -> ElabResult<Instance> {
        self.instantiate_at(definition, name, SourceLoc::caller())
    }

    fn instantiate_at(&mut self, definition: &Definition, name: &str, loc: SourceLoc) -> ElabResult<Instance> {
        self.last_loc = loc.clone();
        if definition.origin() != self.id {
            // its names live in another interner
            let module = top_of(&self.stack, "instantiate a module")?;
            return Err(ElabError::ForeignDefinition {
                definition: definition.key().to_string(),
                module: module.name.clone(),
            });
        }
        let ident = self.interner.get_or_intern(name);
        let def_name = self.resolve(definition.module().name).to_string();
        let record = top_of_mut(&mut self.stack, "instantiate a module")?;

        let domain = match definition.module().clocking {
            ModuleClocking::Bare => InstanceDomain::None,
            ModuleClocking::Implicit { .. } => {
                let (clock, reset) = record
                    .domain
                    .require(|| format!("implicit-clock module `{def_name}`"), &record.name)?;
                InstanceDomain::Inherited { clock, reset }
            }
        };
        let id = record.add_instance(ident, name, definition, domain, loc.clone())?;

        if let (
            InstanceDomain::Inherited { clock, reset },
            ModuleClocking::Implicit {
                clock: child_clock,
                reset: child_reset,
            },
        ) = (domain, definition.module().clocking)
        {
            record.push_connection(
                SignalRef::InstancePort {
                    instance: id,
                    port: child_clock,
                },
                Expr::Ref {
                    target: clock,
                    width: 1,
                },
                loc.clone(),
            );
            record.push_connection(
                SignalRef::InstancePort {
                    instance: id,
                    port: child_reset,
                },
                Expr::Ref {
                    target: reset,
                    width: 1,
                },
                loc,
            );
        }
        trace!("`{}`: instance `{name}` of `{def_name}`", record.name);
        Ok(Instance {
            id,
            name: ident,
            label: name.to_string(),
            parent: record.handle,
            definition: definition.clone(),
        })
    }

    /// Builds a fresh, unshared module with `body` and instantiates it as
    /// `name` in the innermost open module.
    ///
    /// An implicit-clock `spec` is checked against the current domain before
    /// `body` runs.
    #[track_caller]
    pub fn module(
        &mut self,
        spec: ModuleSpec,
        name: &str,
        body: impl FnOnce(&mut ElabContext) -> ElabResult<()>,
    ) -> ElabResult<Instance> {
        let loc = SourceLoc::caller();
        self.last_loc = loc.clone();
        let parent = top_of(&self.stack, "instantiate a module")?;
        if spec.is_implicit_clock() {
            parent
                .domain
                .require(|| format!("implicit-clock module `{}`", spec.name), &parent.name)?;
        }
        let key = self.next_unique_key(&spec.name);
        let definition = self.define_at(key, spec, body, loc.clone())?;
        self.instantiate_at(&definition, name, loc)
    }

    /// Runs `body` with `clock` and `reset` as the clock domain of the
    /// innermost open module, restoring the previous domain afterwards, also
    /// when `body` fails.
    pub fn with_clock_and_reset<T>(
        &mut self,
        clock: &SignalHandle,
        reset: &SignalHandle,
        body: impl FnOnce(&mut ElabContext) -> ElabResult<T>,
    ) -> ElabResult<T> {
        let record = top_of_mut(&mut self.stack, "with_clock_and_reset")?;
        for signal in [clock, reset] {
            if signal.owner != record.handle {
                return Err(ElabError::OutOfScope {
                    module: record.name.clone(),
                    signal: signal.name.clone(),
                });
            }
        }
        if !clock.ty.is_clock() {
            return Err(ElabError::DomainSignal {
                signal: clock.name.clone(),
                expected: "clock",
                found: clock.ty,
            });
        }
        if !reset.ty.is_reset() {
            return Err(ElabError::DomainSignal {
                signal: reset.name.clone(),
                expected: "reset",
                found: reset.ty,
            });
        }
        let handle = record.handle;
        let saved = mem::replace(
            &mut record.domain,
            ClockDomain::Explicit {
                clock: clock.target,
                reset: reset.target,
            },
        );

        let result = body(self);

        if let Some(record) = self.stack.iter_mut().rev().find(|r| r.handle == handle) {
            record.domain = saved;
        }
        let value = result?;
        if self.stack.last().map(|r| r.handle) != Some(handle) {
            return Err(ElabError::nesting(
                "the body of `with_clock_and_reset` left the construction stack unbalanced",
            ));
        }
        Ok(value)
    }

    // ---- Ports and signals -----------------------------------------------

    /// Declares an input port on the innermost open module.
    #[track_caller]
    pub fn input(&mut self, name: &str, ty: Type) -> ElabResult<SignalHandle> {
        self.add_port(PortDirection::Input, name, ty, SourceLoc::caller())
    }

    /// Declares an output port on the innermost open module.
    #[track_caller]
    pub fn output(&mut self, name: &str, ty: Type) -> ElabResult<SignalHandle> {
        self.add_port(PortDirection::Output, name, ty, SourceLoc::caller())
    }

    fn add_port(&mut self, direction: PortDirection, name: &str, ty: Type, loc: SourceLoc) -> ElabResult<SignalHandle> {
        self.last_loc = loc.clone();
        let ident = self.interner.get_or_intern(name);
        let record = top_of_mut(&mut self.stack, "declare a port")?;
        let id = record.add_port(ident, name, direction, ty, false, loc)?;
        Ok(SignalHandle {
            owner: record.handle,
            target: SignalRef::Port(id),
            ty,
            name: name.to_string(),
        })
    }

    /// Declares a wire.
    #[track_caller]
    pub fn wire(&mut self, name: &str, ty: Type) -> ElabResult<SignalHandle> {
        self.add_signal(name, ty, None, SourceLoc::caller())
    }

    /// Declares a register clocked by the current domain's clock.
    #[track_caller]
    pub fn reg(&mut self, name: &str, ty: Type) -> ElabResult<SignalHandle> {
        self.add_signal(name, ty, Some(None), SourceLoc::caller())
    }

    /// Declares a register clocked and reset by the current domain, loading
    /// `init` while reset is asserted.
    #[track_caller]
    pub fn reg_init(&mut self, name: &str, ty: Type, init: impl Into<Value>) -> ElabResult<SignalHandle> {
        self.add_signal(name, ty, Some(Some(init.into())), SourceLoc::caller())
    }

    /// `reg` is `None` for a wire, `Some(init)` for a register.
    fn add_signal(
        &mut self,
        name: &str,
        ty: Type,
        reg: Option<Option<Value>>,
        loc: SourceLoc,
    ) -> ElabResult<SignalHandle> {
        self.last_loc = loc.clone();
        let ident = self.interner.get_or_intern(name);
        let record = top_of_mut(&mut self.stack, "declare a signal")?;
        let kind = match reg {
            None => SignalKind::Wire,
            Some(init) => {
                let (clock, reset) = record
                    .domain
                    .require(|| format!("register `{name}`"), &record.name)?;
                let reset = match init {
                    Some(init) => Some(RegReset {
                        signal: reset,
                        init: init.lower(record.handle, &record.name)?,
                    }),
                    None => None,
                };
                SignalKind::Reg { clock, reset }
            }
        };
        let id = record.add_signal(ident, name, ty, kind, loc)?;
        Ok(SignalHandle {
            owner: record.handle,
            target: SignalRef::Signal(id),
            ty,
            name: name.to_string(),
        })
    }

    /// Looks up a port of the innermost open module by name.
    pub fn port(&self, name: &str) -> ElabResult<SignalHandle> {
        let record = top_of(&self.stack, "port")?;
        let port = self
            .interner
            .get(name)
            .and_then(|ident| record.ports.iter().find(|p| p.name == ident))
            .ok_or_else(|| ElabError::UnknownPort {
                module: record.name.clone(),
                port: name.to_string(),
            })?;
        Ok(SignalHandle {
            owner: record.handle,
            target: SignalRef::Port(port.id),
            ty: port.ty,
            name: name.to_string(),
        })
    }

    /// Looks up a port of a child instance by name, for use in the
    /// instance's parent.
    pub fn instance_port(&self, instance: &Instance, name: &str) -> ElabResult<SignalHandle> {
        let module = instance.definition().module();
        let port = self
            .interner
            .get(name)
            .and_then(|ident| module.port_by_name(ident))
            .ok_or_else(|| ElabError::UnknownPort {
                module: self.resolve(module.name).to_string(),
                port: name.to_string(),
            })?;
        Ok(SignalHandle {
            owner: instance.parent(),
            target: SignalRef::InstancePort {
                instance: instance.id(),
                port: port.id,
            },
            ty: port.ty,
            name: format!("{}.{name}", instance.label()),
        })
    }

    /// The ports of an open or closed module, in declaration order.
    pub fn ports(&self, module: ModuleHandle) -> ElabResult<Vec<Port>> {
        if let Some(record) = self.stack.iter().find(|r| r.handle == module) {
            return Ok(record.ports.clone());
        }
        self.closed
            .get(&module)
            .map(|def| def.ports().to_vec())
            .ok_or_else(|| ElabError::nesting(format!("{module} was never entered")))
    }

    /// Port names of an open or closed module, in declaration order.
    pub fn port_names(&self, module: ModuleHandle) -> ElabResult<Vec<String>> {
        Ok(self
            .ports(module)?
            .iter()
            .map(|p| self.resolve(p.name).to_string())
            .collect())
    }

    // ---- Connections -----------------------------------------------------

    /// Appends `dest <= source` to the innermost open module's connection
    /// log.
    ///
    /// Earlier connections to `dest` are kept.
    #[track_caller]
    pub fn connect(&mut self, dest: &SignalHandle, source: impl Into<Value>) -> ElabResult<()> {
        let loc = SourceLoc::caller();
        self.last_loc = loc.clone();
        let record = top_of_mut(&mut self.stack, "connect")?;
        if dest.owner != record.handle {
            return Err(ElabError::OutOfScope {
                module: record.name.clone(),
                signal: dest.name.clone(),
            });
        }
        let invalid = |reason| ElabError::InvalidSink {
            module: record.name.clone(),
            target: dest.name.clone(),
            reason,
        };
        match dest.target {
            SignalRef::Port(id) => {
                let port = record
                    .ports
                    .get(id.index())
                    .ok_or_else(|| InternalError::new(format!("dangling port handle `{}`", dest.name)))?;
                if port.direction == PortDirection::Input {
                    return Err(invalid("input ports are driven by the parent"));
                }
            }
            SignalRef::Signal(_) => {}
            SignalRef::InstancePort { instance, port } => {
                let port = record
                    .instance_port(instance, port)
                    .ok_or_else(|| InternalError::new(format!("dangling port handle `{}`", dest.name)))?;
                if port.direction == PortDirection::Output {
                    return Err(invalid("instance outputs are driven by the instance"));
                }
            }
        }

        let source: Value = source.into();
        let source = source.lower(record.handle, &record.name)?;
        record.touch("connect")?;
        let src_width = source.width();
        let count = record.push_connection(dest.target, source, loc.clone());
        trace!(
            "`{}`: {} <= {src_width}-bit value (driver {count})",
            record.name,
            dest.name
        );

        let mut warnings = Vec::new();
        if self.config.diagnostics.warn_multiple_drivers && count > 1 {
            warnings.push(errors::warn_multiple_drivers(&dest.name, count, loc.clone()));
        }
        if self.config.diagnostics.warn_width_truncation && src_width > dest.width() {
            warnings.push(errors::warn_width_truncation(&dest.name, dest.width(), src_width, loc));
        }
        if !warnings.is_empty() {
            let path = self.module_path();
            for warning in warnings {
                self.sink.emit(warning.with_path(path.clone()));
            }
        }
        Ok(())
    }

    // ---- Diagnostics -----------------------------------------------------

    /// Warnings emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.sink.diagnostics()
    }

    /// Takes the warnings emitted so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.sink.take_all()
    }

    /// Abandons the elaboration, packaging `error` with the nesting path and
    /// location at the point of failure.
    pub fn into_failure(self, error: ElabError) -> ElabFailure {
        ElabFailure {
            error,
            path: self.module_path(),
            loc: self.last_loc,
            warnings: self.sink.take_all(),
        }
    }
}
