//! Definitions, instances, and the definition cache.
//!
//! A [`Definition`] is the frozen result of running a construction body once.
//! The [`DefinitionCache`] maps a [`DefinitionKey`] to that result so later
//! requests for the same key reuse it instead of re-running the body.
//!
//! # Key derivation
//!
//! A key is the module name plus any number of named parameters. Its hash is
//! XXH3-128 over the name followed by the parameters sorted by parameter name,
//! so the order in which parameters are attached does not matter. Two bodies
//! that produce different hardware must use different keys; the cache never
//! inspects the body itself.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kiln_common::{ContentHash, ContentHasher, Ident};
use kiln_ir::{CompletedModule, InstanceId, ModuleId, Port};

use crate::record::ModuleHandle;

/// A parameter value in a [`DefinitionKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyParam {
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A boolean.
    Bool(bool),
    /// A string.
    Str(String),
}

impl From<i64> for KeyParam {
    fn from(v: i64) -> Self {
        KeyParam::Int(v)
    }
}

impl From<i32> for KeyParam {
    fn from(v: i32) -> Self {
        KeyParam::Int(v.into())
    }
}

impl From<u64> for KeyParam {
    fn from(v: u64) -> Self {
        KeyParam::UInt(v)
    }
}

impl From<u32> for KeyParam {
    fn from(v: u32) -> Self {
        KeyParam::UInt(v.into())
    }
}

impl From<usize> for KeyParam {
    fn from(v: usize) -> Self {
        KeyParam::UInt(v as u64)
    }
}

impl From<bool> for KeyParam {
    fn from(v: bool) -> Self {
        KeyParam::Bool(v)
    }
}

impl From<&str> for KeyParam {
    fn from(v: &str) -> Self {
        KeyParam::Str(v.to_string())
    }
}

impl From<String> for KeyParam {
    fn from(v: String) -> Self {
        KeyParam::Str(v)
    }
}

impl fmt::Display for KeyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyParam::Int(v) => write!(f, "{v}"),
            KeyParam::UInt(v) => write!(f, "{v}"),
            KeyParam::Bool(v) => write!(f, "{v}"),
            KeyParam::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// The structural identity of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionKey {
    name: String,
    params: BTreeMap<String, KeyParam>,
    serial: Option<u64>,
}

impl DefinitionKey {
    /// A key with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
            serial: None,
        }
    }

    /// Adds (or replaces) a parameter binding.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<KeyParam>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// A key that never equals any other key, for bodies that are not meant
    /// to be shared.
    pub(crate) fn unique(name: impl Into<String>, serial: u64) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
            serial: Some(serial),
        }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter bindings, sorted by name.
    pub fn params(&self) -> impl Iterator<Item = (&str, &KeyParam)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The content hash the cache is keyed on.
    pub fn hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        match self.serial {
            None => hasher.write_tag(0),
            Some(serial) => hasher.write_tag(1).write_u64(serial),
        };
        hasher.write_str(&self.name);
        for (name, value) in &self.params {
            hasher.write_str(name);
            match value {
                KeyParam::Int(v) => hasher.write_tag(0).write_u64(*v as u64),
                KeyParam::UInt(v) => hasher.write_tag(1).write_u64(*v),
                KeyParam::Bool(v) => hasher.write_tag(2).write_u64(u64::from(*v)),
                KeyParam::Str(v) => hasher.write_tag(3).write_str(v),
            };
        }
        hasher.finish()
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            let params: Vec<_> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "[{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Identifies the elaboration context a [`Definition`] was built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// A process-unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A completed, shareable module together with the key it was built under.
///
/// Cloning is cheap; every clone refers to the same completed module. A
/// definition can only be instantiated in the context that built it.
#[derive(Debug, Clone)]
pub struct Definition {
    origin: ContextId,
    key: DefinitionKey,
    body: Arc<CompletedModule>,
}

impl Definition {
    pub(crate) fn new(origin: ContextId, key: DefinitionKey, body: Arc<CompletedModule>) -> Self {
        Self { origin, key, body }
    }

    /// The context that built this definition.
    pub fn origin(&self) -> ContextId {
        self.origin
    }

    /// The module's position in the circuit.
    pub fn id(&self) -> ModuleId {
        self.body.id
    }

    /// The completed module.
    pub fn module(&self) -> &CompletedModule {
        &self.body
    }

    /// The shared handle to the completed module.
    pub fn body(&self) -> &Arc<CompletedModule> {
        &self.body
    }

    /// The module's ports in declaration order. Never triggers elaboration.
    pub fn ports(&self) -> &[Port] {
        &self.body.ports
    }

    /// The key the definition was built under.
    pub fn key(&self) -> &DefinitionKey {
        &self.key
    }

    /// Returns `true` if instantiating this definition needs a clock domain.
    pub fn is_implicit_clock(&self) -> bool {
        self.body.is_implicit_clock()
    }

    /// Returns `true` if both handles refer to the same completed module.
    pub fn same_as(&self, other: &Definition) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

/// One instantiation of a definition.
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) name: Ident,
    pub(crate) label: String,
    pub(crate) parent: ModuleHandle,
    pub(crate) definition: Definition,
}

impl Instance {
    /// The instance's position within its parent.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The interned instance name.
    pub fn name(&self) -> Ident {
        self.name
    }

    /// The instance name as written.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The module the instance was created in.
    pub fn parent(&self) -> ModuleHandle {
        self.parent
    }

    /// The instantiated definition.
    pub fn definition(&self) -> &Definition {
        &self.definition
    }
}

/// Completed definitions by key hash, plus the keys currently being built.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: HashMap<ContentHash, Definition>,
    in_progress: HashSet<ContentHash>,
    hits: u64,
    misses: u64,
}

impl DefinitionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached definition for `key`, counting a hit or a miss.
    pub fn lookup(&mut self, key: ContentHash) -> Option<Definition> {
        match self.entries.get(&key) {
            Some(def) => {
                self.hits += 1;
                Some(def.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Marks `key` as under construction. Returns `false` if it already was.
    pub fn begin(&mut self, key: ContentHash) -> bool {
        self.in_progress.insert(key)
    }

    /// Stores the finished definition for `key`.
    pub fn finish(&mut self, key: ContentHash, definition: Definition) {
        self.in_progress.remove(&key);
        self.entries.insert(key, definition);
    }

    /// Forgets that `key` was under construction.
    pub fn abandon(&mut self, key: ContentHash) {
        self.in_progress.remove(&key);
    }

    /// Number of cached definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups that found a cached definition.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that did not.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
