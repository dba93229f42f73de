//! Interned names for modules, ports, signals and instances.

use lasso::ThreadedRodeo;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

/// An interned name of any named entity in a circuit.
///
/// Identifiers are `u32` indices into an [`Interner`], so equality and cloning
/// are O(1). An `Ident` is only meaningful together with the interner that
/// produced it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw `u32` index.
    ///
    /// Intended for deserialization and tests; use [`Interner::get_or_intern`]
    /// otherwise.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner is created per elaboration and shared (behind an `Arc`) with
/// the completed circuit, so names stay resolvable after elaboration ends.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. Already-interned strings
    /// return the existing identifier without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Returns the number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized as the list of interned strings, indexed by [`Ident`].
impl Serialize for Interner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = (0..self.len())
            .map(|i| {
                let ident = Ident::from_raw(u32::try_from(i).map_err(<S::Error as ser::Error>::custom)?);
                self.rodeo
                    .try_resolve(&ident)
                    .ok_or_else(|| <S::Error as ser::Error>::custom(format!("interner has no name for index {i}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        names.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Interner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let interner = Interner::new();
        for (i, name) in names.iter().enumerate() {
            let ident = interner.get_or_intern(name);
            if ident.as_raw() as usize != i {
                return Err(<D::Error as de::Error>::custom(format!("duplicate interned name `{name}`")));
            }
        }
        Ok(interner)
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.get_or_intern("clock");
        assert_eq!(interner.resolve(id), "clock");
    }

    #[test]
    fn same_string_same_ident() {
        let interner = Interner::new();
        let a = interner.get_or_intern("reset");
        let b = interner.get_or_intern("reset");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn get_does_not_intern() {
        let interner = Interner::new();
        assert!(interner.get("out").is_none());
        assert!(interner.is_empty());
        let id = interner.get_or_intern("out");
        assert_eq!(interner.get("out"), Some(id));
    }

    #[test]
    fn different_strings_different_idents() {
        let interner = Interner::new();
        let a = interner.get_or_intern("in_a");
        let b = interner.get_or_intern("in_b");
        assert_ne!(a, b);
    }

    #[test]
    fn serde_roundtrip() {
        let id = Ident(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn interner_serializes_its_names() {
        let interner = Interner::new();
        let top = interner.get_or_intern("Top");
        let clock = interner.get_or_intern("clock");
        let json = serde_json::to_string(&interner).unwrap();
        assert_eq!(json, r#"["Top","clock"]"#);
        let back: Interner = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resolve(top), "Top");
        assert_eq!(back.resolve(clock), "clock");
    }

    #[test]
    fn interner_rejects_duplicate_names() {
        assert!(serde_json::from_str::<Interner>(r#"["a","a"]"#).is_err());
    }
}
