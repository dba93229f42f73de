//! Circuit-wide module name allocation.

use std::collections::{HashMap, HashSet};

/// Hands out unique module names derived from desired names.
///
/// The first request for `Name` gets `Name`, later ones `Name_1`, `Name_2`,
/// and so on. A generated name that collides with an earlier desired name is
/// skipped.
#[derive(Debug, Default)]
pub struct ModuleNamespace {
    counters: HashMap<String, u32>,
    taken: HashSet<String>,
}

impl ModuleNamespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a name not handed out before, derived from `desired`.
    pub fn uniquify(&mut self, desired: &str) -> String {
        if self.taken.insert(desired.to_string()) {
            return desired.to_string();
        }
        let counter = self.counters.entry(desired.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{desired}_{counter}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Returns `true` if `name` has been handed out.
    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_keeps_name() {
        let mut ns = ModuleNamespace::new();
        assert_eq!(ns.uniquify("Adder"), "Adder");
        assert!(ns.contains("Adder"));
        assert!(!ns.contains("Adder_1"));
    }

    #[test]
    fn repeats_get_suffixes() {
        let mut ns = ModuleNamespace::new();
        assert_eq!(ns.uniquify("Adder"), "Adder");
        assert_eq!(ns.uniquify("Adder"), "Adder_1");
        assert_eq!(ns.uniquify("Adder"), "Adder_2");
        assert_eq!(ns.uniquify("Mux"), "Mux");
    }

    #[test]
    fn skips_names_already_desired() {
        let mut ns = ModuleNamespace::new();
        assert_eq!(ns.uniquify("Adder_1"), "Adder_1");
        assert_eq!(ns.uniquify("Adder"), "Adder");
        assert_eq!(ns.uniquify("Adder"), "Adder_2");
    }
}
