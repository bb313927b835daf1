use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::function::Function;

/// Functions known to an engine, looked up case-insensitively.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Arc<dyn Function>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for f in crate::builtins::builtins() {
            registry.register(f);
        }
        registry
    }

    /// Add `function`, returning any function it replaced.
    pub fn register(&mut self, function: Arc<dyn Function>) -> Option<Arc<dyn Function>> {
        self.functions
            .insert(function.name().to_ascii_uppercase(), function)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(&name.to_ascii_uppercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names beginning with `prefix`, sorted.
    pub fn names_starting_with(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_ascii_uppercase();
        let mut names: Vec<&str> = self
            .functions
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// A classifier for the parser that flags calls to volatile functions.
    pub fn volatility_classifier(&self) -> impl Fn(&str) -> bool + Send + Sync + 'static {
        let volatile: FxHashSet<String> = self
            .functions
            .iter()
            .filter(|(_, f)| f.volatile())
            .map(|(k, _)| k.clone())
            .collect();
        move |name: &str| volatile.contains(&name.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.get("sum").is_some());
        assert!(registry.contains("Sum"));
        assert!(registry.get("NOPE").is_none());
    }

    #[test]
    fn prefix_search_and_volatility() {
        let registry = FunctionRegistry::with_builtins();
        let names = registry.names_starting_with("ra");
        assert_eq!(names, vec!["RAND", "RANDBETWEEN"]);
        let classify = registry.volatility_classifier();
        assert!(classify("rand"));
        assert!(!classify("SUM"));
    }
}
