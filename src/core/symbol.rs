//! Interned algebraic symbols.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An algebraic symbol (variable name), interned via a [`SymbolCache`].
///
/// Two `Symbol`s are equal iff their names are equal; interning exists so a
/// session can hand out the same canonical instance for a given name rather
/// than reallocating a `String` at every parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    name: Rc<str>,
}

impl Symbol {
    /// Create a symbol directly, bypassing any cache. Prefer
    /// [`SymbolCache::intern`] when a session is available so repeated uses
    /// of the same name share one allocation.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: Rc::from(name.into()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Maps a symbol name to its canonical [`Symbol`] for the lifetime of a
/// session, per §3 ("The symbol cache maps name → canonical Symbol for the
/// lifetime of the session").
#[derive(Debug, Default)]
pub struct SymbolCache {
    table: RefCell<HashMap<String, Symbol>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical `Symbol` for `name`, creating it on first use.
    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(sym) = self.table.borrow().get(name) {
            return sym.clone();
        }
        let sym = Symbol::new(name);
        self.table.borrow_mut().insert(name.to_string(), sym.clone());
        sym
    }

    pub fn clear(&self) {
        self.table.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_reuses_the_same_symbol() {
        let cache = SymbolCache::new();
        let x1 = cache.intern("x");
        let x2 = cache.intern("x");
        assert_eq!(x1, x2);
        assert!(Rc::ptr_eq(&x1.name, &x2.name));
    }

    #[test]
    fn display_is_the_bare_name() {
        let x = Symbol::new("alpha");
        assert_eq!(format!("{x}"), "alpha");
    }

    #[test]
    fn clear_forgets_previously_interned_symbols() {
        let cache = SymbolCache::new();
        let x1 = cache.intern("x");
        cache.clear();
        let x2 = cache.intern("x");
        assert_eq!(x1, x2);
        assert!(!Rc::ptr_eq(&x1.name, &x2.name));
    }
}
