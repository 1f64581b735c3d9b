//! The reactive session store (§4.6): variable and function bindings plus
//! the symbol cache they share.

use crate::core::{Expression, Symbol, SymbolCache};
use std::collections::{BTreeSet, HashMap};

/// A variable binding: `name → { body, deps }` (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct VarBinding {
    pub body: Expression,
    pub deps: BTreeSet<String>,
}

/// A function binding: `name → { params, body, deps }` (§3). The body is
/// stored unresolved (§9's open question, resolved: function bodies stay
/// unresolved so later variable changes propagate through a call).
#[derive(Debug, Clone, PartialEq)]
pub struct FnBinding {
    pub params: Vec<Symbol>,
    pub body: Expression,
    pub deps: BTreeSet<String>,
}

/// Variable and function tables plus the symbol cache, for the lifetime of
/// one embedding session.
#[derive(Debug, Default)]
pub struct Session {
    variables: HashMap<String, VarBinding>,
    functions: HashMap<String, FnBinding>,
    pub symbols: SymbolCache,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_var(&mut self, name: &str, body: Expression, deps: BTreeSet<String>) {
        log::debug!("session: bind_var {name}");
        self.variables.insert(name.to_string(), VarBinding { body, deps });
    }

    pub fn bind_fn(&mut self, name: &str, params: Vec<Symbol>, body: Expression, deps: BTreeSet<String>) {
        log::debug!("session: bind_fn {name}/{}", params.len());
        self.functions.insert(name.to_string(), FnBinding { params, body, deps });
    }

    pub fn lookup_var(&self, name: &str) -> Option<&VarBinding> {
        self.variables.get(name)
    }

    pub fn lookup_fn(&self, name: &str) -> Option<&FnBinding> {
        self.functions.get(name)
    }

    pub fn var_names(&self) -> std::collections::HashSet<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn fn_names(&self) -> std::collections::HashSet<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        log::debug!("session: clear");
        self.variables.clear();
        self.functions.clear();
        self.symbols.clear();
    }

    /// §4.6, "`snapshot()` — returns a serialized description of both
    /// tables".
    pub fn snapshot(&self, render_latex: impl Fn(&Expression) -> String) -> SessionSnapshot {
        let variables = self
            .variables
            .iter()
            .map(|(name, binding)| {
                (
                    name.clone(),
                    VarSnapshot { latex: render_latex(&binding.body), deps: binding.deps.iter().cloned().collect() },
                )
            })
            .collect();
        let functions = self
            .functions
            .iter()
            .map(|(name, binding)| {
                (
                    name.clone(),
                    FnSnapshot {
                        latex: render_latex(&binding.body),
                        params: binding.params.iter().map(|p| p.name().to_string()).collect(),
                        deps: binding.deps.iter().cloned().collect(),
                    },
                )
            })
            .collect();
        SessionSnapshot { variables, functions }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VarSnapshot {
    pub latex: String,
    pub deps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FnSnapshot {
    pub latex: String,
    pub params: Vec<String>,
    pub deps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SessionSnapshot {
    pub variables: HashMap<String, VarSnapshot>,
    pub functions: HashMap<String, FnSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_lookup_roundtrips() {
        let mut session = Session::new();
        session.bind_var("x", Expression::integer(5), BTreeSet::new());
        assert_eq!(session.lookup_var("x").unwrap().body, Expression::integer(5));
    }

    #[test]
    fn rebinding_overwrites() {
        let mut session = Session::new();
        session.bind_var("x", Expression::integer(5), BTreeSet::new());
        session.bind_var("x", Expression::integer(6), BTreeSet::new());
        assert_eq!(session.lookup_var("x").unwrap().body, Expression::integer(6));
    }

    #[test]
    fn clear_empties_everything() {
        let mut session = Session::new();
        session.bind_var("x", Expression::integer(5), BTreeSet::new());
        session.clear();
        assert!(session.lookup_var("x").is_none());
    }
}
