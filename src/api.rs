//! The crate-root facade (§6): a single evaluation entry point plus the
//! state-management pair (`clear`, `introspect`) an embedding host talks to.
//! Everything else in the crate is reachable only through this surface.

use crate::config::CasConfig;
use crate::dispatch;
use crate::render::{self, EvalRecord};
use crate::session::{Session, SessionSnapshot};

/// The result of one evaluation: `Ok` on success, `Err` describing the one
/// user-visible failure (§7). JSON consumers use [`Workspace::evaluate_json`]
/// for the flattened `{ok, ...}` / `{ok:false, error}` shape; native callers
/// match on this directly.
pub type EvalOutcome = crate::error::CasResult<EvalRecord>;

/// Backend/version metadata (§6, "Engine info").
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// One embedding session: a variable/function store plus the config it was
/// built with. Cheap to construct; expensive to share across threads (it
/// isn't `Sync`) — an embedding host owns one per tab/worker.
#[derive(Debug, Default)]
pub struct Workspace {
    session: Session,
    config: CasConfig,
}

impl Workspace {
    /// A fresh workspace with default tunables (§6).
    pub fn new() -> Self {
        Self { session: Session::new(), config: CasConfig::default() }
    }

    /// A fresh workspace with caller-supplied tunables, e.g. a lower series
    /// order for a constrained widget.
    pub fn with_config(config: CasConfig) -> Self {
        Self { session: Session::new(), config }
    }

    /// The single evaluation entry point (§4, §6): runs one line of
    /// input through the command-dispatch priority chain and returns the
    /// resulting record, or the error that stopped it. Never panics on
    /// malformed input.
    pub fn evaluate(&mut self, input: &str) -> EvalOutcome {
        log::trace!("workspace: evaluate {input:?}");
        dispatch::dispatch(input, &mut self.session, &self.config)
    }

    /// [`Self::evaluate`], flattened into the `{ok, ...}` / `{ok:false,
    /// error}` JSON shape an embedding host serializes directly (§7).
    pub fn evaluate_json(&mut self, input: &str) -> serde_json::Value {
        let record = match self.evaluate(input) {
            Ok(record) => record,
            Err(err) => EvalRecord::error(err.to_string()),
        };
        serde_json::to_value(&record).unwrap_or_else(|e| {
            serde_json::json!({ "ok": false, "error": e.to_string() })
        })
    }

    /// `clear()` (§6): forgets every bound variable, function, and interned
    /// symbol name, returning the workspace to its freshly-constructed state.
    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// `introspect()` (§6): a serializable snapshot of every variable and
    /// function binding, keyed by name.
    pub fn introspect(&self) -> SessionSnapshot {
        self.session.snapshot(render::to_latex)
    }

    /// Backend/version metadata, mirroring the teacher's `cas_engine_info()`.
    pub fn engine_info(&self) -> EngineInfo {
        EngineInfo { name: env!("CARGO_PKG_NAME"), version: env!("CARGO_PKG_VERSION") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_returns_ok_for_simple_arithmetic() {
        let mut ws = Workspace::new();
        let record = ws.evaluate("1+1").unwrap();
        assert_eq!(record.plain, "2");
    }

    #[test]
    fn evaluate_json_flattens_errors() {
        let mut ws = Workspace::new();
        let value = ws.evaluate_json("solve(1,2,3)");
        assert_eq!(value["ok"], false);
        assert!(value["error"].as_str().is_some());
    }

    #[test]
    fn clear_forgets_bindings() {
        let mut ws = Workspace::new();
        ws.evaluate("x = 5").unwrap();
        ws.clear();
        let snapshot = ws.introspect();
        assert!(snapshot.variables.is_empty());
    }

    #[test]
    fn introspect_reports_bound_variable() {
        let mut ws = Workspace::new();
        ws.evaluate("x = 5").unwrap();
        let snapshot = ws.introspect();
        assert!(snapshot.variables.contains_key("x"));
    }

    #[test]
    fn engine_info_reports_crate_name() {
        let ws = Workspace::new();
        assert_eq!(ws.engine_info().name, "quillmath-core");
    }
}
