//! QuillMath Core - Symbolic Algebra Core for a Browser-Embeddable CAS
//!
//! A Rust core for a computer algebra system: LaTeX parsing, a symbolic
//! expression kernel, a reactive variable/function store, an
//! algebra/calculus engine, and a linear-algebra engine, behind one
//! evaluation entry point ([`Workspace`]).

pub mod api;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod linalg;
pub mod parsing;
pub mod preprocess;
pub mod render;
pub mod resolver;
pub mod session;

pub use api::{EngineInfo, EvalOutcome, Workspace};
pub use config::CasConfig;
pub use error::{CasError, CasResult};

/// Re-exports for the common embedding path: construct a [`Workspace`],
/// call `evaluate`, read the result back as an [`render::EvalRecord`].
pub mod prelude {
    pub use crate::api::{EngineInfo, EvalOutcome, Workspace};
    pub use crate::config::CasConfig;
    pub use crate::core::{Expression, Number, Symbol};
    pub use crate::error::{CasError, CasResult};
    pub use crate::render::{EvalRecord, RecordKind};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn evaluates_a_plain_expression() {
        let mut ws = Workspace::new();
        let record = ws.evaluate("2+3*4").unwrap();
        assert_eq!(record.plain, "14");
    }

    #[test]
    fn reactive_assignment_propagates_on_reread() {
        let mut ws = Workspace::new();
        ws.evaluate("a = 2").unwrap();
        ws.evaluate("b = a + 1").unwrap();
        assert_eq!(ws.evaluate("b").unwrap().plain, "3");
        ws.evaluate("a = 10").unwrap();
        assert_eq!(ws.evaluate("b").unwrap().plain, "11");
    }
}
