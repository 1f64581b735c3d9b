//! Property-based tests (§10.4): canonical-form stability under
//! permutation, and cycle detection over arbitrary-length binding chains.

use proptest::prelude::*;
use quillmath_core::prelude::*;
use quillmath_core::Workspace;

/// A handful of distinct single-letter symbol names, kept short so
/// generated terms collide on like-bases often enough to exercise the
/// collection path in `Expression::add`/`mul`, not just the flatten path.
const NAMES: [&str; 4] = ["x", "y", "z", "w"];

fn term_strategy() -> impl Strategy<Value = Expression> {
    (0..NAMES.len(), -5i64..=5i64).prop_map(|(i, coeff)| {
        let sym = Expression::symbol(Symbol::new(NAMES[i]));
        if coeff == 0 {
            Expression::zero()
        } else {
            Expression::mul(vec![Expression::integer(coeff), sym])
        }
    })
}

fn shuffled(mut terms: Vec<Expression>, seed: usize) -> Vec<Expression> {
    // Deterministic rotation stands in for a shuffle: proptest forbids
    // `rand`'s thread-local RNG inside a strategy closure, and a rotation
    // by every offset still covers every relative ordering pairwise.
    if !terms.is_empty() {
        terms.rotate_left(seed % terms.len());
    }
    terms
}

proptest! {
    /// `Expression::add` must not care about the order its terms arrive in.
    #[test]
    fn add_is_order_independent(terms in prop::collection::vec(term_strategy(), 1..8), seed in 0usize..16) {
        let a = Expression::add(terms.clone());
        let b = Expression::add(shuffled(terms, seed));
        prop_assert_eq!(a, b);
    }

    /// `Expression::mul` must not care about the order its factors arrive in.
    #[test]
    fn mul_is_order_independent(factors in prop::collection::vec(term_strategy(), 1..8), seed in 0usize..16) {
        let a = Expression::mul(factors.clone());
        let b = Expression::mul(shuffled(factors, seed));
        prop_assert_eq!(a, b);
    }

    /// Parsing a canonical expression's own rendering back must reproduce
    /// the same canonical form — a second pass through the smart
    /// constructors is idempotent.
    #[test]
    fn canonical_add_is_stable_under_rebuild(terms in prop::collection::vec(term_strategy(), 1..6)) {
        let once = Expression::add(terms);
        let twice = Expression::add(vec![once.clone()]);
        prop_assert_eq!(once, twice);
    }

    /// A chain of `n` variable bindings each depending on the next, closed
    /// into a cycle by the last depending on the first, must report
    /// `CircularDependency` when any member is read back — regardless of
    /// cycle length or which member is read.
    #[test]
    fn arbitrary_length_binding_cycles_are_detected(len in 2usize..8, read_offset in 0usize..8) {
        let mut ws = Workspace::new();
        let names: Vec<String> = (0..len).map(|i| format!("v{i}")).collect();
        for i in 0..len {
            let dep = &names[(i + 1) % len];
            ws.evaluate(&format!("{} = {} + 1", names[i], dep)).unwrap();
        }
        let read = &names[read_offset % len];
        let err = ws.evaluate(read).unwrap_err();
        prop_assert!(err.to_string().contains("ircular"));
    }
}
