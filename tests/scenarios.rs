//! End-to-end scenarios exercising the public `Workspace::evaluate` entry
//! point the way an embedding host would call it.

use quillmath_core::Workspace;

#[test]
fn scenario_01_assignment_then_read() {
    let mut ws = Workspace::new();
    let assign = ws.evaluate("x = 5").unwrap();
    assert_eq!(assign.plain, "5");
    let read = ws.evaluate("x").unwrap();
    assert_eq!(read.plain, "5");
}

#[test]
fn scenario_02_chained_reassignment_propagates() {
    let mut ws = Workspace::new();
    ws.evaluate("a = 1").unwrap();
    ws.evaluate("b = a+1").unwrap();
    ws.evaluate("c = b+1").unwrap();
    ws.evaluate("d = c+1").unwrap();
    assert!(ws.evaluate("d").unwrap().plain.contains('4'));

    ws.evaluate("a = 10").unwrap();
    assert!(ws.evaluate("d").unwrap().plain.contains("13"));
}

#[test]
fn scenario_03_circular_assignment_is_detected_on_read() {
    let mut ws = Workspace::new();
    ws.evaluate("p = q+1").unwrap();
    ws.evaluate("q = p+1").unwrap();
    let err = ws.evaluate("p").unwrap_err();
    assert!(err.to_string().contains("ircular"));
}

#[test]
fn scenario_04_function_definition_then_call() {
    let mut ws = Workspace::new();
    ws.evaluate("f(x) = x^2+1").unwrap();
    let result = ws.evaluate("f(3)").unwrap();
    assert!(result.plain.contains("10"));
}

#[test]
fn scenario_05_definite_integral() {
    let mut ws = Workspace::new();
    let result = ws.evaluate(r"\int_{0}^{5} 5x").unwrap();
    assert!(result.plain.contains("125"));
}

#[test]
fn scenario_06_big_sum_and_product() {
    let mut ws = Workspace::new();
    let sum = ws.evaluate(r"\sum_{n=0}^{5} n").unwrap();
    assert_eq!(sum.plain, "15");

    let prod = ws.evaluate(r"\prod _0^2 5x").unwrap();
    assert_eq!(prod.plain, "0");
}

#[test]
fn scenario_07_solve_quadratic() {
    let mut ws = Workspace::new();
    let result = ws.evaluate("solve(x^2 - 5*x + 6, x)").unwrap();
    assert!(result.plain.contains('2'));
    assert!(result.plain.contains('3'));
}

#[test]
fn scenario_08_simplify_pythagorean_identity() {
    let mut ws = Workspace::new();
    let result = ws.evaluate("simplify(sin(x)^2 + cos(x)^2)").unwrap();
    assert_eq!(result.plain, "1");
}

#[test]
fn scenario_09_limit_of_sinc_at_zero() {
    let mut ws = Workspace::new();
    let result = ws.evaluate("limit(sin(x)/x, x, 0)").unwrap();
    assert_eq!(result.plain, "1");
}

#[test]
fn scenario_10_matrix_assignment_then_determinant() {
    let mut ws = Workspace::new();
    ws.evaluate(r"M = \begin{pmatrix}1&2\\3&4\end{pmatrix}").unwrap();
    let det = ws.evaluate("det(M)").unwrap();
    assert!(det.plain.contains("-2"));
}

#[test]
fn scenario_11_empty_input_is_ok_and_empty() {
    let mut ws = Workspace::new();
    let record = ws.evaluate("   ").unwrap();
    assert!(record.ok);
    assert_eq!(record.plain, "");
}

#[test]
fn scenario_12_bare_limit_keeps_lim_prefix() {
    let mut ws = Workspace::new();
    let record = ws.evaluate(r"\lim x+2").unwrap();
    assert!(record.latex.starts_with(r"\lim "));
    assert!(!record.latex.contains(r"i \cdot l \cdot m"));
}

#[test]
fn evaluate_json_reports_ok_false_and_error_string_on_failure() {
    let mut ws = Workspace::new();
    let value = ws.evaluate_json("(((");
    assert_eq!(value["ok"], false);
    assert!(value["error"].is_string());
}

#[test]
fn clear_forgets_every_binding_between_sessions() {
    let mut ws = Workspace::new();
    ws.evaluate("x = 5").unwrap();
    ws.evaluate("f(t) = t+1").unwrap();
    ws.clear();
    let snapshot = ws.introspect();
    assert!(snapshot.variables.is_empty());
    assert!(snapshot.functions.is_empty());
}

#[test]
fn introspect_reports_deps_for_a_dependent_variable() {
    let mut ws = Workspace::new();
    ws.evaluate("a = 1").unwrap();
    ws.evaluate("b = a+1").unwrap();
    let snapshot = ws.introspect();
    let b = &snapshot.variables["b"];
    assert_eq!(b.deps, vec!["a".to_string()]);
}

#[test]
fn non_rational_fraction_carries_a_numeric_pair() {
    let mut ws = Workspace::new();
    let record = ws.evaluate("1/3").unwrap();
    assert!(record.numeric_plain.is_some());
}

#[test]
fn integer_result_never_carries_a_numeric_pair() {
    let mut ws = Workspace::new();
    let record = ws.evaluate("2+2").unwrap();
    assert!(record.numeric_plain.is_none());
}
