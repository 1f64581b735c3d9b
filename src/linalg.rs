//! The linear-algebra engine (§4.8): determinant, inverse, trace,
//! transpose, eigenvalues/vectors, rank, rref, characteristic polynomial,
//! and null/column space, all over exact rational arithmetic.

use crate::core::{Expression, Number};
use crate::engine::{simplify::Simplify, solve};
use crate::error::{CasError, CasResult};

/// Dense rational matrix, row-major, used internally by every linalg
/// operation. Built from and rendered back to `Expression::Matrix`.
#[derive(Debug, Clone, PartialEq)]
struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<Number>,
}

impl Mat {
    fn get(&self, r: usize, c: usize) -> &Number {
        &self.data[r * self.cols + c]
    }

    fn set(&mut self, r: usize, c: usize, v: Number) {
        self.data[r * self.cols + c] = v;
    }

    fn identity(n: usize) -> Self {
        let mut m = Mat { rows: n, cols: n, data: vec![Number::zero(); n * n] };
        for i in 0..n {
            m.set(i, i, Number::one());
        }
        m
    }

    fn row(&self, r: usize) -> Vec<Number> {
        (0..self.cols).map(|c| self.get(r, c).clone()).collect()
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            let (ia, ib) = (a * self.cols + c, b * self.cols + c);
            self.data.swap(ia, ib);
        }
    }
}

fn to_matrix(expr: &Expression) -> CasResult<Mat> {
    let Expression::Matrix(rows) = expr else {
        return Err(CasError::NotAMatrix(crate::render::to_plain(expr)));
    };
    let row_count = rows.len();
    let col_count = rows.first().map(Vec::len).unwrap_or(0);
    let mut data = Vec::with_capacity(row_count * col_count);
    for row in rows {
        for cell in row {
            let n = cell.as_number().cloned().ok_or_else(|| {
                CasError::Engine(format!("matrix entry '{}' did not resolve to a number", crate::render::to_plain(cell)))
            })?;
            data.push(n);
        }
    }
    Ok(Mat { rows: row_count, cols: col_count, data })
}

fn from_matrix(m: &Mat) -> Expression {
    let rows = (0..m.rows).map(|r| m.row(r).into_iter().map(Expression::Number).collect()).collect();
    Expression::matrix(rows)
}

fn require_square(m: &Mat) -> CasResult<()> {
    if m.rows != m.cols {
        return Err(CasError::NonSquare { rows: m.rows, cols: m.cols });
    }
    Ok(())
}

/// `det(M)` (§4.8): Bareiss-free cofactor expansion, exact over the
/// rationals; fine at the textbook-CAS sizes this engine targets.
pub fn det(expr: &Expression) -> CasResult<Expression> {
    let m = to_matrix(expr)?;
    require_square(&m)?;
    Ok(Expression::Number(determinant(&m)).simplify())
}

fn determinant(m: &Mat) -> Number {
    if m.rows == 1 {
        return m.get(0, 0).clone();
    }
    if m.rows == 2 {
        return m.get(0, 0).mul(m.get(1, 1)).add(&m.get(0, 1).mul(m.get(1, 0)).neg());
    }
    let mut total = Number::zero();
    for col in 0..m.cols {
        let cofactor = minor(m, 0, col);
        let term = m.get(0, col).mul(&determinant(&cofactor));
        total = if col % 2 == 0 { total.add(&term) } else { total.add(&term.neg()) };
    }
    total
}

fn minor(m: &Mat, skip_row: usize, skip_col: usize) -> Mat {
    let mut data = Vec::with_capacity((m.rows - 1) * (m.cols - 1));
    for r in 0..m.rows {
        if r == skip_row {
            continue;
        }
        for c in 0..m.cols {
            if c == skip_col {
                continue;
            }
            data.push(m.get(r, c).clone());
        }
    }
    Mat { rows: m.rows - 1, cols: m.cols - 1, data }
}

/// `inv(M)` (§4.8): Gauss-Jordan elimination augmented with the identity.
pub fn inv(expr: &Expression) -> CasResult<Expression> {
    let m = to_matrix(expr)?;
    require_square(&m)?;
    let n = m.rows;
    let det_value = determinant(&m);
    if det_value.is_zero() {
        return Err(CasError::Singular(crate::render::to_plain(expr)));
    }

    let mut work = m.clone();
    let mut inverse = Mat::identity(n);
    for pivot in 0..n {
        if work.get(pivot, pivot).is_zero() {
            let swap_row = (pivot + 1..n).find(|&r| !work.get(r, pivot).is_zero());
            let Some(swap_row) = swap_row else {
                return Err(CasError::Singular(crate::render::to_plain(expr)));
            };
            work.swap_rows(pivot, swap_row);
            inverse.swap_rows(pivot, swap_row);
        }
        let pivot_val = work.get(pivot, pivot).clone();
        for c in 0..n {
            work.set(pivot, c, work.get(pivot, c).div(&pivot_val).expect("pivot is nonzero"));
            inverse.set(pivot, c, inverse.get(pivot, c).div(&pivot_val).expect("pivot is nonzero"));
        }
        for r in 0..n {
            if r == pivot {
                continue;
            }
            let factor = work.get(r, pivot).clone();
            if factor.is_zero() {
                continue;
            }
            for c in 0..n {
                let new_work = work.get(r, c).add(&work.get(pivot, c).mul(&factor).neg());
                work.set(r, c, new_work);
                let new_inv = inverse.get(r, c).add(&inverse.get(pivot, c).mul(&factor).neg());
                inverse.set(r, c, new_inv);
            }
        }
    }
    Ok(from_matrix(&inverse))
}

/// `trace(M)` (§4.8): sum of the diagonal.
pub fn trace(expr: &Expression) -> CasResult<Expression> {
    let m = to_matrix(expr)?;
    require_square(&m)?;
    let sum = (0..m.rows).fold(Number::zero(), |acc, i| acc.add(m.get(i, i)));
    Ok(Expression::Number(sum))
}

/// `transpose(M)` (§4.8): no squareness requirement.
pub fn transpose(expr: &Expression) -> CasResult<Expression> {
    let m = to_matrix(expr)?;
    let mut out = Mat { rows: m.cols, cols: m.rows, data: vec![Number::zero(); m.rows * m.cols] };
    for r in 0..m.rows {
        for c in 0..m.cols {
            out.set(c, r, m.get(r, c).clone());
        }
    }
    Ok(from_matrix(&out))
}

/// `charpoly(M)` (§4.8): `det(M - λI)` as a polynomial in a fresh `λ`.
pub fn charpoly(expr: &Expression) -> CasResult<Expression> {
    let m = to_matrix(expr)?;
    require_square(&m)?;
    let lambda = Expression::symbol("λ");
    let rows: Vec<Vec<Expression>> = (0..m.rows)
        .map(|r| {
            (0..m.cols)
                .map(|c| {
                    let entry = Expression::Number(m.get(r, c).clone());
                    if r == c { Expression::sub(entry, lambda.clone()) } else { entry }
                })
                .collect()
        })
        .collect();
    let symbolic = Expression::matrix(rows);
    Ok(charpoly_determinant(&symbolic)?.simplify())
}

/// Cofactor-expand the determinant of a matrix of (possibly symbolic)
/// expressions, used by [`charpoly`] where entries carry `λ`.
fn charpoly_determinant(expr: &Expression) -> CasResult<Expression> {
    let Expression::Matrix(rows) = expr else {
        return Err(CasError::NotAMatrix(crate::render::to_plain(expr)));
    };
    let n = rows.len();
    if n == 1 {
        return Ok(rows[0][0].clone());
    }
    if n == 2 {
        return Ok(Expression::sub(
            Expression::mul(vec![rows[0][0].clone(), rows[1][1].clone()]),
            Expression::mul(vec![rows[0][1].clone(), rows[1][0].clone()]),
        ));
    }
    let mut terms = Vec::with_capacity(n);
    for col in 0..n {
        let sub_rows: Vec<Vec<Expression>> = rows[1..]
            .iter()
            .map(|row| row.iter().enumerate().filter(|(c, _)| *c != col).map(|(_, e)| e.clone()).collect())
            .collect();
        let sub_det = charpoly_determinant(&Expression::matrix(sub_rows))?;
        let term = Expression::mul(vec![rows[0][col].clone(), sub_det]);
        terms.push(if col % 2 == 0 { term } else { Expression::neg(term) });
    }
    Ok(Expression::add(terms))
}

/// `eigenvals(M)` (§4.8): exact only up to `max_exact_eigen_dim` (see
/// `CasConfig`); larger matrices report whichever rational roots of the
/// characteristic polynomial exist.
pub fn eigenvals(expr: &Expression, max_exact_dim: usize) -> CasResult<Vec<(Expression, usize)>> {
    let m = to_matrix(expr)?;
    require_square(&m)?;
    if m.rows > max_exact_dim {
        log::warn!("eigenvals: {}x{} exceeds the exact eigen-search ceiling of {max_exact_dim}", m.rows, m.rows);
    }
    let poly = charpoly(expr)?;
    let roots = solve::solve(&poly, "λ")?;
    Ok(group_multiplicities(roots))
}

fn group_multiplicities(roots: Vec<Expression>) -> Vec<(Expression, usize)> {
    let mut grouped: Vec<(Expression, usize)> = Vec::new();
    for root in roots {
        if let Some(entry) = grouped.iter_mut().find(|(r, _)| *r == root) {
            entry.1 += 1;
        } else {
            grouped.push((root, 1));
        }
    }
    grouped
}

/// `eigenvects(M)` (§4.8): for each eigenvalue, the nullspace basis of
/// `M - λI`.
pub fn eigenvects(expr: &Expression, max_exact_dim: usize) -> CasResult<Vec<(Expression, usize, Vec<Expression>)>> {
    let m = to_matrix(expr)?;
    let values = eigenvals(expr, max_exact_dim)?;
    let mut out = Vec::with_capacity(values.len());
    for (value, multiplicity) in values {
        let Some(numeric) = value.as_number().cloned() else {
            log::warn!("eigenvects: skipping non-rational eigenvalue {}", crate::render::to_plain(&value));
            continue;
        };
        let mut shifted = m.clone();
        for i in 0..shifted.rows {
            shifted.set(i, i, shifted.get(i, i).add(&numeric.neg()));
        }
        let basis = nullspace_vectors(&shifted);
        out.push((value, multiplicity, basis));
    }
    Ok(out)
}

/// `rank(M)` (§4.8): number of nonzero rows after row-reduction.
pub fn rank(expr: &Expression) -> CasResult<Expression> {
    let m = to_matrix(expr)?;
    let (reduced, _) = row_echelon(&m);
    let rank = reduced.iter().filter(|row| row.iter().any(|c| !c.is_zero())).count();
    Ok(Expression::integer(rank as i64))
}

/// `rref(M)` (§4.8): reduced row-echelon form plus pivot column indices.
pub fn rref(expr: &Expression) -> CasResult<(Expression, Vec<usize>)> {
    let m = to_matrix(expr)?;
    let (reduced, pivots) = row_echelon(&m);
    let rows = reduced.into_iter().map(|row| row.into_iter().map(Expression::Number).collect()).collect();
    Ok((Expression::matrix(rows), pivots))
}

/// Full Gauss-Jordan reduction to reduced row-echelon form, returning the
/// rows plus the pivot column indices, shared by `rank`, `rref`,
/// `nullspace`, and `colspace`.
fn row_echelon(m: &Mat) -> (Vec<Vec<Number>>, Vec<usize>) {
    let mut rows: Vec<Vec<Number>> = (0..m.rows).map(|r| m.row(r)).collect();
    let mut pivots = Vec::new();
    let mut pivot_row = 0usize;

    for col in 0..m.cols {
        if pivot_row >= rows.len() {
            break;
        }
        let Some(found) = (pivot_row..rows.len()).find(|&r| !rows[r][col].is_zero()) else { continue };
        rows.swap(pivot_row, found);
        let pivot_val = rows[pivot_row][col].clone();
        for v in rows[pivot_row].iter_mut() {
            *v = v.div(&pivot_val).expect("pivot is nonzero");
        }
        for r in 0..rows.len() {
            if r == pivot_row {
                continue;
            }
            let factor = rows[r][col].clone();
            if factor.is_zero() {
                continue;
            }
            for c in 0..m.cols {
                let pivot_cell = rows[pivot_row][c].clone();
                rows[r][c] = rows[r][c].add(&pivot_cell.mul(&factor).neg());
            }
        }
        pivots.push(col);
        pivot_row += 1;
    }
    (rows, pivots)
}

/// `nullspace(M)` (§4.8): basis vectors of `{v : Mv = 0}`; `{0}` when trivial.
pub fn nullspace(expr: &Expression) -> CasResult<Vec<Expression>> {
    let m = to_matrix(expr)?;
    Ok(nullspace_vectors(&m))
}

fn nullspace_vectors(m: &Mat) -> Vec<Expression> {
    let (reduced, pivots) = row_echelon(m);
    let free_cols: Vec<usize> = (0..m.cols).filter(|c| !pivots.contains(c)).collect();
    if free_cols.is_empty() {
        return vec![column_of_zeros(m.cols)];
    }

    let mut basis = Vec::with_capacity(free_cols.len());
    for &free in &free_cols {
        let mut vector = vec![Number::zero(); m.cols];
        vector[free] = Number::one();
        for (row_idx, &pivot_col) in pivots.iter().enumerate() {
            let coeff = reduced[row_idx][free].clone();
            vector[pivot_col] = coeff.neg();
        }
        basis.push(Expression::matrix(vector.into_iter().map(|n| vec![Expression::Number(n)]).collect()));
    }
    basis
}

fn column_of_zeros(n: usize) -> Expression {
    Expression::matrix(vec![Expression::zero(); n].into_iter().map(|z| vec![z]).collect())
}

/// `colspace(M)` (§4.8): basis vectors of the column space, i.e. the
/// original columns at the pivot positions found by row reduction.
pub fn colspace(expr: &Expression) -> CasResult<Vec<Expression>> {
    let m = to_matrix(expr)?;
    let (_, pivots) = row_echelon(&m);
    if pivots.is_empty() {
        return Ok(vec![column_of_zeros(m.rows)]);
    }
    Ok(pivots
        .into_iter()
        .map(|col| {
            let column: Vec<Expression> = (0..m.rows).map(|r| Expression::Number(m.get(r, col).clone())).collect();
            Expression::matrix(column.into_iter().map(|e| vec![e]).collect())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m2(a: i64, b: i64, c: i64, d: i64) -> Expression {
        Expression::matrix(vec![
            vec![Expression::integer(a), Expression::integer(b)],
            vec![Expression::integer(c), Expression::integer(d)],
        ])
    }

    #[test]
    fn determinant_of_two_by_two() {
        let m = m2(1, 2, 3, 4);
        assert_eq!(det(&m).unwrap(), Expression::integer(-2));
    }

    #[test]
    fn non_square_det_is_an_error() {
        let m = Expression::matrix(vec![vec![Expression::integer(1), Expression::integer(2)]]);
        assert!(matches!(det(&m).unwrap_err(), CasError::NonSquare { .. }));
    }

    #[test]
    fn inverse_of_identity_is_identity() {
        let m = m2(1, 0, 0, 1);
        assert_eq!(inv(&m).unwrap(), m);
    }

    #[test]
    fn singular_matrix_inversion_errors() {
        let m = m2(1, 2, 2, 4);
        assert!(matches!(inv(&m).unwrap_err(), CasError::Singular(_)));
    }

    #[test]
    fn trace_sums_the_diagonal() {
        let m = m2(1, 2, 3, 4);
        assert_eq!(trace(&m).unwrap(), Expression::integer(5));
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let m = Expression::matrix(vec![vec![Expression::integer(1), Expression::integer(2)]]);
        let expected = Expression::matrix(vec![vec![Expression::integer(1)], vec![Expression::integer(2)]]);
        assert_eq!(transpose(&m).unwrap(), expected);
    }

    #[test]
    fn rank_of_a_singular_matrix_is_one() {
        let m = m2(1, 2, 2, 4);
        assert_eq!(rank(&m).unwrap(), Expression::integer(1));
    }

    #[test]
    fn rref_reports_pivot_columns() {
        let m = m2(2, 0, 0, 2);
        let (reduced, pivots) = rref(&m).unwrap();
        assert_eq!(reduced, m2(1, 0, 0, 1));
        assert_eq!(pivots, vec![0, 1]);
    }

    #[test]
    fn nullspace_of_a_rank_deficient_matrix_is_nontrivial() {
        let m = m2(1, 2, 2, 4);
        let basis = nullspace(&m).unwrap();
        assert_eq!(basis.len(), 1);
    }

    #[test]
    fn eigenvals_of_identity_is_one_with_multiplicity_two() {
        let m = m2(1, 0, 0, 1);
        let values = eigenvals(&m, 3).unwrap();
        assert_eq!(values, vec![(Expression::integer(1), 2)]);
    }
}
