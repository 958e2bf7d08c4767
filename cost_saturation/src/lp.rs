//! The LP interface consumed by post-hoc optimization and optimal cost partitioning,
//! plus a small bundled two-phase simplex so the crate is self-contained and testable.
//!
//! Grounded on how post-hoc-optimization and optimal cost-partitioning heuristics
//! inject `osi`/`cplex`/`soplex` bindings behind an `LP` abstraction: the trait is the
//! real consumed interface; `simplex` is a minimal stand-in, not a production solver.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    LessEqual,
    GreaterEqual,
    Equal,
}

#[derive(Debug, Clone)]
pub struct LpConstraint {
    pub coefficients: Vec<f64>,
    pub kind: ConstraintKind,
    pub rhs: f64,
}

/// A maximization LP over non-negative variables: `maximize c^T x` subject to
/// `constraints`, `x >= 0`.
#[derive(Debug, Clone)]
pub struct LpProblem {
    pub num_vars: usize,
    pub objective: Vec<f64>,
    pub constraints: Vec<LpConstraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpResult {
    Optimal { value: f64, assignment: Vec<f64> },
    Infeasible,
    Unbounded,
}

/// Solves maximization LPs over non-negative variables. The cost-partitioning LPs
/// (post-hoc optimization, optimal CP) are built and solved against this trait, so a
/// production driver can inject a real solver without touching the rest of the crate.
pub trait LpSolver {
    fn solve(&self, problem: &LpProblem) -> LpResult;
}

/// Bundled two-phase primal simplex with Bland's rule (always pick the lowest-indexed
/// eligible entering/leaving column) to guarantee termination on degenerate tableaus,
/// at the cost of possibly more pivots than a pricing rule tuned for speed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimplexSolver;

const EPS: f64 = 1e-9;

impl LpSolver for SimplexSolver {
    fn solve(&self, problem: &LpProblem) -> LpResult {
        simplex::solve(problem)
    }
}

mod simplex {
    use super::{ConstraintKind, LpProblem, LpResult, EPS};

    /// Dense simplex tableau: `rows` constraint rows each of length
    /// `num_vars + num_slack_surplus + num_artificial + 1` (last column is the RHS),
    /// plus one trailing objective row of the same width.
    struct Tableau {
        rows: Vec<Vec<f64>>,
        objective: Vec<f64>,
        basis: Vec<usize>,
        num_cols: usize,
    }

    fn pivot(tableau: &mut Tableau, row: usize, col: usize) {
        let width = tableau.num_cols;
        let pivot_val = tableau.rows[row][col];
        for j in 0..width {
            tableau.rows[row][j] /= pivot_val;
        }
        for r in 0..tableau.rows.len() {
            if r == row {
                continue;
            }
            let factor = tableau.rows[r][col];
            if factor.abs() > EPS {
                for j in 0..width {
                    tableau.rows[r][j] -= factor * tableau.rows[row][j];
                }
            }
        }
        let factor = tableau.objective[col];
        if factor.abs() > EPS {
            for j in 0..width {
                tableau.objective[j] -= factor * tableau.rows[row][j];
            }
        }
        tableau.basis[row] = col;
    }

    /// Runs simplex iterations against `tableau.objective` (stored as reduced costs to
    /// *minimize*: optimal once every entry except the RHS column is `>= -EPS`).
    /// Returns `false` if the problem is unbounded in the direction being minimized.
    fn run(tableau: &mut Tableau) -> bool {
        loop {
            let width = tableau.num_cols;
            // Bland's rule: lowest-indexed column with a negative reduced cost enters.
            let Some(entering) = (0..width - 1).find(|&j| tableau.objective[j] < -EPS) else {
                return true;
            };
            let mut leaving_row = None;
            let mut best_ratio = f64::INFINITY;
            for r in 0..tableau.rows.len() {
                let coeff = tableau.rows[r][entering];
                if coeff > EPS {
                    let ratio = tableau.rows[r][width - 1] / coeff;
                    if ratio < best_ratio - EPS
                        || (ratio < best_ratio + EPS && leaving_row.map_or(true, |lr| tableau.basis[lr] > tableau.basis[r]))
                    {
                        best_ratio = ratio;
                        leaving_row = Some(r);
                    }
                }
            }
            let Some(row) = leaving_row else {
                return false; // unbounded: entering column has no blocking row.
            };
            pivot(tableau, row, entering);
        }
    }

    pub fn solve(problem: &LpProblem) -> LpResult {
        let num_vars = problem.num_vars;
        let num_constraints = problem.constraints.len();

        // One slack/surplus column per constraint (+1 for Le, -1 for Ge, 0 for Eq),
        // plus one artificial column for every Ge/Eq constraint (and for any Le row
        // whose RHS had to be negated to make it non-negative).
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(num_constraints);
        let mut needs_artificial = vec![false; num_constraints];
        let mut slack_sign = vec![0.0_f64; num_constraints];

        for (i, c) in problem.constraints.iter().enumerate() {
            let mut coeffs = c.coefficients.clone();
            coeffs.resize(num_vars, 0.0);
            let mut rhs = c.rhs;
            let mut kind = c.kind;
            if rhs < 0.0 {
                for v in coeffs.iter_mut() {
                    *v = -*v;
                }
                rhs = -rhs;
                kind = match kind {
                    ConstraintKind::LessEqual => ConstraintKind::GreaterEqual,
                    ConstraintKind::GreaterEqual => ConstraintKind::LessEqual,
                    ConstraintKind::Equal => ConstraintKind::Equal,
                };
            }
            match kind {
                ConstraintKind::LessEqual => slack_sign[i] = 1.0,
                ConstraintKind::GreaterEqual => {
                    slack_sign[i] = -1.0;
                    needs_artificial[i] = true;
                }
                ConstraintKind::Equal => {
                    slack_sign[i] = 0.0;
                    needs_artificial[i] = true;
                }
            }
            let mut row = coeffs;
            row.push(rhs);
            rows.push(row);
        }

        let num_slack = num_constraints;
        let artificial_indices: Vec<usize> = (0..num_constraints).filter(|&i| needs_artificial[i]).collect();
        let num_artificial = artificial_indices.len();
        let num_cols = num_vars + num_slack + num_artificial + 1;

        // Expand every row to the full column width: original vars | slacks | artificials | rhs.
        let mut artificial_col_of_row = vec![None; num_constraints];
        for (idx, &row_i) in artificial_indices.iter().enumerate() {
            artificial_col_of_row[row_i] = Some(num_vars + num_slack + idx);
        }
        let mut full_rows = Vec::with_capacity(num_constraints);
        let mut basis = Vec::with_capacity(num_constraints);
        for i in 0..num_constraints {
            let rhs = rows[i][num_vars];
            let mut row = vec![0.0; num_cols];
            row[..num_vars].copy_from_slice(&rows[i][..num_vars]);
            row[num_vars + i] = slack_sign[i];
            let basis_col = if let Some(art_col) = artificial_col_of_row[i] {
                row[art_col] = 1.0;
                art_col
            } else {
                num_vars + i
            };
            row[num_cols - 1] = rhs;
            full_rows.push(row);
            basis.push(basis_col);
        }

        let mut tableau = Tableau {
            rows: full_rows,
            objective: vec![0.0; num_cols],
            basis,
            num_cols,
        };

        if num_artificial > 0 {
            // Phase 1: minimize the sum of artificial variables. Feasible iff that
            // minimum is (numerically) zero.
            for &row_i in &artificial_indices {
                let col = artificial_col_of_row[row_i].unwrap();
                tableau.objective[col] = 1.0;
            }
            for &row_i in &artificial_indices {
                let factor = tableau.objective[tableau.basis[row_i]];
                if factor.abs() > EPS {
                    for j in 0..tableau.num_cols {
                        tableau.objective[j] -= factor * tableau.rows[row_i][j];
                    }
                }
            }
            if !run(&mut tableau) {
                return LpResult::Infeasible;
            }
            if tableau.objective[tableau.num_cols - 1].abs() > 1e-6 {
                return LpResult::Infeasible;
            }
            // Drive any artificial still in the basis (at value 0) out, if possible.
            for (row_i, &art_row_basis) in tableau.basis.clone().iter().enumerate() {
                if artificial_indices.iter().any(|&i| artificial_col_of_row[i] == Some(art_row_basis)) {
                    if let Some(col) = (0..num_vars + num_slack).find(|&j| tableau.rows[row_i][j].abs() > EPS) {
                        pivot(&mut tableau, row_i, col);
                    }
                }
            }
        }

        // Phase 2: minimize `-objective` (equivalent to maximizing `objective`) over
        // the real variables and slacks only; artificial columns are pinned to 0 and
        // never re-enter since phase 1 drove them out or they stay at value 0.
        let mut phase2_objective = vec![0.0; num_cols];
        for j in 0..num_vars {
            phase2_objective[j] = -problem.objective.get(j).copied().unwrap_or(0.0);
        }
        tableau.objective = phase2_objective;
        for r in 0..tableau.rows.len() {
            let basis_col = tableau.basis[r];
            let factor = tableau.objective[basis_col];
            if factor.abs() > EPS {
                for j in 0..tableau.num_cols {
                    tableau.objective[j] -= factor * tableau.rows[r][j];
                }
            }
        }
        // Artificial columns must never be chosen as an entering column in phase 2.
        for &i in &artificial_indices {
            if let Some(col) = artificial_col_of_row[i] {
                tableau.objective[col] = f64::INFINITY;
            }
        }
        if !run(&mut tableau) {
            return LpResult::Unbounded;
        }

        let mut assignment = vec![0.0; num_vars];
        for (row, &basis_col) in tableau.basis.iter().enumerate() {
            if basis_col < num_vars {
                assignment[basis_col] = tableau.rows[row][tableau.num_cols - 1];
            }
        }
        let value: f64 = assignment.iter().zip(&problem.objective).map(|(x, c)| x * c).sum();
        LpResult::Optimal { value, assignment }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_le_problem() {
        // maximize x + y s.t. x + 2y <= 4, 3x + y <= 6, x,y >= 0
        let problem = LpProblem {
            num_vars: 2,
            objective: vec![1.0, 1.0],
            constraints: vec![
                LpConstraint { coefficients: vec![1.0, 2.0], kind: ConstraintKind::LessEqual, rhs: 4.0 },
                LpConstraint { coefficients: vec![3.0, 1.0], kind: ConstraintKind::LessEqual, rhs: 6.0 },
            ],
        };
        match SimplexSolver.solve(&problem) {
            LpResult::Optimal { value, .. } => assert!((value - 2.8).abs() < 1e-6),
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    #[test]
    fn detects_infeasible_problem() {
        // x >= 5 and x <= 1 is infeasible for x >= 0.
        let problem = LpProblem {
            num_vars: 1,
            objective: vec![1.0],
            constraints: vec![
                LpConstraint { coefficients: vec![1.0], kind: ConstraintKind::GreaterEqual, rhs: 5.0 },
                LpConstraint { coefficients: vec![1.0], kind: ConstraintKind::LessEqual, rhs: 1.0 },
            ],
        };
        assert_eq!(SimplexSolver.solve(&problem), LpResult::Infeasible);
    }

    #[test]
    fn solves_equality_constraint() {
        // maximize x s.t. x + y = 3, x <= 2
        let problem = LpProblem {
            num_vars: 2,
            objective: vec![1.0, 0.0],
            constraints: vec![
                LpConstraint { coefficients: vec![1.0, 1.0], kind: ConstraintKind::Equal, rhs: 3.0 },
                LpConstraint { coefficients: vec![1.0, 0.0], kind: ConstraintKind::LessEqual, rhs: 2.0 },
            ],
        };
        match SimplexSolver.solve(&problem) {
            LpResult::Optimal { value, .. } => assert!((value - 2.0).abs() < 1e-6),
            other => panic!("expected optimal, got {other:?}"),
        }
    }
}
