// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Binary packing model.
//!
//! A `Model` describes the problem
//!
//! ```text
//! maximize    c^T x
//! subject to  A x <= b
//!             x in {0, 1}^n
//! ```
//!
//! with a non-negative coefficient matrix `A` and non-negative right-hand
//! sides `b`. Multi-dimensional knapsacks and set packing problems (and thus
//! combinatorial auctions) fit this shape. The restriction keeps the all-zero
//! assignment feasible, which the LP relaxation and the rounding heuristic of
//! the solver rely on.
//!
//! Coefficients are stored densely in row-major order. Instances handled by
//! the benchmarks are small enough that a dense layout is both simpler and
//! faster to scan than a compressed one.

use crate::index::{ConstraintIndex, VariableIndex};

/// Errors raised while building or editing a `Model`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The model has no variables or no constraints.
    #[error("model dimensions must be positive (variables: {variables}, constraints: {constraints})")]
    InvalidDimensions {
        variables: usize,
        constraints: usize,
    },
    /// A coefficient of the constraint matrix is negative.
    #[error("coefficient of {variable} in {constraint} is negative: {value}")]
    NegativeCoefficient {
        constraint: ConstraintIndex,
        variable: VariableIndex,
        value: f64,
    },
    /// A right-hand side is negative.
    #[error("right-hand side of {constraint} is negative: {value}")]
    NegativeRhs {
        constraint: ConstraintIndex,
        value: f64,
    },
    /// A value is NaN or infinite.
    #[error("non-finite value in {context}")]
    NonFinite { context: &'static str },
    /// A row or permutation has the wrong length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// An immutable binary packing model.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    num_variables: usize,
    num_constraints: usize,
    objective: Vec<f64>,
    coefficients: Vec<f64>,
    rhs: Vec<f64>,
}

impl Model {
    /// Returns the name of the model.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of decision variables.
    #[inline]
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Returns the number of constraints.
    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Returns the objective coefficient of `variable`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is out of bounds.
    #[inline]
    pub fn objective(&self, variable: VariableIndex) -> f64 {
        self.objective[variable.get()]
    }

    /// Returns all objective coefficients.
    #[inline]
    pub fn objective_coefficients(&self) -> &[f64] {
        &self.objective
    }

    /// Returns the coefficient of `variable` in `constraint`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn coefficient(&self, constraint: ConstraintIndex, variable: VariableIndex) -> f64 {
        debug_assert!(
            variable.get() < self.num_variables,
            "called `Model::coefficient` with variable index out of bounds: the len is {} but the index is {}",
            self.num_variables,
            variable.get()
        );
        self.coefficients[constraint.get() * self.num_variables + variable.get()]
    }

    /// Returns the dense coefficient row of `constraint`.
    #[inline]
    pub fn row(&self, constraint: ConstraintIndex) -> &[f64] {
        let start = constraint.get() * self.num_variables;
        &self.coefficients[start..start + self.num_variables]
    }

    /// Returns the right-hand side of `constraint`.
    #[inline]
    pub fn rhs(&self, constraint: ConstraintIndex) -> f64 {
        self.rhs[constraint.get()]
    }

    /// Returns all right-hand sides.
    #[inline]
    pub fn rhs_values(&self) -> &[f64] {
        &self.rhs
    }

    /// Iterates over the non-zero entries of a row as `(variable, coefficient)`.
    #[inline]
    pub fn row_nonzeros(
        &self,
        constraint: ConstraintIndex,
    ) -> impl Iterator<Item = (VariableIndex, f64)> + '_ {
        self.row(constraint)
            .iter()
            .enumerate()
            .filter(|(_, a)| **a != 0.0)
            .map(|(j, a)| (VariableIndex::new(j), *a))
    }

    /// Iterates over the non-zero entries of a column as `(constraint, coefficient)`.
    #[inline]
    pub fn column_nonzeros(
        &self,
        variable: VariableIndex,
    ) -> impl Iterator<Item = (ConstraintIndex, f64)> + '_ {
        (0..self.num_constraints).filter_map(move |i| {
            let a = self.coefficients[i * self.num_variables + variable.get()];
            (a != 0.0).then_some((ConstraintIndex::new(i), a))
        })
    }

    /// Returns the number of non-zero coefficients in the constraint matrix.
    pub fn num_nonzeros(&self) -> usize {
        self.coefficients.iter().filter(|a| **a != 0.0).count()
    }

    /// Returns the Euclidean norm of the objective vector.
    pub fn objective_norm(&self) -> f64 {
        self.objective.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Returns the Euclidean norm of the coefficient row of `constraint`.
    pub fn row_norm(&self, constraint: ConstraintIndex) -> f64 {
        self.row(constraint).iter().map(|a| a * a).sum::<f64>().sqrt()
    }

    /// Appends a constraint `row^T x <= rhs` and returns its index.
    pub fn push_constraint(
        &mut self,
        row: &[f64],
        rhs: f64,
    ) -> Result<ConstraintIndex, ModelError> {
        if row.len() != self.num_variables {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_variables,
                actual: row.len(),
            });
        }
        let constraint = ConstraintIndex::new(self.num_constraints);
        validate_rhs(constraint, rhs)?;
        for (j, &a) in row.iter().enumerate() {
            validate_coefficient(constraint, VariableIndex::new(j), a)?;
        }

        self.coefficients.extend_from_slice(row);
        self.rhs.push(rhs);
        self.num_constraints += 1;
        Ok(constraint)
    }

    /// Returns a copy of the model that keeps only the constraints for which
    /// `keep` returns `true`. Constraint indices are compacted.
    pub fn retain_constraints<F>(&self, mut keep: F) -> Model
    where
        F: FnMut(ConstraintIndex) -> bool,
    {
        let mut coefficients = Vec::with_capacity(self.coefficients.len());
        let mut rhs = Vec::with_capacity(self.rhs.len());
        for i in 0..self.num_constraints {
            let constraint = ConstraintIndex::new(i);
            if keep(constraint) {
                coefficients.extend_from_slice(self.row(constraint));
                rhs.push(self.rhs[i]);
            }
        }

        Model {
            name: self.name.clone(),
            num_variables: self.num_variables,
            num_constraints: rhs.len(),
            objective: self.objective.clone(),
            coefficients,
            rhs,
        }
    }

    /// Returns a copy of the model whose variable `k` is variable `order[k]`
    /// of `self`.
    pub fn permute_variables(&self, order: &[VariableIndex]) -> Result<Model, ModelError> {
        if order.len() != self.num_variables {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_variables,
                actual: order.len(),
            });
        }

        let objective = order.iter().map(|v| self.objective[v.get()]).collect();
        let mut coefficients = Vec::with_capacity(self.coefficients.len());
        for i in 0..self.num_constraints {
            let row = self.row(ConstraintIndex::new(i));
            coefficients.extend(order.iter().map(|v| row[v.get()]));
        }

        Ok(Model {
            name: self.name.clone(),
            num_variables: self.num_variables,
            num_constraints: self.num_constraints,
            objective,
            coefficients,
            rhs: self.rhs.clone(),
        })
    }

    /// Evaluates the objective of a (possibly fractional) assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Returns `true` if `values` satisfies every constraint within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        (0..self.num_constraints).all(|i| {
            let constraint = ConstraintIndex::new(i);
            let activity: f64 = self.row(constraint).iter().zip(values).map(|(a, x)| a * x).sum();
            activity <= self.rhs[i] + tolerance
        })
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Model(name: {}, variables: {}, constraints: {}, nonzeros: {})",
            self.name,
            self.num_variables,
            self.num_constraints,
            self.num_nonzeros()
        )
    }
}

#[inline]
fn validate_coefficient(
    constraint: ConstraintIndex,
    variable: VariableIndex,
    value: f64,
) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFinite {
            context: "constraint matrix",
        });
    }
    if value < 0.0 {
        return Err(ModelError::NegativeCoefficient {
            constraint,
            variable,
            value,
        });
    }
    Ok(())
}

#[inline]
fn validate_rhs(constraint: ConstraintIndex, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFinite {
            context: "right-hand side",
        });
    }
    if value < 0.0 {
        return Err(ModelError::NegativeRhs { constraint, value });
    }
    Ok(())
}

/// Incremental builder for `Model`. Validation happens in `build`.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    num_variables: usize,
    num_constraints: usize,
    objective: Vec<f64>,
    coefficients: Vec<f64>,
    rhs: Vec<f64>,
}

impl ModelBuilder {
    /// Creates a builder for a model with all coefficients, objective values
    /// and right-hand sides set to zero.
    pub fn new(num_variables: usize, num_constraints: usize) -> Self {
        Self {
            name: String::from("unnamed"),
            num_variables,
            num_constraints,
            objective: vec![0.0; num_variables],
            coefficients: vec![0.0; num_variables * num_constraints],
            rhs: vec![0.0; num_constraints],
        }
    }

    /// Sets the model name.
    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets the objective coefficient of `variable`.
    pub fn set_objective(&mut self, variable: VariableIndex, value: f64) -> &mut Self {
        self.objective[variable.get()] = value;
        self
    }

    /// Sets the coefficient of `variable` in `constraint`.
    pub fn set_coefficient(
        &mut self,
        constraint: ConstraintIndex,
        variable: VariableIndex,
        value: f64,
    ) -> &mut Self {
        self.coefficients[constraint.get() * self.num_variables + variable.get()] = value;
        self
    }

    /// Sets the right-hand side of `constraint`.
    pub fn set_rhs(&mut self, constraint: ConstraintIndex, value: f64) -> &mut Self {
        self.rhs[constraint.get()] = value;
        self
    }

    /// Validates the data and builds the model.
    pub fn build(&self) -> Result<Model, ModelError> {
        if self.num_variables == 0 || self.num_constraints == 0 {
            return Err(ModelError::InvalidDimensions {
                variables: self.num_variables,
                constraints: self.num_constraints,
            });
        }
        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite {
                context: "objective",
            });
        }
        for i in 0..self.num_constraints {
            let constraint = ConstraintIndex::new(i);
            validate_rhs(constraint, self.rhs[i])?;
            for j in 0..self.num_variables {
                let value = self.coefficients[i * self.num_variables + j];
                validate_coefficient(constraint, VariableIndex::new(j), value)?;
            }
        }

        Ok(Model {
            name: self.name.clone(),
            num_variables: self.num_variables,
            num_constraints: self.num_constraints,
            objective: self.objective.clone(),
            coefficients: self.coefficients.clone(),
            rhs: self.rhs.clone(),
        })
    }
}
