//! nlp_solver::program: a validated nonlinear program.
//!
//! [`MathProgram`] pairs a borrowed [`ProgramEvaluator`] with its variable
//! bounds `xl <= x <= xu` and constraint bounds `gl <= g(x) <= gu`. Bounds are
//! checked once at construction so solver backends can rely on consistent
//! lengths, finite variable bounds, and a finite lower constraint bound.
use crate::optimization::{
    errors::OptResult,
    nlp_solver::{
        traits::ProgramEvaluator,
        types::Theta,
        validation::{validate_constraint_bounds, validate_variable_bounds},
    },
    numerical_stability::transformations::{to_bounded, to_unbounded},
};

#[derive(Debug, Clone)]
pub struct MathProgram<'a, E: ProgramEvaluator> {
    pub evaluator: &'a E,
    pub xl: Theta,
    pub xu: Theta,
    pub gl: Theta,
    pub gu: Theta,
}

impl<'a, E: ProgramEvaluator> MathProgram<'a, E> {
    /// Bind an evaluator to its bounds.
    ///
    /// # Errors
    /// - [`OptError::ProgramDimMismatch`](crate::optimization::errors::OptError::ProgramDimMismatch)
    ///   if any bound vector disagrees with the evaluator's dimensions.
    /// - `InvalidVariableBounds` / `InvalidConstraintBounds` for malformed bounds.
    pub fn new(evaluator: &'a E, xl: Theta, xu: Theta, gl: Theta, gu: Theta) -> OptResult<Self> {
        validate_variable_bounds(&xl, &xu, evaluator.n_vars())?;
        validate_constraint_bounds(&gl, &gu, evaluator.n_constraints())?;
        Ok(Self { evaluator, xl, xu, gl, gu })
    }

    pub fn n_vars(&self) -> usize {
        self.evaluator.n_vars()
    }

    pub fn n_constraints(&self) -> usize {
        self.evaluator.n_constraints()
    }

    /// Map an unconstrained point `z` into the variable box.
    pub fn to_box(&self, z: &Theta) -> Theta {
        z.iter()
            .zip(self.xl.iter().zip(self.xu.iter()))
            .map(|(&zi, (&lo, &hi))| to_bounded(zi, lo, hi))
            .collect()
    }

    /// Map a point of the variable box into unconstrained coordinates;
    /// points on or outside a bound are pulled just inside it.
    pub fn from_box(&self, x: &Theta) -> Theta {
        x.iter()
            .zip(self.xl.iter().zip(self.xu.iter()))
            .map(|(&xi, (&lo, &hi))| to_unbounded(xi, lo, hi))
            .collect()
    }

    /// Objective and constraint values at `x` in plain arithmetic.
    pub fn evaluate(&self, x: &Theta) -> (f64, Theta) {
        let mut fg = vec![0.0; 1 + self.n_constraints()];
        let xs: Vec<f64> = x.to_vec();
        self.evaluator.eval(&xs, &mut fg);
        let g = Theta::from(fg.split_off(1));
        (fg[0], g)
    }

    /// Largest violation of a constraint or variable bound at `x`.
    pub fn max_violation(&self, x: &Theta) -> f64 {
        let (_, g) = self.evaluate(x);
        self.violation_of(x, &g)
    }

    /// Largest violation given precomputed constraint values `g`.
    pub fn violation_of(&self, x: &Theta, g: &Theta) -> f64 {
        let mut worst: f64 = 0.0;
        for ((&gi, &lo), &hi) in g.iter().zip(self.gl.iter()).zip(self.gu.iter()) {
            worst = worst.max(lo - gi).max(gi - hi);
        }
        for ((&xi, &lo), &hi) in x.iter().zip(self.xl.iter()).zip(self.xu.iter()) {
            worst = worst.max(lo - xi).max(xi - hi);
        }
        worst
    }
}
