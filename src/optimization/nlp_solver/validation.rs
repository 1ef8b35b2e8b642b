//! Validation helpers for nonlinear-program optimization.
//!
//! This module centralizes common consistency checks used across the
//! solver interface:
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`],
//!   [`verify_constraint_tol`] ensure numeric tolerances are finite and
//!   strictly positive when provided.
//! - **Program checks**: [`validate_variable_bounds`],
//!   [`validate_constraint_bounds`], [`validate_start`] enforce consistent
//!   lengths and admissible bounds before a solve begins.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Solutions**: [`validate_theta_hat`] and [`validate_value`] guard the
//!   solver output.
//!
//! These helpers standardize error reporting by returning domain-specific
//! [`OptError`] variants.
use crate::optimization::{
    errors::{OptError, OptResult},
    nlp_solver::types::{Grad, Theta},
};

/// Validate the optional gradient‐norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost‐change tolerance (for convergence).
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the feasibility tolerance on constraint violations.
///
/// # Errors
/// Returns [`OptError::InvalidConstraintTol`] if the value is non-finite or ≤ 0.0.
pub fn verify_constraint_tol(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidConstraintTol { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidConstraintTol { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate variable bounds: equal lengths, finite, `lower <= upper`.
///
/// # Errors
/// - [`OptError::ProgramDimMismatch`] if lengths disagree with `n_vars`.
/// - [`OptError::InvalidVariableBounds`] for the first offending index.
pub fn validate_variable_bounds(xl: &Theta, xu: &Theta, n_vars: usize) -> OptResult<()> {
    if xl.len() != n_vars {
        return Err(OptError::ProgramDimMismatch {
            what: "variable lower bounds",
            expected: n_vars,
            found: xl.len(),
        });
    }
    if xu.len() != n_vars {
        return Err(OptError::ProgramDimMismatch {
            what: "variable upper bounds",
            expected: n_vars,
            found: xu.len(),
        });
    }
    for (index, (&lower, &upper)) in xl.iter().zip(xu.iter()).enumerate() {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(OptError::InvalidVariableBounds { index, lower, upper });
        }
    }
    Ok(())
}

/// Validate constraint bounds: equal lengths, finite lower bound,
/// `lower <= upper` (upper may be `+∞`).
///
/// # Errors
/// - [`OptError::ProgramDimMismatch`] if lengths disagree with `n_constraints`.
/// - [`OptError::InvalidConstraintBounds`] for the first offending index.
pub fn validate_constraint_bounds(gl: &Theta, gu: &Theta, n_constraints: usize) -> OptResult<()> {
    if gl.len() != n_constraints {
        return Err(OptError::ProgramDimMismatch {
            what: "constraint lower bounds",
            expected: n_constraints,
            found: gl.len(),
        });
    }
    if gu.len() != n_constraints {
        return Err(OptError::ProgramDimMismatch {
            what: "constraint upper bounds",
            expected: n_constraints,
            found: gu.len(),
        });
    }
    for (index, (&lower, &upper)) in gl.iter().zip(gu.iter()).enumerate() {
        if !lower.is_finite() || upper.is_nan() || lower > upper {
            return Err(OptError::InvalidConstraintBounds { index, lower, upper });
        }
    }
    Ok(())
}

/// Validate an initial point: correct length and finite entries.
///
/// # Errors
/// - [`OptError::ProgramDimMismatch`] on a length mismatch.
/// - [`OptError::InvalidStartingPoint`] for the first non-finite entry.
pub fn validate_start(x0: &Theta, n_vars: usize) -> OptResult<()> {
    if x0.len() != n_vars {
        return Err(OptError::ProgramDimMismatch {
            what: "starting point",
            expected: n_vars,
            found: x0.len(),
        });
    }
    for (index, &value) in x0.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidStartingPoint { index, value });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Tolerance checks accept `None` and positive finite values, reject the rest.
    fn tolerance_checks_reject_non_positive_and_non_finite() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(1e-6)).is_ok());
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(
            verify_tol_cost(Some(f64::NAN)),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(matches!(verify_constraint_tol(-1.0), Err(OptError::InvalidConstraintTol { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Variable bounds must be finite and ordered; the first offender is reported.
    //
    // Given
    // -----
    // - Three variables where index 1 has lower > upper.
    //
    // Expect
    // ------
    // - `InvalidVariableBounds { index: 1, .. }`.
    fn variable_bounds_report_first_offender() {
        let xl = array![-1.0, 0.5, 0.0];
        let xu = array![1.0, 0.0, f64::INFINITY];

        let err = validate_variable_bounds(&xl, &xu, 3).unwrap_err();

        assert_eq!(err, OptError::InvalidVariableBounds { index: 1, lower: 0.5, upper: 0.0 });
    }

    #[test]
    // Purpose
    // -------
    // Constraint bounds accept an infinite upper bound but not an infinite lower one.
    fn constraint_bounds_accept_unbounded_upper_only() {
        assert!(validate_constraint_bounds(&array![1.0, 1.0], &array![1.0, f64::INFINITY], 2)
            .is_ok());
        let err = validate_constraint_bounds(&array![f64::NEG_INFINITY], &array![0.0], 1);
        assert!(matches!(err, Err(OptError::InvalidConstraintBounds { index: 0, .. })));
        let err = validate_constraint_bounds(&array![1.0], &array![1.0], 2);
        assert!(matches!(err, Err(OptError::ProgramDimMismatch { expected: 2, found: 1, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Missing or non-finite solutions are rejected.
    fn theta_hat_and_value_guards() {
        assert_eq!(validate_theta_hat(None), Err(OptError::MissingThetaHat));
        assert!(matches!(
            validate_theta_hat(Some(array![0.0, f64::NAN])),
            Err(OptError::InvalidThetaHat { index: 1, .. })
        ));
        assert!(validate_value(-3.0).is_ok());
        assert!(validate_value(f64::INFINITY).is_err());
        assert!(matches!(
            validate_start(&array![0.0, f64::NAN], 2),
            Err(OptError::InvalidStartingPoint { index: 1, .. })
        ));
        assert!(validate_grad(&array![1.0, 2.0], 3).is_err());
    }
}
