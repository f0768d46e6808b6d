//! Chebyshev polynomial evaluation for ephemeris interpolation
//!
//! JPL ephemerides store each coordinate of a body as a Chebyshev series over
//! a short time interval. Evaluation uses the Clenshaw recurrence, which is
//! both faster and numerically better behaved than summing T_n(x) directly.

use crate::jplephem::errors::{JplephemError, Result};

/// Evaluate `sum(c_k * T_k(x))` for `x` in [-1, 1]
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    let x2 = 2.0 * x;

    for &c in coefficients.iter().skip(1).rev() {
        let b0 = x2 * b1 - b2 + c;
        b2 = b1;
        b1 = b0;
    }

    match coefficients.first() {
        Some(&c0) => x * b1 - b2 + c0,
        None => 0.0,
    }
}

/// Evaluate the derivative with respect to `x` of `sum(c_k * T_k(x))`
///
/// Uses dT_n/dx = n * U_{n-1}(x), with U evaluated by its own recurrence.
pub fn derivative(coefficients: &[f64], x: f64) -> f64 {
    if coefficients.len() <= 1 {
        return 0.0;
    }

    let mut result = 0.0;
    let mut u_prev = 0.0; // U_{-1}
    let mut u = 1.0; // U_0
    for (k, &c) in coefficients.iter().enumerate().skip(1) {
        result += c * k as f64 * u;
        let u_next = 2.0 * x * u - u_prev;
        u_prev = u;
        u = u_next;
    }

    result
}

/// Map `time` onto [-1, 1] for a record centred on `midpoint` with half-length `radius`
pub fn normalize_time(time: f64, midpoint: f64, radius: f64) -> Result<f64> {
    if radius <= 0.0 {
        return Err(JplephemError::InvalidFormat(format!(
            "record radius must be positive, got {}",
            radius
        )));
    }

    let normalized = (time - midpoint) / radius;

    // Allow a hair of slack at the record edges for rounding in `time`
    if !(-1.0 - 1e-12..=1.0 + 1e-12).contains(&normalized) {
        return Err(JplephemError::InvalidFormat(format!(
            "time {} falls outside record [{}, {}]",
            time,
            midpoint - radius,
            midpoint + radius
        )));
    }

    Ok(normalized.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_chebyshev_constant() {
        let coeffs = [5.0];
        assert_eq!(evaluate(&coeffs, -1.0), 5.0);
        assert_eq!(evaluate(&coeffs, 0.0), 5.0);
        assert_eq!(evaluate(&coeffs, 1.0), 5.0);
        assert_eq!(derivative(&coeffs, 0.3), 0.0);
    }

    #[test]
    fn test_chebyshev_quadratic() {
        // 3 + 2x + (2x^2 - 1) = 2 + 2x + 2x^2
        let coeffs = [3.0, 2.0, 1.0];
        assert_relative_eq!(evaluate(&coeffs, -1.0), 2.0);
        assert_relative_eq!(evaluate(&coeffs, 0.0), 2.0);
        assert_relative_eq!(evaluate(&coeffs, 1.0), 6.0);

        // f'(x) = 2 + 4x
        assert_relative_eq!(derivative(&coeffs, -1.0), -2.0);
        assert_relative_eq!(derivative(&coeffs, 0.0), 2.0);
        assert_relative_eq!(derivative(&coeffs, 0.5), 4.0);
    }

    #[test]
    fn test_clenshaw_matches_direct_sum() {
        let coeffs = [0.3, -1.2, 0.7, 0.05, -0.4, 0.11];
        for i in 0..=20 {
            let x = -1.0 + i as f64 * 0.1;
            // T_n(cos t) = cos(n t)
            let theta = x.acos();
            let direct: f64 = coeffs
                .iter()
                .enumerate()
                .map(|(n, c)| c * (n as f64 * theta).cos())
                .sum();
            assert_relative_eq!(evaluate(&coeffs, x), direct, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let coeffs = [1.0, 2.0, 3.0, 4.0, -0.5];
        let h = 1e-6;
        for &x in &[-0.9, -0.2, 0.0, 0.4, 0.8] {
            let numeric = (evaluate(&coeffs, x + h) - evaluate(&coeffs, x - h)) / (2.0 * h);
            assert_relative_eq!(derivative(&coeffs, x), numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_time_normalization() {
        assert_eq!(normalize_time(100.0, 100.0, 10.0).unwrap(), 0.0);
        assert_eq!(normalize_time(90.0, 100.0, 10.0).unwrap(), -1.0);
        assert_eq!(normalize_time(110.0, 100.0, 10.0).unwrap(), 1.0);
        assert_eq!(normalize_time(95.0, 100.0, 10.0).unwrap(), -0.5);

        assert!(normalize_time(80.0, 100.0, 10.0).is_err());
        assert!(normalize_time(120.0, 100.0, 10.0).is_err());
        assert!(normalize_time(100.0, 100.0, 0.0).is_err());
    }
}
