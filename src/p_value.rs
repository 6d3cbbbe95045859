//! Empirical p-values of an observed statistic against a surrogate null
//! distribution.

use crate::errors::{validate_parameter, SignificanceError, SignificanceResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tail of the null distribution the statistic is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tail {
    /// Fraction of surrogates strictly larger than the statistic
    #[default]
    One,
    /// Smaller of the upper and lower tail fractions (not doubled)
    Two,
}

/// Significance decision and p-value of one test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TestOutcome {
    /// Whether the p-value is below alpha
    pub significant: bool,
    /// Empirical p-value in [0, 1]
    pub p_value: f64,
}

impl TestOutcome {
    /// Outcome reported when there is nothing to compare against.
    pub fn trivially_significant() -> Self {
        Self {
            significant: true,
            p_value: 0.0,
        }
    }
}

/// Test `statistic` against an empirical null `distribution`.
///
/// Surrogates equal to the statistic count toward neither tail.
///
/// # Errors
/// * `InvalidArgument` if the distribution is empty
/// * `InvalidParameter` if alpha is outside (0, 1] or the statistic is NaN
///
/// # Example
/// ```rust
/// use surrogate_significance::p_value::{evaluate, Tail};
///
/// let outcome = evaluate(0.5, &[0.1, 0.2, 0.3, 0.9], 0.05, Tail::One).unwrap();
/// assert_eq!(outcome.p_value, 0.25);
/// assert!(!outcome.significant);
/// ```
pub fn evaluate(
    statistic: f64,
    distribution: &[f64],
    alpha: f64,
    tail: Tail,
) -> SignificanceResult<TestOutcome> {
    if distribution.is_empty() {
        return Err(SignificanceError::InvalidArgument {
            reason: "null distribution is empty".to_string(),
        });
    }
    validate_parameter(alpha, f64::MIN_POSITIVE, 1.0, "alpha")?;
    if statistic.is_nan() {
        return Err(SignificanceError::InvalidParameter {
            parameter: "statistic".to_string(),
            value: statistic,
            constraint: "must not be NaN".to_string(),
        });
    }

    let n = distribution.len() as f64;
    let bigger = distribution.iter().filter(|&&x| x > statistic).count();

    let p_value = match tail {
        Tail::One => bigger as f64 / n,
        Tail::Two => {
            let smaller = distribution.iter().filter(|&&x| x < statistic).count();
            bigger.min(smaller) as f64 / n
        }
    };

    Ok(TestOutcome {
        significant: p_value < alpha,
        p_value,
    })
}
