//! Content factor: the minimal positive scalar making all coefficients
//! integral, recovered by continued-fraction rational approximation.

use super::function::Function;

/// Maximum denominator admitted by the rational approximation. Bounding it
/// keeps the lcm across terms inside `i128` and guarantees termination for
/// numerically incommensurate coefficients.
const MAX_DENOMINATOR: i128 = 1 << 31;

/// Relative tolerance at which a continued-fraction convergent is accepted.
const RATIO_TOLERANCE: f64 = 1e-9;

impl Function {
    /// The minimal positive scalar `a` such that every coefficient of
    /// `a * f` is within floating round-off of an integer.
    ///
    /// Coefficient ratios are normalized against the first nonzero
    /// coefficient and approximated as rationals by continued fractions.
    /// If the coefficients are numerically incommensurate (say, ratios of
    /// transcendental constants) the approximation still terminates at the
    /// denominator bound and a large finite factor is returned; callers
    /// must check whether the factor is small enough to be practical.
    ///
    /// # Examples
    ///
    /// ```
    /// use quboform::algebra::Function;
    ///
    /// // (1/3)*x0 + (3/2)*x1 scales to integers with a = 6
    /// let f = Function::linear([(0, 1.0 / 3.0), (1, 1.5)].into(), 0.0);
    /// assert!((f.content_factor() - 6.0).abs() < 1e-9);
    /// ```
    pub fn content_factor(&self) -> f64 {
        let coefficients: Vec<f64> = self
            .terms()
            .into_values()
            .filter(|c| *c != 0.0)
            .collect();
        let Some(&first) = coefficients.first() else {
            return 1.0;
        };

        // Rationalize every ratio c_i / c_0, then a * c_0 * (p_i / q_i)
        // must be integral: a = lcm(q_i) / (c_0 * gcd(p_i * lcm / q_i)).
        let ratios: Vec<(i128, i128)> = coefficients
            .iter()
            .map(|c| rational_approximation(c / first))
            .collect();
        let mut denominator_lcm: i128 = 1;
        for &(_, q) in &ratios {
            denominator_lcm = lcm(denominator_lcm, q);
            if denominator_lcm > MAX_DENOMINATOR {
                denominator_lcm = MAX_DENOMINATOR;
                break;
            }
        }
        let mut numerator_gcd: i128 = 0;
        for &(p, q) in &ratios {
            numerator_gcd = gcd(numerator_gcd, p.saturating_mul(denominator_lcm / q.max(1)));
        }
        if numerator_gcd == 0 {
            return 1.0;
        }
        (denominator_lcm as f64 / numerator_gcd as f64 / first).abs()
    }
}

/// Approximates `x` as `p / q` by the continued-fraction convergents,
/// stopping at `RATIO_TOLERANCE` relative error or `MAX_DENOMINATOR`.
fn rational_approximation(x: f64) -> (i128, i128) {
    let sign = if x < 0.0 { -1 } else { 1 };
    let mut remainder = x.abs();
    // Convergent recurrence: h_k = a_k*h_{k-1} + h_{k-2}, same for k.
    let (mut h_prev, mut h): (i128, i128) = (1, 0);
    let (mut k_prev, mut k): (i128, i128) = (0, 1);
    for _ in 0..64 {
        let integral = remainder.floor();
        if integral > MAX_DENOMINATOR as f64 {
            break;
        }
        let a = integral as i128;
        let h_next = a.saturating_mul(h_prev).saturating_add(h);
        let k_next = a.saturating_mul(k_prev).saturating_add(k);
        if k_next > MAX_DENOMINATOR {
            break;
        }
        h = h_prev;
        k = k_prev;
        h_prev = h_next;
        k_prev = k_next;

        let approx = h_prev as f64 / k_prev as f64;
        if (approx - x.abs()).abs() <= RATIO_TOLERANCE * x.abs().max(1.0) {
            break;
        }
        let fraction = remainder - integral;
        if fraction.abs() < f64::EPSILON {
            break;
        }
        remainder = 1.0 / fraction;
    }
    (sign * h_prev, k_prev.max(1))
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

fn lcm(a: i128, b: i128) -> i128 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b)).saturating_mul(b).abs()
}
