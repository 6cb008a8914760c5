//! Transfer functions for nonuniform grids.
//!
//! Given `f` on `[a, b]`, a transfer function is a strictly increasing
//! `g: [a, b] -> [a, b]` with `g(a) = a`, `g(b) = b`, used to warp a uniform
//! grid so samples land where `f` bends fastest. `g` follows the arc-length
//! density:
//!
//! `g(x) = a + (b - a)/c * ∫_a^x dt/sqrt(1 + f'(t)^2)`
//!
//! with `c` normalizing so `g(b) = b`. Evaluating that integral per lookup
//! would defeat the point, so `g⁻¹` is approximated by a degree-3
//! polynomial, validated for monotonicity, and the encapsulating table's
//! hash is baked into its coefficients: one Horner pass of the stored
//! polynomial returns the real-valued interval index directly. The forward
//! `g` is then re-derived as the Newton inverse of the stored polynomial so
//! the pair stays consistent.

use nalgebra::{DMatrix, DVector};

use crate::linalg::{linspace, solve_refined, vandermonde};
use crate::rootfind::newton_bisect;
use crate::{from_f64, quadrature, to_f64};
use crate::{FunctionContainer, LutError, LutResult, Scalar};

/// Coefficient count of the polynomial approximating `g⁻¹`.
pub(crate) const NUM_COEFS: usize = 4;

/// Acceptance tolerance for the endpoint and round-trip checks.
const BUILDER_TOL: f64 = 1e-4;

/// Probe count for the monotonicity check.
const MONOTONE_PROBES: usize = 50;

/// Argument tolerance for the internal Newton inversions.
const NEWTON_TOL: f64 = 1e-10;

const QUAD_TOL: f64 = 1e-9;

fn horner(coefs: &[f64], x: f64) -> f64 {
    let mut sum = 0.0;
    for k in (1..coefs.len()).rev() {
        sum = x * (coefs[k] + sum);
    }
    sum + coefs[0]
}

fn horner_prime(coefs: &[f64], x: f64) -> f64 {
    let mut sum = 0.0;
    for k in (2..coefs.len()).rev() {
        sum = x * (coefs[k] * k as f64 + sum);
    }
    sum + coefs[1]
}

/// A built transfer function pair. Uniform tables carry an inert one whose
/// coefficients are all zero; it is never evaluated, only serialized.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferFunction<T> {
    // baked: x -> (p(x) - min)/step where p approximates g⁻¹
    coefs: [T; NUM_COEFS],
    min_arg: T,
    table_max_arg: T,
    step_size: T,
}

impl<T: Scalar> TransferFunction<T> {
    /// The do-nothing transfer function a uniform table carries.
    pub(crate) fn inert(min_arg: T, table_max_arg: T, step_size: T) -> Self {
        Self {
            coefs: [T::zero(); NUM_COEFS],
            min_arg,
            table_max_arg,
            step_size,
        }
    }

    /// Rebuild from serialized (already baked) coefficients.
    pub(crate) fn from_coefs(
        coefs: [T; NUM_COEFS],
        min_arg: T,
        table_max_arg: T,
        step_size: T,
    ) -> Self {
        Self {
            coefs,
            min_arg,
            table_max_arg,
            step_size,
        }
    }

    /// Build the pair for `f` over the table domain `[min_arg,
    /// table_max_arg]`.
    ///
    /// Candidate approximations of `g⁻¹` are tried in order (interpolation
    /// with interior slope constraints, then plain inverse interpolation);
    /// the first whose endpoints land within `1e-4` and which is strictly
    /// increasing over 50 equispaced probes wins. If none passes, the grid
    /// is too hostile for this coefficient count and construction fails.
    pub(crate) fn build(
        fc: &FunctionContainer<T>,
        min_arg: T,
        table_max_arg: T,
        step_size: T,
    ) -> LutResult<Self> {
        let derivs =
            fc.deriv_fn().ok_or_else(|| LutError::MissingDerivatives {
                family: "TransferFunction".to_string(),
                order: 1,
            })?;

        let a = to_f64(min_arg);
        let b = to_f64(table_max_arg);
        let h = to_f64(step_size);

        let f_prime = |x: f64| -> f64 { to_f64(derivs(from_f64(x), 1)[1]) };
        let density = move |x: f64| -> f64 {
            let d = f_prime(x);
            1.0 / (1.0 + d * d).sqrt()
        };

        let c = quadrature::integrate(&density, a, b, QUAD_TOL);
        let g = |x: f64| -> f64 {
            if x <= a {
                return a;
            }
            a + (b - a) * quadrature::integrate(&density, a, x, QUAD_TOL) / c
        };
        let g_prime = |x: f64| -> f64 { (b - a) * density(x) / c };

        let mut accepted = None;
        for strategy in 0..2 {
            let candidate = match strategy {
                0 => inverse_poly_interior_slopes_interp(&g, &g_prime, a, b),
                _ => inverse_poly_interp(&g, &g_prime, a, b),
            };
            if let Some(coefs) = candidate {
                if passes_checks(&coefs, a, b) {
                    accepted = Some(coefs);
                    break;
                }
            }
        }
        let mut coefs = accepted.ok_or(LutError::TransferFunctionFit {
            coefs: NUM_COEFS,
        })?;

        // Bake the table's hash into the polynomial: a single Horner pass
        // of the stored coefficients now returns the interval index.
        coefs[0] -= a;
        for coef in coefs.iter_mut() {
            *coef /= h;
        }

        let mut stored = [T::zero(); NUM_COEFS];
        for (dst, src) in stored.iter_mut().zip(coefs.iter()) {
            *dst = from_f64(*src);
        }
        Ok(Self {
            coefs: stored,
            min_arg,
            table_max_arg,
            step_size,
        })
    }

    pub fn coefs(&self) -> [T; NUM_COEFS] {
        self.coefs
    }

    /// `g⁻¹` with the hash baked in: maps `[a, b]` onto `[0, n]` so that
    /// `⌊inverse(x)⌋` is the interval index.
    #[inline]
    pub fn inverse(&self, x: T) -> T {
        let mut sum = x * self.coefs[NUM_COEFS - 1];
        for k in (1..NUM_COEFS - 1).rev() {
            sum = x * (self.coefs[k] + sum);
        }
        sum + self.coefs[0]
    }

    /// The forward warp `g`, the Newton inverse of the stored polynomial.
    pub fn g(&self, y: T) -> T {
        let a = to_f64(self.min_arg);
        let b = to_f64(self.table_max_arg);
        let h = to_f64(self.step_size);
        let mut coefs = [0.0; NUM_COEFS];
        for (dst, src) in coefs.iter_mut().zip(self.coefs.iter()) {
            *dst = to_f64(*src);
        }
        // un-bake: p maps [a, b] -> [a, b] again
        let p = move |x: f64| horner(&coefs, x) * h + a;
        let p_prime = move |x: f64| horner_prime(&coefs, x) * h;
        from_f64(newton_bisect(&p, &p_prime, a, b, to_f64(y), NEWTON_TOL))
    }
}

/// Points `y_i` with `g(y_i) = x_i` for `len` equally spaced `x_i`,
/// endpoints pinned. Newton from `x_i` with bisection fallback; assumes `g`
/// monotone with `g(a) = a` and `g(b) = b`.
fn gspace(
    g: &dyn Fn(f64) -> f64,
    g_prime: &dyn Fn(f64) -> f64,
    a: f64,
    b: f64,
    len: usize,
) -> Vec<f64> {
    let targets = linspace(a, b, len);
    let mut points = targets.clone();
    points[0] = a;
    points[len - 1] = b;
    for i in 1..len - 1 {
        points[i] = newton_bisect(g, g_prime, a, b, targets[i], NEWTON_TOL);
    }
    points
}

/// Inverse polynomial interpolation: fit `p(x_i) = y_i` at `NUM_COEFS`
/// equally spaced outputs `x_i = g(y_i)`.
fn inverse_poly_interp(
    g: &dyn Fn(f64) -> f64,
    g_prime: &dyn Fn(f64) -> f64,
    a: f64,
    b: f64,
) -> Option<[f64; NUM_COEFS]> {
    let xs = linspace(a, b, NUM_COEFS);
    let ys = gspace(g, g_prime, a, b, NUM_COEFS);

    let mat = vandermonde(&xs, NUM_COEFS);
    let rhs = DVector::from_vec(ys);
    let solution = solve_refined(&mat, &rhs)?;

    let mut coefs = [0.0; NUM_COEFS];
    for (dst, src) in coefs.iter_mut().zip(solution.iter()) {
        *dst = *src;
    }
    Some(coefs)
}

/// Inverse polynomial interpolation with interior slope constraints: fit
/// values at `NUM_COEFS/2 + 1` equally spaced outputs and additionally pin
/// the derivative to `1/g'(y_i)` at the interior sample points.
fn inverse_poly_interior_slopes_interp(
    g: &dyn Fn(f64) -> f64,
    g_prime: &dyn Fn(f64) -> f64,
    a: f64,
    b: f64,
) -> Option<[f64; NUM_COEFS]> {
    if NUM_COEFS % 2 != 0 {
        return None;
    }
    let m = NUM_COEFS / 2 + 1;
    let xs = linspace(a, b, m);
    let ys = gspace(g, g_prime, a, b, m);

    let mut mat = DMatrix::zeros(NUM_COEFS, NUM_COEFS);
    let mut rhs = DVector::zeros(NUM_COEFS);

    let values = vandermonde(&xs, NUM_COEFS);
    for row in 0..m {
        for col in 0..NUM_COEFS {
            mat[(row, col)] = values[(row, col)];
        }
        rhs[row] = ys[row];
    }
    // derivative rows at the interior sample points
    for (extra, interior) in (m..NUM_COEFS).zip(1..m - 1) {
        let x = xs[interior];
        let mut power = 1.0;
        for col in 1..NUM_COEFS {
            mat[(extra, col)] = col as f64 * power;
            power *= x;
        }
        // 1/g'(y_i) approximates the slope of the inverse; g' must not
        // vanish there
        let slope = g_prime(ys[interior]);
        if slope == 0.0 {
            return None;
        }
        rhs[extra] = 1.0 / slope;
    }

    let solution = solve_refined(&mat, &rhs)?;
    let mut coefs = [0.0; NUM_COEFS];
    for (dst, src) in coefs.iter_mut().zip(solution.iter()) {
        *dst = *src;
    }
    Some(coefs)
}

/// Endpoint accuracy plus strict monotonicity over a fine probe.
fn passes_checks(coefs: &[f64; NUM_COEFS], a: f64, b: f64) -> bool {
    if (horner(coefs, a) - a).abs() > BUILDER_TOL
        || (horner(coefs, b) - b).abs() > BUILDER_TOL
    {
        return false;
    }
    let probes = linspace(a, b, MONOTONE_PROBES);
    probes
        .windows(2)
        .all(|w| horner(coefs, w[0]) < horner(coefs, w[1]))
}
