//! Scalar root finding and minimization used by the build paths.
//!
//! Three tools: a Newton iteration with a hard switch to Brent's method for
//! inverting monotone maps, a bracket-maintaining regula falsi solver for
//! the generator (which needs the final bracket, not just a root), and a
//! bounded Brent minimizer for per-interval error measurement.

use lerp::Lerp;
use roots::{find_root_brent, SimpleConvergency};

const MAX_NEWTON_IT: usize = 20;
const MAX_BISECTION: usize = 54;

/// Solve `g(x) = target` for monotone `g` on `[a, b]`.
///
/// Newton steps from `target` while they behave; a vanishing slope, an
/// iterate leaving `[a, b]` or too many iterations switch to a bracketed
/// Brent solve capped at 54 steps. `tol` is the stopping tolerance on the
/// argument.
pub fn newton_bisect(
    g: &dyn Fn(f64) -> f64,
    gp: &dyn Fn(f64) -> f64,
    a: f64,
    b: f64,
    target: f64,
    tol: f64,
) -> f64 {
    let mut x = target.clamp(a, b);
    let mut iterations = 0;
    loop {
        iterations += 1;
        let x0 = x;
        let slope = gp(x);
        if slope == 0.0 || x < a || x > b || iterations > MAX_NEWTON_IT {
            let mut convergency = SimpleConvergency {
                eps: 1e-14,
                max_iter: MAX_BISECTION,
            };
            let shifted = |h: f64| g(h) - target;
            return match find_root_brent(a, b, &shifted, &mut convergency) {
                Ok(root) => root,
                // no sign change to work with; the current iterate is the
                // best answer available
                Err(_) => x.clamp(a, b),
            };
        }
        x = x - (g(x) - target) / slope;
        if (x - x0).abs() <= tol {
            return x;
        }
    }
}

/// A sign-change bracket after a root search. The cap is soft: `converged`
/// reports whether the width tolerance was reached before it hit.
#[derive(Clone, Copy, Debug)]
pub struct Bracket {
    pub lo: f64,
    pub hi: f64,
    pub converged: bool,
}

/// Shrink a sign-change bracket of `f` around a root of `f(x) = 0`.
///
/// Regula falsi with the Illinois weighting (halve the stale endpoint's
/// value when the same side moves twice in a row, so both endpoints keep
/// converging), degrading to plain bisection for the last quarter of the
/// iteration budget. The caller supplies the endpoint values, which keeps
/// `f` off the endpoints; the generator exploits this since its error
/// functor cannot evaluate a zero step size.
pub fn bracket_root<F: Fn(f64) -> f64>(
    f: &F,
    mut lo: f64,
    mut hi: f64,
    mut f_lo: f64,
    mut f_hi: f64,
    rel_tol: f64,
    max_iterations: usize,
) -> Bracket {
    let increasing = f_lo < f_hi;
    let rf_iterations = 3 * max_iterations / 4;
    // +1 when lo moved last, -1 when hi did
    let mut last_side = 0i8;

    for iterations in 0..max_iterations {
        let mut t = 0.5;
        if iterations < rf_iterations {
            // Regula falsi; bisect when the secant step degenerates.
            t = -f_lo / (f_hi - f_lo);
            if t <= 0.0 || t >= 1.0 {
                t = 0.5;
            }
        }
        let x = lo.lerp(hi, t);
        let v = f(x);
        if v == 0.0 {
            return Bracket {
                lo: x,
                hi: x,
                converged: true,
            };
        }
        if (v < 0.0) == increasing {
            lo = x;
            f_lo = v;
            if last_side == 1 {
                f_hi = 0.5 * f_hi;
            }
            last_side = 1;
        } else {
            hi = x;
            f_hi = v;
            if last_side == -1 {
                f_lo = 0.5 * f_lo;
            }
            last_side = -1;
        }
        if hi - lo <= rel_tol * lo.abs().max(hi.abs()) {
            return Bracket {
                lo,
                hi,
                converged: true,
            };
        }
    }
    Bracket {
        lo,
        hi,
        converged: false,
    }
}

const CGOLD: f64 = 0.381_966_011_250_105_1;
const ZEPS: f64 = 1e-12;

/// Bounded scalar minimization by Brent's method: golden sections with
/// parabolic interpolation where the fit is trustworthy. Returns
/// `(argmin, min)`.
pub fn brent_minimize<F: Fn(f64) -> f64>(
    f: &F,
    lo: f64,
    hi: f64,
    max_iterations: usize,
) -> (f64, f64) {
    let tol = f64::EPSILON.sqrt();
    let (mut a, mut b) = (lo.min(hi), lo.max(hi));

    let mut x = a + CGOLD * (b - a);
    let (mut w, mut v) = (x, x);
    let mut fx = f(x);
    let (mut fw, mut fv) = (fx, fx);

    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for _ in 0..max_iterations {
        let xm = 0.5 * (a + b);
        let tol1 = tol * x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            break;
        }

        let mut golden = true;
        if e.abs() > tol1 {
            // try a parabola through x, w, v
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let e_prev = e;
            e = d;
            if p.abs() < (0.5 * q * e_prev).abs()
                && p > q * (a - x)
                && p < q * (b - x)
            {
                golden = false;
                d = p / q;
                let u = x + d;
                if u - a < tol2 || b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
            }
        }
        if golden {
            e = if x >= xm { a - x } else { b - x };
            d = CGOLD * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = f(u);

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    (x, fx)
}
