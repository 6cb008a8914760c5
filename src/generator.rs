//! Automatic table sizing: error estimation and step-size selection.

use crate::lut::{LookupTable, Registry};
use crate::rootfind::{bracket_root, brent_minimize};
use crate::table::LutParameters;
use crate::{from_f64, to_f64, FunctionContainer, LutError, LutResult, Scalar};

/// Iteration budget for the per-interval Brent minimization.
const MINIMIZE_MAX_IT: usize = 20;

/// Log-log Newton refinement of the initial step-size guess.
const NEWTON_MAX_IT: usize = 4;
const NEWTON_RTOL: f64 = 1e-5;
const NEWTON_ATOL: f64 = 1e-10;

/// Bracketing stage: iteration cap, and a relative tolerance about 30 bits
/// short of machine precision (the error measurement is noisy; chasing the
/// last bits just thrashes).
const BRACKET_MAX_IT: usize = 50;
const BRACKET_REL_TOL: f64 = 1.1920928955078125e-7; // 2^-23

/// Builds tables by name, sized by step, target tolerance or target
/// memory footprint.
pub struct LookupTableGenerator<'a, T> {
    fc: &'a FunctionContainer<T>,
    registry: &'a Registry<T>,
    min_arg: T,
    max_arg: T,
}

impl<'a, T: Scalar> LookupTableGenerator<'a, T> {
    pub fn new(
        fc: &'a FunctionContainer<T>,
        registry: &'a Registry<T>,
        min_arg: T,
        max_arg: T,
    ) -> Self {
        Self {
            fc,
            registry,
            min_arg,
            max_arg,
        }
    }

    /// Build `name` over the generator's domain at the given step size.
    pub fn generate_by_step(
        &self,
        name: &str,
        step_size: T,
    ) -> LutResult<LookupTable<T>> {
        let par = LutParameters {
            min_arg: self.min_arg,
            max_arg: self.max_arg,
            step_size,
        };
        self.registry.build(name, self.fc, par)
    }

    /// The sampled maximum relative error of `name` built at `step_size`.
    ///
    /// Per interval, minimizes `-2|f - L| / (|f| + |L|)` with Brent's
    /// method and takes the worst case over the table, as a nonnegative
    /// number. Intervals whose right endpoint overhangs `max_arg` (the
    /// guard region) are skipped.
    pub fn error_at_step_size(&self, name: &str, step_size: T) -> LutResult<f64> {
        let lut = self.generate_by_step(name, step_size)?;
        Ok(self.max_relative_error(&lut))
    }

    /// Find a step size whose sampled error meets `tol`, and build with it.
    ///
    /// The search works on `g(h) = error(h) - tol`: a cheap shortcut for
    /// tables that are already fine at one interval, a few log-log Newton
    /// steps using the family's theoretical order as the slope, then a
    /// bracketed solve over `(0, max - min]` whose lower endpoint
    /// guarantees `error <= tol`.
    pub fn generate_by_tol(
        &self,
        name: &str,
        tol: f64,
    ) -> LutResult<LookupTable<T>> {
        let width = self.max_arg - self.min_arg;
        let width_f = to_f64(width);

        // quit now if this table is already good at the largest reasonable
        // step size; high-order tables on small domains often are
        let full = self.generate_by_step(name, width)?;
        let full_err = self.max_relative_error(&full);
        if full_err <= tol {
            return Ok(full);
        }

        let order = f64::from(full.order());
        let log_tol = tol.ln();

        // Newton in log-log space with the known slope; a passable initial
        // guess is all the bracket below needs
        let mut h = width_f / 1000.0;
        let mut probe = None;
        for _ in 0..NEWTON_MAX_IT {
            let err = self.error_at_step_size(name, from_f64(h))?;
            probe = Some((h, err));
            if (err - tol).abs() < tol * NEWTON_RTOL + NEWTON_ATOL {
                break;
            }
            if err <= 0.0 {
                break;
            }
            let log_h = h.ln() + (log_tol - err.ln()) / order;
            h = log_h.exp().clamp(width_f * 1e-9, width_f * 0.999);
        }

        // bracket g(h) = error(h) - tol over (0, width]; error(0+) = 0, so
        // the left endpoint value is -tol, and the right endpoint was
        // measured above
        let (mut lo, mut f_lo) = (0.0, -tol);
        let (mut hi, mut f_hi) = (width_f, full_err - tol);
        if let Some((probed_h, err)) = probe {
            if err <= tol {
                lo = probed_h;
                f_lo = err - tol;
            } else {
                hi = probed_h;
                f_hi = err - tol;
            }
        }
        let g = |step: f64| -> f64 {
            match self.error_at_step_size(name, from_f64(step)) {
                Ok(err) => err - tol,
                // a failed probe counts as out of tolerance
                Err(_) => f64::INFINITY,
            }
        };
        let bracket =
            bracket_root(&g, lo, hi, f_lo, f_hi, BRACKET_REL_TOL, BRACKET_MAX_IT);

        // the lower endpoint of the final bracket is the answer: its error
        // is at or below tol by the bracket invariant
        if bracket.lo <= 0.0 {
            return Err(LutError::ConvergenceFailure {
                iterations: BRACKET_MAX_IT,
                lo: bracket.lo,
                hi: bracket.hi,
            });
        }
        self.generate_by_step(name, from_f64(bracket.lo))
    }

    /// Build `name` sized as close to `target_bytes` as the affine
    /// size-per-interval model allows.
    pub fn generate_by_impl_size(
        &self,
        name: &str,
        target_bytes: usize,
    ) -> LutResult<LookupTable<T>> {
        let width = self.max_arg - self.min_arg;
        // two probes pin down the size model
        let (n1, n2) = (2.0, 10.0);
        let probe1 = self.generate_by_step(name, width / from_f64(n1))?;
        let probe2 = self.generate_by_step(name, width / from_f64(n2))?;
        let s1 = probe1.data_size() as f64;
        let s2 = probe2.data_size() as f64;
        if probe1.data_size() == probe2.data_size() {
            return Err(LutError::EqualSizeProbes {
                bytes: probe1.data_size(),
            });
        }

        let bytes_per_interval = (s2 - s1) / (n2 - n1);
        let intervals =
            (n1 + (target_bytes as f64 - s1) / bytes_per_interval).max(1.0);
        let step = to_f64(width) / intervals;
        self.generate_by_step(name, from_f64(step))
    }

    fn max_relative_error(&self, lut: &LookupTable<T>) -> f64 {
        let max_f = to_f64(self.max_arg);
        let overhang_tol = 1e-9 * (1.0 + max_f.abs());
        let mut worst = 0.0_f64;
        for ii in 0..lut.num_intervals() {
            let (lo, hi) = lut.bounds_of_subinterval(ii);
            let (lo, hi) = (to_f64(lo), to_f64(hi));
            if hi > max_f + overhang_tol {
                // guard region beyond max_arg
                continue;
            }
            // keep the probes strictly inside the subinterval
            let nudge = (hi - lo) * 1e-9;
            let functor = |x: f64| self.error_functor(lut, x);
            let (_, fmin) =
                brent_minimize(&functor, lo + nudge, hi - nudge, MINIMIZE_MAX_IT);
            worst = worst.max(-fmin);
        }
        worst
    }

    /// The negated relative error, suitable for a minimizer. Measured in
    /// `f64` so that `f32` tables are not judged by their own rounding.
    fn error_functor(&self, lut: &LookupTable<T>, x: f64) -> f64 {
        let xt = from_f64::<T>(x);
        let f_value = to_f64(self.fc.eval(xt));
        let lut_value = to_f64(lut.eval(xt));
        let denom = f_value.abs() + lut_value.abs();
        if denom == 0.0 {
            return 0.0;
        }
        -2.0 * (f_value - lut_value).abs() / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::Registry;
    use crate::table::GridType;
    use crate::families;

    #[test]
    fn error_estimate_shrinks_with_the_step() {
        let fc = FunctionContainer::new(|x: f64| x.sin());
        let registry = Registry::with_default_families();
        let generator = LookupTableGenerator::new(&fc, &registry, 0.0, 3.0);
        let coarse = generator
            .error_at_step_size("UniformCubicInterpolation", 0.3)
            .unwrap();
        let fine = generator
            .error_at_step_size("UniformCubicInterpolation", 0.03)
            .unwrap();
        assert!(fine < coarse);
        assert!(fine > 0.0);
    }

    #[test]
    fn tolerance_already_met_takes_the_shortcut() {
        // a cubic reproduces a line exactly, so one interval suffices
        let fc = FunctionContainer::new(|x: f64| 2.0 * x + 1.0);
        let registry = Registry::with_default_families();
        let generator = LookupTableGenerator::new(&fc, &registry, 0.0, 1.0);
        let lut = generator
            .generate_by_tol("UniformCubicInterpolation", 1e-10)
            .unwrap();
        assert_eq!(lut.num_intervals(), 1);
    }

    #[test]
    fn impl_size_tracks_the_affine_model() {
        let fc = FunctionContainer::new(|x: f64| x.exp());
        let registry = Registry::with_default_families();
        let generator = LookupTableGenerator::new(&fc, &registry, 0.0, 1.0);
        let target = 1000;
        let lut = generator
            .generate_by_impl_size("UniformLinearInterpolation", target)
            .unwrap();
        let block = 2 * core::mem::size_of::<f64>();
        let got = lut.data_size() as i64;
        assert!(
            (got - target as i64).unsigned_abs() as usize <= 3 * block,
            "got {got} bytes for a {target} byte target"
        );
    }

    #[test]
    fn equal_probes_are_rejected() {
        // a registry entry that ignores the requested step size produces
        // identically sized probes
        let mut registry = Registry::new();
        registry.register("FixedStepLinear", |fc, par| {
            let fixed = LutParameters {
                min_arg: par.min_arg,
                max_arg: par.max_arg,
                step_size: (par.max_arg - par.min_arg) / 4.0,
            };
            Ok(LookupTable::LinearInterpolation(
                families::linear_interpolation(fc, fixed, GridType::Uniform)?,
            ))
        });
        let fc = FunctionContainer::new(|x: f64| x.exp());
        let generator = LookupTableGenerator::new(&fc, &registry, 0.0, 1.0);
        assert!(matches!(
            generator.generate_by_impl_size("FixedStepLinear", 4096),
            Err(LutError::EqualSizeProbes { .. })
        ));
    }

    #[test]
    fn by_tol_meets_the_tolerance() {
        let fc = FunctionContainer::new(|x: f64| x.exp());
        let registry = Registry::with_default_families();
        let generator = LookupTableGenerator::new(&fc, &registry, 0.0, 1.0);
        let lut = generator
            .generate_by_tol("UniformLinearInterpolation", 1e-3)
            .unwrap();
        let err = generator
            .error_at_step_size("UniformLinearInterpolation", lut.step_size())
            .unwrap();
        assert!(err <= 1e-3, "err = {err}");
        assert!(lut.num_intervals() > 1);
    }
}
