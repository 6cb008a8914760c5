//! Rational Padé tables.
//!
//! A `(M, N)` Padé approximant per subinterval: `P/Q` with `deg P = M`,
//! `deg Q = N`, matching the Taylor series of `f` at the interval's left
//! abscissa through order `M + N`. Each block stores `M + N + 1`
//! coefficients laid out `[p0..pM, q1..qN]`; `Q`'s constant term is always
//! 1 and is not stored.
//!
//! Rational approximants earn their keep near poles, but a denominator
//! root inside a subinterval would poison it; the pole guard drops such a
//! block back to the plain degree-`M` Taylor polynomial (recognizable by
//! its trailing `N` zeros).

use nalgebra::DMatrix;
use roots::{find_roots_cubic, find_roots_linear, find_roots_quadratic};

use crate::linalg::nullspace_vector;
use crate::table::LutParameters;
use crate::{from_f64, to_f64, FunctionContainer, LutError, LutResult, Scalar};

static FACTORIALS: [f64; 8] = [1.0, 1.0, 2.0, 6.0, 24.0, 120.0, 720.0, 5040.0];

/// A uniform-grid Padé lookup table with runtime numerator/denominator
/// degrees. Blocks live in one flat vector with stride `m + n + 1`.
#[derive(Clone, Debug)]
pub struct PadeTable<T> {
    pub(crate) name: String,
    pub(crate) min_arg: T,
    pub(crate) max_arg: T,
    pub(crate) table_max_arg: T,
    pub(crate) step_size: T,
    pub(crate) step_size_inv: T,
    pub(crate) order: u32,
    pub(crate) data_size: usize,
    pub(crate) num_intervals: usize,
    pub(crate) num_table_entries: usize,
    pub(crate) numer_degree: usize,
    pub(crate) denom_degree: usize,
    pub(crate) coefs: Vec<T>,
}

/// Real roots of `Q(dx) = 1 + q[0]*dx + ... + q[n-1]*dx^n` inside the
/// local pole window. Interior subintervals watch `(0, h)`; the two
/// boundary subintervals widen by one step on the outward side, since a
/// pole hugging the table edge has no neighbouring interval to absorb it.
fn pole_in_window(q: &[f64], h: f64, first: bool, last: bool) -> bool {
    let lo = if first { -h } else { 0.0 };
    let hi = if last { 2.0 * h } else { h };
    let roots = match q.len() {
        1 => find_roots_linear(q[0], 1.0),
        2 => find_roots_quadratic(q[1], q[0], 1.0),
        3 => find_roots_cubic(q[2], q[1], q[0], 1.0),
        _ => unreachable!("unregistered Padé denominator degree"),
    };
    roots.as_ref().iter().any(|&r| lo < r && r < hi)
}

impl<T: Scalar> PadeTable<T> {
    pub(crate) fn build(
        fc: &FunctionContainer<T>,
        par: LutParameters<T>,
        m: usize,
        n: usize,
    ) -> LutResult<Self> {
        let name = format!("UniformPade<{m},{n}>");
        if par.step_size <= T::zero() {
            return Err(LutError::NonPositiveStepSize {
                step: to_f64(par.step_size),
            });
        }
        let step_size_inv = T::one() / par.step_size;
        let num_intervals: usize =
            ((par.max_arg - par.min_arg) * step_size_inv).ceil().as_();
        let table_max_arg = par.min_arg
            + par.step_size * T::from_usize(num_intervals).unwrap();
        let num_table_entries = num_intervals + 1;
        let stride = m + n + 1;
        let h = to_f64(par.step_size);

        let mut coefs = vec![T::zero(); stride * num_table_entries];
        for ii in 0..num_intervals {
            let x = par.min_arg + par.step_size * T::from_usize(ii).unwrap();
            let derivs = fc.derivatives_up_to(&name, m + n, x)?;
            let taylor: Vec<f64> = derivs
                .iter()
                .enumerate()
                .map(|(k, &d)| to_f64(d) / FACTORIALS[k])
                .collect();

            // Toeplitz matrix of shifted Taylor columns
            let mut toeplitz = DMatrix::zeros(m + n + 1, n + 1);
            for col in 0..=n {
                for row in col..=(m + n) {
                    toeplitz[(row, col)] = taylor[row - col];
                }
            }

            // Q spans the nullspace of the lower n rows, normalized so its
            // constant term is 1; P follows from the upper rows.
            let lower = toeplitz.rows(m + 1, n).into_owned();
            let rational = nullspace_vector(&lower).and_then(|qv| {
                let q0 = qv[0];
                if q0.abs() < 1e-14 {
                    return None;
                }
                let q: Vec<f64> = (1..=n).map(|j| qv[j] / q0).collect();
                if q.iter().any(|c| !c.is_finite()) {
                    return None;
                }
                let scaled = &qv / q0;
                let p_vec = toeplitz.rows(0, m + 1) * scaled;
                let p: Vec<f64> = p_vec.iter().copied().collect();
                Some((p, q))
            });

            let (p, q) = match rational {
                Some((p, q))
                    if !pole_in_window(
                        &q,
                        h,
                        ii == 0,
                        ii + 1 == num_intervals,
                    ) =>
                {
                    (p, q)
                }
                // degenerate or pole-ridden: degree-m Taylor polynomial
                _ => (taylor[..=m].to_vec(), vec![0.0; n]),
            };

            let base = ii * stride;
            for (k, &value) in p.iter().enumerate() {
                coefs[base + k] = from_f64(value);
            }
            for (k, &value) in q.iter().enumerate() {
                coefs[base + m + 1 + k] = from_f64(value);
            }
        }
        // guard entry: the table max value, constant
        coefs[num_intervals * stride] = fc.eval(table_max_arg);

        Ok(Self {
            name,
            min_arg: par.min_arg,
            max_arg: par.max_arg,
            table_max_arg,
            step_size: par.step_size,
            step_size_inv,
            order: (m + n + 1) as u32,
            data_size: stride * num_table_entries * core::mem::size_of::<T>(),
            num_intervals,
            num_table_entries,
            numer_degree: m,
            denom_degree: n,
            coefs,
        })
    }

    /// Two Horner passes and a division. `dx` here is the dimensional
    /// offset `x - x_i`, not the normalized local coordinate.
    #[inline]
    pub fn eval(&self, x: T) -> T {
        let u = (x - self.min_arg) * self.step_size_inv;
        let index: usize = u.as_();
        let dx = x
            - self.min_arg
            - self.step_size * T::from_usize(index).unwrap();
        let (m, n) = (self.numer_degree, self.denom_degree);
        let block = &self.coefs[index * self.stride()..];

        let mut p = block[m];
        for k in (0..m).rev() {
            p = block[k] + dx * p;
        }
        let mut q_sum = T::zero();
        for j in (1..=n).rev() {
            q_sum = block[m + j] + dx * q_sum;
        }
        // the constant term in Q is always 1
        p / (T::one() + dx * q_sum)
    }

    pub fn bounds_of_subinterval(&self, index: usize) -> (T, T) {
        let lo = self.min_arg + self.step_size * T::from_usize(index).unwrap();
        (lo, lo + self.step_size)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_arg(&self) -> T {
        self.min_arg
    }

    pub fn max_arg(&self) -> T {
        self.max_arg
    }

    pub fn table_max_arg(&self) -> T {
        self.table_max_arg
    }

    pub fn step_size(&self) -> T {
        self.step_size
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn num_intervals(&self) -> usize {
        self.num_intervals
    }

    pub fn num_table_entries(&self) -> usize {
        self.num_table_entries
    }

    /// Numerator and denominator degrees `(m, n)`.
    pub fn degrees(&self) -> (usize, usize) {
        (self.numer_degree, self.denom_degree)
    }

    pub fn coefs_per_entry(&self) -> usize {
        self.stride()
    }

    pub fn table_entry(&self, entry: usize, coef: usize) -> T {
        self.coefs[entry * self.stride() + coef]
    }

    pub fn transfer_function_coefs(&self) -> [T; 4] {
        [T::zero(); 4]
    }

    fn stride(&self) -> usize {
        self.numer_degree + self.denom_degree + 1
    }
}
