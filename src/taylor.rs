//! Truncated Taylor series propagation.
//!
//! Convention: `c[k] = f^(k)(x0) / k!` (normalized Taylor coefficients).
//! All kernels operate on slices, with the truncation degree given by the
//! output length. They exist so callers can hand a
//! [`FunctionContainer`](crate::FunctionContainer) exact derivative
//! closures for composite expressions without an external autodiff crate:
//!
//! ```
//! use polylut::taylor;
//!
//! // derivatives of tan at x, up to order 3
//! let x = 0.4_f64;
//! let v = taylor::variable(x, 4);
//! let mut s = vec![0.0; 4];
//! let mut c = vec![0.0; 4];
//! taylor::sin_cos(&v, &mut s, &mut c);
//! let mut t = vec![0.0; 4];
//! taylor::div(&s, &c, &mut t);
//! let d = taylor::derivatives(&t);
//! assert!((d[1] - 1.0 / (x.cos() * x.cos())).abs() < 1e-12);
//! ```

use num_traits::Float;

/// Taylor expansion of the identity: `[x, 1, 0, ..., 0]`.
pub fn variable<F: Float>(x: F, len: usize) -> Vec<F> {
    let mut c = vec![F::zero(); len];
    c[0] = x;
    if len > 1 {
        c[1] = F::one();
    }
    c
}

/// Taylor expansion of a constant: `[v, 0, ..., 0]`.
pub fn constant<F: Float>(v: F, len: usize) -> Vec<F> {
    let mut c = vec![F::zero(); len];
    c[0] = v;
    c
}

/// Recover plain derivatives `f^(k)(x0)` from normalized coefficients.
pub fn derivatives<F: Float>(c: &[F]) -> Vec<F> {
    let mut fact = F::one();
    c.iter()
        .enumerate()
        .map(|(k, &ck)| {
            if k > 1 {
                fact = fact * F::from(k).unwrap();
            }
            ck * fact
        })
        .collect()
}

/// `c = a + b`
pub fn add<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = a[k] + b[k];
    }
}

/// `c = a - b`
pub fn sub<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = a[k] - b[k];
    }
}

/// `c = s * a` for a scalar `s`.
pub fn scale<F: Float>(a: &[F], s: F, c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = s * a[k];
    }
}

/// `c = a * b`, the Cauchy product.
pub fn mul<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        let mut sum = F::zero();
        for j in 0..=k {
            sum = sum + a[j] * b[k - j];
        }
        c[k] = sum;
    }
}

/// `c = a / b`, recursive Taylor division. Requires `b[0] != 0`.
pub fn div<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    let inv_b0 = F::one() / b[0];
    for k in 0..c.len() {
        let mut sum = a[k];
        for j in 1..=k {
            sum = sum - b[j] * c[k - j];
        }
        c[k] = sum * inv_b0;
    }
}

/// `c = 1 / a`. Requires `a[0] != 0`.
pub fn recip<F: Float>(a: &[F], c: &mut [F]) {
    let inv_a0 = F::one() / a[0];
    c[0] = inv_a0;
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + a[j] * c[k - j];
        }
        c[k] = -sum * inv_a0;
    }
}

/// `c = exp(a)`
pub fn exp<F: Float>(a: &[F], c: &mut [F]) {
    c[0] = a[0].exp();
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from(j).unwrap() * a[j] * c[k - j];
        }
        c[k] = sum / F::from(k).unwrap();
    }
}

/// `c = ln(a)`. Requires `a[0] > 0`.
pub fn ln<F: Float>(a: &[F], c: &mut [F]) {
    c[0] = a[0].ln();
    for k in 1..c.len() {
        let mut sum = F::from(k).unwrap() * a[k];
        for j in 1..k {
            sum = sum - F::from(j).unwrap() * c[j] * a[k - j];
        }
        c[k] = sum / (F::from(k).unwrap() * a[0]);
    }
}

/// `s = sin(a)`, `c = cos(a)`, propagated as a coupled pair.
pub fn sin_cos<F: Float>(a: &[F], s: &mut [F], c: &mut [F]) {
    s[0] = a[0].sin();
    c[0] = a[0].cos();
    for k in 1..s.len() {
        let mut ssum = F::zero();
        let mut csum = F::zero();
        for j in 1..=k {
            let ja = F::from(j).unwrap() * a[j];
            ssum = ssum + ja * c[k - j];
            csum = csum + ja * s[k - j];
        }
        let inv_k = F::one() / F::from(k).unwrap();
        s[k] = ssum * inv_k;
        c[k] = -csum * inv_k;
    }
}

/// `c = sqrt(a)`. Requires `a[0] > 0`.
pub fn sqrt<F: Float>(a: &[F], c: &mut [F]) {
    c[0] = a[0].sqrt();
    let two = F::from(2.0).unwrap();
    for k in 1..c.len() {
        let mut sum = a[k];
        for j in 1..k {
            sum = sum - c[j] * c[k - j];
        }
        c[k] = sum / (two * c[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exp_derivatives_are_exp() {
        let x = 0.3_f64;
        let v = variable(x, 5);
        let mut e = vec![0.0; 5];
        exp(&v, &mut e);
        for d in derivatives(&e) {
            assert_relative_eq!(d, x.exp(), epsilon = 1e-12);
        }
    }

    #[test]
    fn sin_derivatives_cycle() {
        let x = 1.1_f64;
        let v = variable(x, 4);
        let mut s = vec![0.0; 4];
        let mut c = vec![0.0; 4];
        sin_cos(&v, &mut s, &mut c);
        let d = derivatives(&s);
        assert_relative_eq!(d[0], x.sin(), epsilon = 1e-12);
        assert_relative_eq!(d[1], x.cos(), epsilon = 1e-12);
        assert_relative_eq!(d[2], -x.sin(), epsilon = 1e-12);
        assert_relative_eq!(d[3], -x.cos(), epsilon = 1e-12);
    }

    #[test]
    fn tan_via_division() {
        let x = 0.4_f64;
        let v = variable(x, 3);
        let (mut s, mut c) = (vec![0.0; 3], vec![0.0; 3]);
        sin_cos(&v, &mut s, &mut c);
        let mut t = vec![0.0; 3];
        div(&s, &c, &mut t);
        let d = derivatives(&t);
        let sec2 = 1.0 / (x.cos() * x.cos());
        assert_relative_eq!(d[0], x.tan(), epsilon = 1e-12);
        assert_relative_eq!(d[1], sec2, epsilon = 1e-12);
        assert_relative_eq!(d[2], 2.0 * x.tan() * sec2, epsilon = 1e-11);
    }

    #[test]
    fn rational_derivatives() {
        // f(x) = 1 / (1 + 25 x^2), the Runge function
        let x = 0.5_f64;
        let v = variable(x, 3);
        let mut x2 = vec![0.0; 3];
        mul(&v, &v, &mut x2);
        let mut den = vec![0.0; 3];
        scale(&x2, 25.0, &mut den);
        den[0] = den[0] + 1.0;
        let mut f = vec![0.0; 3];
        recip(&den, &mut f);
        let d = derivatives(&f);
        let g = 1.0 + 25.0 * x * x;
        assert_relative_eq!(d[0], 1.0 / g, epsilon = 1e-12);
        assert_relative_eq!(d[1], -50.0 * x / (g * g), epsilon = 1e-12);
    }

    #[test]
    fn sqrt_and_ln_roundtrip_exp() {
        let x = 0.8_f64;
        let v = variable(x, 4);
        let mut e = vec![0.0; 4];
        exp(&v, &mut e);
        let mut l = vec![0.0; 4];
        ln(&e, &mut l);
        for (got, want) in l.iter().zip(v.iter()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
        let mut r = vec![0.0; 4];
        sqrt(&e, &mut r);
        let mut rr = vec![0.0; 4];
        mul(&r, &r, &mut rr);
        for (got, want) in rr.iter().zip(e.iter()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }
}
