//! Bundles of callables a table is built from.

use crate::{LutError, LutResult, Scalar};

type ValueFn<T> = dyn Fn(T) -> T + Send + Sync;
type DerivFn<T> = dyn Fn(T, usize) -> Vec<T> + Send + Sync;

/// The target function together with an optional derivative capability.
///
/// Interpolation families only sample `f`; Taylor, Hermite and Padé families
/// additionally need derivatives, and the nonuniform grid builder needs
/// `f'`. Those callers go through [`derivatives_up_to`], which fails with
/// [`LutError::MissingDerivatives`] when the container was built with
/// [`FunctionContainer::new`] alone.
///
/// The derivative closure receives `(x, k)` and must return the `k + 1`
/// values `[f(x), f'(x), ..., f^(k)(x)]`. The [`taylor`](crate::taylor)
/// module has the propagation kernels for assembling exact closures; finite
/// differences work too when accuracy permits.
///
/// A container is only borrowed while a table is built; no table retains it.
///
/// [`derivatives_up_to`]: FunctionContainer::derivatives_up_to
pub struct FunctionContainer<T> {
    f: Box<ValueFn<T>>,
    derivatives: Option<Box<DerivFn<T>>>,
}

impl<T: Scalar> FunctionContainer<T> {
    /// Wrap a plain function with no derivative capability.
    pub fn new(f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        Self {
            f: Box::new(f),
            derivatives: None,
        }
    }

    /// Wrap a function and a derivative closure returning
    /// `[f(x), f'(x), ..., f^(k)(x)]` for any requested order `k`.
    pub fn with_derivatives(
        f: impl Fn(T) -> T + Send + Sync + 'static,
        derivatives: impl Fn(T, usize) -> Vec<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            f: Box::new(f),
            derivatives: Some(Box::new(derivatives)),
        }
    }

    #[inline]
    pub fn eval(&self, x: T) -> T {
        (self.f)(x)
    }

    pub(crate) fn deriv_fn(&self) -> Option<&DerivFn<T>> {
        self.derivatives.as_deref()
    }

    pub fn has_derivatives(&self) -> bool {
        self.derivatives.is_some()
    }

    /// `[f(x), f'(x), ..., f^(order)(x)]`, or `MissingDerivatives` if the
    /// container has no derivative closure. The closure's contract is to
    /// return exactly `order + 1` values; a short vector is a caller bug
    /// and panics at the use site.
    pub fn derivatives_up_to(
        &self,
        family: &str,
        order: usize,
        x: T,
    ) -> LutResult<Vec<T>> {
        let derivs =
            self.derivatives
                .as_deref()
                .ok_or_else(|| LutError::MissingDerivatives {
                    family: family.to_string(),
                    order,
                })?;
        Ok(derivs(x, order))
    }
}
