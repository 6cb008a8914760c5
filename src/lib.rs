//! Piecewise-polynomial function lookup tables.
//!
//! A lookup table (LUT) approximates a scalar function `f: [a, b] -> R` by a
//! polynomial per subinterval of a precomputed grid. Building a table costs
//! one pass of sampling `f` (and, for some families, its derivatives) and one
//! small linear solve per subinterval; evaluating it costs a hash into the
//! grid plus one Horner pass over a handful of coefficients.
//!
//! # Quick start
//!
//! ```
//! use polylut::{FunctionContainer, LutParameters, Registry};
//!
//! let fc = FunctionContainer::new(|x: f64| x.exp());
//! let registry = Registry::with_default_families();
//! let par = LutParameters { min_arg: 0.0, max_arg: 1.0, step_size: 0.01 };
//!
//! let lut = registry
//!     .build("UniformCubicInterpolation", &fc, par)
//!     .unwrap();
//! assert!((lut.eval(0.5) - 0.5f64.exp()).abs() < 1e-8);
//! ```
//!
//! # Table families
//!
//! The [`Registry`] knows the interpolation families (linear through septic,
//! with precomputed coefficients), the Taylor families (constant through
//! cubic), cubic Hermite, and the rational Padé families
//! (`UniformPade<M,N>`). Interpolation families also come in `NonUniform`
//! and `NonUniformPseudo` variants whose grids are warped by a
//! [`TransferFunction`] so samples concentrate where `f` bends fastest.
//!
//! [`CompositeLookupTable`] stitches several tables across breakpoints and
//! is the one evaluator that range-checks its input.
//! [`LookupTableGenerator`] sizes a table automatically for a target
//! tolerance or memory footprint.
//!
//! Tables are immutable once built and may be shared across threads.

use core::fmt;

use num_traits::{AsPrimitive, Float, FromPrimitive, ToPrimitive};

mod block;
mod composite;
mod container;
mod error;
mod families;
mod generator;
mod linalg;
mod lut;
mod pade;
mod quadrature;
mod rootfind;
mod serialize;
mod table;
pub mod taylor;
mod transfer;

pub use block::PolynomialBlock;
pub use composite::{
    CompositeLookupTable, DiscontinuityKind, LimitKind, SpecialPoint,
};
pub use container::FunctionContainer;
pub use error::{LutError, LutResult};
pub use generator::LookupTableGenerator;
pub use lut::{LookupTable, Registry};
pub use pade::PadeTable;
pub use serialize::{TableEntryRecord, TableRecord};
pub use table::{GridType, LutParameters, MetaTable};
pub use transfer::TransferFunction;

/// Scalar type a lookup table can be built over.
///
/// Blanket-implemented for anything float-like; in practice `f32` and `f64`.
/// The bounds are what the hash needs (`AsPrimitive<usize>` for the interval
/// index) plus conversions to and from `f64`, since coefficient solves and
/// error estimation run in `f64` regardless of the table scalar.
pub trait Scalar:
    Float
    + FromPrimitive
    + ToPrimitive
    + AsPrimitive<usize>
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
{
}

impl<T> Scalar for T where
    T: Float
        + FromPrimitive
        + ToPrimitive
        + AsPrimitive<usize>
        + fmt::Debug
        + fmt::Display
        + Send
        + Sync
        + 'static
{
}

/// Lossy `f64 -> T` conversion used throughout the build paths.
pub(crate) fn from_f64<T: Scalar>(x: f64) -> T {
    T::from_f64(x).unwrap()
}

/// Lossy `T -> f64` conversion used by error estimation and diagnostics.
pub(crate) fn to_f64<T: Scalar>(x: T) -> f64 {
    x.to_f64().unwrap()
}
