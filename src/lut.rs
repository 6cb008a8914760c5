//! Tagged-variant dispatch over the table families, plus the registry that
//! builds them by name.

use std::collections::BTreeMap;

use crate::families;
use crate::pade::PadeTable;
use crate::table::{GridType, LutParameters, MetaTable};
use crate::{FunctionContainer, LutError, LutResult, Scalar};

/// Any built lookup table. Each variant carries its family's fixed
/// coefficient width, so the hot Horner loop monomorphizes; only the
/// rational Padé family keeps runtime degrees.
#[derive(Clone, Debug)]
pub enum LookupTable<T> {
    ConstantTaylor(MetaTable<1, T>),
    LinearInterpolation(MetaTable<2, T>),
    LinearTaylor(MetaTable<2, T>),
    QuadraticInterpolation(MetaTable<3, T>),
    QuadraticTaylor(MetaTable<3, T>),
    CubicInterpolation(MetaTable<4, T>),
    CubicTaylor(MetaTable<4, T>),
    CubicHermite(MetaTable<4, T>),
    QuarticInterpolation(MetaTable<5, T>),
    QuinticInterpolation(MetaTable<6, T>),
    SexticInterpolation(MetaTable<7, T>),
    SepticInterpolation(MetaTable<8, T>),
    Pade(PadeTable<T>),
}

/// Apply one expression across every variant's payload.
macro_rules! for_each_table {
    ($self:expr, $t:ident => $body:expr) => {
        match $self {
            LookupTable::ConstantTaylor($t) => $body,
            LookupTable::LinearInterpolation($t) => $body,
            LookupTable::LinearTaylor($t) => $body,
            LookupTable::QuadraticInterpolation($t) => $body,
            LookupTable::QuadraticTaylor($t) => $body,
            LookupTable::CubicInterpolation($t) => $body,
            LookupTable::CubicTaylor($t) => $body,
            LookupTable::CubicHermite($t) => $body,
            LookupTable::QuarticInterpolation($t) => $body,
            LookupTable::QuinticInterpolation($t) => $body,
            LookupTable::SexticInterpolation($t) => $body,
            LookupTable::SepticInterpolation($t) => $body,
            LookupTable::Pade($t) => $body,
        }
    };
}

pub(crate) use for_each_table;

impl<T: Scalar> LookupTable<T> {
    /// Evaluate the table at `x`. See [`MetaTable::eval`] for the domain
    /// contract.
    #[inline]
    pub fn eval(&self, x: T) -> T {
        for_each_table!(self, t => t.eval(x))
    }

    pub fn name(&self) -> &str {
        for_each_table!(self, t => t.name())
    }

    pub fn min_arg(&self) -> T {
        for_each_table!(self, t => t.min_arg())
    }

    pub fn max_arg(&self) -> T {
        for_each_table!(self, t => t.max_arg())
    }

    pub fn table_max_arg(&self) -> T {
        for_each_table!(self, t => t.table_max_arg())
    }

    pub fn step_size(&self) -> T {
        for_each_table!(self, t => t.step_size())
    }

    pub fn order(&self) -> u32 {
        for_each_table!(self, t => t.order())
    }

    pub fn data_size(&self) -> usize {
        for_each_table!(self, t => t.data_size())
    }

    pub fn num_intervals(&self) -> usize {
        for_each_table!(self, t => t.num_intervals())
    }

    pub fn num_table_entries(&self) -> usize {
        for_each_table!(self, t => t.num_table_entries())
    }

    pub fn bounds_of_subinterval(&self, index: usize) -> (T, T) {
        for_each_table!(self, t => t.bounds_of_subinterval(index))
    }
}

type Builder<T> = Box<
    dyn Fn(&FunctionContainer<T>, LutParameters<T>) -> LutResult<LookupTable<T>>
        + Send
        + Sync,
>;

/// Name-to-constructor dispatch, held by value.
///
/// There is no process-wide registration: the application builds a
/// registry (usually [`Registry::with_default_families`]), optionally
/// [`register`](Registry::register)s its own families, and passes it
/// wherever tables get built by name.
pub struct Registry<T> {
    builders: BTreeMap<String, Builder<T>>,
}

const ALL_GRIDS: [GridType; 3] = [
    GridType::Uniform,
    GridType::Nonuniform,
    GridType::NonuniformPseudo,
];

/// The Padé degree pairs the default registry carries, mirroring the
/// instantiation list of the coefficient widths up to 8.
const PADE_DEGREES: [(usize, usize); 9] = [
    (1, 1),
    (2, 1),
    (3, 1),
    (4, 1),
    (2, 2),
    (3, 2),
    (4, 2),
    (3, 3),
    (4, 3),
];

impl<T: Scalar> Registry<T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// A registry preloaded with every built-in family.
    pub fn with_default_families() -> Self {
        let mut reg = Self::new();

        reg.register("UniformConstantTaylor", |fc, par| {
            Ok(LookupTable::ConstantTaylor(families::constant_taylor(
                fc, par,
            )?))
        });
        reg.register("UniformLinearTaylor", |fc, par| {
            Ok(LookupTable::LinearTaylor(families::linear_taylor(fc, par)?))
        });
        reg.register("UniformQuadraticTaylor", |fc, par| {
            Ok(LookupTable::QuadraticTaylor(families::quadratic_taylor(
                fc, par,
            )?))
        });
        reg.register("UniformCubicTaylor", |fc, par| {
            Ok(LookupTable::CubicTaylor(families::cubic_taylor(fc, par)?))
        });
        reg.register("UniformCubicHermite", |fc, par| {
            Ok(LookupTable::CubicHermite(families::cubic_hermite(fc, par)?))
        });

        for grid in ALL_GRIDS {
            reg.register(
                format!("{}LinearInterpolation", grid.prefix()),
                move |fc, par| {
                    Ok(LookupTable::LinearInterpolation(
                        families::linear_interpolation(fc, par, grid)?,
                    ))
                },
            );
            reg.register(
                format!("{}QuadraticInterpolation", grid.prefix()),
                move |fc, par| {
                    Ok(LookupTable::QuadraticInterpolation(
                        families::quadratic_interpolation(fc, par, grid)?,
                    ))
                },
            );
            reg.register(
                format!("{}CubicInterpolation", grid.prefix()),
                move |fc, par| {
                    Ok(LookupTable::CubicInterpolation(
                        families::cubic_interpolation(fc, par, grid)?,
                    ))
                },
            );
        }

        reg.register("UniformQuarticInterpolation", |fc, par| {
            Ok(LookupTable::QuarticInterpolation(
                families::high_degree_interpolation::<5, T>(fc, par)?,
            ))
        });
        reg.register("UniformQuinticInterpolation", |fc, par| {
            Ok(LookupTable::QuinticInterpolation(
                families::high_degree_interpolation::<6, T>(fc, par)?,
            ))
        });
        reg.register("UniformSexticInterpolation", |fc, par| {
            Ok(LookupTable::SexticInterpolation(
                families::high_degree_interpolation::<7, T>(fc, par)?,
            ))
        });
        reg.register("UniformSepticInterpolation", |fc, par| {
            Ok(LookupTable::SepticInterpolation(
                families::high_degree_interpolation::<8, T>(fc, par)?,
            ))
        });

        for (m, n) in PADE_DEGREES {
            reg.register(format!("UniformPade<{m},{n}>"), move |fc, par| {
                Ok(LookupTable::Pade(PadeTable::build(fc, par, m, n)?))
            });
        }

        reg
    }

    /// Register (or replace) a builder under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        builder: impl Fn(
                &FunctionContainer<T>,
                LutParameters<T>,
            ) -> LutResult<LookupTable<T>>
            + Send
            + Sync
            + 'static,
    ) {
        self.builders.insert(name.into(), Box::new(builder));
    }

    /// Build the named table.
    pub fn build(
        &self,
        name: &str,
        fc: &FunctionContainer<T>,
        par: LutParameters<T>,
    ) -> LutResult<LookupTable<T>> {
        let builder =
            self.builders
                .get(name)
                .ok_or_else(|| LutError::UnknownTableName {
                    name: name.to_string(),
                })?;
        builder(fc, par)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

impl<T: Scalar> Default for Registry<T> {
    fn default() -> Self {
        Self::with_default_families()
    }
}
