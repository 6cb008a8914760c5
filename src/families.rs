//! Coefficient construction for the polynomial table families.
//!
//! Every builder lays out a [`MetaTable`] header, fills one block per
//! subinterval, and writes the guard entry. Interpolation families sample
//! `f` at interval endpoints (so uniform tables stay continuous across
//! boundaries); Taylor and Hermite families sample derivatives through the
//! function container. Coefficients follow the `local in [0, 1)`
//! convention, so derivative samples are scaled by the interval width.

use nalgebra::DVector;
use rayon::prelude::*;

use crate::block::PolynomialBlock;
use crate::linalg::{linspace, vandermonde};
use crate::table::{GridType, LutParameters, MetaTable};
use crate::transfer::TransferFunction;
use crate::{from_f64, to_f64, FunctionContainer, LutResult, Scalar};

/// Header plus transfer function and grid storage for the requested grid
/// shape; blocks still zeroed.
fn make_header<const N: usize, T: Scalar>(
    family: &str,
    order: u32,
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
    grid_type: GridType,
) -> LutResult<MetaTable<N, T>> {
    let name = format!("{}{}", grid_type.prefix(), family);
    let inert =
        TransferFunction::inert(par.min_arg, par.max_arg, par.step_size);
    let mut table = MetaTable::with_params(name, order, par, grid_type, inert)?;
    if grid_type != GridType::Uniform {
        table.transfer = TransferFunction::build(
            fc,
            table.min_arg,
            table.table_max_arg,
            table.step_size,
        )?;
        table.grid = Some(vec![T::zero(); table.num_table_entries]);
    }
    Ok(table)
}

/// Run `fill(index, x, h)` over every subinterval, recording the grid for
/// nonuniform tables, then write the guard entry: `f(table_max_arg)` in the
/// constant slot, zeros above it.
fn fill_blocks<const N: usize, T: Scalar>(
    table: &mut MetaTable<N, T>,
    fc: &FunctionContainer<T>,
    mut fill: impl FnMut(usize, T, T) -> LutResult<[T; N]>,
) -> LutResult<()> {
    let n = table.num_intervals;
    for ii in 0..n {
        let u0 = table.min_arg + table.step_size * T::from_usize(ii).unwrap();
        let (x, h) = match table.grid_type {
            GridType::Uniform => (u0, table.step_size),
            _ => {
                // warp the uniform grid point through the transfer
                // function; the endpoints stay pinned to the table domain
                let x = if ii == 0 {
                    table.min_arg
                } else {
                    table.transfer.g(u0)
                };
                let x_next = if ii + 1 == n {
                    table.table_max_arg
                } else {
                    table.transfer.g(u0 + table.step_size)
                };
                (x, x_next - x)
            }
        };
        if let Some(grid) = table.grid.as_mut() {
            grid[ii] = x;
        }
        table.table[ii] = PolynomialBlock::new(fill(ii, x, h)?);
    }

    if let Some(grid) = table.grid.as_mut() {
        grid[n] = table.table_max_arg;
    }
    let mut guard = [T::zero(); N];
    guard[0] = fc.eval(table.table_max_arg);
    table.table[n] = PolynomialBlock::new(guard);
    Ok(())
}

/// `c0 = f(x_i)`; a zeroth-order hold.
pub(crate) fn constant_taylor<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
) -> LutResult<MetaTable<1, T>> {
    let mut table =
        make_header("ConstantTaylor", 1, fc, par, GridType::Uniform)?;
    fill_blocks(&mut table, fc, |_, x, _| Ok([fc.eval(x)]))?;
    Ok(table)
}

/// Chord through the interval endpoints.
pub(crate) fn linear_interpolation<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
    grid_type: GridType,
) -> LutResult<MetaTable<2, T>> {
    let mut table =
        make_header("LinearInterpolation", 2, fc, par, grid_type)?;
    fill_blocks(&mut table, fc, |_, x, h| {
        let y0 = fc.eval(x);
        let y1 = fc.eval(x + h);
        Ok([y0, y1 - y0])
    })?;
    Ok(table)
}

/// Tangent line at the left endpoint.
pub(crate) fn linear_taylor<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
) -> LutResult<MetaTable<2, T>> {
    let mut table =
        make_header("LinearTaylor", 2, fc, par, GridType::Uniform)?;
    fill_blocks(&mut table, fc, |_, x, h| {
        let d = fc.derivatives_up_to("UniformLinearTaylor", 1, x)?;
        Ok([d[0], d[1] * h])
    })?;
    Ok(table)
}

/// Lagrange parabola through the endpoints and midpoint.
pub(crate) fn quadratic_interpolation<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
    grid_type: GridType,
) -> LutResult<MetaTable<3, T>> {
    let two = from_f64::<T>(2.0);
    let three = from_f64::<T>(3.0);
    let four = from_f64::<T>(4.0);
    let mut table =
        make_header("QuadraticInterpolation", 3, fc, par, grid_type)?;
    fill_blocks(&mut table, fc, |_, x, h| {
        let y0 = fc.eval(x);
        let y1 = fc.eval(x + h / two);
        let y2 = fc.eval(x + h);
        Ok([y0, y1 * four - y0 * three - y2, (y0 - y1 * two + y2) * two])
    })?;
    Ok(table)
}

/// Second-order Taylor polynomial from the left endpoint.
pub(crate) fn quadratic_taylor<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
) -> LutResult<MetaTable<3, T>> {
    let two = from_f64::<T>(2.0);
    let mut table =
        make_header("QuadraticTaylor", 3, fc, par, GridType::Uniform)?;
    fill_blocks(&mut table, fc, |_, x, h| {
        let d = fc.derivatives_up_to("UniformQuadraticTaylor", 2, x)?;
        Ok([d[0], d[1] * h, d[2] * h * h / two])
    })?;
    Ok(table)
}

/// Third-order Taylor polynomial from the left endpoint.
pub(crate) fn cubic_taylor<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
) -> LutResult<MetaTable<4, T>> {
    let two = from_f64::<T>(2.0);
    let six = from_f64::<T>(6.0);
    let mut table = make_header("CubicTaylor", 4, fc, par, GridType::Uniform)?;
    fill_blocks(&mut table, fc, |_, x, h| {
        let d = fc.derivatives_up_to("UniformCubicTaylor", 3, x)?;
        let h2 = h * h;
        Ok([d[0], d[1] * h, d[2] * h2 / two, d[3] * h2 * h / six])
    })?;
    Ok(table)
}

/// Cubic Hermite: endpoint values and (width-scaled) endpoint slopes.
pub(crate) fn cubic_hermite<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
) -> LutResult<MetaTable<4, T>> {
    let two = from_f64::<T>(2.0);
    let three = from_f64::<T>(3.0);
    let mut table =
        make_header("CubicHermite", 4, fc, par, GridType::Uniform)?;
    fill_blocks(&mut table, fc, |_, x, h| {
        let left = fc.derivatives_up_to("UniformCubicHermite", 1, x)?;
        let right = fc.derivatives_up_to("UniformCubicHermite", 1, x + h)?;
        let (y0, y1) = (left[0], right[0]);
        let (m0, m1) = (left[1] * h, right[1] * h);
        Ok([
            y0,
            m0,
            (y1 - y0) * three - m0 * two - m1,
            (y0 - y1) * two + m0 + m1,
        ])
    })?;
    Ok(table)
}

/// Cubic through four equally spaced samples, solved against the
/// unit-interval Vandermonde system (LU-factored once).
pub(crate) fn cubic_interpolation<T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
    grid_type: GridType,
) -> LutResult<MetaTable<4, T>> {
    let mut table = make_header("CubicInterpolation", 4, fc, par, grid_type)?;
    let unit = linspace(0.0, 1.0, 4);
    let lu = vandermonde(&unit, 4).lu();
    fill_blocks(&mut table, fc, |_, x, h| {
        let samples = DVector::from_iterator(
            4,
            unit.iter()
                .map(|&u| to_f64(fc.eval(x + h * from_f64::<T>(u)))),
        );
        let solved = lu
            .solve(&samples)
            .expect("unit-interval vandermonde is nonsingular");
        let mut coefs = [T::zero(); 4];
        for (dst, src) in coefs.iter_mut().zip(solved.iter()) {
            *dst = from_f64(*src);
        }
        Ok(coefs)
    })?;
    Ok(table)
}

/// Degree 4 through 7 interpolation (`N` = 5..=8 coefficients) from `N`
/// equally spaced samples per interval. The per-interval solves are
/// independent, so the loop runs on the rayon pool.
pub(crate) fn high_degree_interpolation<const N: usize, T: Scalar>(
    fc: &FunctionContainer<T>,
    par: LutParameters<T>,
) -> LutResult<MetaTable<N, T>> {
    let family = match N {
        5 => "QuarticInterpolation",
        6 => "QuinticInterpolation",
        7 => "SexticInterpolation",
        8 => "SepticInterpolation",
        _ => unreachable!("unregistered interpolation width"),
    };
    let mut table =
        make_header::<N, T>(family, N as u32, fc, par, GridType::Uniform)?;

    let unit = linspace(0.0, 1.0, N);
    let lu = vandermonde(&unit, N).lu();
    let min_arg = table.min_arg;
    let step = table.step_size;

    let blocks: Vec<[T; N]> = (0..table.num_intervals)
        .into_par_iter()
        .map(|ii| {
            let x = min_arg + step * T::from_usize(ii).unwrap();
            let samples = DVector::from_iterator(
                N,
                unit.iter()
                    .map(|&u| to_f64(fc.eval(x + step * from_f64::<T>(u)))),
            );
            let solved = lu
                .solve(&samples)
                .expect("unit-interval vandermonde is nonsingular");
            let mut coefs = [T::zero(); N];
            for (dst, src) in coefs.iter_mut().zip(solved.iter()) {
                *dst = from_f64(*src);
            }
            coefs
        })
        .collect();

    for (ii, block) in blocks.into_iter().enumerate() {
        table.table[ii] = PolynomialBlock::new(block);
    }
    let mut guard = [T::zero(); N];
    guard[0] = fc.eval(table.table_max_arg);
    table.table[table.num_intervals] = PolynomialBlock::new(guard);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taylor;
    use approx::assert_relative_eq;

    fn par(min: f64, max: f64, step: f64) -> LutParameters<f64> {
        LutParameters {
            min_arg: min,
            max_arg: max,
            step_size: step,
        }
    }

    fn exp_container() -> FunctionContainer<f64> {
        FunctionContainer::with_derivatives(
            |x: f64| x.exp(),
            |x, k| {
                let v = taylor::variable(x, k + 1);
                let mut e = vec![0.0; k + 1];
                taylor::exp(&v, &mut e);
                taylor::derivatives(&e)
            },
        )
    }

    #[test]
    fn first_sample_is_exact() {
        let fc = FunctionContainer::new(|x: f64| x.sin());
        let t = cubic_interpolation(&fc, par(0.5, 2.0, 0.1), GridType::Uniform)
            .unwrap();
        assert_eq!(t.eval(0.5), 0.5f64.sin());
    }

    #[test]
    fn guard_entry_holds_the_table_max_value() {
        let fc = FunctionContainer::new(|x: f64| x.exp());
        // 0.3 does not divide 1, so table_max_arg > max_arg
        let t =
            linear_interpolation(&fc, par(0.0, 1.0, 0.3), GridType::Uniform)
                .unwrap();
        let tmax = t.table_max_arg();
        assert!(tmax > 1.0);
        assert_relative_eq!(t.eval(tmax), tmax.exp(), epsilon = 1e-12);
        // the overhang region is still well-defined
        let mid = 0.5 * (1.0 + tmax);
        assert_relative_eq!(t.eval(mid), mid.exp(), epsilon = 5e-2);
    }

    #[test]
    fn quadratic_interpolation_reproduces_parabolas() {
        let fc = FunctionContainer::new(|x: f64| 1.0 + 2.0 * x - 3.0 * x * x);
        let t =
            quadratic_interpolation(&fc, par(0.0, 1.0, 0.25), GridType::Uniform)
                .unwrap();
        for &x in &[0.0, 0.1, 0.37, 0.5, 0.99] {
            assert_relative_eq!(
                t.eval(x),
                1.0 + 2.0 * x - 3.0 * x * x,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn taylor_families_match_the_series() {
        let fc = exp_container();
        let t = cubic_taylor(&fc, par(0.0, 1.0, 0.25)).unwrap();
        // inside the first interval the table is the local cubic series
        let x = 0.1;
        let series = 1.0 + x + x * x / 2.0 + x * x * x / 6.0;
        assert_relative_eq!(t.eval(x), series, epsilon = 1e-12);
    }

    #[test]
    fn hermite_reproduces_cubics() {
        let f = |x: f64| x * x * x - 2.0 * x + 1.0;
        let fc = FunctionContainer::with_derivatives(f, move |x, k| {
            let mut d = vec![f(x), 3.0 * x * x - 2.0, 6.0 * x, 6.0];
            d.truncate(k + 1);
            d
        });
        let t = cubic_hermite(&fc, par(-1.0, 1.0, 0.5)).unwrap();
        for &x in &[-0.9, -0.3, 0.0, 0.6, 0.97] {
            assert_relative_eq!(t.eval(x), f(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn interpolation_families_are_continuous_at_boundaries() {
        let fc = FunctionContainer::new(|x: f64| x.sin());
        let t =
            cubic_interpolation(&fc, par(0.0, 2.0, 0.25), GridType::Uniform)
                .unwrap();
        for ii in 1..t.num_intervals() {
            let x = 0.25 * ii as f64;
            let below = t.eval(x - 1e-12);
            let above = t.eval(x + 1e-12);
            assert_relative_eq!(below, above, epsilon = 1e-9);
        }
    }

    #[test]
    fn high_degree_nails_smooth_functions() {
        let fc = FunctionContainer::new(|x: f64| x.exp());
        let t = high_degree_interpolation::<8, f64>(&fc, par(0.0, 1.0, 0.5))
            .unwrap();
        for &x in &[0.1, 0.33, 0.71, 0.95] {
            assert_relative_eq!(t.eval(x), x.exp(), epsilon = 1e-10);
        }
    }

    #[test]
    fn linear_taylor_needs_derivatives() {
        let fc = FunctionContainer::new(|x: f64| x.exp());
        assert!(linear_taylor(&fc, par(0.0, 1.0, 0.1)).is_err());
    }

    #[test]
    fn nonuniform_grid_is_strictly_increasing_and_pinned() {
        let fc = exp_container();
        let t =
            cubic_interpolation(&fc, par(0.0, 3.0, 0.1), GridType::Nonuniform)
                .unwrap();
        for i in 0..t.num_intervals() {
            let (lo, hi) = t.bounds_of_subinterval(i);
            assert!(lo < hi, "subinterval {i} is degenerate");
        }
        let (first, _) = t.bounds_of_subinterval(0);
        let (_, last) = t.bounds_of_subinterval(t.num_intervals() - 1);
        assert_eq!(first, 0.0);
        assert_eq!(last, t.table_max_arg());
    }

    #[test]
    fn nonuniform_table_still_approximates() {
        let fc = exp_container();
        let t =
            cubic_interpolation(&fc, par(0.0, 3.0, 0.1), GridType::Nonuniform)
                .unwrap();
        for &x in &[0.05, 0.8, 1.7, 2.5, 2.95] {
            assert_relative_eq!(t.eval(x), x.exp(), epsilon = 1e-4);
        }
    }
}
