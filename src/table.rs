//! The piecewise-polynomial table core: grid layout, hashing, evaluation.

use core::mem;

use crate::block::PolynomialBlock;
use crate::transfer::TransferFunction;
use crate::{to_f64, LutError, LutResult, Scalar};

/// How a table's subintervals are laid out.
///
/// `Uniform` grids hash in two flops. `Nonuniform` grids warp the abscissae
/// through a transfer function and hash through its inverse polynomial plus
/// one grid lookup; `NonuniformPseudo` skips the lookup (and the exact
/// local rescale) for a little more speed at a little less accuracy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridType {
    Uniform,
    Nonuniform,
    NonuniformPseudo,
}

impl GridType {
    /// Table-name prefix; purely a naming concern, never branched on
    /// during evaluation.
    pub fn prefix(&self) -> &'static str {
        match self {
            GridType::Uniform => "Uniform",
            GridType::Nonuniform => "NonUniform",
            GridType::NonuniformPseudo => "NonUniformPseudo",
        }
    }
}

/// Construction parameters common to every table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LutParameters<T> {
    pub min_arg: T,
    pub max_arg: T,
    pub step_size: T,
}

/// A piecewise-polynomial lookup table with `N` coefficients per
/// subinterval.
///
/// The table owns `num_intervals + 1` blocks; the extra guard entry keeps
/// evaluation at the right endpoint in bounds, with `f(table_max_arg)` in
/// its constant slot and zeros elsewhere. If the step size does not divide
/// the domain exactly, `table_max_arg > max_arg` and inputs in
/// `(max_arg, table_max_arg]` evaluate fine, just with guard-interval
/// accuracy.
///
/// Evaluation does not range-check `x`: hashing an out-of-domain input
/// produces an out-of-range interval index (and a panic on the table
/// access). Wrap tables in a [`CompositeLookupTable`] when inputs need
/// checking.
///
/// [`CompositeLookupTable`]: crate::CompositeLookupTable
#[derive(Clone, Debug)]
pub struct MetaTable<const N: usize, T> {
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
    pub(crate) grid_type: GridType,
    /// Sample abscissae; populated for nonuniform grids only.
    pub(crate) grid: Option<Vec<T>>,
    pub(crate) transfer: TransferFunction<T>,
    pub(crate) table: Vec<PolynomialBlock<N, T>>,
}

impl<const N: usize, T: Scalar> MetaTable<N, T> {
    /// Lay out an empty table: counts, domain, data size, zeroed blocks.
    /// Family constructors fill in the coefficients (and the grid, for
    /// nonuniform tables).
    pub(crate) fn with_params(
        name: String,
        order: u32,
        par: LutParameters<T>,
        grid_type: GridType,
        transfer: TransferFunction<T>,
    ) -> LutResult<Self> {
        if par.step_size <= T::zero() {
            return Err(LutError::NonPositiveStepSize {
                step: to_f64(par.step_size),
            });
        }
        let step_size_inv = T::one() / par.step_size;
        let width = par.max_arg - par.min_arg;
        let num_intervals: usize = (step_size_inv * width).ceil().as_();
        let table_max_arg = par.min_arg
            + par.step_size * T::from_usize(num_intervals).unwrap();
        let num_table_entries = num_intervals + 1;

        Ok(Self {
            name,
            min_arg: par.min_arg,
            max_arg: par.max_arg,
            table_max_arg,
            step_size: par.step_size,
            step_size_inv,
            order,
            data_size: num_table_entries * mem::size_of::<PolynomialBlock<N, T>>(),
            num_intervals,
            num_table_entries,
            grid_type,
            grid: None,
            transfer,
            table: vec![PolynomialBlock::zeroed(); num_table_entries],
        })
    }

    /// Hash `x` to `(interval index, local coordinate)`. Every block's
    /// polynomial operates on `local` in `[0, 1)`.
    #[inline]
    pub(crate) fn hash(&self, x: T) -> (usize, T) {
        match self.grid_type {
            GridType::Uniform => {
                // nondimensionalized position, scaled by the step size
                let u = (x - self.min_arg) * self.step_size_inv;
                let index: usize = u.as_();
                (index, u - T::from_usize(index).unwrap())
            }
            GridType::Nonuniform => {
                let index: usize = self.transfer.inverse(x).as_();
                if index >= self.num_intervals {
                    // right endpoint lands on the guard entry
                    return (self.num_intervals, T::zero());
                }
                let grid = self.grid.as_ref().expect("nonuniform grid");
                let width = grid[index + 1] - grid[index];
                (index, (x - grid[index]) / width)
            }
            GridType::NonuniformPseudo => {
                // skip the grid lookup and the exact rescale
                let u = self.transfer.inverse(x);
                let index: usize = u.as_();
                (index, u - T::from_usize(index).unwrap())
            }
        }
    }

    /// Evaluate the table at `x` by Horner's method over the hashed block.
    #[inline]
    pub fn eval(&self, x: T) -> T {
        let (index, local) = self.hash(x);
        self.table[index].eval(local)
    }

    /// Argument bounds of subinterval `index`.
    pub fn bounds_of_subinterval(&self, index: usize) -> (T, T) {
        match &self.grid {
            None => {
                let lo = self.min_arg
                    + self.step_size * T::from_usize(index).unwrap();
                (lo, lo + self.step_size)
            }
            Some(grid) => (grid[index], grid[index + 1]),
        }
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

    /// Order of accuracy of the family that built this table.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Bytes of coefficient data the table owns.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn num_intervals(&self) -> usize {
        self.num_intervals
    }

    pub fn num_table_entries(&self) -> usize {
        self.num_table_entries
    }

    pub fn grid_type(&self) -> GridType {
        self.grid_type
    }

    pub fn coefs_per_entry(&self) -> usize {
        N
    }

    pub fn table_entry(&self, entry: usize, coef: usize) -> T {
        self.table[entry].coefs()[coef]
    }

    pub fn transfer_function_coefs(&self) -> [T; 4] {
        self.transfer.coefs()
    }
}
