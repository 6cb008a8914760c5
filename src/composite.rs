//! Stitching lookup tables across a piecewise domain.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::lut::{LookupTable, Registry};
use crate::table::LutParameters;
use crate::{to_f64, FunctionContainer, LutError, LutResult, Scalar};

/// Why a breakpoint is special: which derivative (if any) jumps there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscontinuityKind {
    None,
    Value,
    FirstDerivative,
    SecondDerivative,
    ThirdDerivative,
}

/// How the function approaches the recorded value at the point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    Equals,
    Approaches,
    Infinite,
}

/// A breakpoint descriptor: where, what value, and how the function
/// behaves there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpecialPoint<T> {
    pub x: T,
    pub y: T,
    pub discontinuity: DiscontinuityKind,
    pub limit: LimitKind,
}

impl<T> SpecialPoint<T> {
    pub fn new(
        x: T,
        y: T,
        discontinuity: DiscontinuityKind,
        limit: LimitKind,
    ) -> Self {
        Self {
            x,
            y,
            discontinuity,
            limit,
        }
    }
}

/// Several child tables side by side, one per stretch between special
/// points. Good for piecewise functions: give every singularity its own
/// breakpoint and each smooth stretch its own family and step size.
///
/// Unlike the raw tables, evaluation checks its input and fails with
/// [`LutError::DomainOutOfRange`] outside the union of the children.
///
/// The most-recently-used child index is cached: callers that iterate over
/// nearby inputs hit their table again in one comparison, a short linear
/// walk covers neighbours, and anything farther falls back to binary
/// search. The hint is a relaxed atomic, so concurrent readers stay safe;
/// a stale hint only costs a longer search.
#[derive(Debug)]
pub struct CompositeLookupTable<T> {
    children: Vec<LookupTable<T>>,
    special_points: Vec<SpecialPoint<T>>,
    min_arg: T,
    max_arg: T,
    smallest_interval: T,
    data_size: usize,
    mru: AtomicUsize,
}

impl<T: Scalar> CompositeLookupTable<T> {
    /// Build one child per `(names[i], step_sizes[i])` over
    /// `[special_points[i].x, special_points[i + 1].x]`, via the registry.
    pub fn new(
        fc: &FunctionContainer<T>,
        registry: &Registry<T>,
        names: &[&str],
        step_sizes: &[T],
        special_points: Vec<SpecialPoint<T>>,
    ) -> LutResult<Self> {
        if names.is_empty() {
            return Err(LutError::EmptyComposite);
        }
        if names.len() != step_sizes.len() {
            return Err(LutError::MismatchedStepSizes {
                names: names.len(),
                steps: step_sizes.len(),
            });
        }
        if special_points.len() != names.len() + 1 {
            return Err(LutError::MismatchedSpecialPoints {
                names: names.len(),
                expected: names.len() + 1,
                points: special_points.len(),
            });
        }
        for (i, pair) in special_points.windows(2).enumerate() {
            if pair[0].x >= pair[1].x {
                return Err(LutError::UnorderedSpecialPoints { index: i + 1 });
            }
        }

        let mut children = Vec::with_capacity(names.len());
        let mut smallest_interval = T::max_value();
        let mut data_size = 0;
        for (i, (&name, &step)) in
            names.iter().zip(step_sizes.iter()).enumerate()
        {
            let par = LutParameters {
                min_arg: special_points[i].x,
                max_arg: special_points[i + 1].x,
                step_size: step,
            };
            let child = registry.build(name, fc, par)?;
            let width = par.max_arg - par.min_arg;
            if width < smallest_interval {
                smallest_interval = width;
            }
            data_size += child.data_size();
            children.push(child);
        }

        let min_arg = special_points[0].x;
        let max_arg = special_points[special_points.len() - 1].x;
        let mru = AtomicUsize::new(children.len() / 2);
        Ok(Self {
            children,
            special_points,
            min_arg,
            max_arg,
            smallest_interval,
            data_size,
            mru,
        })
    }

    /// Walk child by child from `from` toward smaller arguments.
    fn linear_search_left(&self, x: T, from: usize) -> LutResult<usize> {
        let mut i = from;
        while x < self.children[i].min_arg() {
            if i == 0 {
                return Err(LutError::DomainOutOfRange { x: to_f64(x) });
            }
            i -= 1;
        }
        Ok(i)
    }

    fn linear_search_right(&self, x: T, from: usize) -> LutResult<usize> {
        let mut i = from;
        while x > self.children[i].max_arg() {
            if i + 1 == self.children.len() {
                return Err(LutError::DomainOutOfRange { x: to_f64(x) });
            }
            i += 1;
        }
        Ok(i)
    }

    /// Binary search over children `lo..=hi`.
    fn binary_search(&self, x: T, mut lo: usize, mut hi: usize) -> LutResult<usize> {
        loop {
            let mid = (lo + hi) / 2;
            let child = &self.children[mid];
            if x < child.min_arg() {
                if mid == lo {
                    return Err(LutError::DomainOutOfRange { x: to_f64(x) });
                }
                hi = mid - 1;
            } else if x > child.max_arg() {
                if mid == hi {
                    return Err(LutError::DomainOutOfRange { x: to_f64(x) });
                }
                lo = mid + 1;
            } else {
                return Ok(mid);
            }
        }
    }

    /// Evaluate at `x`, or fail if no child's domain contains it.
    pub fn eval(&self, x: T) -> LutResult<T> {
        let mru = self.mru.load(Ordering::Relaxed);
        let recent = &self.children[mru];
        let lo = recent.min_arg();
        let hi = recent.max_arg();
        let two_smallest = self.smallest_interval + self.smallest_interval;

        let index = if x >= lo && x <= hi {
            mru
        } else if x < lo {
            if x > lo - two_smallest {
                self.linear_search_left(x, mru)?
            } else {
                self.binary_search(x, 0, mru)?
            }
        } else if x < hi + two_smallest {
            self.linear_search_right(x, mru)?
        } else {
            self.binary_search(x, mru, self.children.len() - 1)?
        };

        self.mru.store(index, Ordering::Relaxed);
        Ok(self.children[index].eval(x))
    }

    pub fn min_arg(&self) -> T {
        self.min_arg
    }

    pub fn max_arg(&self) -> T {
        self.max_arg
    }

    /// Cumulative coefficient bytes across the children.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn children(&self) -> &[LookupTable<T>] {
        &self.children
    }

    /// The breakpoint descriptors, endpoints included.
    pub fn special_points(&self) -> &[SpecialPoint<T>] {
        &self.special_points
    }
}
