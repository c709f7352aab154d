//! Separable axis passes over a row-addressed volume.
//!
//! A 3D transform is three passes of 1D transforms, always in the order
//! inner (axis 2), middle (axis 1), outer (axis 0). Inner lines are rows and
//! are transformed in place. Middle and outer lines are strided; they are
//! gathered into scratch in groups of adjacent columns, transformed there and
//! scattered back.

use std::fmt;

use crate::kernel::{Dct1d, Direction};
use crate::scratch::ScratchRegion;
use crate::threading::WorkItem;
use crate::view::{RowAddress, Shape};
use crate::{DctFloat, GROUP_WIDTH};

/// One of the three axis passes of a volume transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisPass {
    /// Along axis 2 (contiguous rows).
    Inner,
    /// Along axis 1, within each slice.
    Middle,
    /// Along axis 0, across slices.
    Outer,
}

impl AxisPass {
    /// Passes in execution order.
    pub const ORDER: [AxisPass; 3] = [AxisPass::Inner, AxisPass::Middle, AxisPass::Outer];

    /// Axis this pass transforms.
    pub const fn axis(self) -> usize {
        match self {
            AxisPass::Inner => 2,
            AxisPass::Middle => 1,
            AxisPass::Outer => 0,
        }
    }

    /// Length of the lines this pass transforms.
    pub const fn line_len(self, shape: &Shape) -> usize {
        match self {
            AxisPass::Inner => shape.n3,
            AxisPass::Middle => shape.n2,
            AxisPass::Outer => shape.n1,
        }
    }

    /// Extent of the loop split across workers: slices for the inner and
    /// middle passes, rows for the outer pass.
    pub const fn outer_extent(self, shape: &Shape) -> usize {
        match self {
            AxisPass::Inner | AxisPass::Middle => shape.n1,
            AxisPass::Outer => shape.n2,
        }
    }
}

impl fmt::Display for AxisPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisPass::Inner => "inner",
            AxisPass::Middle => "middle",
            AxisPass::Outer => "outer",
        })
    }
}

/// Number of adjacent columns gathered per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Packing {
    Quad,
    Pair,
    Single,
}

impl Packing {
    /// Widest packing that divides a row of `n3` columns.
    pub(crate) fn for_row_len(n3: usize) -> Self {
        if n3 >= GROUP_WIDTH {
            Packing::Quad
        } else if n3 == 2 {
            Packing::Pair
        } else {
            Packing::Single
        }
    }

    #[inline]
    pub(crate) const fn width(self) -> usize {
        match self {
            Packing::Quad => 4,
            Packing::Pair => 2,
            Packing::Single => 1,
        }
    }
}

/// Everything a worker needs to run its share of one pass.
#[derive(Debug)]
pub(crate) struct PassContext<'a, T> {
    pub(crate) pass: AxisPass,
    pub(crate) kernel: &'a Dct1d<T>,
    pub(crate) direction: Direction,
    pub(crate) scale: bool,
    pub(crate) packing: Packing,
}

impl<'a, T: DctFloat> PassContext<'a, T> {
    pub(crate) fn new(
        pass: AxisPass,
        kernel: &'a Dct1d<T>,
        shape: &Shape,
        direction: Direction,
        scale: bool,
    ) -> Self {
        debug_assert_eq!(kernel.size(), pass.line_len(shape));
        Self {
            pass,
            kernel,
            direction,
            scale,
            packing: Packing::for_row_len(shape.n3),
        }
    }
}

/// Run one work item of a pass.
///
/// # Safety
/// No other thread may access the rows this item touches while it runs.
/// Interleaved items of the same pass satisfy this: the inner and middle
/// passes touch only the slices `i` of the item, the outer pass only the
/// row columns `j`.
pub(crate) unsafe fn run_work_item<T, R>(
    rows: &R,
    ctx: &PassContext<'_, T>,
    item: WorkItem,
    region: &mut ScratchRegion<'_, T>,
) where
    T: DctFloat,
    R: RowAddress<T> + ?Sized,
{
    let shape = rows.shape();
    let width = ctx.packing.width();
    match ctx.pass {
        AxisPass::Inner => {
            for i in item.indices(shape.n1) {
                for j in 0..shape.n2 {
                    let row = unsafe { rows.row_mut(i, j) };
                    ctx.kernel.apply(row, region.spectrum, ctx.direction, ctx.scale);
                }
            }
        }
        AxisPass::Middle => {
            for i in item.indices(shape.n1) {
                for k in (0..shape.n3).step_by(width) {
                    unsafe { transform_group(rows, ctx, region, k, width, |j| (i, j)) };
                }
            }
        }
        AxisPass::Outer => {
            for j in item.indices(shape.n2) {
                for k in (0..shape.n3).step_by(width) {
                    unsafe { transform_group(rows, ctx, region, k, width, |i| (i, j)) };
                }
            }
        }
    }
}

/// Gather columns `k..k + width` along the pass axis, transform each and
/// scatter them back. `at(t)` is the `(i, j)` row holding position `t` of the
/// lines.
///
/// # Safety
/// The caller must have exclusive access to every row `at(t)`.
#[inline]
unsafe fn transform_group<T, R, F>(
    rows: &R,
    ctx: &PassContext<'_, T>,
    region: &mut ScratchRegion<'_, T>,
    k: usize,
    width: usize,
    at: F,
) where
    T: DctFloat,
    R: RowAddress<T> + ?Sized,
    F: Fn(usize) -> (usize, usize),
{
    let len = ctx.kernel.size();
    let (lines, spectrum) = region.group(width, len);

    for t in 0..len {
        let (i, j) = at(t);
        for c in 0..width {
            lines[c * len + t] = unsafe { rows.load(i, j, k + c) };
        }
    }

    for line in lines.chunks_exact_mut(len) {
        ctx.kernel.apply(line, spectrum, ctx.direction, ctx.scale);
    }

    for t in 0..len {
        let (i, j) = at(t);
        for c in 0..width {
            unsafe { rows.store(i, j, k + c, lines[c * len + t]) };
        }
    }
}
