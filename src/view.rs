//! Row-level addressing over the supported volume layouts.
//!
//! Every layout stores the innermost axis contiguously, so a volume is fully
//! described by where each row `(i, j)` starts. The composer is written once
//! against [`RowAddress`]; [`FlatRows`] and [`NestedRows`] only differ in how
//! they find a row.
//!
//! | Layout | Element `(i, j, k)` |
//! |---|---|
//! | `[T]`, `Vec<T>` | `data[i * slice_stride + j * row_stride + k]` |
//! | `[Vec<Vec<T>>]`, `Vec<Vec<Vec<T>>>` | `data[i][j][k]` |
//! | `[Vec<T>]`, `Vec<Vec<T>>` | `data[j][k]` (single slice, `n1 == 1`) |

use std::marker::PhantomData;

use crate::threading::SendPtr;
use crate::{DctError, Result};

/// Extents of a volume, slowest axis first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Slices (axis 0).
    pub n1: usize,
    /// Rows per slice (axis 1).
    pub n2: usize,
    /// Columns per row (axis 2, contiguous).
    pub n3: usize,
}

impl Shape {
    /// Extents `n1 × n2 × n3`, slowest axis first.
    pub const fn new(n1: usize, n2: usize, n3: usize) -> Self {
        Self { n1, n2, n3 }
    }

    /// Extents as `[n1, n2, n3]`.
    #[inline]
    pub const fn dims(&self) -> [usize; 3] {
        [self.n1, self.n2, self.n3]
    }

    /// Flat distance between consecutive slices (`n2 * n3`).
    #[inline]
    pub const fn slice_stride(&self) -> usize {
        self.n2 * self.n3
    }

    /// Flat distance between consecutive rows (`n3`).
    #[inline]
    pub const fn row_stride(&self) -> usize {
        self.n3
    }

    /// Total number of elements, or `None` on overflow.
    pub fn volume(&self) -> Option<usize> {
        self.n1.checked_mul(self.n2)?.checked_mul(self.n3)
    }

    /// Flat offset of element `(i, j, k)`.
    #[inline]
    pub const fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i * self.slice_stride() + j * self.row_stride() + k
    }

    /// Longest of the three extents.
    #[inline]
    pub fn max_extent(&self) -> usize {
        self.n1.max(self.n2).max(self.n3)
    }
}

/// Raw row access shared by all worker threads of a transform.
///
/// # Safety
/// Implementors guarantee that for every `i < n1`, `j < n2` the pointer
/// returned by `row_ptr(i, j)` addresses `n3` initialized elements that stay
/// valid while `self` lives, and that distinct `(i, j)` never overlap.
pub unsafe trait RowAddress<T>: Sync {
    /// Extents of the addressed volume.
    fn shape(&self) -> Shape;

    /// Start of row `(i, j)`.
    ///
    /// # Panics
    /// If `i >= n1` or `j >= n2`.
    fn row_ptr(&self, i: usize, j: usize) -> *mut T;

    /// Row `(i, j)` as a mutable slice.
    ///
    /// # Safety
    /// The caller must be the only one accessing row `(i, j)` while the
    /// returned slice is alive.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn row_mut(&self, i: usize, j: usize) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.row_ptr(i, j), self.shape().n3) }
    }

    /// Element `(i, j, k)`.
    ///
    /// # Safety
    /// `k < n3`, and no other thread may be writing row `(i, j)`.
    #[inline]
    unsafe fn load(&self, i: usize, j: usize, k: usize) -> T
    where
        T: Copy,
    {
        unsafe { self.row_ptr(i, j).add(k).read() }
    }

    /// Overwrite element `(i, j, k)`.
    ///
    /// # Safety
    /// `k < n3`, and the caller must be the only one accessing row `(i, j)`.
    #[inline]
    unsafe fn store(&self, i: usize, j: usize, k: usize, value: T) {
        unsafe { self.row_ptr(i, j).add(k).write(value) }
    }
}

/// Rows of a flat, slice-major buffer.
#[derive(Debug)]
pub struct FlatRows<'a, T> {
    base: SendPtr<T>,
    shape: Shape,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> FlatRows<'a, T> {
    /// Address the first `shape.volume()` elements of `data`.
    ///
    /// # Errors
    /// [`DctError::VolumeTooSmall`] if `data` is shorter than the volume.
    pub fn new(data: &'a mut [T], shape: Shape) -> Result<Self> {
        let expected = shape.volume().ok_or(DctError::VolumeOverflow)?;
        if data.len() < expected {
            return Err(DctError::VolumeTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            base: SendPtr(data.as_mut_ptr()),
            shape,
            _marker: PhantomData,
        })
    }
}

unsafe impl<T: Send + Sync> RowAddress<T> for FlatRows<'_, T> {
    #[inline]
    fn shape(&self) -> Shape {
        self.shape
    }

    #[inline(always)]
    fn row_ptr(&self, i: usize, j: usize) -> *mut T {
        assert!(
            i < self.shape.n1 && j < self.shape.n2,
            "row ({i}, {j}) out of bounds for {:?}",
            self.shape
        );
        // In bounds: the constructor checked the buffer holds the full volume.
        unsafe { self.base.as_ptr().add(self.shape.index(i, j, 0)) }
    }
}

/// Rows gathered from nested vectors.
#[derive(Debug)]
pub struct NestedRows<'a, T> {
    rows: Vec<SendPtr<T>>,
    shape: Shape,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> NestedRows<'a, T> {
    /// Address `data[i][j][k]`; every level must match `shape` exactly.
    ///
    /// # Errors
    /// [`DctError::RaggedVolume`] naming the first container whose length
    /// disagrees with `shape`.
    pub fn new(data: &'a mut [Vec<Vec<T>>], shape: Shape) -> Result<Self> {
        check_extent(0, [0, 0], shape.n1, data.len())?;
        let mut rows = Vec::with_capacity(shape.n1 * shape.n2);
        for (i, slice) in data.iter_mut().enumerate() {
            check_extent(1, [i, 0], shape.n2, slice.len())?;
            for (j, row) in slice.iter_mut().enumerate() {
                check_extent(2, [i, j], shape.n3, row.len())?;
                rows.push(SendPtr(row.as_mut_ptr()));
            }
        }
        Ok(Self {
            rows,
            shape,
            _marker: PhantomData,
        })
    }

    /// Address a plane `data[j][k]` as the single slice of `shape`.
    ///
    /// # Errors
    /// [`DctError::RaggedVolume`] if `shape.n1 != 1` or a row is ragged.
    pub fn plane(data: &'a mut [Vec<T>], shape: Shape) -> Result<Self> {
        check_extent(0, [0, 0], shape.n1, 1)?;
        check_extent(1, [0, 0], shape.n2, data.len())?;
        let mut rows = Vec::with_capacity(shape.n2);
        for (j, row) in data.iter_mut().enumerate() {
            check_extent(2, [0, j], shape.n3, row.len())?;
            rows.push(SendPtr(row.as_mut_ptr()));
        }
        Ok(Self {
            rows,
            shape,
            _marker: PhantomData,
        })
    }
}

unsafe impl<T: Send + Sync> RowAddress<T> for NestedRows<'_, T> {
    #[inline]
    fn shape(&self) -> Shape {
        self.shape
    }

    #[inline(always)]
    fn row_ptr(&self, i: usize, j: usize) -> *mut T {
        assert!(
            i < self.shape.n1 && j < self.shape.n2,
            "row ({i}, {j}) out of bounds for {:?}",
            self.shape
        );
        self.rows[i * self.shape.n2 + j].as_ptr()
    }
}

fn check_extent(axis: usize, index: [usize; 2], expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DctError::RaggedVolume {
            axis,
            index,
            expected,
            actual,
        })
    }
}

// ============================================================================
// Volume layouts
// ============================================================================

/// Data the transform engines accept, in any supported layout.
///
/// This is the single entry type of [`crate::Dct3d::forward`] and friends:
/// flat buffers and nested vectors are interchangeable views of the same
/// logical array.
pub trait Volume<T> {
    /// Row adapter borrowed from the data for one call.
    type Rows<'a>: RowAddress<T>
    where
        Self: 'a;

    /// Validate the layout against `shape` and address its rows.
    fn rows(&mut self, shape: Shape) -> Result<Self::Rows<'_>>;
}

impl<T: Send + Sync> Volume<T> for [T] {
    type Rows<'a> = FlatRows<'a, T> where Self: 'a;

    fn rows(&mut self, shape: Shape) -> Result<FlatRows<'_, T>> {
        FlatRows::new(self, shape)
    }
}

impl<T: Send + Sync> Volume<T> for Vec<T> {
    type Rows<'a> = FlatRows<'a, T> where Self: 'a;

    fn rows(&mut self, shape: Shape) -> Result<FlatRows<'_, T>> {
        FlatRows::new(self.as_mut_slice(), shape)
    }
}

impl<T: Send + Sync> Volume<T> for [Vec<Vec<T>>] {
    type Rows<'a> = NestedRows<'a, T> where Self: 'a;

    fn rows(&mut self, shape: Shape) -> Result<NestedRows<'_, T>> {
        NestedRows::new(self, shape)
    }
}

impl<T: Send + Sync> Volume<T> for Vec<Vec<Vec<T>>> {
    type Rows<'a> = NestedRows<'a, T> where Self: 'a;

    fn rows(&mut self, shape: Shape) -> Result<NestedRows<'_, T>> {
        NestedRows::new(self.as_mut_slice(), shape)
    }
}

impl<T: Send + Sync> Volume<T> for [Vec<T>] {
    type Rows<'a> = NestedRows<'a, T> where Self: 'a;

    fn rows(&mut self, shape: Shape) -> Result<NestedRows<'_, T>> {
        NestedRows::plane(self, shape)
    }
}

impl<T: Send + Sync> Volume<T> for Vec<Vec<T>> {
    type Rows<'a> = NestedRows<'a, T> where Self: 'a;

    fn rows(&mut self, shape: Shape) -> Result<NestedRows<'_, T>> {
        NestedRows::plane(self.as_mut_slice(), shape)
    }
}
