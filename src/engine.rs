//! Volume and plane transform engines.

use std::sync::Arc;

use crate::compose::{run_work_item, AxisPass, PassContext};
use crate::kernel::{Dct1d, Direction};
use crate::scratch::ScratchBuffer;
use crate::tables::TrigTables;
use crate::threading::{WorkItem, WorkerPool};
use crate::view::{RowAddress, Shape, Volume};
use crate::{DctError, DctFloat, Result, PARALLEL_THRESHOLD};

/// How many workers a transform may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerPolicy {
    /// Every thread of the global rayon pool.
    #[default]
    Auto,
    /// A dedicated pool of exactly `n` threads, built with the engine.
    Exact(usize),
    /// At most `n` threads of the global rayon pool.
    Max(usize),
}

/// Dispatch configuration of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DctOptions {
    /// Volumes with at least this many elements use the parallel path.
    pub parallel_threshold: usize,
    /// Worker threads available to the parallel path.
    pub workers: WorkerPolicy,
}

impl Default for DctOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: PARALLEL_THRESHOLD,
            workers: WorkerPolicy::Auto,
        }
    }
}

impl DctOptions {
    /// Options that never leave the calling thread.
    pub fn serial() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            workers: WorkerPolicy::Auto,
        }
    }

    #[must_use]
    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: WorkerPolicy) -> Self {
        self.workers = workers;
        self
    }
}

/// Separable 3D DCT over an `n1 × n2 × n3` volume.
///
/// `forward` computes a DCT-II along every axis and `inverse` a DCT-III. With
/// `scale = true` both are orthonormal and invert each other. Unscaled, a
/// round trip multiplies the data by `n1·n2·n3 / 8`, counting only axes
/// longer than one.
///
/// The engine holds no per-call state; one instance may serve concurrent
/// calls from several threads.
///
/// # Example
/// ```
/// use dct3d::{Dct3d, DctOptions, WorkerPolicy};
///
/// let options = DctOptions::default().with_workers(WorkerPolicy::Max(2));
/// let dct = Dct3d::<f32>::with_options(2, 2, 2, options)?;
///
/// // Nested layout: data[i][j][k].
/// let mut data = vec![vec![vec![1.0f32; 2]; 2]; 2];
/// dct.forward(&mut data, true)?;
/// assert!((data[0][0][0] - 8.0f32.sqrt()).abs() < 1e-5);
/// # Ok::<(), dct3d::DctError>(())
/// ```
#[derive(Debug)]
pub struct Dct3d<T> {
    shape: Shape,
    volume: usize,
    /// Kernels indexed by axis.
    kernels: [Dct1d<T>; 3],
    options: DctOptions,
    pool: WorkerPool,
}

impl<T: DctFloat> Dct3d<T> {
    /// Plan a transform with default options.
    ///
    /// # Errors
    /// [`DctError::NotPowerOfTwo`] naming the first invalid axis, or
    /// [`DctError::VolumeOverflow`].
    pub fn new(n1: usize, n2: usize, n3: usize) -> Result<Self> {
        Self::with_options(n1, n2, n3, DctOptions::default())
    }

    /// Plan a transform with explicit dispatch options.
    ///
    /// # Errors
    /// As [`Dct3d::new`], plus [`DctError::InvalidWorkers`] for a zero worker
    /// count and [`DctError::ThreadPool`] if a dedicated pool cannot start.
    pub fn with_options(n1: usize, n2: usize, n3: usize, options: DctOptions) -> Result<Self> {
        let shape = Shape::new(n1, n2, n3);
        for (axis, extent) in shape.dims().into_iter().enumerate() {
            if !extent.is_power_of_two() {
                return Err(DctError::NotPowerOfTwo { axis, extent });
            }
        }
        let volume = shape.volume().ok_or(DctError::VolumeOverflow)?;

        let tables = Arc::new(TrigTables::for_lengths(&shape.dims()));
        let kernels = shape
            .dims()
            .map(|len| Dct1d::with_tables(len, Arc::clone(&tables)));
        let pool = WorkerPool::new(options.workers)?;

        tracing::debug!(
            n1,
            n2,
            n3,
            workers = ?options.workers,
            dedicated_pool = pool.is_dedicated(),
            parallel_threshold = options.parallel_threshold,
            "planned 3d dct"
        );

        Ok(Self {
            shape,
            volume,
            kernels,
            options,
            pool,
        })
    }

    /// Extents of the volume.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn options(&self) -> &DctOptions {
        &self.options
    }

    /// In-place forward transform (DCT-II along every axis).
    pub fn forward<V>(&self, data: &mut V, scale: bool) -> Result<()>
    where
        V: Volume<T> + ?Sized,
    {
        self.process(data, Direction::Forward, scale)
    }

    /// In-place inverse transform (DCT-III along every axis).
    pub fn inverse<V>(&self, data: &mut V, scale: bool) -> Result<()>
    where
        V: Volume<T> + ?Sized,
    {
        self.process(data, Direction::Inverse, scale)
    }

    /// In-place transform in either direction.
    ///
    /// # Errors
    /// [`DctError::VolumeTooSmall`] or [`DctError::RaggedVolume`] if `data`
    /// does not hold the planned volume, leaving it untouched.
    /// [`DctError::WorkerPanicked`] if a worker fails; `data` is then only
    /// partially transformed.
    pub fn process<V>(&self, data: &mut V, direction: Direction, scale: bool) -> Result<()>
    where
        V: Volume<T> + ?Sized,
    {
        let span = tracing::debug_span!(
            "dct3d",
            n1 = self.shape.n1,
            n2 = self.shape.n2,
            n3 = self.shape.n3,
            ?direction,
            scale
        );
        let _enter = span.enter();

        let rows = data.rows(self.shape)?;
        self.execute(&rows, direction, scale)
    }

    fn execute<R>(&self, rows: &R, direction: Direction, scale: bool) -> Result<()>
    where
        R: RowAddress<T>,
    {
        let workers = self.workers_for_call();
        let gathered = self.shape.n1.max(self.shape.n2);
        let spectrum = (self.shape.max_extent() / 2).max(1);
        let mut scratch = ScratchBuffer::<T>::new(workers, gathered, spectrum);
        tracing::trace!(regions = scratch.workers(), gathered, spectrum, "allocated scratch");

        for pass in AxisPass::ORDER {
            let kernel = &self.kernels[pass.axis()];
            if kernel.size() == 1 {
                tracing::trace!(%pass, "skipped length-1 pass");
                continue;
            }

            let threads = workers.min(pass.outer_extent(&self.shape));
            let items = if threads > 1 {
                WorkItem::interleaved(threads)
            } else {
                vec![WorkItem::SERIAL]
            };
            tracing::trace!(%pass, threads, "axis pass");

            let ctx = PassContext::new(pass, kernel, &self.shape, direction, scale);
            let work: Vec<_> = items.into_iter().zip(scratch.regions()).collect();
            self.pool.dispatch(pass, work, |item, mut region| {
                // Interleaved items of one pass touch disjoint rows.
                unsafe { run_work_item(rows, &ctx, item, &mut region) }
            })?;
        }
        Ok(())
    }

    /// Workers for one call: 1 below the threshold or without a pool.
    fn workers_for_call(&self) -> usize {
        if self.volume >= self.options.parallel_threshold {
            self.pool.workers().max(1)
        } else {
            1
        }
    }
}

/// Separable 2D DCT over a `rows × cols` plane.
///
/// Runs the volume engine with a single slice, so it accepts flat buffers and
/// nested `Vec<Vec<T>>` planes.
///
/// # Example
/// ```
/// use dct3d::Dct2d;
///
/// let dct = Dct2d::<f64>::new(4, 4)?;
/// let mut plane = vec![vec![1.0; 4]; 4];
/// dct.forward(&mut plane, true)?;
/// assert!((plane[0][0] - 4.0).abs() < 1e-12);
/// assert!(plane.iter().flatten().skip(1).all(|v| v.abs() < 1e-12));
/// # Ok::<(), dct3d::DctError>(())
/// ```
#[derive(Debug)]
pub struct Dct2d<T> {
    inner: Dct3d<T>,
}

impl<T: DctFloat> Dct2d<T> {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::with_options(rows, cols, DctOptions::default())
    }

    /// # Errors
    /// As [`Dct3d::with_options`]; `rows` is reported as axis 0 and `cols`
    /// as axis 1.
    pub fn with_options(rows: usize, cols: usize, options: DctOptions) -> Result<Self> {
        let inner = Dct3d::with_options(1, rows, cols, options).map_err(|err| match err {
            DctError::NotPowerOfTwo { axis, extent } => DctError::NotPowerOfTwo {
                axis: axis - 1,
                extent,
            },
            other => other,
        })?;
        Ok(Self { inner })
    }

    /// `(rows, cols)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.inner.shape.n2, self.inner.shape.n3)
    }

    pub fn forward<V>(&self, data: &mut V, scale: bool) -> Result<()>
    where
        V: Volume<T> + ?Sized,
    {
        self.inner.forward(data, scale)
    }

    pub fn inverse<V>(&self, data: &mut V, scale: bool) -> Result<()>
    where
        V: Volume<T> + ?Sized,
    {
        self.inner.inverse(data, scale)
    }

    pub fn process<V>(&self, data: &mut V, direction: Direction, scale: bool) -> Result<()>
    where
        V: Volume<T> + ?Sized,
    {
        self.inner.process(data, direction, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(
            Dct3d::<f64>::new(4, 6, 8),
            Err(DctError::NotPowerOfTwo { axis: 1, extent: 6 })
        ));
        assert!(matches!(
            Dct3d::<f64>::new(0, 4, 4),
            Err(DctError::NotPowerOfTwo { axis: 0, extent: 0 })
        ));
        assert!(matches!(
            Dct2d::<f32>::new(8, 12),
            Err(DctError::NotPowerOfTwo { axis: 1, extent: 12 })
        ));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let options = DctOptions::default().with_workers(WorkerPolicy::Exact(0));
        assert!(matches!(
            Dct3d::<f64>::with_options(2, 2, 2, options),
            Err(DctError::InvalidWorkers { requested: 0 })
        ));
    }

    #[test]
    fn test_too_small_buffer_is_untouched() {
        let dct = Dct3d::<f64>::new(2, 4, 4).unwrap();
        let mut data = vec![1.0; 31];
        let err = dct.forward(&mut data, true).unwrap_err();
        assert!(matches!(err, DctError::VolumeTooSmall { expected: 32, actual: 31 }));
        assert!(data.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_options_builder() {
        let options = DctOptions::default()
            .with_parallel_threshold(0)
            .with_workers(WorkerPolicy::Max(3));
        assert_eq!(options.parallel_threshold, 0);
        assert_eq!(options.workers, WorkerPolicy::Max(3));
        assert_eq!(DctOptions::default().parallel_threshold, PARALLEL_THRESHOLD);
        assert_eq!(DctOptions::serial().parallel_threshold, usize::MAX);
    }

    #[test]
    fn test_serial_below_threshold() {
        let dct = Dct3d::<f64>::with_options(2, 2, 2, DctOptions::serial()).unwrap();
        assert_eq!(dct.workers_for_call(), 1);
        assert_eq!(dct.options(), &DctOptions::serial());
    }

    #[test]
    fn test_constant_volume_has_only_dc() {
        let dct = Dct3d::<f64>::new(4, 2, 8).unwrap();
        let mut data = vec![2.0; 64];
        dct.forward(&mut data, true).unwrap();
        assert_abs_diff_eq!(data[0], 2.0 * 8.0, epsilon = 1e-12);
        assert!(data[1..].iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_degenerate_axes() {
        let dct = Dct3d::<f64>::new(1, 1, 1).unwrap();
        let mut data = vec![3.0];
        dct.forward(&mut data, true).unwrap();
        assert_eq!(data, vec![3.0]);

        let dct = Dct3d::<f64>::new(8, 1, 1).unwrap();
        let mut data: Vec<f64> = (0..8).map(f64::from).collect();
        let mut expected = data.clone();
        Dct1d::<f64>::new(8).unwrap().forward(&mut expected, false).unwrap();
        dct.forward(&mut data, false).unwrap();
        for (got, want) in data.iter().zip(&expected) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dct2d_dims() {
        let dct = Dct2d::<f64>::new(2, 8).unwrap();
        assert_eq!(dct.dims(), (2, 8));
    }
}
