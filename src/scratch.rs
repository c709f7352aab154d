//! Call-scoped scratch memory split into per-worker regions.

use num_complex::Complex;
use num_traits::Zero;

use crate::{DctFloat, GROUP_WIDTH};

/// Flat scratch storage for one transform call.
///
/// Holds `workers` regions, each with [`GROUP_WIDTH`] gathered lines of
/// `line_len` elements and a complex work spectrum of `spectrum_len`.
#[derive(Debug)]
pub(crate) struct ScratchBuffer<T> {
    lines: Vec<T>,
    spectra: Vec<Complex<T>>,
    line_region: usize,
    spectrum_region: usize,
}

/// One worker's view of the scratch buffer.
#[derive(Debug)]
pub(crate) struct ScratchRegion<'a, T> {
    lines: &'a mut [T],
    pub(crate) spectrum: &'a mut [Complex<T>],
}

impl<T: DctFloat> ScratchBuffer<T> {
    pub(crate) fn new(workers: usize, line_len: usize, spectrum_len: usize) -> Self {
        let workers = workers.max(1);
        let line_region = GROUP_WIDTH * line_len.max(1);
        let spectrum_region = spectrum_len.max(1);
        Self {
            lines: vec![T::zero(); workers * line_region],
            spectra: vec![Complex::zero(); workers * spectrum_region],
            line_region,
            spectrum_region,
        }
    }

    /// Number of worker regions.
    pub(crate) fn workers(&self) -> usize {
        self.spectra.len() / self.spectrum_region
    }

    /// All regions, worker `w` at index `w`.
    pub(crate) fn regions(&mut self) -> Vec<ScratchRegion<'_, T>> {
        self.lines
            .chunks_mut(self.line_region)
            .zip(self.spectra.chunks_mut(self.spectrum_region))
            .map(|(lines, spectrum)| ScratchRegion { lines, spectrum })
            .collect()
    }
}

impl<T> ScratchRegion<'_, T> {
    /// `width` line buffers of `len` elements each, plus the spectrum.
    ///
    /// `width * len` must fit in the region.
    #[inline]
    pub(crate) fn group(&mut self, width: usize, len: usize) -> (&mut [T], &mut [Complex<T>]) {
        debug_assert!(width * len <= self.lines.len());
        (&mut self.lines[..width * len], &mut *self.spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_layout() {
        let mut scratch = ScratchBuffer::<f64>::new(3, 16, 8);
        assert_eq!(scratch.workers(), 3);
        let regions = scratch.regions();
        assert_eq!(regions.len(), 3);
        for region in &regions {
            assert_eq!(region.lines.len(), GROUP_WIDTH * 16);
            assert_eq!(region.spectrum.len(), 8);
        }
    }

    #[test]
    fn test_regions_are_disjoint() {
        let mut scratch = ScratchBuffer::<f32>::new(4, 2, 1);
        for (w, mut region) in scratch.regions().into_iter().enumerate() {
            let (lines, spectrum) = region.group(GROUP_WIDTH, 2);
            lines.fill(w as f32);
            spectrum[0] = Complex::new(w as f32, 0.0);
        }
        for (w, chunk) in scratch.lines.chunks(GROUP_WIDTH * 2).enumerate() {
            assert!(chunk.iter().all(|&v| v == w as f32));
        }
        for (w, z) in scratch.spectra.iter().enumerate() {
            assert_eq!(z.re, w as f32);
        }
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let mut scratch = ScratchBuffer::<f64>::new(0, 0, 0);
        assert_eq!(scratch.workers(), 1);
        assert_eq!(scratch.regions().len(), 1);
    }
}
