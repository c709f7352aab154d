//! One-dimensional DCT-II / DCT-III kernel.
//!
//! A length-`n` transform is reduced to an `n/2`-point complex FFT:
//!
//! 1. Even samples are taken in order and odd samples in reverse
//!    (`v = [x0, x2, …, x3, x1]`); pairs of `v` are packed as complex values.
//! 2. The half-length FFT is split into the spectrum `V` of the real
//!    sequence `v`.
//! 3. `X_k = Re(e^{-iπk/2n} V_k)` and `X_{n-k} = -Im(e^{-iπk/2n} V_k)`.
//!
//! The inverse walks the same steps backwards. Its unnormalized complex FFT
//! leaves a factor `n/2` in the result, so the unscaled inverse is exactly
//! `y_m = X_0/2 + Σ_{k≥1} X_k cos(π(2m+1)k/2n)`.

use std::sync::Arc;

use num_complex::Complex;
use num_traits::Zero;

use crate::fft::radix2_in_place;
use crate::tables::TrigTables;
use crate::{DctError, DctFloat, Result};

/// Transform direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// DCT-II.
    Forward,
    /// DCT-III.
    Inverse,
}

/// Power-of-two DCT of a single line.
///
/// With `scale = true` both directions are orthonormal, so
/// `inverse(forward(x)) == x`. Unscaled, `inverse(forward(x)) == (n/2)·x`.
/// A length-1 transform is the identity.
///
/// # Example
/// ```
/// use dct3d::Dct1d;
///
/// let dct = Dct1d::<f64>::new(4)?;
/// let mut line = [1.0, 1.0, 1.0, 1.0];
/// dct.forward(&mut line, true)?;
/// assert!((line[0] - 2.0).abs() < 1e-12);
/// assert!(line[1..].iter().all(|c| c.abs() < 1e-12));
/// # Ok::<(), dct3d::DctError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dct1d<T> {
    len: usize,
    tables: Arc<TrigTables<T>>,
    /// Phasor stride of the quarter-wave rotation `e^{iπk/2n}` (`N/n`).
    quarter_step: usize,
    /// Phasor stride of the packing twiddle `e^{2πik/n}` (`4N/n`).
    circle_step: usize,
    dc_scale: T,
    ac_scale: T,
}

impl<T: DctFloat> Dct1d<T> {
    /// Plan a standalone transform of length `len`.
    ///
    /// # Errors
    /// Returns [`DctError::NotPowerOfTwo`] unless `len` is a power of two.
    pub fn new(len: usize) -> Result<Self> {
        if !len.is_power_of_two() {
            return Err(DctError::NotPowerOfTwo {
                axis: 0,
                extent: len,
            });
        }
        let tables = Arc::new(TrigTables::for_lengths(&[len]));
        tracing::debug!(len, "planned 1d dct");
        Ok(Self::with_tables(len, tables))
    }

    /// Kernel sharing already-built tables. `len` must be covered by them.
    pub(crate) fn with_tables(len: usize, tables: Arc<TrigTables<T>>) -> Self {
        debug_assert!(len.is_power_of_two() && tables.covers(len));
        let quarter_step = tables.valid_through() / len;
        let n = len as f64;
        Self {
            len,
            tables,
            quarter_step,
            circle_step: 4 * quarter_step,
            dc_scale: T::from_f64((1.0 / n).sqrt()),
            ac_scale: T::from_f64((2.0 / n).sqrt()),
        }
    }

    /// Transform length.
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Complex work elements [`Dct1d::apply`] needs.
    #[inline]
    pub(crate) fn spectrum_len(&self) -> usize {
        (self.len / 2).max(1)
    }

    /// In-place DCT-II of `data`.
    pub fn forward(&self, data: &mut [T], scale: bool) -> Result<()> {
        self.process(data, Direction::Forward, scale)
    }

    /// In-place DCT-III of `data`.
    pub fn inverse(&self, data: &mut [T], scale: bool) -> Result<()> {
        self.process(data, Direction::Inverse, scale)
    }

    /// In-place transform in either direction.
    ///
    /// # Errors
    /// Returns [`DctError::LengthMismatch`] if `data.len()` differs from the
    /// planned length.
    pub fn process(&self, data: &mut [T], direction: Direction, scale: bool) -> Result<()> {
        if data.len() != self.len {
            return Err(DctError::LengthMismatch {
                expected: self.len,
                actual: data.len(),
            });
        }
        let mut spectrum = vec![Complex::zero(); self.spectrum_len()];
        self.apply(data, &mut spectrum, direction, scale);
        Ok(())
    }

    /// Unchecked hot path: `line.len()` must equal the planned length and
    /// `spectrum` must hold at least [`Dct1d::spectrum_len`] elements.
    #[inline]
    pub(crate) fn apply(
        &self,
        line: &mut [T],
        spectrum: &mut [Complex<T>],
        direction: Direction,
        scale: bool,
    ) {
        debug_assert_eq!(line.len(), self.len);
        debug_assert!(spectrum.len() >= self.spectrum_len());
        if self.len == 1 {
            return;
        }
        match direction {
            Direction::Forward => self.forward_line(line, spectrum, scale),
            Direction::Inverse => self.inverse_line(line, spectrum, scale),
        }
    }

    fn forward_line(&self, line: &mut [T], spectrum: &mut [Complex<T>], scale: bool) {
        let n = self.len;
        let h = n / 2;
        let spectrum = &mut spectrum[..h];
        let half = T::from_f64(0.5);

        for (m, z) in spectrum.iter_mut().enumerate() {
            *z = Complex::new(line[unfold(2 * m, n)], line[unfold(2 * m + 1, n)]);
        }
        radix2_in_place(spectrum, &self.tables, Direction::Forward);

        for k in 0..=h {
            let zk = spectrum[k % h];
            let zc = spectrum[(h - k) % h].conj();
            let even = (zk + zc).scale(half);
            let diff = zk - zc;
            let odd = Complex::new(diff.im, -diff.re).scale(half);
            let bin = if k == h {
                even - odd
            } else {
                even + self.tables.phasor(k * self.circle_step).conj() * odd
            };
            let rotated = self.tables.phasor(k * self.quarter_step).conj() * bin;
            line[k] = rotated.re;
            if k != 0 && k != h {
                line[n - k] = -rotated.im;
            }
        }

        if scale {
            line[0] = line[0] * self.dc_scale;
            for value in &mut line[1..] {
                *value = *value * self.ac_scale;
            }
        }
    }

    fn inverse_line(&self, line: &mut [T], spectrum: &mut [Complex<T>], scale: bool) {
        let n = self.len;
        let h = n / 2;
        let spectrum = &mut spectrum[..h];
        let half = T::from_f64(0.5);

        if scale {
            // Orthonormal coefficients back to DCT-III weights (X_0 counts half).
            line[0] = line[0] * self.dc_scale * T::from_f64(2.0);
            for value in &mut line[1..] {
                *value = *value * self.ac_scale;
            }
        }

        {
            let line = &*line;
            let bin = |k: usize| -> Complex<T> {
                let im = if k == 0 { T::zero() } else { -line[n - k] };
                self.tables.phasor(k * self.quarter_step) * Complex::new(line[k], im)
            };
            for (k, z) in spectrum.iter_mut().enumerate() {
                let vk = bin(k);
                let vc = bin(h - k).conj();
                let even = (vk + vc).scale(half);
                let odd = ((vk - vc) * self.tables.phasor(k * self.circle_step)).scale(half);
                *z = even + Complex::new(-odd.im, odd.re);
            }
        }
        radix2_in_place(spectrum, &self.tables, Direction::Inverse);

        for p in 0..n {
            let z = spectrum[p / 2];
            line[unfold(p, n)] = if p % 2 == 0 { z.re } else { z.im };
        }
    }
}

/// Source index in `x` of position `p` of the even-forward/odd-backward
/// sequence `v`.
#[inline(always)]
fn unfold(p: usize, n: usize) -> usize {
    if p < n / 2 {
        2 * p
    } else {
        2 * (n - p) - 1
    }
}
