//! Trigonometric and bit-reversal tables shared by the 1D kernels.
//!
//! One [`TrigTables`] instance serves every power-of-two length up to its
//! `valid_through` marker `N`:
//!
//! - `phasors[j] = e^{iπj/(2N)}` for `j ∈ [0, 2N)`: a half circle sampled at
//!   `2π/(4N)`. FFT twiddles of any sub-length, the real-packing twiddles and
//!   the quarter-wave DCT rotations are all strided reads from this table.
//! - `bitrev`: the bit-reversal permutation of the largest complex FFT
//!   (`max(1, N/2)` points). Shorter FFTs shift the entries down.

use num_complex::Complex;

use crate::DctFloat;

/// Lazily grown phasor and bit-reversal tables.
#[derive(Debug, Clone)]
pub(crate) struct TrigTables<T> {
    /// Largest transform length the tables cover (0 before the first build).
    valid_through: usize,
    phasors: Vec<Complex<T>>,
    bitrev: Vec<usize>,
    bitrev_bits: u32,
}

impl<T: DctFloat> TrigTables<T> {
    /// Empty tables; nothing is covered until [`TrigTables::ensure`] runs.
    pub(crate) fn new() -> Self {
        Self {
            valid_through: 0,
            phasors: Vec::new(),
            bitrev: Vec::new(),
            bitrev_bits: 0,
        }
    }

    /// Tables covering the largest of `lengths`.
    pub(crate) fn for_lengths(lengths: &[usize]) -> Self {
        let mut tables = Self::new();
        for &len in lengths {
            tables.ensure(len);
        }
        tables
    }

    /// Make the tables cover transform length `len` (a power of two).
    ///
    /// Returns `true` when the tables were rebuilt. Requests at or below the
    /// current coverage leave them untouched.
    pub(crate) fn ensure(&mut self, len: usize) -> bool {
        debug_assert!(len.is_power_of_two());
        if len <= self.valid_through {
            return false;
        }
        let fft_len = (len / 2).max(1);
        self.phasors = build_phasors(len);
        self.bitrev = build_bitrev(fft_len);
        self.bitrev_bits = fft_len.trailing_zeros();
        self.valid_through = len;
        true
    }

    #[inline]
    pub(crate) fn valid_through(&self) -> usize {
        self.valid_through
    }

    #[inline]
    pub(crate) fn covers(&self, len: usize) -> bool {
        len <= self.valid_through
    }

    /// Number of phasor steps in a full turn (`4N`).
    #[inline]
    pub(crate) fn circle(&self) -> usize {
        4 * self.valid_through
    }

    /// `e^{iπ·index/(2N)}`.
    #[inline(always)]
    pub(crate) fn phasor(&self, index: usize) -> Complex<T> {
        self.phasors[index]
    }

    /// Bit-reversed `index` over `bits` bits, for `bits` up to the table depth.
    #[inline(always)]
    pub(crate) fn bit_reverse(&self, index: usize, bits: u32) -> usize {
        self.bitrev[index] >> (self.bitrev_bits - bits)
    }
}

/// Phasors for `j ∈ [0, 2N)`.
///
/// Only the first octant is evaluated; the second octant swaps cosine and
/// sine (`θ = π/2 - φ`), and the second quadrant rotates the first by a
/// quarter turn (`θ = π/2 + φ`).
fn build_phasors<T: DctFloat>(n: usize) -> Vec<Complex<T>> {
    let octant = n / 2;
    let delta = std::f64::consts::FRAC_PI_2 / n as f64;
    let first: Vec<(f64, f64)> = (0..=octant)
        .map(|j| {
            let angle = delta * j as f64;
            (angle.cos(), angle.sin())
        })
        .collect();

    let quadrant = |j: usize| -> (f64, f64) {
        if j <= octant {
            first[j]
        } else {
            let (c, s) = first[n - j];
            (s, c)
        }
    };

    (0..2 * n)
        .map(|j| {
            let (c, s) = if j <= n {
                quadrant(j)
            } else {
                let (c, s) = quadrant(j - n);
                (-s, c)
            };
            Complex::new(T::from_f64(c), T::from_f64(s))
        })
        .collect()
}

/// Bit-reversal permutation of `len` points, grown by doubling.
fn build_bitrev(len: usize) -> Vec<usize> {
    let mut table = Vec::with_capacity(len);
    table.push(0);
    while table.len() < len {
        let half = table.len();
        for entry in table.iter_mut() {
            *entry <<= 1;
        }
        for i in 0..half {
            let odd = table[i] + 1;
            table.push(odd);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bitrev_doubling() {
        assert_eq!(build_bitrev(1), vec![0]);
        assert_eq!(build_bitrev(2), vec![0, 1]);
        assert_eq!(build_bitrev(8), vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn test_bitrev_matches_reverse_bits() {
        let table = build_bitrev(256);
        for (i, &r) in table.iter().enumerate() {
            assert_eq!(r, (i as u8).reverse_bits() as usize);
        }
    }

    #[test]
    fn test_sub_length_bit_reverse() {
        let tables = TrigTables::<f64>::for_lengths(&[64]);
        // 32-point table shifted down to 8 points.
        let reversed: Vec<usize> = (0..8).map(|i| tables.bit_reverse(i, 3)).collect();
        assert_eq!(reversed, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn test_phasors_match_direct_evaluation() {
        for n in [1usize, 2, 4, 16, 128] {
            let phasors = build_phasors::<f64>(n);
            assert_eq!(phasors.len(), 2 * n);
            for (j, p) in phasors.iter().enumerate() {
                let angle = std::f64::consts::PI * j as f64 / (2 * n) as f64;
                assert_abs_diff_eq!(p.re, angle.cos(), epsilon = 1e-14);
                assert_abs_diff_eq!(p.im, angle.sin(), epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_ensure_is_idempotent_and_grow_only() {
        let mut tables = TrigTables::<f32>::new();
        assert!(!tables.covers(1));
        assert!(tables.ensure(16));
        assert_eq!(tables.valid_through(), 16);
        assert_eq!(tables.circle(), 64);

        let snapshot = tables.phasors.clone();
        assert!(!tables.ensure(16));
        assert!(!tables.ensure(4));
        assert_eq!(tables.valid_through(), 16);
        assert_eq!(tables.phasors, snapshot);

        assert!(tables.ensure(64));
        assert_eq!(tables.valid_through(), 64);
        assert_eq!(tables.phasors.len(), 128);
        assert_eq!(tables.bitrev.len(), 32);
    }

    #[test]
    fn test_for_lengths_covers_largest() {
        let tables = TrigTables::<f64>::for_lengths(&[8, 32, 2]);
        assert_eq!(tables.valid_through(), 32);
        assert!(tables.covers(8));
        assert!(!tables.covers(64));
    }
}
