//! In-place radix-2 complex FFT over the shared tables.

use num_complex::Complex;

use crate::kernel::Direction;
use crate::tables::TrigTables;
use crate::DctFloat;

/// Unnormalized decimation-in-time FFT of a power-of-two `buf`.
///
/// `Forward` uses `e^{-2πijk/n}`, `Inverse` uses `e^{+2πijk/n}`; neither
/// direction divides by `n`. `buf.len()` must be covered by the tables (at
/// most half of their `valid_through`).
pub(crate) fn radix2_in_place<T: DctFloat>(
    buf: &mut [Complex<T>],
    tables: &TrigTables<T>,
    direction: Direction,
) {
    let len = buf.len();
    if len <= 1 {
        return;
    }
    debug_assert!(len.is_power_of_two());
    debug_assert!(2 * len <= tables.valid_through());

    let bits = len.trailing_zeros();
    for i in 0..len {
        let r = tables.bit_reverse(i, bits);
        if i < r {
            buf.swap(i, r);
        }
    }

    let mut span = 2;
    while span <= len {
        let half = span / 2;
        let step = tables.circle() / span;
        for block in buf.chunks_exact_mut(span) {
            let (lo, hi) = block.split_at_mut(half);
            for (j, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                let w = tables.phasor(j * step);
                let w = match direction {
                    Direction::Forward => w.conj(),
                    Direction::Inverse => w,
                };
                let t = *b * w;
                *b = *a - t;
                *a = *a + t;
            }
        }
        span <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn naive_dft(input: &[Complex<f64>], sign: f64) -> Vec<Complex<f64>> {
        let n = input.len();
        (0..n)
            .map(|k| {
                input
                    .iter()
                    .enumerate()
                    .map(|(t, &x)| {
                        let angle = sign * 2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
                        x * Complex::new(angle.cos(), angle.sin())
                    })
                    .sum()
            })
            .collect()
    }

    fn ramp(n: usize) -> Vec<Complex<f64>> {
        (0..n)
            .map(|i| Complex::new((i as f64 * 0.37).sin(), (i as f64 * 1.3).cos() - 0.25))
            .collect()
    }

    #[test]
    fn test_forward_matches_naive_dft() {
        let tables = TrigTables::<f64>::for_lengths(&[128]);
        for len in [1usize, 2, 4, 8, 16, 64] {
            let input = ramp(len);
            let mut buf = input.clone();
            radix2_in_place(&mut buf, &tables, Direction::Forward);
            let expected = naive_dft(&input, -1.0);
            for (got, want) in buf.iter().zip(expected.iter()) {
                assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-10);
                assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_inverse_is_unnormalized() {
        let tables = TrigTables::<f64>::for_lengths(&[32]);
        let input = ramp(16);
        let mut buf = input.clone();
        radix2_in_place(&mut buf, &tables, Direction::Forward);
        radix2_in_place(&mut buf, &tables, Direction::Inverse);
        for (got, want) in buf.iter().zip(input.iter()) {
            assert_abs_diff_eq!(got.re, 16.0 * want.re, epsilon = 1e-10);
            assert_abs_diff_eq!(got.im, 16.0 * want.im, epsilon = 1e-10);
        }
    }
}
