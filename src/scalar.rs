//! Scalar type bounds for cosine transforms.

use num_traits::Float;

/// Floating-point element types the transform engines operate on.
///
/// Tables are always evaluated in `f64` and narrowed through
/// [`DctFloat::from_f64`], so single-precision engines share the accuracy of
/// the double-precision table builder.
pub trait DctFloat: Float + Send + Sync + std::fmt::Debug + 'static {
    /// Narrow an `f64` constant to `Self`.
    fn from_f64(value: f64) -> Self;
}

impl DctFloat for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl DctFloat for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}
