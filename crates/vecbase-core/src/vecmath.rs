//! Vector math kernel.
//!
//! Pure functions over dense, fixed-dimension real vectors. Inputs are `f32`
//! slices; every accumulation runs in `f64` with a sequential reduction so
//! identical inputs always give identical results. Dimension agreement and
//! finiteness are validated at component boundaries via [`ensure_dimension`]
//! and [`ensure_finite`].

use crate::error::{Result, VecbaseError};

/// Dot product of `a` and `b`, accumulated in `f64`.
///
/// Callers are responsible for dimension agreement; in debug builds a
/// mismatch asserts.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut acc = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        acc += f64::from(*x) * f64::from(*y);
    }
    acc
}

/// L2 norm of `a`.
#[inline]
pub fn norm(a: &[f32]) -> f64 {
    let mut acc = 0.0f64;
    for x in a {
        let x = f64::from(*x);
        acc += x * x;
    }
    acc.sqrt()
}

/// Cosine similarity of `a` and `b`.
///
/// Returns 0.0 when either vector has zero norm.
#[inline]
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Euclidean (L2) distance between `a` and `b`.
#[inline]
pub fn l2(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut acc = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = f64::from(*x) - f64::from(*y);
        acc += d * d;
    }
    acc.sqrt()
}

/// Unit-normalize `a`. The zero vector maps to itself.
pub fn normalize(a: &[f32]) -> Vec<f32> {
    let n = norm(a);
    if n == 0.0 {
        return a.to_vec();
    }
    a.iter().map(|x| (f64::from(*x) / n) as f32).collect()
}

/// Element-wise accumulate `v` into `acc` (centroid maintenance).
#[inline]
pub fn accumulate(acc: &mut [f64], v: &[f32]) {
    debug_assert_eq!(acc.len(), v.len());
    for (a, x) in acc.iter_mut().zip(v.iter()) {
        *a += f64::from(*x);
    }
}

/// Mean of an accumulated sum over `count` vectors.
///
/// Returns the zero vector for `count == 0`.
pub fn mean(acc: &[f64], count: usize) -> Vec<f32> {
    if count == 0 {
        return vec![0.0; acc.len()];
    }
    let n = count as f64;
    acc.iter().map(|a| (a / n) as f32).collect()
}

/// Reject a dimension that differs from the expected one.
#[inline]
pub fn ensure_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(VecbaseError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Reject vectors containing NaN or infinite components.
pub fn ensure_finite(v: &[f32]) -> Result<()> {
    for (i, x) in v.iter().enumerate() {
        if !x.is_finite() {
            return Err(VecbaseError::validation(format!(
                "embedding component {} is not finite: {}",
                i, x
            )));
        }
    }
    Ok(())
}
