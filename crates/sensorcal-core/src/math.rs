use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

pub type Real = f64;

pub type Vec3 = Vector3<Real>;
pub type Mat3 = Matrix3<Real>;
pub type DMat = DMatrix<Real>;
pub type DVec = DVector<Real>;

/// Median of a slice of finite values, reordering `buf` in place.
///
/// Even-length inputs return the mean of the two middle values. Returns
/// `None` for an empty slice.
pub fn median_in_place(buf: &mut [Real]) -> Option<Real> {
    let n = buf.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = buf.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let upper = *upper;
    if n % 2 == 1 {
        return Some(upper);
    }
    let lower = lower
        .iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
        .unwrap_or(upper);
    Some(0.5 * (lower + upper))
}

/// Row-major nested array view of a 3x3 matrix.
pub fn mat3_rows(m: &Mat3) -> [[Real; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        let mut odd = [5.0, 1.0, 3.0];
        assert_eq!(median_in_place(&mut odd), Some(3.0));

        let mut even = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(median_in_place(&mut even), Some(2.5));

        let mut empty: [Real; 0] = [];
        assert_eq!(median_in_place(&mut empty), None);
    }

    #[test]
    fn median_handles_infinite_outliers() {
        let mut vals = [0.0, f64::INFINITY, 0.0, f64::INFINITY, 0.0];
        assert_eq!(median_in_place(&mut vals), Some(0.0));
    }
}
