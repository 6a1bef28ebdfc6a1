//! Weighted Kabsch alignment and RMSD filter (C5).
//!
//! Aligns a molecule-side point set onto a query-side point set with the
//! quaternion formulation of the Kabsch problem: the optimal rotation is the
//! eigenvector of the largest eigenvalue of a 4x4 matrix built from weighted
//! cross-covariances. The eigendecomposition itself is delegated to
//! `nalgebra`'s symmetric eigensolver rather than hand-rolled.

use nalgebra::{Matrix3, Matrix4, SymmetricEigen, Vector3};

/// The outcome of aligning one candidate correspondence: the weighted RMSD
/// value plus the rigid transform (molecule -> query space) that achieves it.
#[derive(Debug, Clone, Copy)]
pub struct RmsdResult {
    /// Weighted RMSD for the weighted mode; classical RMSD for unweighted.
    pub value: f64,
    /// Rotation matrix, molecule -> query space.
    pub rotation: Matrix3<f64>,
    /// Translation applied after rotation.
    pub translation: Vector3<f64>,
}

impl RmsdResult {
    /// Applies this alignment's rotation and translation to a molecule-side
    /// point.
    #[must_use]
    pub fn reorient(&self, p: Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }
}

/// Computes the weighted Kabsch alignment of `mol` onto `query`, with
/// per-point weight `weights[i]`.
///
/// Returns `None` if the eigensolver fails to converge (degenerate or
/// collinear point sets) — section 7's "alignment impossible" outcome, to be
/// treated by the caller as "drop the candidate, continue".
///
/// # Panics
///
/// Panics if `query`, `mol`, and `weights` have different lengths, or fewer
/// than 3 points; callers are expected to only reach this with a complete,
/// validated correspondence.
#[must_use]
pub fn weighted_kabsch(query: &[Vector3<f64>], mol: &[Vector3<f64>], weights: &[f64]) -> Option<RmsdResult> {
    assert_eq!(query.len(), mol.len());
    assert_eq!(query.len(), weights.len());
    assert!(query.len() >= 3, "alignment requires at least 3 points");

    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return None;
    }

    let centroid_q = weighted_centroid(query, weights, total_weight);
    let centroid_m = weighted_centroid(mol, weights, total_weight);

    let mut s = Matrix3::<f64>::zeros();
    for ((q, m), &w) in query.iter().zip(mol.iter()).zip(weights.iter()) {
        let qc = q - centroid_q;
        let mc = m - centroid_m;
        s += w * mc * qc.transpose();
    }

    let rotation = rotation_from_cross_covariance(&s)?;
    let translation = centroid_q - rotation * centroid_m;

    let mut sum_sq = 0.0;
    for ((q, m), &w) in query.iter().zip(mol.iter()).zip(weights.iter()) {
        let aligned = rotation * m + translation;
        let d = aligned - q;
        sum_sq += w * d.norm_squared();
    }
    let value = (sum_sq / total_weight).sqrt();

    Some(RmsdResult { value, rotation, translation })
}

/// Computes the unweighted Kabsch alignment (all weights 1), the classical
/// RMSD special case.
#[must_use]
pub fn unweighted_kabsch(query: &[Vector3<f64>], mol: &[Vector3<f64>]) -> Option<RmsdResult> {
    let weights = vec![1.0; query.len()];
    weighted_kabsch(query, mol, &weights)
}

fn weighted_centroid(points: &[Vector3<f64>], weights: &[f64], total_weight: f64) -> Vector3<f64> {
    let mut sum = Vector3::zeros();
    for (p, &w) in points.iter().zip(weights.iter()) {
        sum += w * p;
    }
    sum / total_weight
}

/// Builds the 4x4 Horn key matrix from the weighted cross-covariance `s`
/// (mol-to-query correlation) and returns the rotation matrix corresponding
/// to its largest-eigenvalue eigenvector, or `None` on eigensolver
/// non-convergence.
fn rotation_from_cross_covariance(s: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let sxx = s[(0, 0)];
    let sxy = s[(0, 1)];
    let sxz = s[(0, 2)];
    let syx = s[(1, 0)];
    let syy = s[(1, 1)];
    let syz = s[(1, 2)];
    let szx = s[(2, 0)];
    let szy = s[(2, 1)];
    let szz = s[(2, 2)];

    #[rustfmt::skip]
    let n = Matrix4::new(
        sxx + syy + szz, syz - szy,        szx - sxz,        sxy - syx,
        syz - szy,       sxx - syy - szz,  sxy + syx,        szx + sxz,
        szx - sxz,       sxy + syx,        -sxx + syy - szz, syz + szy,
        sxy - syx,       szx + sxz,        syz + szy,        -sxx - syy + szz,
    );

    if !n.iter().all(|v| v.is_finite()) {
        return None;
    }

    let eigen = SymmetricEigen::new(n);
    let (max_idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
    let q = eigen.eigenvectors.column(max_idx);
    let (qw, qx, qy, qz) = (q[0], q[1], q[2], q[3]);
    let norm = (qw * qw + qx * qx + qy * qy + qz * qz).sqrt();
    if norm < 1e-12 || !norm.is_finite() {
        return None;
    }
    let (qw, qx, qy, qz) = (qw / norm, qx / norm, qy / norm, qz / norm);

    #[rustfmt::skip]
    let rotation = Matrix3::new(
        1.0 - 2.0 * (qy * qy + qz * qz), 2.0 * (qx * qy - qw * qz),       2.0 * (qx * qz + qw * qy),
        2.0 * (qx * qy + qw * qz),       1.0 - 2.0 * (qx * qx + qz * qz), 2.0 * (qy * qz - qw * qx),
        2.0 * (qx * qz - qw * qy),       2.0 * (qy * qz + qw * qx),       1.0 - 2.0 * (qx * qx + qy * qy),
    );
    Some(rotation)
}
