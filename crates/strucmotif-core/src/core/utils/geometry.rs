use nalgebra::{Point3, Vector3};

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

pub fn distance_squared(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm_squared()
}

/// Angle between two direction vectors in degrees, within [0, 180].
///
/// Degenerate (zero-length) vectors yield 0.
pub fn angle_between_degrees(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let norms = u.norm() * v.norm();
    if norms <= f64::EPSILON {
        return 0.0;
    }
    (u.dot(v) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn angle_between_perpendicular_vectors_is_ninety_degrees() {
        let angle = angle_between_degrees(&Vector3::x(), &Vector3::y());
        assert!((angle - 90.0).abs() < EPS);
    }

    #[test]
    fn angle_between_opposite_vectors_is_one_eighty_degrees() {
        let angle = angle_between_degrees(&Vector3::x(), &(-Vector3::x() * 3.0));
        assert!((angle - 180.0).abs() < EPS);
    }

    #[test]
    fn angle_with_degenerate_vector_is_zero() {
        assert_eq!(angle_between_degrees(&Vector3::zeros(), &Vector3::y()), 0.0);
    }

    #[test]
    fn centroid_of_points_is_their_mean() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -2.0)];
        assert_eq!(centroid(&points), Some(Point3::new(1.0, 2.0, -1.0)));
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn calculate_rmsd_of_identical_sets_is_zero() {
        let points = [Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.5, 2.0)];
        assert!(calculate_rmsd(&points, &points).unwrap().abs() < EPS);
    }

    #[test]
    fn calculate_rmsd_rejects_mismatched_lengths() {
        let a = [Point3::origin()];
        let b = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert!(calculate_rmsd(&a, &b).is_none());
        assert!(calculate_rmsd(&[], &[]).is_none());
    }

    #[test]
    fn distance_squared_matches_distance() {
        let a = Point3::new(0.0, 3.0, 0.0);
        let b = Point3::new(4.0, 0.0, 0.0);
        assert!((distance(&a, &b) - 5.0).abs() < EPS);
        assert!((distance_squared(&a, &b) - 25.0).abs() < EPS);
    }
}
