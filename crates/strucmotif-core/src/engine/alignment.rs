use crate::core::models::residue::Residue;
use crate::core::utils::geometry;
use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, SVD, Translation3, UnitQuaternion};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::error::InputError;

#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("Coordinate sets differ in size ({reference} reference vs {mobile} mobile points)")]
    MismatchedLength { reference: usize, mobile: usize },
    #[error("Cannot align empty coordinate sets")]
    Empty,
    #[error("Singular value decomposition did not converge")]
    Decomposition,
}

/// Which representative coordinates of a residue take part in a superposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtomPairingScheme {
    Backbone,
    SideChain,
    #[default]
    All,
}

impl AtomPairingScheme {
    pub fn coordinates(&self, residue: &Residue) -> Vec<Point3<f64>> {
        match self {
            AtomPairingScheme::Backbone => vec![residue.backbone],
            AtomPairingScheme::SideChain => vec![residue.side_chain_or_backbone()],
            AtomPairingScheme::All => vec![residue.backbone, residue.side_chain_or_backbone()],
        }
    }
}

impl FromStr for AtomPairingScheme {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "backbone" => Ok(AtomPairingScheme::Backbone),
            "side-chain" | "sidechain" => Ok(AtomPairingScheme::SideChain),
            "all" => Ok(AtomPairingScheme::All),
            _ => Err(InputError::UnknownPairingScheme(s.to_string())),
        }
    }
}

impl fmt::Display for AtomPairingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomPairingScheme::Backbone => "backbone",
            AtomPairingScheme::SideChain => "side-chain",
            AtomPairingScheme::All => "all",
        };
        f.write_str(name)
    }
}

/// Rigid-body transformation superposing mobile onto reference coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub transformation: Isometry3<f64>,
    pub rmsd: f64,
}

pub trait AlignmentService: Send + Sync {
    fn align(
        &self,
        reference: &[Point3<f64>],
        mobile: &[Point3<f64>],
    ) -> Result<Alignment, AlignmentError>;
}

/// Least-squares superposition via the Kabsch algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct KabschAlignmentService;

impl AlignmentService for KabschAlignmentService {
    fn align(
        &self,
        reference: &[Point3<f64>],
        mobile: &[Point3<f64>],
    ) -> Result<Alignment, AlignmentError> {
        if reference.len() != mobile.len() {
            return Err(AlignmentError::MismatchedLength {
                reference: reference.len(),
                mobile: mobile.len(),
            });
        }
        let (Some(reference_center), Some(mobile_center)) =
            (geometry::centroid(reference), geometry::centroid(mobile))
        else {
            return Err(AlignmentError::Empty);
        };

        let covariance = mobile
            .iter()
            .zip(reference)
            .fold(Matrix3::zeros(), |acc, (m, r)| {
                acc + (m - mobile_center) * (r - reference_center).transpose()
            });

        let svd = SVD::new(covariance, true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(AlignmentError::Decomposition);
        };

        // Flip the weakest axis if the optimal orthogonal matrix is a reflection.
        let mut correction = Matrix3::identity();
        if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
            correction[(2, 2)] = -1.0;
        }
        let rotation_matrix = v_t.transpose() * correction * u.transpose();
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
            rotation_matrix,
        ));
        let translation = reference_center.coords - rotation * mobile_center.coords;
        let transformation = Isometry3::from_parts(Translation3::from(translation), rotation);

        let transformed: Vec<Point3<f64>> = mobile
            .iter()
            .map(|p| transformation.transform_point(p))
            .collect();
        let rmsd = geometry::calculate_rmsd(reference, &transformed).ok_or(AlignmentError::Empty)?;

        Ok(Alignment {
            transformation,
            rmsd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn reference() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.8, 0.0, 0.0),
            Point3::new(3.8, 3.8, 0.0),
            Point3::new(1.0, 2.0, 4.0),
        ]
    }

    #[test]
    fn identical_sets_align_with_zero_rmsd() {
        let alignment = KabschAlignmentService.align(&reference(), &reference()).unwrap();
        assert!(alignment.rmsd < 1e-9);
    }

    #[test]
    fn rigidly_moved_copy_is_superposed_exactly() {
        let motion = Isometry3::new(Vector3::new(5.0, -2.0, 7.5), Vector3::new(0.3, -1.1, 0.7));
        let mobile: Vec<_> = reference().iter().map(|p| motion.transform_point(p)).collect();

        let alignment = KabschAlignmentService.align(&reference(), &mobile).unwrap();

        assert!(alignment.rmsd < 1e-6, "rmsd = {}", alignment.rmsd);
        let restored = alignment.transformation.transform_point(&mobile[3]);
        assert!((restored - reference()[3]).norm() < 1e-6);
    }

    #[test]
    fn mirror_image_is_not_superposed_by_a_reflection() {
        let mirrored: Vec<_> = reference()
            .iter()
            .map(|p| Point3::new(p.x, p.y, -p.z))
            .collect();

        let alignment = KabschAlignmentService.align(&reference(), &mirrored).unwrap();

        assert!(alignment.rmsd > 0.1);
    }

    #[test]
    fn mismatched_and_empty_sets_are_rejected() {
        let service = KabschAlignmentService;
        assert_eq!(
            service.align(&reference(), &reference()[..2]),
            Err(AlignmentError::MismatchedLength {
                reference: 4,
                mobile: 2
            })
        );
        assert_eq!(service.align(&[], &[]), Err(AlignmentError::Empty));
    }

    #[test]
    fn pairing_scheme_selects_representative_coordinates() {
        use crate::core::models::ids::ResidueIdentifier;
        use crate::core::models::residue::ResidueType;

        let glycine = Residue::new(
            ResidueIdentifier::new('A', 1),
            ResidueType::Glycine,
            Point3::new(1.0, 2.0, 3.0),
            None,
        );

        assert_eq!(AtomPairingScheme::Backbone.coordinates(&glycine).len(), 1);
        assert_eq!(
            AtomPairingScheme::SideChain.coordinates(&glycine),
            vec![Point3::new(1.0, 2.0, 3.0)]
        );
        assert_eq!(AtomPairingScheme::All.coordinates(&glycine).len(), 2);
        assert_eq!("side_chain".parse(), Ok(AtomPairingScheme::SideChain));
        assert!("atoms".parse::<AtomPairingScheme>().is_err());
    }
}
