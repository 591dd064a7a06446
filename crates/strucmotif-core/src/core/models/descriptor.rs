use super::ids::ResidueIdentifier;
use super::residue::{Residue, ResidueType};
use crate::core::utils::geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantized index key of an unordered residue pair.
///
/// Residue types are stored in canonical order (smaller type first), so a pair
/// has exactly one descriptor regardless of enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResiduePairDescriptor {
    residue_type_a: ResidueType,
    residue_type_b: ResidueType,
    backbone_distance: u8,
    side_chain_distance: u8,
    angle: u8,
}

impl ResiduePairDescriptor {
    pub fn new(
        residue_type_a: ResidueType,
        residue_type_b: ResidueType,
        backbone_distance: u8,
        side_chain_distance: u8,
        angle: u8,
    ) -> Self {
        let (residue_type_a, residue_type_b) = if residue_type_a <= residue_type_b {
            (residue_type_a, residue_type_b)
        } else {
            (residue_type_b, residue_type_a)
        };
        Self {
            residue_type_a,
            residue_type_b,
            backbone_distance,
            side_chain_distance,
            angle,
        }
    }

    pub fn residue_type_a(&self) -> ResidueType {
        self.residue_type_a
    }

    pub fn residue_type_b(&self) -> ResidueType {
        self.residue_type_b
    }

    pub fn backbone_distance(&self) -> u8 {
        self.backbone_distance
    }

    pub fn side_chain_distance(&self) -> u8 {
        self.side_chain_distance
    }

    pub fn angle(&self) -> u8 {
        self.angle
    }
}

impl fmt::Display for ResiduePairDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}-{}-{}-{}",
            self.residue_type_a.to_one_letter(),
            self.residue_type_b.to_one_letter(),
            self.backbone_distance,
            self.side_chain_distance,
            self.angle
        )
    }
}

/// A concrete residue pair inside one structure.
///
/// `a` carries the descriptor's first residue type and `b` the second; for
/// pairs of identical types the order is the enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResiduePairIdentifier {
    pub a: ResidueIdentifier,
    pub b: ResidueIdentifier,
}

impl ResiduePairIdentifier {
    pub fn new(a: ResidueIdentifier, b: ResidueIdentifier) -> Self {
        Self { a, b }
    }
}

/// Continuous (unbinned) geometry of a residue pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResiduePairGeometry {
    pub backbone_distance: f64,
    pub side_chain_distance: f64,
    pub angle: f64, // Degrees in [0, 180]
}

impl ResiduePairGeometry {
    pub fn measure(a: &Residue, b: &Residue) -> Self {
        let backbone_distance = geometry::distance(&a.backbone, &b.backbone);
        Self::measure_with_backbone_distance(a, b, backbone_distance)
    }

    pub(crate) fn measure_with_backbone_distance(
        a: &Residue,
        b: &Residue,
        backbone_distance: f64,
    ) -> Self {
        let side_chain_a = a.side_chain_or_backbone();
        let side_chain_b = b.side_chain_or_backbone();
        Self {
            backbone_distance,
            side_chain_distance: geometry::distance(&side_chain_a, &side_chain_b),
            angle: geometry::angle_between_degrees(
                &(side_chain_a - a.backbone),
                &(side_chain_b - b.backbone),
            ),
        }
    }
}

/// Fixed-resolution binning of residue-pair geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantizer {
    distance_cutoff: f64,
    distance_bin_size: f64,
    angle_bin_size: f64,
}

impl Quantizer {
    pub fn new(distance_cutoff: f64, distance_bin_size: f64, angle_bin_size: f64) -> Self {
        Self {
            distance_cutoff,
            distance_bin_size,
            angle_bin_size,
        }
    }

    pub fn distance_cutoff(&self) -> f64 {
        self.distance_cutoff
    }

    pub fn distance_bin_size(&self) -> f64 {
        self.distance_bin_size
    }

    pub fn angle_bin_size(&self) -> f64 {
        self.angle_bin_size
    }

    /// Highest distance bin that can occur below the cutoff.
    pub fn max_distance_bin(&self) -> u8 {
        (self.distance_cutoff / self.distance_bin_size).floor() as u8
    }

    pub fn max_angle_bin(&self) -> u8 {
        (180.0 / self.angle_bin_size).floor() as u8
    }

    /// Returns `None` for distances beyond the cutoff, which are never indexed.
    pub fn bin_distance(&self, distance: f64) -> Option<u8> {
        if !(0.0..=self.distance_cutoff).contains(&distance) {
            return None;
        }
        Some((distance / self.distance_bin_size).floor() as u8)
    }

    pub fn bin_angle(&self, angle: f64) -> u8 {
        (angle.clamp(0.0, 180.0) / self.angle_bin_size).floor() as u8
    }

    pub fn descriptor(
        &self,
        a: &Residue,
        b: &Residue,
        geometry: &ResiduePairGeometry,
    ) -> Option<ResiduePairDescriptor> {
        Some(ResiduePairDescriptor::new(
            a.residue_type,
            b.residue_type,
            self.bin_distance(geometry.backbone_distance)?,
            self.bin_distance(geometry.side_chain_distance)?,
            self.bin_angle(geometry.angle),
        ))
    }
}

/// One residue pair extracted from a structure, ready to be indexed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResiduePairOccurrence {
    pub descriptor: ResiduePairDescriptor,
    pub identifier: ResiduePairIdentifier,
    pub geometry: ResiduePairGeometry,
}

impl ResiduePairOccurrence {
    /// Quantizes the pair; the identifier is oriented to follow the descriptor's
    /// canonical type order.
    pub fn new(a: &Residue, b: &Residue, geometry: ResiduePairGeometry, quantizer: &Quantizer) -> Option<Self> {
        let descriptor = quantizer.descriptor(a, b, &geometry)?;
        let identifier = if a.residue_type <= b.residue_type {
            ResiduePairIdentifier::new(a.identifier, b.identifier)
        } else {
            ResiduePairIdentifier::new(b.identifier, a.identifier)
        };
        Some(Self {
            descriptor,
            identifier,
            geometry,
        })
    }
}
