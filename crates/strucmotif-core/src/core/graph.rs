use crate::core::models::descriptor::{Quantizer, ResiduePairGeometry, ResiduePairOccurrence};
use crate::core::models::structure::Structure;
use crate::core::utils::geometry;
use nalgebra::Point3;
use rayon::prelude::*;
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

/// Spatial graph over the residues of one structure.
///
/// Residues are bucketed into a uniform cell grid whose edge length equals the
/// distance cutoff, so every partner of a residue lies in one of the 27 cells
/// around it. Edges are the residue pairs whose backbone representatives are at
/// most the cutoff apart.
pub struct ResidueGraph<'a> {
    structure: &'a Structure,
    quantizer: Quantizer,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl<'a> ResidueGraph<'a> {
    pub fn new(structure: &'a Structure, quantizer: Quantizer) -> Self {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (index, residue) in structure.residues().iter().enumerate() {
            let key = cell_key(&residue.backbone, quantizer.distance_cutoff());
            cells.entry(key).or_default().push(index);
        }
        Self {
            structure,
            quantizer,
            cells,
        }
    }

    pub fn structure(&self) -> &Structure {
        self.structure
    }

    /// Indices `j > i` of residues whose backbone lies within the cutoff of
    /// residue `i`, in ascending order.
    fn partners(&self, i: usize) -> Vec<(usize, f64)> {
        let residues = self.structure.residues();
        let origin = &residues[i].backbone;
        let cutoff = self.quantizer.distance_cutoff();
        let cutoff_squared = cutoff * cutoff;
        let (cx, cy, cz) = cell_key(origin, cutoff);

        let mut partners = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(members) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in members.iter().filter(|&&j| j > i) {
                        let d2 = geometry::distance_squared(origin, &residues[j].backbone);
                        if d2 <= cutoff_squared {
                            partners.push((j, d2.sqrt()));
                        }
                    }
                }
            }
        }
        partners.sort_unstable_by_key(|&(j, _)| j);
        partners
    }

    fn occurrences_from(&self, i: usize) -> Vec<ResiduePairOccurrence> {
        let residues = self.structure.residues();
        let a = &residues[i];
        self.partners(i)
            .into_iter()
            .filter_map(|(j, backbone_distance)| {
                let b = &residues[j];
                let geometry =
                    ResiduePairGeometry::measure_with_backbone_distance(a, b, backbone_distance);
                ResiduePairOccurrence::new(a, b, geometry, &self.quantizer)
            })
            .collect()
    }

    /// All indexable residue pairs, ordered by the position of their first
    /// residue and then their second one.
    ///
    /// An empty result means the structure contributes nothing to the index.
    pub fn residue_pair_occurrences(&self) -> Vec<ResiduePairOccurrence> {
        (0..self.structure.len())
            .flat_map(|i| self.occurrences_from(i))
            .collect()
    }

    /// Parallel variant of [`Self::residue_pair_occurrences`] with identical output.
    pub fn par_residue_pair_occurrences(&self) -> Vec<ResiduePairOccurrence> {
        (0..self.structure.len())
            .into_par_iter()
            .flat_map_iter(|i| self.occurrences_from(i))
            .collect()
    }
}

fn cell_key(point: &Point3<f64>, cell_size: f64) -> CellKey {
    (
        (point.x / cell_size).floor() as i64,
        (point.y / cell_size).floor() as i64,
        (point.z / cell_size).floor() as i64,
    )
}
