use super::alignment::{Alignment, AlignmentService, AtomPairingScheme};
use super::assembler::TargetStructure;
use super::error::EngineError;
use super::query::{MotifSearchQuery, ScoringStrategy};
use crate::core::models::descriptor::{Quantizer, ResiduePairGeometry};
use crate::core::models::ids::{ResidueIdentifier, StructureIdentifier};
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use nalgebra::Point3;

/// One accepted motif occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub structure_identifier: StructureIdentifier,
    /// Target residue assigned to each query position.
    pub residues: Vec<ResidueIdentifier>,
    pub descriptor_score: f64,
    /// Present when the search superposed the hit onto the query.
    pub alignment: Option<Alignment>,
}

impl Hit {
    pub fn rmsd(&self) -> Option<f64> {
        self.alignment.as_ref().map(|a| a.rmsd)
    }
}

/// Scoring strategy of a search, selected from the query parameters.
pub enum HitScorer<'a> {
    Descriptor {
        query: &'a MotifSearchQuery,
        quantizer: Quantizer,
    },
    Alignment {
        query: &'a MotifSearchQuery,
        quantizer: Quantizer,
        aligner: &'a dyn AlignmentService,
        scheme: AtomPairingScheme,
        reference: Vec<Point3<f64>>,
    },
}

impl<'a> HitScorer<'a> {
    pub fn for_query(
        query: &'a MotifSearchQuery,
        quantizer: Quantizer,
        aligner: &'a dyn AlignmentService,
    ) -> Self {
        let parameters = query.parameters();
        match parameters.scoring_strategy {
            ScoringStrategy::Descriptor => HitScorer::Descriptor { query, quantizer },
            ScoringStrategy::Alignment => {
                let scheme = parameters.atom_pairing_scheme;
                let reference = coordinates(query.query_structure().residues(), scheme);
                HitScorer::Alignment {
                    query,
                    quantizer,
                    aligner,
                    scheme,
                    reference,
                }
            }
        }
    }

    fn query(&self) -> &'a MotifSearchQuery {
        match self {
            HitScorer::Descriptor { query, .. } | HitScorer::Alignment { query, .. } => *query,
        }
    }

    fn quantizer(&self) -> &Quantizer {
        match self {
            HitScorer::Descriptor { quantizer, .. } | HitScorer::Alignment { quantizer, .. } => {
                quantizer
            }
        }
    }

    /// Mean normalized deviation between the measured geometry of the query
    /// pairs and that of the corresponding target pairs; 0 for a perfect match.
    pub fn descriptor_score(&self, residues: &[&Residue]) -> f64 {
        let quantizer = self.quantizer();
        let pairs = self.query().query_structure().pairs();
        if pairs.is_empty() {
            return 0.0;
        }
        let total: f64 = pairs
            .iter()
            .map(|pair| {
                let target = ResiduePairGeometry::measure(residues[pair.i], residues[pair.j]);
                let query = &pair.geometry;
                (query.backbone_distance - target.backbone_distance).abs() / quantizer.distance_bin_size()
                    + (query.side_chain_distance - target.side_chain_distance).abs()
                        / quantizer.distance_bin_size()
                    + (query.angle - target.angle).abs() / quantizer.angle_bin_size()
            })
            .sum();
        total / (3 * pairs.len()) as f64
    }

    /// Scores one path, returning `None` if it fails a cutoff.
    pub fn score(&self, structure: &Structure, path: Vec<ResidueIdentifier>) -> Result<Option<Hit>, EngineError> {
        let residues = path
            .iter()
            .map(|id| {
                structure.residue(id).ok_or_else(|| EngineError::Internal(format!(
                    "Residue {} of '{}' is indexed but missing from the stored structure",
                    id,
                    structure.identifier()
                )))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let parameters = self.query().parameters();
        let descriptor_score = self.descriptor_score(&residues);
        if descriptor_score >= parameters.score_cutoff {
            return Ok(None);
        }

        let alignment = match self {
            HitScorer::Descriptor { .. } => None,
            HitScorer::Alignment {
                aligner,
                scheme,
                reference,
                ..
            } => {
                let alignment = aligner.align(reference, &coordinates(residues.iter().copied(), *scheme))?;
                if alignment.rmsd >= parameters.rmsd_cutoff {
                    return Ok(None);
                }
                Some(alignment)
            }
        };

        Ok(Some(Hit {
            structure_identifier: structure.identifier().clone(),
            residues: path,
            descriptor_score,
            alignment,
        }))
    }

    /// Accepted hits of one target, lazily in path order.
    pub fn score_target<'t>(
        &'t self,
        target: &'t TargetStructure,
        structure: &'t Structure,
    ) -> impl Iterator<Item = Result<Hit, EngineError>> + 't {
        target
            .paths()
            .map(move |path| self.score(structure, path))
            .filter_map(Result::transpose)
    }
}

fn coordinates<'r>(
    residues: impl IntoIterator<Item = &'r Residue>,
    scheme: AtomPairingScheme,
) -> Vec<Point3<f64>> {
    residues
        .into_iter()
        .flat_map(|r| scheme.coordinates(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::alignment::KabschAlignmentService;
    use crate::engine::assembler::TargetAssembler;
    use crate::engine::assembler::tests::index_of;
    use crate::engine::config::MotifSearchConfig;
    use crate::engine::query::tests::{triad, triad_selection};
    use nalgebra::{Isometry3, Vector3};

    fn moved_triad(id: &str) -> Structure {
        let motion = Isometry3::new(Vector3::new(10.0, -4.0, 2.0), Vector3::new(0.4, 0.2, -0.9));
        let original = triad(id);
        let residues = original
            .residues()
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.backbone = motion.transform_point(&r.backbone);
                r.side_chain = r.side_chain.map(|p| motion.transform_point(&p));
                r
            })
            .collect();
        Structure::new(original.identifier().clone(), original.revision(), residues)
    }

    fn hits(strategy: ScoringStrategy, target: &Structure) -> Vec<Hit> {
        let config = MotifSearchConfig::default();
        let query = MotifSearchQuery::builder(triad("1tri"), triad_selection())
            .scoring_strategy(strategy)
            .build(&config)
            .unwrap();
        let index = index_of(std::slice::from_ref(target), config.quantizer());
        let targets = TargetAssembler::new(&index, config.quantizer())
            .assemble(&query)
            .unwrap();
        let aligner = KabschAlignmentService;
        let scorer = HitScorer::for_query(&query, config.quantizer(), &aligner);
        targets
            .iter()
            .flat_map(|t| scorer.score_target(t, target).collect::<Vec<_>>())
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn descriptor_strategy_scores_rigid_copy_as_perfect() {
        let hits = hits(ScoringStrategy::Descriptor, &moved_triad("2mov"));

        assert_eq!(hits.len(), 1);
        assert!(hits[0].descriptor_score < 1e-9);
        assert!(hits[0].alignment.is_none());
    }

    #[test]
    fn alignment_strategy_recovers_the_rigid_motion() {
        let target = moved_triad("2mov");
        let hits = hits(ScoringStrategy::Alignment, &target);

        assert_eq!(hits.len(), 1);
        assert!(hits[0].rmsd().unwrap() < 1e-6);
        let transformation = &hits[0].alignment.as_ref().unwrap().transformation;
        let restored = transformation.transform_point(&target.residues()[0].backbone);
        assert!((restored - triad("1tri").residues()[0].backbone).norm() < 1e-6);
    }

    #[test]
    fn score_cutoff_is_exclusive() {
        let config = MotifSearchConfig::default();
        let query = MotifSearchQuery::builder(triad("1tri"), triad_selection())
            .score_cutoff(0.0)
            .build(&config)
            .unwrap();
        let aligner = KabschAlignmentService;
        let scorer = HitScorer::for_query(&query, config.quantizer(), &aligner);
        let target = triad("2cpy");

        let result = scorer.score(&target, triad_selection()).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn distorted_target_has_positive_descriptor_score() {
        let config = MotifSearchConfig::default();
        let query = MotifSearchQuery::builder(triad("1tri"), triad_selection())
            .scoring_strategy(ScoringStrategy::Descriptor)
            .build(&config)
            .unwrap();
        let aligner = KabschAlignmentService;
        let scorer = HitScorer::for_query(&query, config.quantizer(), &aligner);

        let mut residues = triad("3dis").residues().to_vec();
        residues[1].backbone.x += 0.6;
        let target = Structure::new(StructureIdentifier::new("3dis"), Default::default(), residues);

        let hit = scorer.score(&target, triad_selection()).unwrap().unwrap();
        assert!(hit.descriptor_score > 0.0);
    }

    #[test]
    fn missing_target_residue_is_an_error() {
        let config = MotifSearchConfig::default();
        let query = MotifSearchQuery::builder(triad("1tri"), triad_selection())
            .build(&config)
            .unwrap();
        let aligner = KabschAlignmentService;
        let scorer = HitScorer::for_query(&query, config.quantizer(), &aligner);
        let mut path = triad_selection();
        path[0] = ResidueIdentifier::new('Z', 1);

        assert!(matches!(
            scorer.score(&triad("2cpy"), path),
            Err(EngineError::Internal(_))
        ));
    }
}
