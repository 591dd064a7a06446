use super::alignment::AtomPairingScheme;
use super::config::MotifSearchConfig;
use super::error::InputError;
use crate::core::models::descriptor::{ResiduePairDescriptor, ResiduePairGeometry};
use crate::core::models::ids::ResidueIdentifier;
use crate::core::models::residue::{Residue, ResidueType};
use crate::core::models::structure::Structure;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringStrategy {
    /// Rank by deviation of residue-pair geometry only.
    Descriptor,
    /// Additionally superpose every hit onto the query and filter by RMSD.
    #[default]
    Alignment,
}

impl FromStr for ScoringStrategy {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "descriptor" => Ok(ScoringStrategy::Descriptor),
            "alignment" => Ok(ScoringStrategy::Alignment),
            _ => Err(InputError::UnknownScoringStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::Descriptor => f.write_str("descriptor"),
            ScoringStrategy::Alignment => f.write_str("alignment"),
        }
    }
}

/// Tolerances, cutoffs and limits of a single search.
///
/// Tolerances are bin radii: a tolerance of 1 on the backbone distance also
/// matches target pairs one bin shorter or longer than the query pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub backbone_distance_tolerance: u8,
    pub side_chain_distance_tolerance: u8,
    pub angle_tolerance: u8,
    pub scoring_strategy: ScoringStrategy,
    pub atom_pairing_scheme: AtomPairingScheme,
    /// Hits must score strictly below this value.
    pub score_cutoff: f64,
    /// Aligned hits must have an RMSD strictly below this value.
    pub rmsd_cutoff: f64,
    pub limit: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            backbone_distance_tolerance: 1,
            side_chain_distance_tolerance: 1,
            angle_tolerance: 1,
            scoring_strategy: ScoringStrategy::default(),
            atom_pairing_scheme: AtomPairingScheme::default(),
            score_cutoff: f64::INFINITY,
            rmsd_cutoff: 2.0,
            limit: usize::MAX,
        }
    }
}

/// One edge of the (complete) query graph between motif positions `i < j`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPair {
    pub i: usize,
    pub j: usize,
    pub descriptor: ResiduePairDescriptor,
    pub geometry: ResiduePairGeometry,
}

/// The motif residues in selection order and every pair formed from them.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStructure {
    structure: Structure,
    residues: Vec<Residue>,
    pairs: Vec<QueryPair>,
}

impl QueryStructure {
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn pairs(&self) -> &[QueryPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotifSearchQuery {
    query_structure: QueryStructure,
    parameters: Parameters,
    exchanges: HashMap<ResidueIdentifier, HashSet<ResidueType>>,
    allowed_types: Vec<Vec<ResidueType>>, // Per motif position, sorted, always contains the own type
}

impl MotifSearchQuery {
    pub fn builder(structure: Structure, residues: Vec<ResidueIdentifier>) -> MotifSearchQueryBuilder {
        MotifSearchQueryBuilder::new(structure, residues)
    }

    pub fn query_structure(&self) -> &QueryStructure {
        &self.query_structure
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn exchanges(&self) -> &HashMap<ResidueIdentifier, HashSet<ResidueType>> {
        &self.exchanges
    }

    /// Residue types a target residue may have at motif position `position`.
    pub fn allowed_types(&self, position: usize) -> &[ResidueType] {
        self.allowed_types
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub struct MotifSearchQueryBuilder {
    structure: Structure,
    residues: Vec<ResidueIdentifier>,
    exchanges: HashMap<ResidueIdentifier, HashSet<ResidueType>>,
    parameters: Parameters,
}

impl MotifSearchQueryBuilder {
    pub fn new(structure: Structure, residues: Vec<ResidueIdentifier>) -> Self {
        Self {
            structure,
            residues,
            exchanges: HashMap::new(),
            parameters: Parameters::default(),
        }
    }

    /// Allows additional residue types at the position of `residue`.
    pub fn exchange(mut self, residue: ResidueIdentifier, types: impl IntoIterator<Item = ResidueType>) -> Self {
        self.exchanges.entry(residue).or_default().extend(types);
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
    pub fn backbone_distance_tolerance(mut self, tolerance: u8) -> Self {
        self.parameters.backbone_distance_tolerance = tolerance;
        self
    }
    pub fn side_chain_distance_tolerance(mut self, tolerance: u8) -> Self {
        self.parameters.side_chain_distance_tolerance = tolerance;
        self
    }
    pub fn angle_tolerance(mut self, tolerance: u8) -> Self {
        self.parameters.angle_tolerance = tolerance;
        self
    }
    pub fn scoring_strategy(mut self, strategy: ScoringStrategy) -> Self {
        self.parameters.scoring_strategy = strategy;
        self
    }
    pub fn atom_pairing_scheme(mut self, scheme: AtomPairingScheme) -> Self {
        self.parameters.atom_pairing_scheme = scheme;
        self
    }
    pub fn score_cutoff(mut self, cutoff: f64) -> Self {
        self.parameters.score_cutoff = cutoff;
        self
    }
    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.parameters.rmsd_cutoff = cutoff;
        self
    }
    pub fn limit(mut self, limit: usize) -> Self {
        self.parameters.limit = limit;
        self
    }

    /// Validates the selection against `config` and measures all motif pairs.
    pub fn build(self, config: &MotifSearchConfig) -> Result<MotifSearchQuery, InputError> {
        let count = self.residues.len();
        match count {
            0 => return Err(InputError::EmptyMotif),
            1 => return Err(InputError::TooFewResidues { count }),
            _ if count > config.max_motif_size => {
                return Err(InputError::MotifTooLarge {
                    count,
                    max: config.max_motif_size,
                });
            }
            _ => {}
        }

        let mut seen = HashSet::with_capacity(count);
        let mut residues = Vec::with_capacity(count);
        for id in &self.residues {
            if !seen.insert(*id) {
                return Err(InputError::DuplicateResidue(*id));
            }
            let residue = self
                .structure
                .residue(id)
                .ok_or(InputError::ResidueNotFound(*id))?;
            residues.push(residue.clone());
        }
        if let Some(unselected) = self.exchanges.keys().find(|id| !seen.contains(*id)) {
            return Err(InputError::ResidueNotFound(*unselected));
        }

        let quantizer = config.quantizer();
        let mut pairs = Vec::with_capacity(count * (count - 1) / 2);
        for i in 0..count {
            for j in i + 1..count {
                let (a, b) = (&residues[i], &residues[j]);
                let geometry = ResiduePairGeometry::measure(a, b);
                let descriptor = quantizer.descriptor(a, b, &geometry).ok_or(
                    InputError::PairBeyondCutoff {
                        a: a.identifier,
                        b: b.identifier,
                        distance: geometry.backbone_distance.max(geometry.side_chain_distance),
                    },
                )?;
                pairs.push(QueryPair {
                    i,
                    j,
                    descriptor,
                    geometry,
                });
            }
        }

        let allowed_types = residues
            .iter()
            .map(|residue| {
                let mut types: BTreeSet<ResidueType> = self
                    .exchanges
                    .get(&residue.identifier)
                    .into_iter()
                    .flatten()
                    .copied()
                    .collect();
                types.insert(residue.residue_type);
                types.into_iter().collect()
            })
            .collect();

        Ok(MotifSearchQuery {
            query_structure: QueryStructure {
                structure: self.structure,
                residues,
                pairs,
            },
            parameters: self.parameters,
            exchanges: self.exchanges,
            allowed_types,
        })
    }
}
