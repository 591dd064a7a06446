use super::error::EngineError;
use super::index::{InvertedIndex, OccurrenceMap};
use super::query::{MotifSearchQuery, QueryPair};
use crate::core::models::descriptor::{Quantizer, ResiduePairDescriptor};
use crate::core::models::ids::{ResidueIdentifier, StructureIdentifier};
use crate::core::models::residue::ResidueType;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Target residue pairs matching one query pair, keyed by the residue taking
/// the pair's first position.
type PairRelation = HashMap<ResidueIdentifier, BTreeSet<ResidueIdentifier>>;

/// Joins per-descriptor index lookups into complete motif occurrences.
pub struct TargetAssembler<'a> {
    index: &'a dyn InvertedIndex,
    quantizer: Quantizer,
}

impl<'a> TargetAssembler<'a> {
    pub fn new(index: &'a dyn InvertedIndex, quantizer: Quantizer) -> Self {
        Self { index, quantizer }
    }

    /// All descriptors within the query's tolerances around `pair`, with residue
    /// types expanded by the allowed exchanges of both positions.
    pub fn neighbourhood(&self, query: &MotifSearchQuery, pair: &QueryPair) -> BTreeSet<ResiduePairDescriptor> {
        let parameters = query.parameters();
        let (types_i, types_j) = (query.allowed_types(pair.i), query.allowed_types(pair.j));
        let max_distance = self.quantizer.max_distance_bin();
        let backbone = bin_range(
            pair.descriptor.backbone_distance(),
            parameters.backbone_distance_tolerance,
            max_distance,
        );
        let side_chain = bin_range(
            pair.descriptor.side_chain_distance(),
            parameters.side_chain_distance_tolerance,
            max_distance,
        );
        let angle = bin_range(
            pair.descriptor.angle(),
            parameters.angle_tolerance,
            self.quantizer.max_angle_bin(),
        );

        let mut neighbourhood = BTreeSet::new();
        for &type_i in types_i {
            for &type_j in types_j {
                for bb in backbone.clone() {
                    for sc in side_chain.clone() {
                        for a in angle.clone() {
                            neighbourhood.insert(ResiduePairDescriptor::new(type_i, type_j, bb, sc, a));
                        }
                    }
                }
            }
        }
        neighbourhood
    }

    /// Assembles every target structure that contains at least one complete
    /// path, ordered by structure identifier.
    #[instrument(skip_all, name = "target_assembly")]
    pub fn assemble(&self, query: &MotifSearchQuery) -> Result<Vec<TargetStructure>, EngineError> {
        let pairs = query.query_structure().pairs();
        let size = query.query_structure().len();
        let mut relations: BTreeMap<StructureIdentifier, Vec<PairRelation>> = BTreeMap::new();

        for (pair_number, pair) in pairs.iter().enumerate() {
            let neighbourhood: Vec<_> = self.neighbourhood(query, pair).into_iter().collect();
            let lookups = neighbourhood
                .par_iter()
                .map(|descriptor| self.index.lookup(descriptor).map(|hits| (*descriptor, hits)))
                .collect::<Result<Vec<_>, _>>()?;

            let mut pair_relations: HashMap<StructureIdentifier, PairRelation> = HashMap::new();
            for (descriptor, occurrences) in lookups {
                merge_occurrences(
                    &mut pair_relations,
                    descriptor,
                    occurrences,
                    (query.allowed_types(pair.i), query.allowed_types(pair.j)),
                    |id| pair_number == 0 || relations.contains_key(id),
                );
            }

            if pair_number == 0 {
                relations = pair_relations
                    .into_iter()
                    .map(|(id, relation)| (id, vec![relation]))
                    .collect();
            } else {
                relations.retain(|id, per_pair| match pair_relations.remove(id) {
                    Some(relation) => {
                        per_pair.push(relation);
                        true
                    }
                    None => false,
                });
            }
            debug!(
                "Query pair {} ({}): {} descriptors looked up, {} candidate structures remain",
                pair_number,
                pair.descriptor,
                neighbourhood.len(),
                relations.len()
            );
            if relations.is_empty() {
                break;
            }
        }

        let targets: Vec<TargetStructure> = relations
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter_map(|(id, per_pair)| TargetStructure::new(id, size, per_pair))
            .filter(|target| target.paths().next().is_some())
            .collect();

        info!("Assembled {} candidate target structures", targets.len());
        Ok(targets)
    }
}

fn bin_range(center: u8, tolerance: u8, max: u8) -> std::ops::RangeInclusive<u8> {
    center.saturating_sub(tolerance)..=center.saturating_add(tolerance).min(max)
}

/// Adds the occurrences of one neighbourhood descriptor to the relation of a
/// query pair `(i, j)`, trying both orientations of every occurrence.
fn merge_occurrences(
    pair_relations: &mut HashMap<StructureIdentifier, PairRelation>,
    descriptor: ResiduePairDescriptor,
    occurrences: OccurrenceMap,
    (types_i, types_j): (&[ResidueType], &[ResidueType]),
    is_candidate: impl Fn(&StructureIdentifier) -> bool,
) {
    let (type_a, type_b) = (descriptor.residue_type_a(), descriptor.residue_type_b());
    let forward = types_i.contains(&type_a) && types_j.contains(&type_b);
    let backward = types_i.contains(&type_b) && types_j.contains(&type_a);
    if !forward && !backward {
        return;
    }

    for (structure, identifiers) in occurrences {
        if !is_candidate(&structure) {
            continue;
        }
        let relation = pair_relations.entry(structure).or_default();
        for identifier in identifiers {
            if forward {
                relation.entry(identifier.a).or_default().insert(identifier.b);
            }
            if backward {
                relation.entry(identifier.b).or_default().insert(identifier.a);
            }
        }
    }
}

/// Index of pair `(i, j)`, `i < j`, in the row-major enumeration of all pairs
/// of `size` positions.
fn pair_index(i: usize, j: usize, size: usize) -> usize {
    i * (2 * size - i - 1) / 2 + (j - i - 1)
}

/// Candidate structure of one search, holding per query pair the matching
/// target residue pairs and per query position the residues that can occupy it.
#[derive(Debug, Clone)]
pub struct TargetStructure {
    identifier: StructureIdentifier,
    relations: Vec<PairRelation>,
    candidates: Vec<BTreeSet<ResidueIdentifier>>,
}

impl TargetStructure {
    /// Returns `None` unless every query pair has at least one matching target pair.
    fn new(identifier: StructureIdentifier, size: usize, relations: Vec<PairRelation>) -> Option<Self> {
        if size < 2 || relations.len() != size * (size - 1) / 2 {
            return None;
        }

        let mut candidates: Vec<Option<BTreeSet<ResidueIdentifier>>> = vec![None; size];
        let mut restrict = |position: usize, residues: BTreeSet<ResidueIdentifier>| {
            let slot = &mut candidates[position];
            *slot = Some(match slot.take() {
                Some(current) => current.intersection(&residues).copied().collect(),
                None => residues,
            });
        };
        for i in 0..size {
            for j in i + 1..size {
                let relation = &relations[pair_index(i, j, size)];
                restrict(i, relation.keys().copied().collect());
                restrict(j, relation.values().flatten().copied().collect());
            }
        }

        let candidates: Vec<_> = candidates.into_iter().map(Option::unwrap_or_default).collect();
        if candidates.iter().any(BTreeSet::is_empty) {
            return None;
        }
        Some(Self {
            identifier,
            relations,
            candidates,
        })
    }

    pub fn identifier(&self) -> &StructureIdentifier {
        &self.identifier
    }

    /// Number of query positions.
    pub fn size(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidates(&self, position: usize) -> &BTreeSet<ResidueIdentifier> {
        &self.candidates[position]
    }

    /// Lazily enumerates complete paths in lexicographic order of the assigned
    /// residues. Every call starts a fresh enumeration.
    pub fn paths(&self) -> Paths<'_> {
        Paths {
            target: self,
            stack: Vec::new(),
            assignment: Vec::with_capacity(self.size()),
            started: false,
        }
    }

    /// Residues that can take `position` given the assignment of all earlier positions.
    fn extensions(&self, assignment: &[ResidueIdentifier]) -> Vec<ResidueIdentifier> {
        let position = assignment.len();
        let size = self.size();
        self.candidates[position]
            .iter()
            .filter(|candidate| {
                assignment.iter().enumerate().all(|(q, assigned)| {
                    self.relations[pair_index(q, position, size)]
                        .get(assigned)
                        .is_some_and(|partners| partners.contains(candidate))
                })
            })
            .copied()
            .collect()
    }
}

struct Frame {
    options: Vec<ResidueIdentifier>,
    next: usize,
}

/// Depth-first backtracking over partial assignments with an explicit stack.
///
/// Frame `d` enumerates the options for position `d`; `assignment` holds the
/// current choice of every frame below the top one.
pub struct Paths<'a> {
    target: &'a TargetStructure,
    stack: Vec<Frame>,
    assignment: Vec<ResidueIdentifier>,
    started: bool,
}

impl Iterator for Paths<'_> {
    type Item = Vec<ResidueIdentifier>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            self.stack.push(Frame {
                options: self.target.candidates[0].iter().copied().collect(),
                next: 0,
            });
        }

        let last_position = self.target.size() - 1;
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let frame = self.stack.last_mut()?;
            let Some(&choice) = frame.options.get(frame.next) else {
                self.stack.pop();
                self.assignment.pop();
                continue;
            };
            frame.next += 1;

            if depth == last_position {
                let mut path = self.assignment.clone();
                path.push(choice);
                return Some(path);
            }

            self.assignment.push(choice);
            let options = self.target.extensions(&self.assignment);
            self.stack.push(Frame { options, next: 0 });
        }
    }
}
