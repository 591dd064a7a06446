use crate::core::io::provider::StructureDataProvider;
use crate::engine::alignment::AlignmentService;
use crate::engine::assembler::{TargetAssembler, TargetStructure};
use crate::engine::config::MotifSearchConfig;
use crate::engine::error::EngineError;
use crate::engine::index::InvertedIndex;
use crate::engine::query::{MotifSearchQuery, ScoringStrategy};
use crate::engine::result::{MotifSearchResult, Timings};
use crate::engine::scoring::{Hit, HitScorer};
use itertools::Itertools;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Executes motif queries against an index and its renumbered structures.
pub struct MotifSearchRuntime<'a> {
    index: &'a dyn InvertedIndex,
    provider: &'a dyn StructureDataProvider,
    aligner: &'a dyn AlignmentService,
    config: &'a MotifSearchConfig,
}

impl<'a> MotifSearchRuntime<'a> {
    pub fn new(
        index: &'a dyn InvertedIndex,
        provider: &'a dyn StructureDataProvider,
        aligner: &'a dyn AlignmentService,
        config: &'a MotifSearchConfig,
    ) -> Self {
        Self {
            index,
            provider,
            aligner,
            config,
        }
    }

    /// Runs one search.
    ///
    /// Hits are collected in target order until the effective limit (the
    /// smaller of the query limit and the configured maximum) is reached, then
    /// ranked by RMSD or, for descriptor scoring, by descriptor score.
    #[instrument(skip_all, name = "motif_search")]
    pub fn perform_search(&self, query: MotifSearchQuery) -> Result<MotifSearchResult, EngineError> {
        let start = Instant::now();
        let parameters = query.parameters();
        info!(
            "Query: {}, tolerances: [{}, {}, {}], exchanges: {}",
            query.query_structure().structure().identifier(),
            parameters.backbone_distance_tolerance,
            parameters.side_chain_distance_tolerance,
            parameters.angle_tolerance,
            describe_exchanges(&query)
        );

        let quantizer = self.config.quantizer();
        let targets = TargetAssembler::new(self.index, quantizer).assemble(&query)?;
        let assembly = start.elapsed();
        debug!("Assembled {} target structures", targets.len());

        let limit = parameters.limit.min(self.config.max_results);
        let scoring_start = Instant::now();
        let mut hits = {
            let scorer = HitScorer::for_query(&query, quantizer, self.aligner);
            if self.config.parallel_scoring {
                self.score_parallel(&scorer, &targets, limit)?
            } else {
                self.score_sequential(&scorer, &targets, limit)?
            }
        };
        rank(&mut hits, parameters.scoring_strategy);
        let scoring = scoring_start.elapsed();

        let total = start.elapsed();
        info!("Accepted {} hits in {} ms", hits.len(), scoring.as_millis());

        Ok(MotifSearchResult {
            query,
            hits,
            timings: Timings {
                assembly,
                scoring,
                total,
            },
        })
    }

    fn score_sequential(
        &self,
        scorer: &HitScorer<'_>,
        targets: &[TargetStructure],
        limit: usize,
    ) -> Result<Vec<Hit>, EngineError> {
        let mut hits = Vec::new();
        for target in targets {
            if hits.len() >= limit {
                break;
            }
            let structure = self.provider.read_renumbered(target.identifier())?;
            for hit in scorer.score_target(target, &structure) {
                hits.push(hit?);
                if hits.len() >= limit {
                    break;
                }
            }
        }
        Ok(hits)
    }

    fn score_parallel(
        &self,
        scorer: &HitScorer<'_>,
        targets: &[TargetStructure],
        limit: usize,
    ) -> Result<Vec<Hit>, EngineError> {
        let per_target = targets
            .par_iter()
            .map(|target| {
                let structure = self.provider.read_renumbered(target.identifier())?;
                scorer
                    .score_target(target, &structure)
                    .take(limit)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(per_target.into_iter().flatten().take(limit).collect())
    }
}

fn rank(hits: &mut [Hit], strategy: ScoringStrategy) {
    match strategy {
        ScoringStrategy::Alignment => hits.sort_by(|a, b| match (a.rmsd(), b.rmsd()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        }),
        ScoringStrategy::Descriptor => {
            hits.sort_by(|a, b| a.descriptor_score.total_cmp(&b.descriptor_score))
        }
    }
}

fn describe_exchanges(query: &MotifSearchQuery) -> String {
    let exchanges = query.exchanges();
    if exchanges.is_empty() {
        return "none".to_string();
    }
    exchanges
        .iter()
        .sorted_by_key(|(residue, _)| **residue)
        .map(|(residue, types)| {
            let names = types.iter().map(|t| t.to_three_letter()).sorted().join(",");
            format!("{}={}", residue, names)
        })
        .join("; ")
}
