use super::Archive;
use crate::cli::SearchArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::parser;
use std::path::Path;
use strucmotif::core::io::pdb::PdbFile;
use strucmotif::core::io::provider::StructureDataProvider;
use strucmotif::core::io::traits::StructureFile;
use strucmotif::core::models::ids::StructureIdentifier;
use strucmotif::core::models::structure::Structure;
use strucmotif::engine::alignment::KabschAlignmentService;
use strucmotif::engine::config::MotifSearchConfig;
use strucmotif::engine::error::EngineError;
use strucmotif::engine::query::{MotifSearchQuery, ScoringStrategy};
use strucmotif::engine::result::MotifSearchResult;
use strucmotif::workflows::search::MotifSearchRuntime;
use tracing::info;

pub async fn run(args: SearchArgs, config: AppConfig) -> Result<()> {
    info!("Opening archive stores...");
    let archive = Archive::open(&config)?;

    let structure = load_query_structure(&args.structure, &archive.provider)?;
    let query = build_query(&args, structure, &config.motif)?;

    let aligner = KabschAlignmentService;
    let result = tokio::task::block_in_place(|| {
        MotifSearchRuntime::new(&archive.index, &archive.provider, &aligner, &config.motif)
            .perform_search(query)
    })?;

    print!("{}", render_result(&result));
    Ok(())
}

/// A path to an existing file is read as PDB; anything else is looked up as
/// an identifier in the renumbered store.
fn load_query_structure(value: &str, provider: &dyn StructureDataProvider) -> Result<Structure> {
    let path = Path::new(value);
    if path.is_file() {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(value);
        info!("Loading query structure from {:?}", path);
        return PdbFile::read_from_path(path, StructureIdentifier::new(stem)).map_err(|e| {
            CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            }
        });
    }
    let id = StructureIdentifier::new(value);
    info!("Loading query structure '{}' from the archive", id);
    provider
        .read_renumbered(&id)
        .map_err(|e| CliError::Strucmotif(EngineError::from(e)))
}

fn build_query(args: &SearchArgs, structure: Structure, config: &MotifSearchConfig) -> Result<MotifSearchQuery> {
    let residues = parser::parse_residues(&args.residues)?;
    let mut builder = MotifSearchQuery::builder(structure, residues);

    for exchange in &args.exchanges {
        let (residue, types) = parser::parse_exchange(exchange)?;
        builder = builder.exchange(residue, types);
    }
    if let Some(v) = args.backbone_tolerance {
        builder = builder.backbone_distance_tolerance(v);
    }
    if let Some(v) = args.side_chain_tolerance {
        builder = builder.side_chain_distance_tolerance(v);
    }
    if let Some(v) = args.angle_tolerance {
        builder = builder.angle_tolerance(v);
    }
    if let Some(v) = args.strategy {
        builder = builder.scoring_strategy(v);
    }
    if let Some(v) = args.pairing_scheme {
        builder = builder.atom_pairing_scheme(v);
    }
    if let Some(v) = args.score_cutoff {
        builder = builder.score_cutoff(v);
    }
    if let Some(v) = args.rmsd_cutoff {
        builder = builder.rmsd_cutoff(v);
    }
    if let Some(v) = args.limit {
        builder = builder.limit(v);
    }

    builder
        .build(config)
        .map_err(|e| CliError::Strucmotif(EngineError::from(e)))
}

fn render_result(result: &MotifSearchResult) -> String {
    let mut out = String::new();
    let strategy = result.query.parameters().scoring_strategy;
    out.push_str(&format!(
        "{:>5}  {:<8} {:>10} {:>8}  {}\n",
        "Rank", "Entry", "Score", "RMSD", "Residues"
    ));
    for (rank, hit) in result.hits.iter().enumerate() {
        let rmsd = match (strategy, hit.rmsd()) {
            (ScoringStrategy::Alignment, Some(rmsd)) => format!("{:.3}", rmsd),
            _ => "-".to_string(),
        };
        let residues = hit
            .residues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "{:>5}  {:<8} {:>10.4} {:>8}  {}\n",
            rank + 1,
            hit.structure_identifier,
            hit.descriptor_score,
            rmsd,
            residues
        ));
    }
    out.push_str(&format!(
        "\n{} hit(s). Assembly: {} ms, scoring: {} ms, total: {} ms\n",
        result.len(),
        result.timings.assembly.as_millis(),
        result.timings.scoring.as_millis(),
        result.timings.total.as_millis()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use nalgebra::Point3;
    use strucmotif::core::io::provider::MemoryDataProvider;
    use strucmotif::core::models::ids::ResidueIdentifier;
    use strucmotif::core::models::residue::{Residue, ResidueType};
    use strucmotif::core::models::structure::Revision;
    use strucmotif::engine::result::Timings;
    use strucmotif::engine::scoring::Hit;

    fn structure() -> Structure {
        let residue = |seq_id, residue_type, backbone: [f64; 3], side_chain: [f64; 3]| {
            Residue::new(
                ResidueIdentifier::new('A', seq_id),
                residue_type,
                Point3::from(backbone),
                Some(Point3::from(side_chain)),
            )
        };
        Structure::new(
            StructureIdentifier::new("1qry"),
            Revision::default(),
            vec![
                residue(57, ResidueType::Histidine, [0.0, 0.0, 0.0], [1.2, 1.9, 0.4]),
                residue(102, ResidueType::AsparticAcid, [6.5, 0.8, 0.3], [5.1, 2.2, 0.9]),
                residue(195, ResidueType::Serine, [2.9, 6.1, -1.4], [2.4, 4.6, -0.2]),
            ],
        )
    }

    fn search_args(extra: &[&str]) -> SearchArgs {
        let mut argv = vec!["strucmotif", "search", "-s", "1qry", "-r", "A:57,A:102,A:195"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Search(args) => args,
            _ => panic!("Expected 'search' subcommand"),
        }
    }

    #[test]
    fn query_applies_command_line_parameters() {
        let args = search_args(&["-x", "A:195=CYS", "--limit", "7", "--strategy", "descriptor"]);

        let query = build_query(&args, structure(), &MotifSearchConfig::default()).unwrap();

        assert_eq!(query.parameters().limit, 7);
        assert_eq!(query.parameters().scoring_strategy, ScoringStrategy::Descriptor);
        assert_eq!(
            query.allowed_types(2),
            &[ResidueType::Cysteine, ResidueType::Serine][..]
        );
    }

    #[test]
    fn unknown_query_residue_is_rejected() {
        let args = search_args(&[]);
        let mut residues = structure().residues().to_vec();
        residues.pop();
        let truncated = Structure::new(StructureIdentifier::new("1qry"), Revision::default(), residues);

        assert!(matches!(
            build_query(&args, truncated, &MotifSearchConfig::default()),
            Err(CliError::Strucmotif(EngineError::Input(_)))
        ));
    }

    #[test]
    fn query_structure_is_read_from_the_archive_by_identifier() {
        let provider = MemoryDataProvider::new();
        let id = StructureIdentifier::new("1qry");
        provider.write_renumbered(&id, &structure()).unwrap();

        let loaded = load_query_structure("1QRY", &provider).unwrap();

        assert_eq!(loaded.len(), 3);
        assert!(matches!(
            load_query_structure("9zzz", &provider),
            Err(CliError::Strucmotif(_))
        ));
    }

    #[test]
    fn result_table_lists_ranked_hits_and_timings() {
        let query = build_query(&search_args(&["--strategy", "descriptor"]), structure(), &MotifSearchConfig::default())
            .unwrap();
        let result = MotifSearchResult {
            query,
            hits: vec![Hit {
                structure_identifier: StructureIdentifier::new("4cha"),
                residues: vec![
                    ResidueIdentifier::new('B', 57),
                    ResidueIdentifier::new('B', 102),
                    ResidueIdentifier::new('C', 195),
                ],
                descriptor_score: 0.125,
                alignment: None,
            }],
            timings: Timings::default(),
        };

        let table = render_result(&result);

        assert!(table.contains("4cha"));
        assert!(table.contains("B:57 B:102 C:195"));
        assert!(table.contains("0.1250"));
        assert!(table.contains("1 hit(s)."));
    }
}
