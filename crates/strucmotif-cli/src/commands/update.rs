use super::Archive;
use crate::cli::UpdateArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::listing;
use crate::utils::progress::CliProgressHandler;
use strucmotif::core::models::ids::StructureIdentifier;
use strucmotif::engine::progress::ProgressReporter;
use strucmotif::workflows::update::{MotifSearchUpdate, Operation, UpdateSummary};
use tracing::info;

const FULL_UPDATE: &str = "full";

pub async fn run(args: UpdateArgs, config: AppConfig) -> Result<()> {
    let requested = resolve_identifiers(args.operation, &args.ids, &config.entry_list_url).await?;

    info!("Opening archive stores...");
    let archive = Archive::open(&config)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting {} of {} structure(s)...", args.operation, requested.len());
    let summary = tokio::task::block_in_place(|| {
        MotifSearchUpdate::new(
            &archive.state,
            &archive.provider,
            &archive.index,
            &config.motif,
            &reporter,
        )
        .run(args.operation, &requested)
    })?;

    print_summary(&summary);
    Ok(())
}

async fn resolve_identifiers(
    operation: Operation,
    ids: &[String],
    entry_list_url: &str,
) -> Result<Vec<StructureIdentifier>> {
    if ids.len() == 1 && ids[0].eq_ignore_ascii_case(FULL_UPDATE) {
        return listing::fetch_current_identifiers(entry_list_url).await;
    }
    if ids.is_empty() && operation != Operation::Recover {
        return Err(CliError::Argument(format!(
            "'{}' requires structure identifiers or '{}'.",
            operation, FULL_UPDATE
        )));
    }
    Ok(ids.iter().map(|id| StructureIdentifier::new(id)).collect())
}

fn print_summary(summary: &UpdateSummary) {
    if !summary.recovered.is_empty() {
        println!("Recovered {} dirty structure(s).", summary.recovered.len());
    }
    if !summary.added.is_empty() {
        println!("✓ Added {} structure(s).", summary.added.len());
    }
    if !summary.skipped.is_empty() {
        println!(
            "  Skipped {} structure(s) without usable data: {}",
            summary.skipped.len(),
            summary
                .skipped
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !summary.removed.is_empty() {
        println!("✓ Removed {} structure(s).", summary.removed.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_identifiers_are_normalized() {
        let ids = resolve_identifiers(
            Operation::Add,
            &["1ACJ".to_string(), "4hhb".to_string()],
            "http://unused",
        )
        .await
        .unwrap();
        assert_eq!(
            ids,
            vec![StructureIdentifier::new("1acj"), StructureIdentifier::new("4hhb")]
        );
    }

    #[tokio::test]
    async fn recover_needs_no_identifiers() {
        let ids = resolve_identifiers(Operation::Recover, &[], "http://unused")
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn add_without_identifiers_is_rejected() {
        let result = resolve_identifiers(Operation::Add, &[], "http://unused").await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
