use crate::error::Result;
use serde::Deserialize;
use strucmotif::core::models::ids::StructureIdentifier;
use tracing::{debug, info};

/// Response body of the entry-list endpoint.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EntryList {
    result_count: usize,
    id_list: Vec<String>,
}

/// Fetches every identifier currently published by the archive.
pub async fn fetch_current_identifiers(url: &str) -> Result<Vec<StructureIdentifier>> {
    info!("Retrieving current entry list from {}", url);
    let client = reqwest::Client::new();
    let body = client.get(url).send().await?.error_for_status()?.text().await?;
    let ids = parse_entry_list(&body)?;
    info!("Retrieved {} identifiers", ids.len());
    Ok(ids)
}

fn parse_entry_list(body: &str) -> Result<Vec<StructureIdentifier>> {
    let list: EntryList = serde_json::from_str(body)?;
    if list.result_count != list.id_list.len() {
        debug!(
            "Entry list reports {} results but contains {} identifiers",
            list.result_count,
            list.id_list.len()
        );
    }
    Ok(list
        .id_list
        .iter()
        .map(|id| StructureIdentifier::new(id))
        .collect())
}
