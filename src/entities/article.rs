use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::entities::QueryParams;
use crate::error::PharmaError;
use crate::sources::pubmed::{EFETCH_BATCH_SIZE, PubMedClient};

/// Title and abstract of one PubMed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub pmid: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiteratureResult {
    pub records: Vec<DocumentRecord>,
    /// Number of identifiers the search matched.
    pub total: usize,
}

/// Resolves PMIDs published between 1900/01/01 and the cutoff, by relevance.
///
/// `Ok(None)` means the search response carried no result envelope.
pub async fn search_ids(
    client: &PubMedClient,
    params: &QueryParams,
) -> Result<Option<Vec<String>>, PharmaError> {
    let term = crate::utils::query::pubmed_term(params.drug(), params.disease(), params.cutoff());
    client.esearch(&term).await
}

/// Splits `ids` into contiguous batches of [`EFETCH_BATCH_SIZE`]; the last
/// batch holds the remainder.
///
/// Empty input yields a single empty batch.
pub fn partition_into_batches<T>(ids: &[T]) -> Vec<&[T]> {
    if ids.is_empty() {
        return vec![ids];
    }
    ids.chunks(EFETCH_BATCH_SIZE).collect()
}

/// Reorders parsed documents to follow `batch`, matching on PMID.
///
/// Requested ids with no document get an empty record carrying the id.
/// Unrequested or repeated documents are dropped.
fn align_to_ids(batch: &[String], parsed: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    let mut by_pmid: HashMap<String, DocumentRecord> = HashMap::with_capacity(parsed.len());
    for record in parsed {
        if !batch.contains(&record.pmid) {
            warn!(pmid = record.pmid.as_str(), "efetch returned an unrequested document");
            continue;
        }
        if by_pmid.contains_key(&record.pmid) {
            warn!(pmid = record.pmid.as_str(), "efetch returned a duplicate document");
            continue;
        }
        by_pmid.insert(record.pmid.clone(), record);
    }

    batch
        .iter()
        .map(|id| {
            by_pmid.remove(id).unwrap_or_else(|| {
                warn!(pmid = id.as_str(), "efetch returned no document for id");
                DocumentRecord {
                    pmid: id.clone(),
                    ..DocumentRecord::default()
                }
            })
        })
        .collect()
}

/// Fetches one record per identifier, batch by batch, preserving order.
///
/// The result always has one record per id, in id order. Empty batches are
/// skipped without a remote call.
pub async fn fetch_records(
    client: &PubMedClient,
    ids: &[String],
) -> Result<Vec<DocumentRecord>, PharmaError> {
    let batches = partition_into_batches(ids);
    let mut records = Vec::with_capacity(ids.len());

    for (index, batch) in batches.iter().enumerate() {
        if batch.is_empty() {
            continue;
        }
        debug!(batch = index + 1, of = batches.len(), size = batch.len(), "fetching batch");

        let xml = client.efetch_xml(batch).await?;
        let parsed = crate::transform::article::records_from_efetch_xml(&xml)?;
        if parsed.len() != batch.len() {
            warn!(
                batch = index + 1,
                requested = batch.len(),
                returned = parsed.len(),
                "efetch returned a different number of documents than requested"
            );
        }
        records.extend(align_to_ids(batch, parsed));
    }

    Ok(records)
}

/// Searches, then fetches every match. `Ok(None)` is the no-result sentinel.
pub async fn fetch_literature(
    client: &PubMedClient,
    params: &QueryParams,
) -> Result<Option<LiteratureResult>, PharmaError> {
    let Some(ids) = search_ids(client, params).await? else {
        return Ok(None);
    };
    let records = fetch_records(client, &ids).await?;
    Ok(Some(LiteratureResult {
        records,
        total: ids.len(),
    }))
}

/// Convenience entry point building the client from `config`.
pub async fn literature(
    config: &Config,
    params: &QueryParams,
) -> Result<Option<LiteratureResult>, PharmaError> {
    let client = PubMedClient::new(config)?;
    fetch_literature(&client, params).await
}

/// PubMed's plain-text abstract rendering for `ids`, batch by batch.
pub async fn abstract_text(config: &Config, ids: &[String]) -> Result<String, PharmaError> {
    let client = PubMedClient::new(config)?;
    let mut out = String::new();
    for batch in partition_into_batches(ids) {
        out.push_str(&client.fetch_abstract_text(batch).await?);
    }
    Ok(out)
}
