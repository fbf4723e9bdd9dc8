use time::Date;

/// Earliest publication date PubMed searches are anchored to.
const EARLIEST_PUBLICATION_DATE: &str = "1900/01/01";

/// Rewrites a comma-separated disease description as a boolean OR term.
///
/// `"Diabetes, heart disease"` becomes `"Diabetes OR heart disease"`. Each
/// phrase is trimmed and empty phrases are dropped; order is preserved.
pub fn disease_term(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub(crate) fn registry_expression(drug: &str, disease: &str) -> String {
    format!("({drug}) AND ({disease})")
}

pub(crate) fn pubmed_term(drug: &str, disease: &str, cutoff: Date) -> String {
    let cutoff = crate::utils::date::pubmed_date(cutoff);
    format!(
        "({drug}) AND ({disease}) AND ((\"{EARLIEST_PUBLICATION_DATE}\"[Date - Publication] : \"{cutoff}\"[Date - Publication]))"
    )
}
