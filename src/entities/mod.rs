//! Query parameters and the retrieval workflows built on the source clients.

use time::Date;

use crate::error::PharmaError;

pub mod article;
pub mod trial;

/// A drug/disease pair and the cutoff date every query is bounded by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    drug: String,
    disease: String,
    cutoff: Date,
}

impl QueryParams {
    /// Builds parameters, rewriting `disease` with [`crate::disease_term`].
    pub fn new(drug: &str, disease: &str, cutoff: Date) -> Result<Self, PharmaError> {
        let drug = drug.trim();
        if drug.is_empty() {
            return Err(PharmaError::InvalidArgument("--drug is required".into()));
        }
        let disease = crate::utils::query::disease_term(disease);
        if disease.is_empty() {
            return Err(PharmaError::InvalidArgument(
                "--disease is required. Example: --disease \"Diabetes, heart disease\"".into(),
            ));
        }

        Ok(Self {
            drug: drug.to_string(),
            disease,
            cutoff,
        })
    }

    /// Like [`QueryParams::new`], parsing `cutoff` from `YYYY[-MM[-DD]]`.
    pub fn parse(drug: &str, disease: &str, cutoff: &str) -> Result<Self, PharmaError> {
        Self::new(drug, disease, crate::utils::date::parse_cutoff(cutoff)?)
    }

    pub fn drug(&self) -> &str {
        &self.drug
    }

    pub fn disease(&self) -> &str {
        &self.disease
    }

    pub fn cutoff(&self) -> Date {
        self.cutoff
    }
}
