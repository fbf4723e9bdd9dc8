use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::Date;
use tracing::debug;

use crate::config::Config;
use crate::error::PharmaError;

// ClinicalTrials.gov field-values query
// Docs: https://classic.clinicaltrials.gov/api/gui/ref/api_urls#field_values
const CTGOV_API: &str = "clinicaltrials.gov";
const FIELD_VALUES_PATH: &str = "api/query/field_values";

/// Registry fields the summary is broken down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryField {
    OverallStatus,
    OrgClass,
    Phase,
}

impl RegistryField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OverallStatus => "OverallStatus",
            Self::OrgClass => "OrgClass",
            Self::Phase => "Phase",
        }
    }
}

#[derive(Clone)]
pub struct ClinicalTrialsClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl ClinicalTrialsClient {
    pub fn new(config: &Config) -> Result<Self, PharmaError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: config.ctgov_base.clone(),
        })
    }

    fn endpoint(&self) -> String {
        crate::sources::join_endpoint(&self.base, FIELD_VALUES_PATH)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<T, PharmaError> {
        let (content_type, bytes) = crate::sources::send_checked(CTGOV_API, req).await?;
        crate::sources::ensure_json_content_type(CTGOV_API, content_type.as_ref(), &bytes)?;
        serde_json::from_slice(&bytes).map_err(|source| PharmaError::ApiJson {
            api: CTGOV_API.to_string(),
            source,
        })
    }

    /// Counts trials matching `expr`, first posted on or before `cutoff`,
    /// grouped by the distinct values of `field`.
    pub async fn field_values(
        &self,
        expr: &str,
        cutoff: Date,
        field: RegistryField,
    ) -> Result<FieldValuesResponse, PharmaError> {
        let cutoff = crate::utils::date::registry_date(cutoff);
        debug!(
            expr,
            cutoff = cutoff.as_str(),
            field = field.as_str(),
            "querying registry field values"
        );

        let url = self.endpoint();
        let req = self.client.get(&url).query(&[
            ("expr", expr),
            ("fmt", "json"),
            ("sfpd_e", cutoff.as_str()),
            ("field", field.as_str()),
        ]);
        let envelope: FieldValuesEnvelope = self.get_json(req).await?;
        Ok(envelope.response)
    }
}

#[derive(Debug, Deserialize)]
pub struct FieldValuesEnvelope {
    #[serde(rename = "FieldValuesResponse")]
    pub response: FieldValuesResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldValuesResponse {
    pub n_studies_found: u64,
    pub field_values: Vec<FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldValue {
    pub field_value: String,
    pub n_studies_found_with_value: u64,
}
