use std::borrow::Cow;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::PharmaError;

// NCBI E-utilities (esearch + efetch against the pubmed database)
// Docs: https://www.ncbi.nlm.nih.gov/books/NBK25499/
const ESEARCH_API: &str = "pubmed-esearch";
const EFETCH_API: &str = "pubmed-efetch";

/// Hard ceiling on identifiers per efetch call.
pub const EFETCH_BATCH_SIZE: usize = 200;
/// Far above any realistic drug/disease result set; effectively "all matches".
const ESEARCH_RETMAX: usize = 100_000;

#[derive(Clone)]
pub struct PubMedClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: Option<String>,
    email: Option<String>,
}

impl PubMedClient {
    pub fn new(config: &Config) -> Result<Self, PharmaError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: config.eutils_base.clone(),
            api_key: config.api_key.clone(),
            email: config.email.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        crate::sources::join_endpoint(&self.base, path)
    }

    fn with_credentials(
        &self,
        mut req: reqwest_middleware::RequestBuilder,
    ) -> reqwest_middleware::RequestBuilder {
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("api_key", key)]);
        }
        if let Some(email) = self.email.as_deref() {
            req = req.query(&[("email", email)]);
        }
        req
    }

    fn validate_batch(ids: &[String]) -> Result<(), PharmaError> {
        if ids.len() > EFETCH_BATCH_SIZE {
            return Err(PharmaError::InvalidArgument(format!(
                "efetch accepts at most {EFETCH_BATCH_SIZE} identifiers per call (got {})",
                ids.len()
            )));
        }
        Ok(())
    }

    /// Runs an esearch for `term`, relevance-sorted.
    ///
    /// Returns `Ok(None)` when the response lacks the `esearchresult.idlist`
    /// envelope; a present but empty list is `Ok(Some(vec![]))`.
    pub async fn esearch(&self, term: &str) -> Result<Option<Vec<String>>, PharmaError> {
        let url = self.endpoint("esearch.fcgi");
        let retmax = ESEARCH_RETMAX.to_string();
        let req = self.client.get(&url).query(&[
            ("db", "pubmed"),
            ("term", term),
            ("retmax", retmax.as_str()),
            ("sort", "relevance"),
            ("retmode", "json"),
        ]);
        let req = self.with_credentials(req);

        let (content_type, bytes) = crate::sources::send_checked(ESEARCH_API, req).await?;
        crate::sources::ensure_json_content_type(ESEARCH_API, content_type.as_ref(), &bytes)?;
        let resp: ESearchResponse =
            serde_json::from_slice(&bytes).map_err(|source| PharmaError::ApiJson {
                api: ESEARCH_API.to_string(),
                source,
            })?;

        let Some(result) = resp.esearchresult else {
            warn!(term, "esearch response has no esearchresult envelope");
            return Ok(None);
        };
        let Some(ids) = result.idlist else {
            warn!(
                term,
                error = result.error.as_deref().unwrap_or(""),
                "esearch result has no idlist"
            );
            return Ok(None);
        };

        debug!(
            term,
            returned = ids.len(),
            count = result.count.as_deref().unwrap_or("?"),
            "esearch complete"
        );
        Ok(Some(ids))
    }

    /// Fetches PubMed XML for one batch of identifiers.
    pub async fn efetch_xml(&self, ids: &[String]) -> Result<String, PharmaError> {
        Self::validate_batch(ids)?;

        let url = self.endpoint("efetch.fcgi");
        let id = ids.join(",");
        let req = self.client.get(&url).query(&[
            ("db", "pubmed"),
            ("id", id.as_str()),
            ("rettype", "xml"),
            ("retmode", "xml"),
        ]);
        let req = self.with_credentials(req);

        let (_, bytes) = crate::sources::send_checked(EFETCH_API, req).await?;
        debug!(ids = ids.len(), bytes = bytes.len(), "efetch complete");
        String::from_utf8(bytes).map_err(|err| PharmaError::ApiXml {
            api: EFETCH_API.to_string(),
            message: format!("response is not valid UTF-8: {err}"),
        })
    }

    /// Fetches the plain-text abstract rendering for one batch of identifiers.
    pub async fn fetch_abstract_text(&self, ids: &[String]) -> Result<String, PharmaError> {
        if ids.is_empty() {
            return Ok(String::new());
        }
        Self::validate_batch(ids)?;

        let url = self.endpoint("efetch.fcgi");
        let id = ids.join(",");
        let req = self.client.get(&url).query(&[
            ("db", "pubmed"),
            ("id", id.as_str()),
            ("rettype", "abstract"),
            ("retmode", "text"),
        ]);
        let req = self.with_credentials(req);

        let (_, bytes) = crate::sources::send_checked(EFETCH_API, req).await?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct ESearchResponse {
    pub esearchresult: Option<ESearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct ESearchResult {
    pub count: Option<String>,
    pub idlist: Option<Vec<String>>,
    #[serde(rename = "ERROR")]
    pub error: Option<String>,
}
