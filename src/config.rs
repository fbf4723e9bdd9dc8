//! Process configuration for the upstream clients.
//!
//! Values are read once and handed to each client at construction time;
//! clients never consult the environment themselves.

use std::borrow::Cow;

pub const CTGOV_BASE: &str = "https://clinicaltrials.gov";
pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const PUBMED_API_KEY_ENV: &str = "PUBMED_API_KEY";
const PUBMED_EMAIL_ENV: &str = "PUBMED_EMAIL";
const CTGOV_BASE_ENV: &str = "PHARMATOOLS_CTGOV_BASE";
const EUTILS_BASE_ENV: &str = "PHARMATOOLS_EUTILS_BASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// NCBI API key sent with every E-utilities call.
    pub api_key: Option<String>,
    /// Contact email NCBI asks tools to identify themselves with.
    pub email: Option<String>,
    pub ctgov_base: Cow<'static, str>,
    pub eutils_base: Cow<'static, str>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            email: None,
            ctgov_base: Cow::Borrowed(CTGOV_BASE),
            eutils_base: Cow::Borrowed(EUTILS_BASE),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_key: env_value(PUBMED_API_KEY_ENV),
            email: env_value(PUBMED_EMAIL_ENV),
            ctgov_base: env_base(CTGOV_BASE, CTGOV_BASE_ENV),
            eutils_base: env_base(EUTILS_BASE, EUTILS_BASE_ENV),
        }
    }

    /// Replaces credentials with explicitly supplied values; blanks are ignored.
    pub fn with_credentials(mut self, api_key: Option<&str>, email: Option<&str>) -> Self {
        if let Some(key) = clean(api_key) {
            self.api_key = Some(key);
        }
        if let Some(email) = clean(email) {
            self.email = Some(email);
        }
        self
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn env_value(env_var: &str) -> Option<String> {
    clean(std::env::var(env_var).ok().as_deref())
}

fn env_base(default: &'static str, env_var: &str) -> Cow<'static, str> {
    env_value(env_var)
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed(default))
}
