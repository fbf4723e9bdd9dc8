//! Command-line surface: argument parsing and command dispatch.

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::entities::QueryParams;
use crate::entities::{article, trial};
use crate::render::{json, markdown};

#[derive(Parser, Debug)]
#[command(
    name = "pharmatools",
    version,
    about = "Clinical trial and PubMed literature summaries for a drug/disease pair"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// NCBI API key (default: PUBMED_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Contact email sent to NCBI (default: PUBMED_EMAIL)
    #[arg(long, global = true)]
    pub email: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Drug name, e.g. rivaroxaban
    #[arg(long)]
    pub drug: String,

    /// Disease; comma-separated phrases are OR'ed, e.g. "DVT, pulmonary embolism"
    #[arg(long)]
    pub disease: String,

    /// Cutoff date: YYYY, YYYY-MM, or YYYY-MM-DD
    #[arg(long)]
    pub date: String,
}

impl QueryArgs {
    fn params(&self) -> Result<QueryParams, crate::error::PharmaError> {
        QueryParams::parse(&self.drug, &self.disease, &self.date)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Trial counts by overall status, lead sponsor class and phase
    Trials {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Titles and abstracts of matching PubMed articles
    Literature {
        #[command(flatten)]
        query: QueryArgs,

        /// Records shown in markdown output (JSON always includes all)
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Matching PubMed IDs in relevance order
    Ids {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// PubMed's plain-text abstract rendering for the given PMIDs
    Abstracts {
        /// PubMed IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show how a disease description is rewritten for queries
    Normalize {
        /// Disease description, e.g. "Diabetes, heart disease"
        text: String,
    },

    /// Print version
    Version,
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = Config::from_env().with_credentials(cli.api_key.as_deref(), cli.email.as_deref());
    let json_output = cli.json;

    match cli.command {
        Commands::Trials { query } => {
            let params = query.params()?;
            let summary = trial::trial_summary(&config, &params).await?;
            if json_output {
                Ok(json::to_pretty(&summary)?)
            } else {
                Ok(markdown::trial_summary_markdown(&params, &summary)?)
            }
        }
        Commands::Literature { query, limit } => {
            let params = query.params()?;
            let result = article::literature(&config, &params).await?;
            if json_output {
                Ok(json::to_pretty(&result)?)
            } else {
                Ok(markdown::literature_markdown(
                    &params,
                    result.as_ref(),
                    limit,
                )?)
            }
        }
        Commands::Ids { query } => {
            let params = query.params()?;
            let client = crate::sources::pubmed::PubMedClient::new(&config)?;
            let ids = article::search_ids(&client, &params).await?;
            if json_output {
                Ok(json::to_pretty(&ids)?)
            } else {
                Ok(markdown::id_list_markdown(&params, ids.as_deref())?)
            }
        }
        Commands::Abstracts { ids } => {
            let ids: Vec<String> = ids
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            if ids.is_empty() {
                return Err(crate::error::PharmaError::InvalidArgument(
                    "At least one PubMed ID is required".into(),
                )
                .into());
            }
            let text = article::abstract_text(&config, &ids).await?;
            if json_output {
                Ok(json::to_pretty(&serde_json::json!({ "text": text }))?)
            } else {
                Ok(text.trim_end().to_string())
            }
        }
        Commands::Normalize { text } => {
            let term = crate::disease_term(&text);
            if json_output {
                Ok(json::to_pretty(&serde_json::json!({ "input": text, "term": term }))?)
            } else {
                Ok(term)
            }
        }
        Commands::Version => Ok(format!("pharmatools {}", env!("CARGO_PKG_VERSION"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trials_command_with_global_flags() {
        let cli = Cli::try_parse_from([
            "pharmatools",
            "trials",
            "--drug",
            "rivaroxaban",
            "--disease",
            "pulmonary embolism",
            "--date",
            "2019-01-01",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Trials { query } => {
                assert_eq!(query.drug, "rivaroxaban");
                assert_eq!(query.date, "2019-01-01");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn literature_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from([
            "pharmatools",
            "literature",
            "--drug",
            "a",
            "--disease",
            "b",
            "--date",
            "2019",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Literature { limit: 10, .. }));
    }

    #[test]
    fn abstracts_requires_ids() {
        assert!(Cli::try_parse_from(["pharmatools", "abstracts"]).is_err());
    }

    #[tokio::test]
    async fn normalize_prints_or_term() {
        let cli = Cli::try_parse_from(["pharmatools", "normalize", "Diabetes, heart disease"])
            .unwrap();
        let out = run(cli).await.unwrap();
        assert_eq!(out, "Diabetes OR heart disease");
    }

    #[tokio::test]
    async fn trials_rejects_bad_date_before_any_request() {
        let cli = Cli::try_parse_from([
            "pharmatools",
            "trials",
            "--drug",
            "a",
            "--disease",
            "b",
            "--date",
            "2019-02-30",
        ])
        .unwrap();
        let err = run(cli).await.unwrap_err();
        assert!(
            err.downcast_ref::<crate::error::PharmaError>()
                .is_some_and(|e| matches!(e, crate::error::PharmaError::InvalidArgument(_)))
        );
    }
}
