use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::entities::QueryParams;
use crate::entities::article::LiteratureResult;
use crate::entities::trial::{FieldCounts, FieldLabel, TrialSummary};
use crate::error::PharmaError;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(serde::Serialize)]
struct CountRow {
    label: &'static str,
    count: u64,
}

fn count_rows<L: FieldLabel>(counts: &FieldCounts<L>) -> Vec<CountRow> {
    counts
        .iter()
        .map(|(label, count)| CountRow {
            label: label.label(),
            count,
        })
        .collect()
}

fn env() -> Result<&'static Environment<'static>, PharmaError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.add_filter("truncate", |s: String, max_bytes: usize| -> String {
        if s.len() <= max_bytes {
            return s;
        }
        if max_bytes == 0 {
            return "…".to_string();
        }
        let mut boundary = max_bytes;
        while boundary > 0 && !s.is_char_boundary(boundary) {
            boundary -= 1;
        }
        let mut out = s[..boundary].trim_end().to_string();
        out.push('…');
        out
    });
    env.add_template(
        "trial_summary.md.j2",
        include_str!("../../templates/trial_summary.md.j2"),
    )?;
    env.add_template(
        "literature.md.j2",
        include_str!("../../templates/literature.md.j2"),
    )?;
    env.add_template("id_list.md.j2", include_str!("../../templates/id_list.md.j2"))?;

    let _ = ENV.set(env);
    ENV.get().ok_or_else(|| PharmaError::Api {
        api: "render".into(),
        message: "Template environment initialization failed".into(),
    })
}

pub fn trial_summary_markdown(
    params: &QueryParams,
    summary: &TrialSummary,
) -> Result<String, PharmaError> {
    let tmpl = env()?.get_template("trial_summary.md.j2")?;
    let body = tmpl.render(context! {
        drug => params.drug(),
        disease => params.disease(),
        cutoff => params.cutoff().to_string(),
        n_trials => summary.n_trials,
        status => count_rows(&summary.status),
        organizers => count_rows(&summary.organizers),
        phases => count_rows(&summary.phases),
    })?;
    Ok(body)
}

pub fn literature_markdown(
    params: &QueryParams,
    result: Option<&LiteratureResult>,
    limit: usize,
) -> Result<String, PharmaError> {
    let tmpl = env()?.get_template("literature.md.j2")?;
    let records = result
        .map(|r| r.records.iter().take(limit).collect::<Vec<_>>())
        .unwrap_or_default();
    let body = tmpl.render(context! {
        drug => params.drug(),
        disease => params.disease(),
        cutoff => params.cutoff().to_string(),
        no_result => result.is_none(),
        total => result.map(|r| r.total).unwrap_or_default(),
        records => records,
    })?;
    Ok(body)
}

pub fn id_list_markdown(
    params: &QueryParams,
    ids: Option<&[String]>,
) -> Result<String, PharmaError> {
    let tmpl = env()?.get_template("id_list.md.j2")?;
    let body = tmpl.render(context! {
        drug => params.drug(),
        disease => params.disease(),
        cutoff => params.cutoff().to_string(),
        no_result => ids.is_none(),
        ids => ids.unwrap_or_default(),
    })?;
    Ok(body)
}
