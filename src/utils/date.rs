use time::Date;
use time::macros::format_description;

use crate::error::PharmaError;

fn normalize_cutoff(value: &str) -> Result<String, PharmaError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(PharmaError::InvalidArgument(
            "--date accepts YYYY, YYYY-MM, or YYYY-MM-DD format".into(),
        ));
    }

    if v.len() == 4 && v.chars().all(|c| c.is_ascii_digit()) {
        return Ok(format!("{v}-01-01"));
    }

    if v.len() == 7 {
        let bytes = v.as_bytes();
        if bytes[4] == b'-'
            && v.chars()
                .enumerate()
                .all(|(i, c)| i == 4 || c.is_ascii_digit())
        {
            return Ok(format!("{v}-01"));
        }
    }

    if v.len() == 10 {
        return Ok(v.to_string());
    }

    Err(PharmaError::InvalidArgument(
        "--date accepts YYYY, YYYY-MM, or YYYY-MM-DD format".into(),
    ))
}

/// Parses a cutoff date; partial dates resolve to the first day of the period.
pub(crate) fn parse_cutoff(value: &str) -> Result<Date, PharmaError> {
    let normalized = normalize_cutoff(value)?;
    Date::parse(&normalized, format_description!("[year]-[month]-[day]")).map_err(|err| {
        PharmaError::InvalidArgument(format!("Invalid --date {normalized}: {err}"))
    })
}

/// `dd/mm/yyyy`, as the registry's first-posted filter expects.
pub(crate) fn registry_date(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

/// `yyyy/mm/dd`, as PubMed's `[Date - Publication]` ranges expect.
pub(crate) fn pubmed_date(date: Date) -> String {
    format!(
        "{:04}/{:02}/{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
