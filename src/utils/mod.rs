//! Internal helpers for cutoff dates and query building.

pub(crate) mod date;
pub(crate) mod query;
