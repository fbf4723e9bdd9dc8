//! Output rendering: markdown via minijinja templates, or pretty JSON.

pub(crate) mod json;
pub(crate) mod markdown;
