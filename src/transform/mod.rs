//! Transform adapters from upstream API shapes into entity models.

pub(crate) mod article;
pub(crate) mod trial;
