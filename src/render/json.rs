use serde::Serialize;

use crate::error::PharmaError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, PharmaError> {
    Ok(serde_json::to_string_pretty(value)?)
}
