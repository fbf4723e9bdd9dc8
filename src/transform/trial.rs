use tracing::debug;

use crate::entities::trial::{FieldCounts, FieldLabel};
use crate::sources::clinicaltrials::FieldValue;

/// Folds registry field values into a fixed-key count map.
///
/// Labels outside `L` are dropped. A repeated label keeps the last count seen.
pub(crate) fn fold_field_values<L: FieldLabel>(values: &[FieldValue]) -> FieldCounts<L> {
    let mut counts = FieldCounts::<L>::default();
    for value in values {
        match L::from_label(&value.field_value) {
            Some(label) => counts.set(label, value.n_studies_found_with_value),
            None => debug!(
                field = L::FIELD.as_str(),
                label = value.field_value.as_str(),
                count = value.n_studies_found_with_value,
                "dropping unrecognized field value"
            ),
        }
    }
    counts
}
